/// STL export and import, binary and ASCII
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{multispace0, multispace1},
    multi::many0,
    number::complete::float,
    sequence::preceded,
    IResult,
};
use std::fmt;

use nalgebra::{Point3, Vector3};

use crate::geometry::{barycentric, Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StlError {
    #[error("file too small to be a valid STL ({0} bytes)")]
    TooSmall(usize),
    #[error("unexpected end of file in facet {facet} of {expected}")]
    Truncated { facet: usize, expected: usize },
    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),
}

/// Serialize a mesh as binary STL
///
/// Facet normals are recomputed from the winding.
pub fn write_binary_stl(mesh: &Mesh) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 4 + mesh.triangles.len() * FACET_LEN);
    let mut header = [0u8; HEADER_LEN];
    let label = b"gears binary STL";
    header[..label.len()].copy_from_slice(label);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(mesh.triangles.len() as u32).to_le_bytes());

    for triangle in &mesh.triangles {
        let normal = facet_normal(triangle);
        for c in normal.iter() {
            out.extend_from_slice(&c.to_le_bytes());
        }
        for vertex in &triangle.vertices {
            for c in vertex.position.iter() {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        // Attribute byte count
        out.extend_from_slice(&0u16.to_le_bytes());
    }

    out
}

/// Serialize a mesh as ASCII STL
pub fn write_ascii_stl(mesh: &Mesh, name: &str) -> String {
    let mut out = String::new();
    // Formatting into a String never fails
    let _ = write_ascii_to(&mut out, mesh, name);
    out
}

/// Write a mesh as ASCII STL into any formatter
pub fn write_ascii_to<W: fmt::Write>(out: &mut W, mesh: &Mesh, name: &str) -> fmt::Result {
    writeln!(out, "solid {name}")?;
    for triangle in &mesh.triangles {
        let n = facet_normal(triangle);
        writeln!(out, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(out, "    outer loop")?;
        for vertex in &triangle.vertices {
            let p = vertex.position;
            writeln!(out, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }
    writeln!(out, "endsolid {name}")
}

fn facet_normal(triangle: &Triangle) -> Vector3<f32> {
    let normal = triangle.calculate_normal();
    if normal.iter().all(|c| c.is_finite()) {
        normal
    } else {
        Vector3::zeros()
    }
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooSmall(data.len()));
    }

    // Skip 80-byte header
    let data = &data[HEADER_LEN..];

    // Read triangle count (4 bytes, little-endian)
    let triangle_count = read_u32(data, 0) as usize;

    let mut mesh = Mesh::with_capacity(triangle_count.min(data.len() / FACET_LEN));
    let mut offset = 4;

    for facet in 0..triangle_count {
        if offset + FACET_LEN > data.len() {
            return Err(StlError::Truncated {
                facet,
                expected: triangle_count,
            });
        }

        let normal = read_vector3(data, offset);
        offset += 12;

        let mut vertices = [Vertex::new(Point3::origin(), normal, barycentric::CORNER_C); 3];
        for (vertex, tag) in vertices.iter_mut().zip(barycentric::CYCLE) {
            *vertex = Vertex::new(Point3::from(read_vector3(data, offset)), normal, tag);
            offset += 12;
        }

        // Skip attribute byte count (2 bytes)
        offset += 2;

        mesh.add_triangle(Triangle::new(vertices[0], vertices[1], vertices[2]));
    }

    Ok(mesh)
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

fn read_vector3(data: &[u8], offset: usize) -> Vector3<f32> {
    let c = |i: usize| f32::from_bits(read_u32(data, offset + 4 * i));
    Vector3::new(c(0), c(1), c(2))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, StlError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(StlError::Ascii(format!("{:?}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = take_till(|c| c == '\n')(input)?; // Optional name
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }

    Ok((input, mesh))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input, normal, barycentric::CORNER_A)?;
    let (input, v2) = parse_vertex(input, normal, barycentric::CORNER_B)?;
    let (input, v3) = parse_vertex(input, normal, barycentric::CORNER_C)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v1, v2, v3)))
}

fn parse_vertex(
    input: &str,
    normal: Vector3<f32>,
    tag_value: nalgebra::Vector2<f32>,
) -> IResult<&str, Vertex> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, position) = parse_vector3(input)?;
    Ok((input, Vertex::new(Point3::from(position), normal, tag_value)))
}

fn parse_vector3(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, StlError> {
    // Binary files may also start with "solid", so fall back on failure
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gear::{generate_gear, GearSpec};

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = vec![0u8; 100];
        data[80..84].copy_from_slice(&2u32.to_le_bytes());
        assert_eq!(
            parse_binary_stl(&data).unwrap_err(),
            StlError::Truncated { facet: 0, expected: 2 }
        );
        assert_eq!(parse_binary_stl(&[0; 10]).unwrap_err(), StlError::TooSmall(10));
    }

    #[test]
    fn test_binary_export_reads_back() {
        let mesh = generate_gear(&GearSpec::new(1.3, 2.0, 0.5, 10, 0.7)).to_mesh();
        let bytes = write_binary_stl(&mesh);
        assert_eq!(bytes.len(), 84 + 50 * mesh.triangles.len());

        let parsed = parse_stl(&bytes).unwrap();
        assert_eq!(parsed.triangles.len(), mesh.triangles.len());
        for (a, b) in parsed.triangles.iter().zip(&mesh.triangles) {
            for (va, vb) in a.vertices.iter().zip(&b.vertices) {
                assert_eq!(va.position, vb.position);
            }
            assert!((a.vertices[0].normal - b.calculate_normal()).norm() < 1e-5);
        }
    }

    #[test]
    fn test_ascii_writer_reports_formatter_errors() {
        struct Full;
        impl fmt::Write for Full {
            fn write_str(&mut self, _: &str) -> fmt::Result {
                Err(fmt::Error)
            }
        }
        let mesh = generate_gear(&GearSpec::new(0.5, 2.0, 2.0, 3, 0.7)).to_mesh();
        assert_eq!(write_ascii_to(&mut Full, &mesh, "gear"), Err(fmt::Error));

        let mut text = String::new();
        write_ascii_to(&mut text, &mesh, "gear").unwrap();
        assert_eq!(text, write_ascii_stl(&mesh, "gear"));
        assert_eq!(text.matches("endfacet").count(), mesh.triangles.len());
    }

    #[test]
    fn test_ascii_export_reads_back() {
        let mesh = generate_gear(&GearSpec::new(0.5, 2.0, 2.0, 3, 0.7)).to_mesh();
        let text = write_ascii_stl(&mesh, "gear");
        assert!(text.starts_with("solid gear\n"));
        assert!(text.trim_end().ends_with("endsolid gear"));

        let parsed = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(parsed.triangles.len(), mesh.triangles.len());
        let (min, max) = parsed.bounds().unwrap();
        assert!((max.z - 1.0).abs() < 1e-6 && (min.z + 1.0).abs() < 1e-6);
    }
}

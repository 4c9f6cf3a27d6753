/// Geometry primitives shared by the generator, exporters and renderers
use nalgebra::{Point3, Vector2, Vector3};

/// Per-corner wireframe tags. A triangle whose corners carry all three tags
/// lets a shader recover its edges from interpolated values alone.
pub mod barycentric {
    use nalgebra::Vector2;

    pub const CORNER_A: Vector2<f32> = Vector2::new(1.0, 0.0);
    pub const CORNER_B: Vector2<f32> = Vector2::new(0.0, 1.0);
    pub const CORNER_C: Vector2<f32> = Vector2::new(0.0, 0.0);

    /// Tags in the order they are handed out around a triangle.
    pub const CYCLE: [Vector2<f32>; 3] = [CORNER_A, CORNER_B, CORNER_C];
}

/// A 3D vertex with position, normal and wireframe tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub barycentric: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, barycentric: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            barycentric,
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    ///
    /// Counter-clockwise corners produce a normal pointing towards the viewer.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        self.cross().normalize()
    }

    /// Area of the triangle in model units squared
    pub fn area(&self) -> f32 {
        self.cross().norm() * 0.5
    }

    fn cross(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2)
    }
}

/// A non-indexed mesh: every triangle owns its three vertices
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Axis-aligned bounding box as `(min, max)`, or `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        bounds_of(
            self.triangles
                .iter()
                .flat_map(|t| t.vertices.iter().map(|v| v.position)),
        )
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn bounds_of(
    mut points: impl Iterator<Item = Point3<f32>>,
) -> Option<(Point3<f32>, Point3<f32>)> {
    let first = points.next()?;
    Some(points.fold((first, first), |(min, max), p| {
        (min.inf(&p), max.sup(&p))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(Point3::new(x, y, z), Vector3::z(), barycentric::CORNER_C)
    }

    #[test]
    fn test_counter_clockwise_normal_faces_viewer() {
        let tri = Triangle::new(flat(0.0, 0.0, 0.0), flat(1.0, 0.0, 0.0), flat(0.0, 1.0, 0.0));
        let normal = tri.calculate_normal();
        assert!((normal - Vector3::z()).norm() < 1e-6);
        assert!((tri.area() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bounds() {
        let mut mesh = Mesh::new();
        assert!(mesh.bounds().is_none());

        mesh.add_triangle(Triangle::new(
            flat(-1.0, 0.0, 2.0),
            flat(3.0, -4.0, 0.0),
            flat(0.0, 5.0, -2.0),
        ));
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Point3::new(-1.0, -4.0, -2.0));
        assert_eq!(max, Point3::new(3.0, 5.0, 2.0));
    }
}

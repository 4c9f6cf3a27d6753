//! Parametric spur gear mesh generator.
//!
//! A gear is a disc of thickness `width` with `teeth` trapezoidal teeth on
//! its rim and a cylindrical bore through its centre. [`generate_gear`] turns
//! a [`GearSpec`] into an indexed triangle mesh with outward normals and
//! counter-clockwise winding on every face.
//!
//! Vertices are emitted piece by piece, each piece a ring around the axis:
//!
//! 1. front face (`z = +width/2`)
//! 2. front faces of the teeth
//! 3. back face (`z = -width/2`)
//! 4. back faces of the teeth
//! 5. outward faces of the teeth (two flanks, tip, root land)
//! 6. bore cylinder
//!
//! Only the bore shares vertices between neighbouring quads; every other
//! piece has flat shading and therefore its own corners.

use std::f32::consts::PI;

use nalgebra::{Point3, Vector2, Vector3};

use crate::geometry::{barycentric, bounds_of, Mesh, Triangle, Vertex};

/// Parameters of a single gear, in model units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearSpec {
    /// Radius of the bore.
    pub inner_radius: f32,
    /// Radius at the middle of the teeth.
    pub outer_radius: f32,
    /// Thickness along the z axis.
    pub width: f32,
    pub teeth: u32,
    /// Radial distance from tooth root to tooth tip.
    pub tooth_depth: f32,
}

/// Reasons a [`GearSpec`] would produce a degenerate or self-intersecting mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GearSpecError {
    #[error("a gear needs at least one tooth")]
    NoTeeth,
    #[error("{name} must be positive and finite, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("bore radius {inner_radius} must be smaller than the tooth root radius {root_radius}")]
    BoreTooLarge { inner_radius: f32, root_radius: f32 },
}

impl GearSpec {
    /// Arguments follow the classic `gear(inner, outer, width, teeth, depth)` order.
    pub fn new(inner_radius: f32, outer_radius: f32, width: f32, teeth: u32, tooth_depth: f32) -> Self {
        Self {
            inner_radius,
            outer_radius,
            width,
            teeth,
            tooth_depth,
        }
    }

    /// Radius at the base of a tooth (`r1`).
    pub fn root_radius(&self) -> f32 {
        self.outer_radius - self.tooth_depth / 2.0
    }

    /// Radius at the outermost point of a tooth (`r2`).
    pub fn tip_radius(&self) -> f32 {
        self.outer_radius + self.tooth_depth / 2.0
    }

    /// Angular width of one tooth slice.
    pub fn tooth_angle(&self) -> f32 {
        2.0 * PI / self.teeth as f32
    }

    /// A quarter of a tooth slice (`da`). Tooth corners sit on multiples of it.
    pub fn quarter_angle(&self) -> f32 {
        PI / self.teeth as f32 / 2.0
    }

    /// Checks that the parameters describe a non-self-intersecting solid.
    ///
    /// [`generate_gear`] never calls this to reject input; use
    /// [`try_generate_gear`] to fail fast instead.
    pub fn validate(&self) -> Result<(), GearSpecError> {
        if self.teeth == 0 {
            return Err(GearSpecError::NoTeeth);
        }
        for (name, value) in [
            ("inner_radius", self.inner_radius),
            ("outer_radius", self.outer_radius),
            ("width", self.width),
            ("tooth_depth", self.tooth_depth),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GearSpecError::NotPositive { name, value });
            }
        }
        let root_radius = self.root_radius();
        if self.inner_radius >= root_radius {
            return Err(GearSpecError::BoreTooLarge {
                inner_radius: self.inner_radius,
                root_radius,
            });
        }
        Ok(())
    }
}

/// Indexed triangle mesh of a gear, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct GearMesh {
    pub vertices: Vec<Vertex>,
    /// Counter-clockwise triangles indexing into `vertices`.
    pub indices: Vec<[u32; 3]>,
}

impl GearMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Resolves each index triple into its vertices.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.iter().map(|&[a, b, c]| {
            Triangle::new(
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            )
        })
    }

    /// Expands the index buffer into a non-indexed triangle list.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.indices.len());
        for triangle in self.triangles() {
            mesh.add_triangle(triangle);
        }
        mesh
    }

    /// Axis-aligned bounding box as `(min, max)`, or `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        bounds_of(self.vertices.iter().map(|v| v.position))
    }
}

/// Number of vertices [`generate_gear`] emits for a gear with `teeth` teeth.
pub const fn expected_vertex_count(teeth: u32) -> usize {
    let teeth = teeth as usize;
    // Faces: 7 (triangle + quad) + 4 (tooth) per side; sides: 4 quads; bore: 2 per edge.
    teeth * (2 * (7 + 4) + 4 * 4) + 2 * (teeth + 1)
}

/// Number of triangles [`generate_gear`] emits for a gear with `teeth` teeth.
pub const fn expected_triangle_count(teeth: u32) -> usize {
    let teeth = teeth as usize;
    teeth * (2 * (3 + 2) + 4 * 2 + 2)
}

/// Builds the mesh of a gear.
///
/// This is a pure function: equal specs give bit-identical meshes. Input is
/// not validated; specs that fail [`GearSpec::validate`] produce degenerate
/// geometry (and a warning in the log) rather than an error.
pub fn generate_gear(spec: &GearSpec) -> GearMesh {
    if let Err(err) = spec.validate() {
        log::warn!("generating gear from invalid parameters: {err}");
    }

    let mut builder = MeshBuilder::with_capacity(spec.teeth);
    let rim = Rim::new(spec);
    let (r0, r1, r2) = (spec.inner_radius, spec.root_radius(), spec.tip_radius());
    let front = spec.width * 0.5;
    let back = -spec.width * 0.5;

    // Front face
    for s in rim.tooth_steps() {
        builder.add_tri(
            Vector3::z(),
            [rim.point(r0, s, front), rim.point(r1, s, front), rim.point(r1, s + 3, front)],
        );
        builder.add_quad(
            Vector3::z(),
            [
                rim.point(r0, s, front),
                rim.point(r1, s + 3, front),
                rim.point(r0, s + 4, front),
                rim.point(r1, s + 4, front),
            ],
        );
    }

    // Front sides of teeth
    for s in rim.tooth_steps() {
        builder.add_quad(
            Vector3::z(),
            [
                rim.point(r1, s, front),
                rim.point(r2, s + 1, front),
                rim.point(r1, s + 3, front),
                rim.point(r2, s + 2, front),
            ],
        );
    }

    // Back face, same triangles with reversed winding
    for s in rim.tooth_steps() {
        builder.add_tri(
            -Vector3::z(),
            [rim.point(r1, s, back), rim.point(r0, s, back), rim.point(r1, s + 3, back)],
        );
        builder.add_quad(
            -Vector3::z(),
            mirrored([
                rim.point(r0, s, back),
                rim.point(r1, s + 3, back),
                rim.point(r0, s + 4, back),
                rim.point(r1, s + 4, back),
            ]),
        );
    }

    // Back sides of teeth
    for s in rim.tooth_steps() {
        builder.add_quad(
            -Vector3::z(),
            mirrored([
                rim.point(r1, s, back),
                rim.point(r2, s + 1, back),
                rim.point(r1, s + 3, back),
                rim.point(r2, s + 2, back),
            ]),
        );
    }

    // Outward faces of teeth: flank, tip, flank, root land
    for s in rim.tooth_steps() {
        let outline = [(r1, s), (r2, s + 1), (r2, s + 2), (r1, s + 3), (r1, s + 4)];
        for pair in outline.windows(2) {
            let (p, q) = (rim.point(pair[0].0, pair[0].1, 0.0), rim.point(pair[1].0, pair[1].1, 0.0));
            builder.add_quad(
                edge_normal(p, q),
                [
                    Point3::new(p.x, p.y, front),
                    Point3::new(p.x, p.y, back),
                    Point3::new(q.x, q.y, front),
                    Point3::new(q.x, q.y, back),
                ],
            );
        }
    }

    // Bore
    let bore_start = builder.index_start();
    for k in 0..=spec.teeth {
        let step = 4 * k;
        let normal = -rim.radial(step);
        let tags = &barycentric::CYCLE;
        builder.push(rim.point(r0, step, back), normal, tags[k as usize % 3]);
        builder.push(rim.point(r0, step, front), normal, tags[(k as usize + 1) % 3]);
    }
    for k in 0..spec.teeth {
        builder.add_quad_indices(bore_start + 2 * k);
    }

    let mesh = builder.finish();
    log::debug!(
        "generated gear with {} teeth: {} vertices, {} triangles",
        spec.teeth,
        mesh.vertices.len(),
        mesh.indices.len(),
    );
    mesh
}

/// Like [`generate_gear`], but rejects specs that fail [`GearSpec::validate`].
pub fn try_generate_gear(spec: &GearSpec) -> Result<GearMesh, GearSpecError> {
    spec.validate()?;
    Ok(generate_gear(spec))
}

/// Angular positions around the rim, in quarter-tooth steps.
///
/// Steps wrap at a full turn so that corners shared between neighbouring
/// teeth land on bit-identical coordinates.
struct Rim {
    teeth: u32,
    quarter_angle: f32,
}

impl Rim {
    fn new(spec: &GearSpec) -> Self {
        Self {
            teeth: spec.teeth,
            quarter_angle: spec.quarter_angle(),
        }
    }

    /// First step of every tooth slice.
    fn tooth_steps(&self) -> impl Iterator<Item = u32> {
        (0..self.teeth).map(|i| 4 * i)
    }

    fn angle(&self, step: u32) -> f32 {
        let steps = 4 * self.teeth;
        (step % steps.max(1)) as f32 * self.quarter_angle
    }

    fn radial(&self, step: u32) -> Vector3<f32> {
        let angle = self.angle(step);
        Vector3::new(angle.cos(), angle.sin(), 0.0)
    }

    fn point(&self, radius: f32, step: u32, z: f32) -> Point3<f32> {
        let angle = self.angle(step);
        Point3::new(radius * angle.cos(), radius * angle.sin(), z)
    }
}

/// Outward normal of the rim edge `p -> q` traversed counter-clockwise: the
/// edge direction rotated by -90 degrees in the xy plane.
fn edge_normal(p: Point3<f32>, q: Point3<f32>) -> Vector3<f32> {
    let dir = Vector2::new(q.x - p.x, q.y - p.y).normalize();
    Vector3::new(dir.y, -dir.x, 0.0)
}

/// Reorders quad corners so the same two triangles come out with the
/// opposite winding.
fn mirrored([v1, v2, v3, v4]: [Point3<f32>; 4]) -> [Point3<f32>; 4] {
    [v1, v3, v2, v4]
}

/// Appends vertices and triangles to a growing indexed mesh.
struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<[u32; 3]>,
}

impl MeshBuilder {
    fn with_capacity(teeth: u32) -> Self {
        Self {
            vertices: Vec::with_capacity(expected_vertex_count(teeth)),
            indices: Vec::with_capacity(expected_triangle_count(teeth)),
        }
    }

    /// Index the next pushed vertex will get.
    fn index_start(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn push(&mut self, position: Point3<f32>, normal: Vector3<f32>, barycentric: Vector2<f32>) {
        self.vertices.push(Vertex::new(position, normal, barycentric));
    }

    fn add_tri(&mut self, normal: Vector3<f32>, corners: [Point3<f32>; 3]) {
        let start = self.index_start();
        for (position, tag) in corners.into_iter().zip(barycentric::CYCLE) {
            self.push(position, normal, tag);
        }
        self.indices.push([start, start + 1, start + 2]);
    }

    /// Adds a flat quad as triangles `(v1, v2, v4)` and `(v4, v3, v1)`.
    ///
    /// `v1, v2, v4` must run counter-clockwise seen from the front. The tags
    /// give both triangles one corner of each kind.
    fn add_quad(&mut self, normal: Vector3<f32>, corners: [Point3<f32>; 4]) {
        let start = self.index_start();
        let tags = [
            barycentric::CORNER_A,
            barycentric::CORNER_B,
            barycentric::CORNER_B,
            barycentric::CORNER_C,
        ];
        for (position, tag) in corners.into_iter().zip(tags) {
            self.push(position, normal, tag);
        }
        self.add_quad_indices(start);
    }

    /// Indexes four consecutive vertices starting at `start` as a quad.
    fn add_quad_indices(&mut self, start: u32) {
        self.indices.push([start, start + 1, start + 3]);
        self.indices.push([start + 3, start + 2, start]);
    }

    fn finish(self) -> GearMesh {
        GearMesh {
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic() -> GearSpec {
        GearSpec::new(1.0, 4.0, 1.0, 20, 0.7)
    }

    #[test]
    fn test_derived_radii() {
        let spec = classic();
        assert!((spec.root_radius() - 3.65).abs() < 1e-6);
        assert!((spec.tip_radius() - 4.35).abs() < 1e-6);
        assert!((spec.quarter_angle() * 4.0 - spec.tooth_angle()).abs() < 1e-6);
    }

    #[test]
    fn test_counts_match_layout() {
        for teeth in [3, 10, 20] {
            let mesh = generate_gear(&GearSpec { teeth, ..classic() });
            assert_eq!(mesh.vertices.len(), expected_vertex_count(teeth));
            assert_eq!(mesh.triangle_count(), expected_triangle_count(teeth));
        }
        assert_eq!(expected_vertex_count(20), 802);
        assert_eq!(expected_triangle_count(20), 400);
    }

    #[test]
    fn test_indices_in_range() {
        let mesh = generate_gear(&classic());
        let len = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().flatten().all(|&i| i < len));
    }

    #[test]
    fn test_quad_split_along_first_last_diagonal() {
        let mut builder = MeshBuilder::with_capacity(0);
        builder.add_tri(Vector3::z(), [Point3::origin(); 3]);
        builder.add_quad(Vector3::z(), [Point3::origin(); 4]);
        let mesh = builder.finish();
        assert_eq!(mesh.indices, vec![[0, 1, 2], [3, 4, 6], [6, 5, 3]]);
    }

    #[test]
    fn test_every_triangle_has_all_tags() {
        let mesh = generate_gear(&GearSpec { teeth: 7, ..classic() });
        for [a, b, c] in &mesh.indices {
            let mut tags: Vec<_> = [a, b, c]
                .iter()
                .map(|&&i| mesh.vertices[i as usize].barycentric)
                .map(|t| (t.x as i32, t.y as i32))
                .collect();
            tags.sort();
            assert_eq!(tags, vec![(0, 0), (0, 1), (1, 0)]);
        }
    }

    #[test]
    fn test_front_face_comes_first() {
        let spec = classic();
        let mesh = generate_gear(&spec);
        // First tooth's front triangle: bore corner, root corner, trailing root corner.
        let first = &mesh.vertices[..3];
        assert!(first.iter().all(|v| v.position.z == 0.5 && v.normal == Vector3::z()));
        let radius = |v: &Vertex| v.position.xy().coords.norm();
        assert!((radius(&first[0]) - spec.inner_radius).abs() < 1e-5);
        assert!((radius(&first[1]) - spec.root_radius()).abs() < 1e-5);
        assert!((radius(&first[2]) - spec.root_radius()).abs() < 1e-5);
    }

    #[test]
    fn test_bore_normals_point_inward() {
        let spec = classic();
        let mesh = generate_gear(&spec);
        let bore = &mesh.vertices[mesh.vertices.len() - 2 * (spec.teeth as usize + 1)..];
        for v in bore {
            let radial = Vector3::new(v.position.x, v.position.y, 0.0).normalize();
            assert!((v.normal + radial).norm() < 1e-5);
        }
    }

    #[test]
    fn test_side_normals_are_per_face() {
        let spec = GearSpec { teeth: 4, ..classic() };
        let mesh = generate_gear(&spec);
        let sides_start = spec.teeth as usize * 22;
        let flank = mesh.vertices[sides_start].normal;
        let tip = mesh.vertices[sides_start + 4].normal;
        assert!(flank.z == 0.0 && tip.z == 0.0);
        assert!((flank - tip).norm() > 1e-3);
        // Tip normal points through the middle of the tip.
        let mid = 1.5 * spec.quarter_angle();
        assert!((tip - Vector3::new(mid.cos(), mid.sin(), 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_validate() {
        assert_eq!(classic().validate(), Ok(()));
        assert_eq!(
            GearSpec { teeth: 0, ..classic() }.validate(),
            Err(GearSpecError::NoTeeth)
        );
        assert!(matches!(
            GearSpec { width: -1.0, ..classic() }.validate(),
            Err(GearSpecError::NotPositive { name: "width", .. })
        ));
        assert!(matches!(
            GearSpec { inner_radius: 3.7, ..classic() }.validate(),
            Err(GearSpecError::BoreTooLarge { .. })
        ));
        assert!(try_generate_gear(&GearSpec { inner_radius: f32::NAN, ..classic() }).is_err());
    }

    #[test]
    fn test_invalid_spec_still_generates() {
        let spec = GearSpec { inner_radius: 5.0, ..classic() };
        let mesh = generate_gear(&spec);
        assert_eq!(mesh.vertices.len(), expected_vertex_count(spec.teeth));
    }

    #[test]
    fn test_to_mesh_expands_indices() {
        let gear = generate_gear(&GearSpec { teeth: 5, ..classic() });
        let mesh = gear.to_mesh();
        assert_eq!(mesh.triangles.len(), gear.triangle_count());
        assert_eq!(mesh.bounds(), gear.bounds());
    }
}

//! Watertightness checks for triangle meshes.
//!
//! Flat-shaded meshes duplicate vertices along creases, so edges are matched
//! by quantized position rather than by index.

use std::collections::HashMap;

use nalgebra::Point3;

use crate::gear::GearMesh;
use crate::geometry::{Mesh, Triangle};

const QUANTIZATION_FACTOR: f32 = 1e5;

/// Triangles with a smaller area than this count as degenerate.
pub const DEGENERATE_AREA: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantizedPoint(i64, i64, i64);

impl From<Point3<f32>> for QuantizedPoint {
    fn from(p: Point3<f32>) -> Self {
        let q = |c: f32| (c * QUANTIZATION_FACTOR).round() as i64;
        QuantizedPoint(q(p.x), q(p.y), q(p.z))
    }
}

/// Directed edge usage of a mesh.
#[derive(Debug, Clone, Default)]
pub struct EdgeReport {
    directed: HashMap<(QuantizedPoint, QuantizedPoint), u32>,
    degenerate: Vec<usize>,
}

impl EdgeReport {
    pub fn from_triangles(triangles: impl IntoIterator<Item = Triangle>) -> Self {
        let mut report = Self::default();
        for (i, tri) in triangles.into_iter().enumerate() {
            if tri.area() < DEGENERATE_AREA {
                report.degenerate.push(i);
            }
            for &(a, b) in &[(0, 1), (1, 2), (2, 0)] {
                let from = QuantizedPoint::from(tri.vertices[a].position);
                let to = QuantizedPoint::from(tri.vertices[b].position);
                *report.directed.entry((from, to)).or_insert(0) += 1;
            }
        }
        report
    }

    pub fn edge_count(&self) -> usize {
        self.directed.len()
    }

    /// Directed edges that are not matched by exactly one edge running the
    /// other way, or that are used more than once, sorted.
    pub fn boundary_edges(&self) -> Vec<(QuantizedPoint, QuantizedPoint)> {
        let mut edges: Vec<_> = self
            .directed
            .iter()
            .filter(|&(&(from, to), &count)| {
                count != 1 || self.directed.get(&(to, from)).copied() != Some(1)
            })
            .map(|(&edge, _)| edge)
            .collect();
        edges.sort();
        edges
    }

    /// True if every edge is shared by exactly two triangles with opposite
    /// winding.
    pub fn is_closed(&self) -> bool {
        self.boundary_edges().is_empty()
    }

    /// Indices of triangles with (near) zero area.
    pub fn degenerate_triangles(&self) -> &[usize] {
        &self.degenerate
    }
}

impl From<&GearMesh> for EdgeReport {
    fn from(mesh: &GearMesh) -> Self {
        Self::from_triangles(mesh.triangles())
    }
}

impl From<&Mesh> for EdgeReport {
    fn from(mesh: &Mesh) -> Self {
        Self::from_triangles(mesh.triangles.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{barycentric, Vertex};
    use nalgebra::Vector3;

    fn tri(points: [[f32; 3]; 3]) -> Triangle {
        let [a, b, c] = points.map(|[x, y, z]| {
            Vertex::new(Point3::new(x, y, z), Vector3::z(), barycentric::CORNER_C)
        });
        Triangle::new(a, b, c)
    }

    fn tetrahedron() -> Vec<Triangle> {
        let (o, x, y, z) = ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
        vec![tri([o, y, x]), tri([o, x, z]), tri([o, z, y]), tri([x, y, z])]
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let report = EdgeReport::from_triangles(tetrahedron());
        assert!(report.is_closed());
        assert_eq!(report.edge_count(), 12);
        assert!(report.degenerate_triangles().is_empty());
    }

    #[test]
    fn test_missing_face_leaves_boundary() {
        let mut tris = tetrahedron();
        tris.pop();
        let report = EdgeReport::from_triangles(tris);
        assert!(!report.is_closed());
        assert_eq!(report.boundary_edges().len(), 3);
    }

    #[test]
    fn test_flipped_face_is_not_closed() {
        let mut tris = tetrahedron();
        tris[3].vertices.swap(0, 1);
        assert!(!EdgeReport::from_triangles(tris).is_closed());
    }

    #[test]
    fn test_degenerate_triangle_detected() {
        let report = EdgeReport::from_triangles([tri([[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]])]);
        assert_eq!(report.degenerate_triangles(), &[0]);
    }
}

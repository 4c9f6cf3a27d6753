//! Interleaved vertex layout for GPU upload.
//!
//! Types here are `#[repr(C)]` and `bytemuck`-safe so buffers can be handed
//! to a graphics API without extra copies.

use bytemuck::{Pod, Zeroable};

use crate::gear::GearMesh;
use crate::geometry::Vertex;

/// Position, normal and barycentric tag: 8 floats, 32 bytes per vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub barycentric: [f32; 2],
}

impl GpuVertex {
    pub const STRIDE: usize = std::mem::size_of::<GpuVertex>();
    pub const POSITION_OFFSET: usize = 0;
    pub const NORMAL_OFFSET: usize = 3 * std::mem::size_of::<f32>();
    pub const BARYCENTRIC_OFFSET: usize = 6 * std::mem::size_of::<f32>();
}

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            position: v.position.coords.into(),
            normal: v.normal.into(),
            barycentric: v.barycentric.into(),
        }
    }
}

impl GearMesh {
    pub fn gpu_vertices(&self) -> Vec<GpuVertex> {
        self.vertices.iter().map(GpuVertex::from).collect()
    }

    /// Vertex buffer contents in [`GpuVertex`] layout.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.gpu_vertices()).to_vec()
    }

    /// Index buffer contents: three native-endian `u32`s per triangle.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gear::{generate_gear, GearSpec};

    #[test]
    fn test_stride() {
        assert_eq!(GpuVertex::STRIDE, 32);
        assert_eq!(GpuVertex::NORMAL_OFFSET, 12);
        assert_eq!(GpuVertex::BARYCENTRIC_OFFSET, 24);
    }

    #[test]
    fn test_buffer_sizes() {
        let mesh = generate_gear(&GearSpec::new(0.5, 2.0, 2.0, 10, 0.7));
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertices.len() * 32);
        assert_eq!(mesh.index_bytes().len(), mesh.indices.len() * 12);

        let first = mesh.gpu_vertices()[0];
        assert_eq!(first.position, [0.5, 0.0, 1.0]);
        assert_eq!(first.normal, [0.0, 0.0, 1.0]);
        assert_eq!(first.barycentric, [1.0, 0.0]);
    }
}

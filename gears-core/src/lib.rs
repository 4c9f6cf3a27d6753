/// Gears Core Library - Gear mesh generation and shared geometry
///
/// This library provides the stateless core of the gears demo: the
/// parametric gear mesh generator, GPU buffer layout, mesh checks, STL
/// export, and the camera and transforms used to view the classic scene.

pub mod camera;
pub mod gear;
pub mod geometry;
pub mod layout;
pub mod scene;
pub mod stl;
pub mod topology;
pub mod transform;

// Re-export commonly used types
pub use camera::{project_to_screen, Camera, ProjectionMode};
pub use gear::{generate_gear, try_generate_gear, GearMesh, GearSpec, GearSpecError};
pub use geometry::{Mesh, Triangle, Vertex};
pub use layout::GpuVertex;
pub use scene::{Scene, SceneObject};
pub use topology::EdgeReport;
pub use transform::{RotationState, Transform};

//! The three-gear demo scene.

use nalgebra::{Matrix4, Point3, Vector3};

use crate::gear::{generate_gear, GearMesh, GearSpec};
use crate::transform::Transform;

/// A gear placed in the scene. Owns its mesh.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub mesh: GearMesh,
    /// Linear RGB, each channel in `0.0..=1.0`
    pub colour: Vector3<f32>,
    pub position: Point3<f32>,
    /// Multiplier on the scene angle, so meshing gears can turn at their
    /// own ratio and direction.
    pub angle_multiply: f32,
    /// Phase offset in degrees, so teeth interlock.
    pub angle_add: f32,
}

impl SceneObject {
    pub fn new(spec: GearSpec, colour: Vector3<f32>, position: Point3<f32>) -> Self {
        Self::with_angle(spec, colour, position, 1.0, 0.0)
    }

    pub fn with_angle(
        spec: GearSpec,
        colour: Vector3<f32>,
        position: Point3<f32>,
        angle_multiply: f32,
        angle_add: f32,
    ) -> Self {
        Self {
            mesh: generate_gear(&spec),
            colour,
            position,
            angle_multiply,
            angle_add,
        }
    }

    /// Rotation of this gear in degrees when the scene is at `angle`
    pub fn angle_at(&self, angle: f32) -> f32 {
        self.angle_multiply * angle + self.angle_add
    }

    pub fn model_matrix(&self, angle: f32) -> Matrix4<f32> {
        Transform::model_matrix(&self.position, self.angle_at(angle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Degrees turned per second of animation
    pub const DEGREES_PER_SECOND: f32 = 100.0;

    /// The classic red, green and blue gears.
    pub fn classic() -> Self {
        let objects = vec![
            SceneObject::new(
                GearSpec::new(1.0, 4.0, 1.0, 20, 0.7),
                Vector3::new(0.8, 0.1, 0.0),
                Point3::new(-3.0, -2.0, 0.0),
            ),
            SceneObject::with_angle(
                GearSpec::new(0.5, 2.0, 2.0, 10, 0.7),
                Vector3::new(0.0, 0.8, 0.2),
                Point3::new(3.1, -2.0, 0.0),
                -2.0,
                -9.0,
            ),
            SceneObject::with_angle(
                GearSpec::new(1.3, 2.0, 0.5, 10, 0.7),
                Vector3::new(0.2, 0.2, 1.0),
                Point3::new(-3.1, 4.2, 0.0),
                -2.0,
                -25.0,
            ),
        ];
        log::info!("built classic scene with {} gears", objects.len());
        Self { objects }
    }

    /// A scene holding a single gear at the origin.
    pub fn single(spec: GearSpec) -> Self {
        Self {
            objects: vec![SceneObject::new(spec, Vector3::new(0.8, 0.1, 0.0), Point3::origin())],
        }
    }

    /// Scene angle in degrees after `seconds` of animation
    pub fn angle_at(seconds: f32) -> f32 {
        Self::DEGREES_PER_SECOND * seconds
    }

    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.triangle_count()).sum()
    }
}

/// 3D transformation matrices and view rotation state
use nalgebra::{Matrix4, Point3, Vector3};

/// View orbit around three axes, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in degrees)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

impl Default for RotationState {
    /// The classic gears viewing angle
    fn default() -> Self {
        Self::new(20.0, 30.0, 0.0)
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::from_axis_angle(&Vector3::x_axis(), rotation.x.to_radians());
        let ry = Matrix4::from_axis_angle(&Vector3::y_axis(), rotation.y.to_radians());
        let rz = Matrix4::from_axis_angle(&Vector3::z_axis(), rotation.z.to_radians());

        // Apply rotations in order: Z, Y, X
        rx * ry * rz
    }

    /// Turn a y-up scene viewed along -z into the z-up world the camera
    /// lives in, viewed along +y
    pub fn stand_up() -> Matrix4<f32> {
        Matrix4::from_axis_angle(&Vector3::x_axis(), std::f32::consts::FRAC_PI_2)
    }

    /// Place an object at `position`, spun by `angle` degrees about its z axis
    pub fn model_matrix(position: &Point3<f32>, angle: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&position.coords)
            * Matrix4::from_axis_angle(&Vector3::z_axis(), angle.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(5.0, -5.0, 0.5);
        assert!((state.x - 5.0).abs() < 1e-6);
        assert!((state.y + 5.0).abs() < 1e-6);
        assert!((state.z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let rotation = RotationState::zero();
        let matrix = Transform::rotation_matrix(&rotation);
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_stand_up_faces_camera() {
        let m = Transform::stand_up();
        let front = m.transform_vector(&Vector3::z());
        let up = m.transform_vector(&Vector3::y());
        assert!((front + Vector3::y()).norm() < 1e-6);
        assert!((up - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_model_matrix_rotates_then_translates() {
        let model = Transform::model_matrix(&Point3::new(3.1, -2.0, 0.0), 90.0);
        let p = model.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(3.1, -1.0, 0.0)).norm() < 1e-5);
    }
}

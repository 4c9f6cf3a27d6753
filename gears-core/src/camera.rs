/// First-person camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// A first-person camera in a z-up world
///
/// `theta` is the heading in degrees clockwise from +y, `phi` the elevation
/// in degrees above the xy plane.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub theta: f32,
    pub phi: f32,
    /// Horizontal field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Visible height in orthographic mode
    pub ortho_height: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, -20.0, 0.0),
            theta: 0.0,
            phi: 0.0,
            fov: 100.0,
            aspect: width as f32 / height.max(1) as f32,
            near: 0.03125,
            far: 10000.0,
            ortho_height: 20.0,
            mode: ProjectionMode::Perspective,
        }
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Unit vector the camera looks along
    pub fn direction(&self) -> Vector3<f32> {
        let (theta, phi) = (self.theta.to_radians(), self.phi.to_radians());
        Vector3::new(theta.sin() * phi.cos(), theta.cos() * phi.cos(), phi.sin())
    }

    /// Move relative to the heading: `x` strafes right, `y` walks forward,
    /// `z` climbs. Elevation does not tilt the movement plane.
    pub fn move_by(&mut self, by: Vector3<f32>) {
        let theta = self.theta.to_radians();
        let (sin, cos) = theta.sin_cos();
        self.position += Vector3::new(
            by.x * cos + by.y * sin,
            -by.x * sin + by.y * cos,
            by.z,
        );
    }

    /// Turn by the given heading and elevation deltas, in degrees
    pub fn look(&mut self, dtheta: f32, dphi: f32) {
        self.theta = (self.theta + dtheta).rem_euclid(360.0);
        self.phi = (self.phi + dphi).clamp(-89.0, 89.0);
    }

    /// Switch between perspective and orthographic projection
    pub fn toggle_projection(&mut self) {
        self.mode = match self.mode {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        };
        log::debug!("projection mode now {:?}", self.mode);
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position + self.direction();
        Matrix4::look_at_rh(&self.position, &target, &Vector3::z())
    }

    /// Vertical field of view in degrees
    pub fn fovy(&self) -> f32 {
        self.fov / self.aspect
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => Matrix4::new_perspective(
                self.aspect,
                self.fovy().to_radians(),
                self.near,
                self.far,
            ),
            ProjectionMode::Orthographic => {
                let height = self.ortho_height;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Project a model-space point to screen space through `mvp`
///
/// Returns `(x, y, depth)` with `y` growing downwards and depth in NDC, or
/// `None` for points behind the camera or outside the view volume.
pub fn project_to_screen(
    mvp: &Matrix4<f32>,
    point: &Point3<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip: Vector4<f32> = mvp * point.to_homogeneous();

    // Prevent division by near-zero depth values
    if clip.w < 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    // Clip test
    if !(-1.0..=1.0).contains(&ndc_x) || !(-1.0..=1.0).contains(&ndc_y) || !(-1.0..=1.0).contains(&depth) {
        return None;
    }

    // Convert to screen space
    let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

    Some((screen_x, screen_y, depth))
}

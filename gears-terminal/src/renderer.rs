/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix3, Matrix4, Vector2, Vector3};
use std::io::Write;
use gears_core::{project_to_screen, SceneObject, Triangle};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Interpolated barycentric tags below this count as lying on an edge
const EDGE_THRESHOLD: f32 = 0.12;

/// Ambient light so faces turned away from the light stay visible
const AMBIENT: f32 = 0.15;

/// Toggles that affect how triangles are shaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub lit: bool,
    pub wireframe: bool,
    /// World-space direction towards the light
    pub light_dir: Vector3<f32>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            lit: true,
            wireframe: false,
            light_dir: Vector3::new(0.5, -1.0, 1.0).normalize(),
        }
    }
}

/// A projected vertex: screen position, depth and shading inputs
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    normal: Vector3<f32>,
    barycentric: Vector2<f32>,
}

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    colour_buffer: Vec<Color>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            colour_buffer: vec![Color::Reset; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.colour_buffer.fill(Color::Reset);
    }

    /// Character at a cell, or `None` outside the buffer
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        if x >= self.width {
            return None;
        }
        self.char_buffer.get(y * self.width + x).copied()
    }

    /// Render one gear. `world` places the whole scene, `view_projection`
    /// comes from the camera and `angle` is the scene animation angle.
    pub fn render_object(
        &mut self,
        object: &SceneObject,
        world: &Matrix4<f32>,
        view_projection: &Matrix4<f32>,
        angle: f32,
        settings: &RenderSettings,
    ) {
        let model = world * object.model_matrix(angle);
        let mvp = view_projection * model;
        // Rigid transforms only, so the rotation block maps normals too
        let normal_matrix: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
        let colour = object.colour;

        for triangle in object.mesh.triangles() {
            self.render_triangle(&triangle, &mvp, &normal_matrix, &colour, settings);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        mvp: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        colour: &Vector3<f32>,
        settings: &RenderSettings,
    ) {
        // Project vertices to screen space
        let mut screen = [None; 3];
        for (out, vertex) in screen.iter_mut().zip(&triangle.vertices) {
            let (x, y, depth) = match project_to_screen(
                mvp,
                &vertex.position,
                self.width as u32,
                self.height as u32,
            ) {
                Some(p) => p,
                None => return, // Triangle is clipped
            };
            *out = Some(ScreenVertex {
                x,
                y,
                depth,
                normal: normal_matrix * vertex.normal,
                barycentric: vertex.barycentric,
            });
        }
        let [Some(v0), Some(v1), Some(v2)] = screen else {
            return;
        };

        // Counter-clockwise in NDC is clockwise once y points down
        let signed_area = (v1.x - v0.x) * (v2.y - v0.y) - (v2.x - v0.x) * (v1.y - v0.y);
        if signed_area >= 0.0 {
            return;
        }

        self.rasterize_triangle([v0, v1, v2], colour, settings);
    }

    fn rasterize_triangle(
        &mut self,
        verts: [ScreenVertex; 3],
        colour: &Vector3<f32>,
        settings: &RenderSettings,
    ) {
        let [v0, v1, v2] = verts;

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Interpolate depth
                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let idx = y as usize * self.width + x as usize;
                if depth >= self.depth_buffer[idx] {
                    continue;
                }
                self.depth_buffer[idx] = depth;

                if settings.wireframe {
                    let tag = v0.barycentric * w0 + v1.barycentric * w1 + v2.barycentric * w2;
                    let nearest_edge = tag.x.min(tag.y).min(1.0 - tag.x - tag.y);
                    if nearest_edge > EDGE_THRESHOLD {
                        // Hidden-line removal: occlude without drawing
                        self.char_buffer[idx] = ' ';
                        continue;
                    }
                }

                let brightness = if settings.lit {
                    let normal = (v0.normal * w0 + v1.normal * w1 + v2.normal * w2).normalize();
                    AMBIENT + (1.0 - AMBIENT) * normal.dot(&settings.light_dir).max(0.0)
                } else {
                    1.0
                };
                self.char_buffer[idx] = shade_char(brightness);
                self.colour_buffer[idx] = shade_colour(colour, brightness);
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                writer.queue(SetForegroundColor(self.colour_buffer[idx]))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map brightness in `0.0..=1.0` to a character
fn shade_char(brightness: f32) -> char {
    // Skip the blank so lit surfaces never vanish
    let ramp = &LUMINOSITY_RAMP[1..];
    let char_index = (brightness.clamp(0.0, 1.0) * (ramp.len() - 1) as f32).round() as usize;
    ramp[char_index.min(ramp.len() - 1)]
}

fn shade_colour(colour: &Vector3<f32>, brightness: f32) -> Color {
    let c = colour * brightness.clamp(0.0, 1.0);
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: to_u8(c.x),
        g: to_u8(c.y),
        b: to_u8(c.z),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

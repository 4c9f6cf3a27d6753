/// Terminal-based ASCII viewer for the gears scene
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use gears_core::{Camera, RotationState, Scene, Transform};
use nalgebra::{Matrix4, Vector3};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::{AsciiRenderer, RenderSettings};

/// Degrees per key press for view rotation
const ROTATE_STEP: f32 = 5.0;
/// Model units per key press for camera movement
const MOVE_STEP: f32 = 0.5;

/// Everything input can change between frames
#[derive(Debug, Clone)]
pub struct ViewState {
    pub rotation: RotationState,
    pub camera: Camera,
    pub settings: RenderSettings,
    pub animate: bool,
    /// Scene angle in degrees
    pub angle: f32,
    pub running: bool,
}

impl ViewState {
    /// `width` and `height` are in terminal cells, which are about twice as
    /// tall as they are wide.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            rotation: RotationState::default(),
            camera: Camera::new(width as u32, height as u32 * 2),
            settings: RenderSettings::default(),
            animate: true,
            angle: 0.0,
            running: true,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.camera.on_resize(width as u32, height as u32 * 2);
    }

    /// Places the classic y-up scene in front of the camera
    pub fn world_matrix(&self) -> Matrix4<f32> {
        Transform::stand_up() * Transform::rotation_matrix(&self.rotation)
    }

    /// Advance the animation by `dt`
    pub fn update(&mut self, dt: Duration) {
        if self.animate {
            self.angle = (self.angle + Scene::angle_at(dt.as_secs_f32())).rem_euclid(360.0);
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Up => self.rotation.rotate(ROTATE_STEP, 0.0, 0.0),
            KeyCode::Down => self.rotation.rotate(-ROTATE_STEP, 0.0, 0.0),
            KeyCode::Left => self.rotation.rotate(0.0, ROTATE_STEP, 0.0),
            KeyCode::Right => self.rotation.rotate(0.0, -ROTATE_STEP, 0.0),
            KeyCode::Char('z') => self.rotation.rotate(0.0, 0.0, ROTATE_STEP),
            KeyCode::Char('Z') => self.rotation.rotate(0.0, 0.0, -ROTATE_STEP),
            KeyCode::Char('w') => self.camera.move_by(Vector3::new(0.0, MOVE_STEP, 0.0)),
            KeyCode::Char('s') => self.camera.move_by(Vector3::new(0.0, -MOVE_STEP, 0.0)),
            KeyCode::Char('a') => self.camera.move_by(Vector3::new(-MOVE_STEP, 0.0, 0.0)),
            KeyCode::Char('d') => self.camera.move_by(Vector3::new(MOVE_STEP, 0.0, 0.0)),
            KeyCode::Char('t') => self.animate = !self.animate,
            KeyCode::Char('v') => self.settings.wireframe = !self.settings.wireframe,
            KeyCode::Char('l') => self.settings.lit = !self.settings.lit,
            KeyCode::Char('o') => self.camera.toggle_projection(),
            _ => {}
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    view: ViewState,
    renderer: AsciiRenderer,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(scene: Scene) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        log::info!("starting viewer at {width}x{height} cells");

        Ok(Self {
            scene,
            view: ViewState::new(width, height),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target
        let mut previous = Instant::now();

        while self.view.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update
            self.view.update(frame_start - previous);
            previous = frame_start;

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => self.view.handle_key(code),
            Event::Resize(width, height) => {
                log::debug!("resized to {width}x{height} cells");
                self.view.resize(width, height);
                self.renderer.resize(width as usize, height as usize);
            }
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let world = self.view.world_matrix();
        let view_projection = self.view.camera.view_projection_matrix();

        // Clear renderer
        self.renderer.clear();

        // Render scene
        for object in &self.scene.objects {
            self.renderer.render_object(
                object,
                &world,
                &view_projection,
                self.view.angle,
                &self.view.settings,
            );
        }

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Gears | FPS: {:.1} | {} tris | Arrows/zZ=Rotate WASD=Move T=Animate V=Wireframe L=Light O=Ortho Q=Quit",
                self.fps,
                self.scene.triangle_count(),
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gears_core::ProjectionMode;

    #[test]
    fn test_keys_update_view() {
        let mut view = ViewState::new(80, 24);
        assert_eq!(view.rotation, RotationState::new(20.0, 30.0, 0.0));

        view.handle_key(KeyCode::Up);
        view.handle_key(KeyCode::Char('Z'));
        assert_eq!(view.rotation, RotationState::new(25.0, 30.0, -5.0));

        view.handle_key(KeyCode::Char('v'));
        view.handle_key(KeyCode::Char('l'));
        assert!(view.settings.wireframe);
        assert!(!view.settings.lit);

        view.handle_key(KeyCode::Esc);
        assert!(!view.running);
    }

    #[test]
    fn test_animation_toggle() {
        let mut view = ViewState::new(80, 24);
        view.update(Duration::from_millis(500));
        assert!((view.angle - 50.0).abs() < 1e-4);

        view.handle_key(KeyCode::Char('t'));
        view.update(Duration::from_secs(1));
        assert!((view.angle - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_projection_toggle() {
        let mut view = ViewState::new(80, 24);
        assert_eq!(view.camera.mode, ProjectionMode::Perspective);
        view.handle_key(KeyCode::Char('o'));
        assert_eq!(view.camera.mode, ProjectionMode::Orthographic);
        view.handle_key(KeyCode::Char('o'));
        assert_eq!(view.camera.mode, ProjectionMode::Perspective);
    }

    #[test]
    fn test_walk_towards_scene() {
        let mut view = ViewState::new(80, 24);
        let start = view.camera.position;
        view.handle_key(KeyCode::Char('w'));
        assert!((view.camera.position - start - Vector3::new(0.0, MOVE_STEP, 0.0)).norm() < 1e-6);
    }
}

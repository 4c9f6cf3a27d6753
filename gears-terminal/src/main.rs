/// Gears Terminal Demo - Rotating Gears
///
/// Shows the classic three-gear scene in the terminal, or exports a gear
/// as STL.
/// Controls:
///   - Arrow Keys / z / Z: Rotate the view
///   - WASD: Move the camera
///   - T: Toggle animation, V: Wireframe, L: Lighting, O: Orthographic
///   - Q/ESC: Quit

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gears_core::{stl, try_generate_gear, GearSpec, Scene};
use gears_terminal::TerminalApp;

#[derive(Parser, Debug)]
#[command(name = "gears-terminal")]
#[command(about = "Render spinning gears in the terminal, or export one as STL")]
struct Cli {
    /// Write the gear as STL to this path instead of starting the viewer
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write ASCII STL rather than binary
    #[arg(long, requires = "export")]
    ascii: bool,

    /// View only the gear given on the command line
    #[arg(long, conflicts_with = "export")]
    single: bool,

    /// Radius of the bore
    #[arg(long, default_value_t = 1.0)]
    inner_radius: f32,

    /// Radius at the middle of the teeth
    #[arg(long, default_value_t = 4.0)]
    outer_radius: f32,

    /// Thickness of the gear
    #[arg(long, default_value_t = 1.0)]
    width: f32,

    /// Number of teeth
    #[arg(long, default_value_t = 20)]
    teeth: u32,

    /// Radial depth of each tooth
    #[arg(long, default_value_t = 0.7)]
    tooth_depth: f32,
}

impl Cli {
    fn spec(&self) -> GearSpec {
        GearSpec::new(
            self.inner_radius,
            self.outer_radius,
            self.width,
            self.teeth,
            self.tooth_depth,
        )
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let spec = cli.spec();

    if let Some(path) = &cli.export {
        let mesh = try_generate_gear(&spec)
            .context("invalid gear parameters")?
            .to_mesh();
        let data = if cli.ascii {
            stl::write_ascii_stl(&mesh, "gear").into_bytes()
        } else {
            stl::write_binary_stl(&mesh)
        };
        fs::write(path, data)
            .with_context(|| format!("failed to write STL file {}", path.display()))?;
        log::info!("wrote {} triangles to {}", mesh.triangles.len(), path.display());
        return Ok(());
    }

    let scene = if cli.single {
        spec.validate().context("invalid gear parameters")?;
        Scene::single(spec)
    } else {
        Scene::classic()
    };

    // Run the terminal app
    let mut app = TerminalApp::new(scene).context("failed to query terminal size")?;
    app.run().context("terminal renderer failed")?;

    Ok(())
}

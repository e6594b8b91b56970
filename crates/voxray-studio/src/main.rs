mod app;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use voxray_engine::device::GpuInit;
use voxray_engine::logging::{LoggingConfig, init_logging};
use voxray_engine::window::{Runtime, RuntimeConfig};
use voxray_raycast::ViewerConfig;
use voxray_raycast::camera::ProjectionParams;
use voxray_raycast::shader::ShaderPaths;
use voxray_raycast::transfer::{Bound, Channel, Light, TransferFunction};
use winit::dpi::LogicalSize;

use crate::app::RaycastApp;

const DEFAULT_SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders");

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Interactive GPU raycasting volume viewer")]
struct Args {
    /// Directory of image slices to load at startup
    #[arg(long)]
    volume: Option<PathBuf>,

    /// Directory holding raycast.vert.wgsl and raycast.frag.wgsl
    #[arg(long, default_value = DEFAULT_SHADER_DIR)]
    shader_dir: PathBuf,

    /// Initial window width in logical pixels
    #[arg(long, short = 'W', default_value_t = 1024.0)]
    width: f64,

    /// Initial window height in logical pixels
    #[arg(long, short = 'H', default_value_t = 768.0)]
    height: f64,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    fov: f32,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    red_min: f32,
    #[arg(long, default_value_t = 0.3, allow_hyphen_values = true)]
    red_max: f32,
    #[arg(long, default_value_t = 0.3, allow_hyphen_values = true)]
    green_min: f32,
    #[arg(long, default_value_t = 0.6, allow_hyphen_values = true)]
    green_max: f32,
    #[arg(long, default_value_t = 0.6, allow_hyphen_values = true)]
    blue_min: f32,
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    blue_max: f32,

    /// Light position as 3 values: X Y Z
    #[arg(
        long,
        num_args = 3,
        value_names = ["X", "Y", "Z"],
        allow_hyphen_values = true
    )]
    light: Option<Vec<f32>>,

    /// Log filter in env_logger syntax (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    fn viewer_config(&self) -> ViewerConfig {
        let mut transfer = TransferFunction::default();
        let thresholds = [
            (Channel::Red, Bound::Min, self.red_min),
            (Channel::Red, Bound::Max, self.red_max),
            (Channel::Green, Bound::Min, self.green_min),
            (Channel::Green, Bound::Max, self.green_max),
            (Channel::Blue, Bound::Min, self.blue_min),
            (Channel::Blue, Bound::Max, self.blue_max),
        ];
        for (channel, bound, value) in thresholds {
            let _ = transfer.set_threshold(channel, bound, value);
        }

        let mut light = Light::default();
        if let Some([x, y, z]) = self.light.as_deref().and_then(|v| <[f32; 3]>::try_from(v).ok())
        {
            light.position = [x, y, z].into();
        }

        ViewerConfig {
            shaders: ShaderPaths::in_dir(&self.shader_dir),
            projection: ProjectionParams {
                fov_y_degrees: self.fov,
                ..ProjectionParams::default()
            },
            transfer,
            light,
            ..ViewerConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let config = RuntimeConfig {
        title: "voxray".to_string(),
        initial_size: LogicalSize::new(args.width, args.height),
    };
    let app = RaycastApp::new(args.viewer_config(), args.volume.clone());

    Runtime::run(config, GpuInit::default(), app)
}

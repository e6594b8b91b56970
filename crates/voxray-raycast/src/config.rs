use crate::camera::ProjectionParams;
use crate::frame::ClearColor;
use crate::shader::ShaderPaths;
use crate::transfer::{Light, TransferFunction};

/// Startup configuration of a [`Viewer`](crate::Viewer).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub shaders: ShaderPaths,
    pub projection: ProjectionParams,
    pub transfer: TransferFunction,
    pub light: Light,
    pub background: ClearColor,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            shaders: ShaderPaths::default(),
            projection: ProjectionParams::default(),
            transfer: TransferFunction::default(),
            light: Light::default(),
            background: ClearColor::WHITE,
        }
    }
}

//! GPU volume raycasting.
//!
//! A dataset is uploaded as a 3D texture and a unit cube is drawn around it;
//! the fragment shader marches rays through the texture and classifies samples
//! with a six-threshold transfer function, lit by a single point light.
//!
//! Layout:
//! - [`camera`]: orbit/zoom camera producing projection, view and model matrices
//! - [`shader`]: WGSL program load, compile, attribute binding, link and reload
//! - [`transfer`]: thresholds and light position
//! - [`volume`]: dataset loading and the uploaded texture resource
//! - [`frame`]: the per-frame protocol over an abstract [`FrameBackend`]
//! - [`gpu`]: the wgpu backend
//! - [`action`]: engine input to viewer actions
//! - [`Viewer`]: the state that ties the above together

pub mod action;
pub mod camera;
mod config;
pub mod frame;
pub mod gpu;
pub mod shader;
pub mod transfer;
mod viewer;
pub mod volume;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ViewerConfig;
pub use frame::FrameBackend;
pub use viewer::Viewer;

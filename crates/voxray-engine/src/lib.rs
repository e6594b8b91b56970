//! voxray engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the volume viewer:
//! window and event loop, wgpu device/surface, platform-agnostic input and logging.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod window;

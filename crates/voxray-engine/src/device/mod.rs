//! wgpu device and window surface.
//!
//! [`Gpu`] owns the device/queue pair the viewer uploads volumes and shaders
//! through, and hands out one [`GpuFrame`] per redraw.

mod gpu;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;

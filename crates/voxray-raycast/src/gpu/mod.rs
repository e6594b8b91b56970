//! wgpu implementation of the frame backend, program linker and texture
//! uploader.
//!
//! GL-style state (current program, blend flag, texture units) is recorded on
//! the CPU during a frame and turned into one render pass at `draw_cube`.

mod cube;
mod frame;
mod linker;
mod texture;

pub use frame::{WgpuFrame, WgpuResources};
pub use linker::{WgpuLinker, WgpuProgram};
pub use texture::{VolumeTexture, WgpuTextureUploader};

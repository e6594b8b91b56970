//! Renderer-facing handles.
//!
//! Renderers own their GPU resources (pipelines, buffers, textures) and receive
//! the device/queue plus the frame's encoder and color view through these types.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};

//! Core engine-facing contracts.
//!
//! Defines the interface between the runtime (platform loop) and the
//! application: input callbacks, resize notification and a per-frame context.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};

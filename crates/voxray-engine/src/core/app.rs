use crate::input::InputEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    /// Nothing visible changed.
    Continue,
    /// State changed; schedule one redraw. Requests made before the next frame coalesce.
    Redraw,
    /// Leave the event loop.
    Exit,
}

/// Application contract implemented by the viewer.
///
/// All callbacks run on the event-loop thread.
pub trait App {
    /// Called for every translated input event.
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called when the drawable size changes (physical pixels).
    fn on_resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Called once per requested redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}

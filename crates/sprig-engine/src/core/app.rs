use winit::event::WindowEvent;

use crate::device::WgpuBackend;
use crate::render::RenderContext;

use super::ctx::FrameCtx;

/// What the runtime should do after a callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Game or tool driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once the render context exists, before the first frame.
    ///
    /// Typical work: start atlas loads, build sprite definitions. An error
    /// stops the runtime.
    fn on_start(&mut self, render: &mut RenderContext<WgpuBackend<'_>>) -> anyhow::Result<()> {
        let _ = render;
        Ok(())
    }

    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called between `begin_frame` and `end_frame`; draw into the logical
    /// target here.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}

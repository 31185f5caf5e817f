use winit::window::Window;

use crate::coords::Viewport;
use crate::device::WgpuBackend;
use crate::render::RenderContext;

/// Per-frame handles passed to [`App::on_frame`](super::App::on_frame).
///
/// `'w` is the window borrow carried by the surface.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub render: &'a mut RenderContext<WgpuBackend<'w>>,
}

impl FrameCtx<'_, '_> {
    /// Size of the logical frame every draw is expressed in.
    #[inline]
    pub fn view(&self) -> Viewport {
        self.render.logical_size()
    }

    /// Value of the frame counter advanced by this frame's `begin_frame`.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.render.timer().value()
    }
}

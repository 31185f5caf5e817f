//! Rendering pipeline on top of a [`GpuBackend`](crate::device::GpuBackend).
//!
//! Convention:
//! - draws are expressed in logical pixels (top-left origin, +Y down)
//! - every frame is rendered into the logical target, then composited onto
//!   the display surface by `end_frame`

mod compositor;
mod context;
pub mod draw;
pub mod responsive;

pub use context::{RenderContext, ResponsivePolicy};
pub use draw::DrawStyle;
pub use responsive::{DisplayLayout, ResponsiveStrategy};

//! Frame timing.
//!
//! `FrameTimer` is the wrapping per-frame counter that drives speed-based
//! sprite animation. It is owned by the render context and advanced by
//! `begin_frame`, never by wall-clock time.

mod frame_timer;

pub use frame_timer::{wrap_index, FrameTimer, FRAME_TIMER_WRAP};

//! winit host: owns the event loop and the window, and drives frames.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};

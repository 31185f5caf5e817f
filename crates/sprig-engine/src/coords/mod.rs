//! Coordinate types in logical-target units.
//!
//! Canonical space:
//! - logical pixels of the off-screen game surface
//! - origin top-left, +X right, +Y down
//!
//! Conversion to clip space happens through projection matrices, never here.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;

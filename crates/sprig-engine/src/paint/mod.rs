//! Color model shared by draw calls and render targets.
//!
//! Colors are straight-alpha RGBA. Draws use them as a multiplicative tint;
//! render targets use them as clear colors.

pub mod color;

pub use color::Color;

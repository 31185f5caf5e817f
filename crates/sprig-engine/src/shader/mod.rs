//! Shader programs: WGSL sources, naga-based compilation and reflection, and
//! the program type the draw protocol binds against.

pub mod program;
pub mod reflect;
pub mod source;

pub use program::{ShaderProgram, DEGENERATE_POINT, UNIT_QUAD};
pub use source::{SemanticNames, ShaderSource};

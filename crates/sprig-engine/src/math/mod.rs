//! Affine transform math.
//!
//! Pure CPU code with no GPU dependency. Matrices built here are handed to
//! shader programs as position and texture matrices.

mod affine;

pub use affine::{AffineMatrix, YAxis};

//! sprig engine crate.
//!
//! A fixed-resolution 2D sprite pipeline: every frame is drawn into an
//! off-screen logical target, then composited into the window under a
//! responsive scaling policy.
//!
//! - [`math`]: 3x3 affine transforms and projections.
//! - [`shader`]: WGSL programs with reflected attribute and uniform slots.
//! - [`render`]: the frame protocol, draw calls and the responsive layout.
//! - [`device`]: the [`device::GpuBackend`] seam, its wgpu implementation and
//!   a recording implementation for tests.
//! - [`window`]: the winit host that drives an [`core::App`].

pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod math;
pub mod paint;
pub mod render;
pub mod shader;
pub mod sprite;
pub mod texture;
pub mod time;
pub mod window;

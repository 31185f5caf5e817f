//! GPU access.
//!
//! - `GpuBackend`: the command surface the rendering pipeline is written against
//! - `WgpuBackend`: the real implementation on top of `Gpu` (wgpu device + surface)
//! - `recording::RecordingBackend`: headless implementation that records commands

mod backend;
mod error;
mod gpu;
mod handles;
mod init;
pub mod recording;
mod surface;
mod wgpu_backend;

pub use backend::GpuBackend;
pub use error::SurfaceErrorAction;
pub use gpu::{Gpu, SurfaceFrame};
pub use handles::{
    AttributeSlot, BufferId, ProgramDesc, ProgramId, ProgramLayout, TargetId, TextureBinding,
    TextureId, Topology, UniformDesc, UniformKind, UniformSlot,
};
pub use init::GpuInit;
pub use wgpu_backend::WgpuBackend;

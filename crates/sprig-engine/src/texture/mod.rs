//! Textures: CPU pixel data, sampling parameters and asynchronous loading.

mod data;
pub mod loader;
mod params;

pub use data::TextureData;
pub use loader::{LoadState, LoadedTexture, PendingTexture, TextureLoader};
pub use params::{FilterMode, TextureParams, WrapMode};

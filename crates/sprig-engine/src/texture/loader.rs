//! Off-thread image decoding with render-thread upload.
//!
//! Decoding happens on a worker thread; the decoded pixels travel back over a
//! channel. Uploading to the GPU always happens on the thread that polls.

use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, warn};

use crate::device::{GpuBackend, TextureId};
use crate::error::LoadError;
use crate::render::RenderContext;

use super::data::TextureData;
use super::params::TextureParams;

/// Texture handle and size after a successful upload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LoadedTexture {
    pub handle: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Result of polling a [`PendingTexture`].
#[derive(Debug)]
pub enum LoadState {
    Pending,
    Ready(LoadedTexture),
    Failed(LoadError),
}

/// Entry point for asynchronous texture loads.
pub struct TextureLoader;

impl TextureLoader {
    /// Starts decoding the image at `path` on a worker thread.
    pub fn load(path: impl Into<PathBuf>, params: TextureParams) -> PendingTexture {
        let path = path.into();
        let label = path.display().to_string();
        spawn_decode(label, params, move || {
            let image = image::open(&path).map_err(map_image_error)?;
            into_texture_data(image)
        })
    }

    /// Starts decoding an in-memory encoded image on a worker thread.
    pub fn load_bytes(label: &str, bytes: Vec<u8>, params: TextureParams) -> PendingTexture {
        spawn_decode(label.to_string(), params, move || {
            let image = image::load_from_memory(&bytes).map_err(map_image_error)?;
            into_texture_data(image)
        })
    }

    /// Decodes synchronously on the calling thread.
    pub fn decode_file(path: &Path) -> Result<TextureData, LoadError> {
        let image = image::open(path).map_err(map_image_error)?;
        into_texture_data(image)
    }
}

/// In-flight texture load. Poll it on the render thread once per frame.
pub struct PendingTexture {
    label: String,
    params: TextureParams,
    rx: Receiver<Result<TextureData, LoadError>>,
    delivered: bool,
}

impl PendingTexture {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Checks for a decoded image and uploads it through `ctx`.
    ///
    /// Returns `Pending` until the worker finishes. A load yields `Ready` or
    /// `Failed` exactly once; polling again afterwards reports
    /// `Failed(LoadError::Disconnected)`.
    pub fn poll<B: GpuBackend>(&mut self, ctx: &mut RenderContext<B>) -> LoadState {
        if self.delivered {
            return LoadState::Failed(LoadError::Disconnected);
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.delivered = true;
                self.finish(ctx, result)
            }
            Err(TryRecvError::Empty) => LoadState::Pending,
            Err(TryRecvError::Disconnected) => LoadState::Failed(LoadError::Disconnected),
        }
    }

    /// Blocks until the worker finishes, then uploads.
    pub fn wait<B: GpuBackend>(self, ctx: &mut RenderContext<B>) -> Result<LoadedTexture, LoadError> {
        let result = self.rx.recv().map_err(|_| LoadError::Disconnected)?;
        match self.finish(ctx, result) {
            LoadState::Ready(loaded) => Ok(loaded),
            LoadState::Failed(err) => Err(err),
            LoadState::Pending => Err(LoadError::Disconnected),
        }
    }

    fn finish<B: GpuBackend>(
        &self,
        ctx: &mut RenderContext<B>,
        result: Result<TextureData, LoadError>,
    ) -> LoadState {
        let data = match result {
            Ok(data) => data,
            Err(err) => {
                warn!("texture '{}' failed to load: {err}", self.label);
                return LoadState::Failed(err);
            }
        };

        match ctx.create_texture(&data, self.params) {
            Ok(handle) => {
                debug!(
                    "texture '{}' ready ({}x{})",
                    self.label,
                    data.width(),
                    data.height()
                );
                LoadState::Ready(LoadedTexture {
                    handle,
                    width: data.width(),
                    height: data.height(),
                })
            }
            Err(err) => {
                warn!("texture '{}' upload failed: {err}", self.label);
                LoadState::Failed(err.into())
            }
        }
    }
}

fn spawn_decode<F>(label: String, params: TextureParams, decode: F) -> PendingTexture
where
    F: FnOnce() -> Result<TextureData, LoadError> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);

    let spawned = thread::Builder::new()
        .name("sprig-texture-loader".to_string())
        .spawn({
            let tx = tx.clone();
            move || {
                let _ = tx.send(decode());
            }
        });

    if let Err(err) = spawned {
        let _ = tx.send(Err(LoadError::Io(err)));
    }

    PendingTexture {
        label,
        params,
        rx,
        delivered: false,
    }
}

fn map_image_error(err: image::ImageError) -> LoadError {
    match err {
        image::ImageError::IoError(e) => LoadError::Io(e),
        other => LoadError::Decode(other.to_string()),
    }
}

fn into_texture_data(image: image::DynamicImage) -> Result<TextureData, LoadError> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    TextureData::from_rgba8(width, height, rgba.into_raw())
        .map_err(|e| LoadError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::device::recording::RecordingBackend;

    fn context() -> RenderContext<RecordingBackend> {
        RenderContext::new(RecordingBackend::new(), StageConfig::default()).unwrap()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_and_uploads_png() {
        let mut ctx = context();
        let pending = TextureLoader::load_bytes("red", png_bytes(3, 2), TextureParams::smooth());

        let loaded = pending.wait(&mut ctx).unwrap();
        assert_eq!((loaded.width, loaded.height), (3, 2));
        let uploaded = ctx.backend().textures[loaded.handle.0];
        assert_eq!(uploaded, (3, 2, TextureParams::smooth()));
    }

    #[test]
    fn poll_reports_ready_once() {
        let mut ctx = context();
        let mut pending =
            TextureLoader::load_bytes("red", png_bytes(1, 1), TextureParams::pixelated());

        let loaded = loop {
            match pending.poll(&mut ctx) {
                LoadState::Pending => thread::yield_now(),
                LoadState::Ready(t) => break t,
                LoadState::Failed(e) => panic!("load failed: {e}"),
            }
        };
        assert_eq!(loaded.width, 1);
        assert!(matches!(
            pending.poll(&mut ctx),
            LoadState::Failed(LoadError::Disconnected)
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let mut ctx = context();
        let pending = TextureLoader::load_bytes("junk", vec![1, 2, 3, 4], TextureParams::default());
        assert!(matches!(pending.wait(&mut ctx), Err(LoadError::Decode(_))));
    }

    #[test]
    fn decode_file_reads_png_from_disk() {
        let path = std::env::temp_dir().join(format!("sprig-decode-{}.png", std::process::id()));
        std::fs::write(&path, png_bytes(4, 2)).unwrap();

        let data = TextureLoader::decode_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!((data.width(), data.height()), (4, 2));
        assert_eq!(&data.pixels()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut ctx = context();
        let pending = TextureLoader::load(
            std::env::temp_dir().join("sprig-missing-atlas.png"),
            TextureParams::default(),
        );
        assert!(matches!(pending.wait(&mut ctx), Err(LoadError::Io(_))));
    }

    #[test]
    fn upload_failure_is_reported() {
        let mut ctx = context();
        ctx.backend_mut().fail_allocations = true;
        let pending = TextureLoader::load_bytes("red", png_bytes(1, 1), TextureParams::default());
        assert!(matches!(pending.wait(&mut ctx), Err(LoadError::Upload(_))));
    }
}

use log::info;

use crate::config::StageConfig;
use crate::coords::Viewport;
use crate::device::{GpuBackend, ProgramId, TargetId, TextureId};
use crate::error::{InitError, ShaderError};
use crate::math::{AffineMatrix, YAxis};
use crate::paint::Color;
use crate::shader::ShaderProgram;
use crate::texture::TextureParams;
use crate::time::FrameTimer;

use super::responsive::ResponsiveStrategy;

/// Off-screen surface drawn into at a fixed resolution.
#[derive(Debug, Copy, Clone)]
pub(super) struct LogicalSurface {
    pub target: TargetId,
    pub size: Viewport,
    pub projection: AffineMatrix,
}

/// On-screen area the logical frame is composited into.
#[derive(Debug, Copy, Clone)]
pub(super) struct DisplaySurface {
    pub size: Viewport,
    pub projection: AffineMatrix,
}

/// Inputs of the responsive layout policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResponsivePolicy {
    pub strategy: ResponsiveStrategy,
    pub aspect_lock: bool,
    pub pixel_perfect: bool,
}

/// Mutable rendering state shared by the compositor and draw calls.
///
/// Owns the backend, both shader programs, the surface pair and the frame
/// timer. Single-threaded: draw functions take it by `&mut`.
pub struct RenderContext<B: GpuBackend> {
    pub(super) backend: B,
    pub(super) image: ShaderProgram,
    pub(super) primitive: ShaderProgram,
    pub(super) active: Option<ProgramId>,

    pub(super) logical: LogicalSurface,
    pub(super) display: DisplaySurface,
    pub(super) y_axis: YAxis,

    pub(super) background: Color,
    pub(super) letterbox: Color,
    pub(super) composite_blend: Color,

    pub(super) atlas: Option<TextureId>,
    pub(super) atlas_params: TextureParams,
    pub(super) timer: FrameTimer,
    pub(super) in_frame: bool,
    pub(super) policy: ResponsivePolicy,
}

impl<B: GpuBackend> RenderContext<B> {
    /// Builds both programs, the logical target and the initial projections.
    ///
    /// Any shader or allocation failure is fatal and returned unchanged.
    pub fn new(mut backend: B, config: StageConfig) -> Result<Self, InitError> {
        let image = ShaderProgram::new(&mut backend, &config.image_shader)?;
        if !image.is_textured() {
            return Err(ShaderError::Link {
                label: image.label().to_string(),
                log: "image program needs a texture coordinate attribute".to_string(),
            }
            .into());
        }
        let primitive = ShaderProgram::new(&mut backend, &config.primitive_shader)?;

        let (w, h) = config.view.to_pixels();
        let target = backend.create_render_target(w, h)?;

        let mut ctx = Self {
            backend,
            image,
            primitive,
            active: None,
            logical: LogicalSurface {
                target,
                size: config.view,
                projection: AffineMatrix::projection_with(
                    config.view.width,
                    config.view.height,
                    config.y_axis,
                ),
            },
            display: DisplaySurface {
                size: config.view,
                projection: AffineMatrix::projection(config.view.width, config.view.height),
            },
            y_axis: config.y_axis,
            background: config.background,
            letterbox: config.letterbox,
            composite_blend: config.composite_blend,
            atlas: None,
            atlas_params: config.atlas_params,
            timer: FrameTimer::new(),
            in_frame: false,
            policy: ResponsivePolicy {
                strategy: config.strategy,
                aspect_lock: config.aspect_lock,
                pixel_perfect: config.pixel_perfect,
            },
        };

        ctx.set_projection(config.view.width, config.view.height, config.display)?;
        info!(
            "render context ready: logical {}x{}, display {}x{}",
            ctx.logical.size.width,
            ctx.logical.size.height,
            ctx.display.size.width,
            ctx.display.size.height
        );
        Ok(ctx)
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Logical projection: logical pixels to clip space.
    #[inline]
    pub fn projection(&self) -> AffineMatrix {
        self.logical.projection
    }

    /// Display projection: display pixels to clip space.
    #[inline]
    pub fn display_projection(&self) -> AffineMatrix {
        self.display.projection
    }

    #[inline]
    pub fn logical_size(&self) -> Viewport {
        self.logical.size
    }

    #[inline]
    pub fn display_size(&self) -> Viewport {
        self.display.size
    }

    #[inline]
    pub fn logical_target(&self) -> TargetId {
        self.logical.target
    }

    #[inline]
    pub fn timer(&self) -> FrameTimer {
        self.timer
    }

    #[inline]
    pub fn atlas(&self) -> Option<TextureId> {
        self.atlas
    }

    /// Sampling parameters for atlas uploads, from
    /// [`StageConfig::atlas_params`].
    #[inline]
    pub fn atlas_params(&self) -> TextureParams {
        self.atlas_params
    }

    #[inline]
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    #[inline]
    pub fn responsive_policy(&self) -> ResponsivePolicy {
        self.policy
    }

    pub fn set_responsive_policy(&mut self, policy: ResponsivePolicy) {
        self.policy = policy;
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn set_letterbox(&mut self, color: Color) {
        self.letterbox = color;
    }

    /// Default blend of [`end_frame`](Self::end_frame).
    pub fn set_composite_blend(&mut self, color: Color) {
        self.composite_blend = color;
    }

    #[inline]
    pub fn image_program(&self) -> &ShaderProgram {
        &self.image
    }

    #[inline]
    pub fn primitive_program(&self) -> &ShaderProgram {
        &self.primitive
    }

    /// Activates the textured program with `positions` (unit quad by default).
    pub(crate) fn activate_image(&mut self, positions: Option<&[f32]>) {
        self.image
            .activate(&mut self.backend, &mut self.active, positions);
    }

    /// Activates the flat-color program with `positions` (single point by default).
    pub(crate) fn activate_primitive(&mut self, positions: Option<&[f32]>) {
        self.primitive
            .activate(&mut self.backend, &mut self.active, positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::recording::RecordingBackend;
    use crate::error::ResourceError;
    use crate::shader::ShaderSource;

    #[test]
    fn builds_programs_and_logical_target() {
        let ctx = RenderContext::new(RecordingBackend::new(), StageConfig::default()).unwrap();

        let backend = ctx.backend();
        assert_eq!(backend.programs.len(), 2);
        assert_eq!(backend.targets.len(), 1);
        assert_eq!((backend.targets[0].0, backend.targets[0].1), (400, 240));
        assert_eq!(ctx.display_size(), ctx.logical_size());
    }

    #[test]
    fn allocation_failure_is_fatal() {
        let mut backend = RecordingBackend::new();
        backend.fail_allocations = true;
        let err = RenderContext::new(backend, StageConfig::default()).err();
        assert!(matches!(
            err,
            Some(InitError::Resource(ResourceError::Allocation { .. }))
        ));
    }

    #[test]
    fn image_slot_requires_a_textured_program() {
        let config = StageConfig {
            image_shader: ShaderSource::primitive(),
            ..StageConfig::default()
        };
        let err = RenderContext::new(RecordingBackend::new(), config).err();
        assert!(matches!(err, Some(InitError::Shader(ShaderError::Link { .. }))));
    }

    #[test]
    fn initial_display_size_is_honoured() {
        let config = StageConfig {
            display: Some(Viewport::new(800.0, 480.0)),
            ..StageConfig::default()
        };
        let ctx = RenderContext::new(RecordingBackend::new(), config).unwrap();
        assert_eq!(ctx.display_size(), Viewport::new(800.0, 480.0));
        assert_eq!(ctx.logical_size(), Viewport::new(400.0, 240.0));
    }
}

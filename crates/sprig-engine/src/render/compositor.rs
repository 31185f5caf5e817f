//! Frame protocol: render at logical resolution, then composite to the display.

use log::{debug, info, warn};

use crate::coords::Viewport;
use crate::device::{GpuBackend, TextureId, Topology};
use crate::error::ResourceError;
use crate::math::AffineMatrix;
use crate::paint::Color;
use crate::shader::UNIT_QUAD;
use crate::texture::{TextureData, TextureParams};

use super::context::{DisplaySurface, LogicalSurface, RenderContext};

impl<B: GpuBackend> RenderContext<B> {
    /// Starts a frame on the logical target.
    ///
    /// Binds and clears the logical target, activates the image program with an
    /// opaque white blend, binds the atlas (if any) and advances the timer.
    pub fn begin_frame(&mut self) {
        if self.in_frame {
            warn!("begin_frame called twice without end_frame");
        }
        self.in_frame = true;

        let (w, h) = self.logical.size.to_pixels();
        self.backend.bind_target(Some(self.logical.target));
        self.backend.set_viewport(w, h);
        self.backend.clear(self.background);

        self.activate_image(None);
        self.image.set_blend(&mut self.backend, Color::WHITE);
        self.backend.bind_texture(self.atlas);

        self.timer.advance();
    }

    /// Composites the logical frame with the configured blend and no transform.
    pub fn end_frame(&mut self) {
        let blend = self.composite_blend;
        self.end_frame_with(None, blend);
    }

    /// Composites the logical frame onto the display.
    ///
    /// The quad fills the display viewport; `transform` may move, scale or
    /// rotate it. The display stays bound afterwards.
    pub fn end_frame_with(
        &mut self,
        transform: Option<&dyn Fn(AffineMatrix) -> AffineMatrix>,
        blend: Color,
    ) {
        if !self.in_frame {
            debug!("end_frame called without begin_frame");
        }

        let (w, h) = self.display.size.to_pixels();
        self.backend.bind_target(None);
        self.backend.set_viewport(w, h);
        self.backend.clear(self.letterbox);

        let surface = self.backend.target_texture(self.logical.target);
        self.backend.bind_texture(surface);

        // Unit quad to the full clip rectangle.
        let fill = AffineMatrix::projection(1.0, 1.0);
        let position = transform.map_or(fill, |t| t(fill));

        self.activate_image(Some(&UNIT_QUAD));
        self.image.set_position_matrix(&mut self.backend, &position);
        self.image
            .set_texture_matrix(&mut self.backend, &AffineMatrix::IDENTITY);
        self.image.set_blend(&mut self.backend, blend);
        self.backend.draw(Topology::Triangles, 0, 6);

        self.in_frame = false;
    }

    /// Sets the logical resolution and the display size.
    ///
    /// The display defaults to the logical size. The logical target is
    /// reallocated when its pixel size changes; its contents are undefined
    /// afterwards. Must not be called between `begin_frame` and `end_frame`.
    pub fn set_projection(
        &mut self,
        view_width: f32,
        view_height: f32,
        display: Option<Viewport>,
    ) -> Result<(), ResourceError> {
        debug_assert!(!self.in_frame, "set_projection called inside a frame");
        if self.in_frame {
            warn!("set_projection called inside a frame; the current frame is undefined");
        }

        let view = Viewport::new(view_width, view_height);
        let display = display.unwrap_or(view);
        for (what, size) in [("logical target", view), ("display surface", display)] {
            if !size.is_valid() {
                return Err(ResourceError::InvalidSize {
                    what,
                    width: size.width.max(0.0) as u32,
                    height: size.height.max(0.0) as u32,
                });
            }
        }

        let (w, h) = view.to_pixels();
        if self.logical.size.to_pixels() != (w, h) {
            self.backend
                .resize_render_target(self.logical.target, w, h)?;
            debug!("logical target reallocated at {w}x{h}");
        }
        self.logical = LogicalSurface {
            target: self.logical.target,
            size: view,
            projection: AffineMatrix::projection_with(view.width, view.height, self.y_axis),
        };

        let (dw, dh) = display.to_pixels();
        self.backend.resize_display(dw, dh);
        self.display = DisplaySurface {
            size: display,
            projection: AffineMatrix::projection(display.width, display.height),
        };

        info!(
            "projection set: logical {}x{}, display {}x{}",
            view.width, view.height, display.width, display.height
        );
        Ok(())
    }

    /// Uploads a texture through the backend.
    pub fn create_texture(
        &mut self,
        data: &TextureData,
        params: TextureParams,
    ) -> Result<TextureId, ResourceError> {
        let id = self.backend.create_texture(data, params)?;
        if params.min_filter.uses_mipmaps() || params.mag_filter.uses_mipmaps() {
            debug!("texture #{} has one level; mipmap filters sample like their base", id.0);
        }
        debug!(
            "texture #{} uploaded ({}x{})",
            id.0,
            data.width(),
            data.height()
        );
        Ok(id)
    }

    /// Uploads `data` with the configured atlas parameters and installs it.
    pub fn create_atlas(&mut self, data: &TextureData) -> Result<TextureId, ResourceError> {
        let id = self.create_texture(data, self.atlas_params)?;
        self.install_atlas(id);
        Ok(id)
    }

    /// Makes `texture` the atlas bound at every `begin_frame`. Takes effect
    /// immediately when called inside a frame.
    pub fn install_atlas(&mut self, texture: TextureId) {
        self.atlas = Some(texture);
        if self.in_frame {
            self.backend.bind_texture(self.atlas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::coords::Vec2;
    use crate::device::recording::{Command, RecordingBackend};
    use crate::render::draw::{self, DrawStyle};
    use crate::sprite::SpriteDefinition;
    use crate::texture::WrapMode;

    fn context() -> RenderContext<RecordingBackend> {
        let mut ctx =
            RenderContext::new(RecordingBackend::new(), StageConfig::default()).unwrap();
        ctx.backend_mut().take_commands();
        ctx
    }

    #[test]
    fn begin_frame_prepares_logical_target() {
        let mut ctx = context();
        let target = ctx.logical_target();
        ctx.begin_frame();

        let commands = ctx.backend().commands.clone();
        assert_eq!(commands[0], Command::BindTarget(Some(target)));
        assert_eq!(
            commands[1],
            Command::Viewport {
                width: 400,
                height: 240
            }
        );
        assert_eq!(commands[2], Command::Clear(Color::BLACK));
        assert!(commands.iter().any(|c| matches!(
            c,
            Command::SetColor { color, .. } if *color == Color::WHITE
        )));
        assert_eq!(ctx.timer().value(), 1);
        assert!(ctx.in_frame());
    }

    #[test]
    fn sprite_frame_composites_and_leaves_display_bound() {
        let mut ctx = context();
        let atlas = ctx
            .create_texture(
                &TextureData::solid(16, 16, Color::WHITE).unwrap(),
                TextureParams::pixelated(),
            )
            .unwrap();
        ctx.install_atlas(atlas);
        let sprite = SpriteDefinition::single(16.0, 16.0, Vec2::ZERO);

        ctx.begin_frame();
        draw::sprite(
            &mut ctx,
            &sprite,
            0.0,
            Vec2::new(100.0, 100.0),
            &DrawStyle::default(),
        )
        .unwrap();
        ctx.end_frame();

        let backend = ctx.backend();
        assert_eq!(backend.bound_target(), None);
        assert_eq!(
            backend.draws(),
            vec![(Topology::Triangles, 0, 6), (Topology::Triangles, 0, 6)]
        );
        assert_eq!(
            backend.bound_texture(),
            backend.target_texture(ctx.logical_target())
        );
        assert!(!ctx.in_frame());
    }

    #[test]
    fn end_frame_uses_display_viewport_and_letterbox() {
        let mut ctx = context();
        ctx.set_letterbox(Color::rgb(0.1, 0.2, 0.3));
        ctx.set_projection(400.0, 240.0, Some(Viewport::new(800.0, 480.0)))
            .unwrap();

        ctx.begin_frame();
        ctx.backend_mut().take_commands();
        ctx.end_frame();

        let commands = &ctx.backend().commands;
        assert_eq!(commands[0], Command::BindTarget(None));
        assert_eq!(
            commands[1],
            Command::Viewport {
                width: 800,
                height: 480
            }
        );
        assert_eq!(commands[2], Command::Clear(Color::rgb(0.1, 0.2, 0.3)));
    }

    #[test]
    fn setters_change_clear_and_composite_colors() {
        let mut ctx = context();
        let sky = Color::rgb(0.2, 0.3, 0.9);
        let dim = Color::rgb(0.5, 0.5, 0.5);
        ctx.set_background(sky);
        ctx.set_composite_blend(dim);

        ctx.begin_frame();
        assert_eq!(ctx.backend().commands[2], Command::Clear(sky));
        ctx.backend_mut().take_commands();
        ctx.end_frame();

        assert!(ctx.backend().commands.iter().any(|c| matches!(
            c,
            Command::SetColor { color, .. } if *color == dim
        )));
    }

    #[test]
    fn end_frame_with_applies_transform_and_blend() {
        let mut ctx = context();
        let tint = Color::rgba(1.0, 0.5, 0.5, 1.0);
        let shrink = |m: AffineMatrix| m.scale(0.5, 0.5);

        ctx.begin_frame();
        ctx.backend_mut().take_commands();
        ctx.end_frame_with(Some(&shrink), tint);

        let expected = AffineMatrix::projection(1.0, 1.0).scale(0.5, 0.5);
        let commands = &ctx.backend().commands;
        assert!(commands.iter().any(|c| matches!(
            c,
            Command::SetMatrix { matrix, .. } if *matrix == expected
        )));
        assert!(commands.iter().any(|c| matches!(
            c,
            Command::SetColor { color, .. } if *color == tint
        )));
    }

    #[test]
    fn set_projection_reallocates_only_on_change() {
        let mut ctx = context();

        ctx.set_projection(400.0, 240.0, None).unwrap();
        assert!(
            !ctx.backend()
                .commands
                .iter()
                .any(|c| matches!(c, Command::ResizeTarget { .. }))
        );

        ctx.set_projection(320.0, 180.0, None).unwrap();
        assert!(ctx.backend().commands.contains(&Command::ResizeTarget {
            target: ctx.logical_target(),
            width: 320,
            height: 180,
        }));
        assert_eq!(ctx.display_size(), Viewport::new(320.0, 180.0));
        assert_eq!(ctx.projection(), AffineMatrix::projection(320.0, 180.0));
    }

    #[test]
    fn zero_sized_projection_is_rejected() {
        let mut ctx = context();
        let err = ctx.set_projection(0.0, 240.0, None).unwrap_err();
        assert!(matches!(err, ResourceError::InvalidSize { .. }));
        assert_eq!(ctx.logical_size(), Viewport::new(400.0, 240.0));
    }

    #[test]
    fn atlas_upload_uses_configured_params() {
        let params = TextureParams::smooth().with_wrap(WrapMode::Repeat);
        let config = StageConfig {
            atlas_params: params,
            ..StageConfig::default()
        };
        let mut ctx = RenderContext::new(RecordingBackend::new(), config).unwrap();
        assert_eq!(ctx.atlas_params(), params);

        let atlas = ctx
            .create_atlas(&TextureData::solid(8, 8, Color::WHITE).unwrap())
            .unwrap();
        assert_eq!(ctx.atlas(), Some(atlas));
        assert_eq!(ctx.backend().textures.get(atlas.0), Some(&(8, 8, params)));

        ctx.begin_frame();
        assert_eq!(ctx.backend().bound_texture(), Some(atlas));
    }

    #[test]
    fn begin_frame_without_atlas_unbinds_texture() {
        let mut ctx = context();
        ctx.begin_frame();
        assert_eq!(ctx.backend().bound_texture(), None);
    }
}

use crate::coords::Viewport;
use crate::math::YAxis;
use crate::paint::Color;
use crate::render::ResponsiveStrategy;
use crate::shader::ShaderSource;
use crate::texture::TextureParams;

/// Construction parameters for a [`RenderContext`](crate::render::RenderContext).
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Fixed logical resolution every draw is expressed in.
    pub view: Viewport,

    /// Initial display size. Defaults to the logical size when `None`.
    pub display: Option<Viewport>,

    pub y_axis: YAxis,

    /// Policy used by [`responsive::apply`](crate::render::responsive::apply).
    pub strategy: ResponsiveStrategy,
    pub aspect_lock: bool,
    /// Restricts `Scale` to whole-number factors.
    pub pixel_perfect: bool,

    /// Clear color of the logical target at the start of every frame.
    pub background: Color,
    /// Clear color of the display surface around the composited frame.
    pub letterbox: Color,
    /// Blend applied when compositing the logical frame.
    pub composite_blend: Color,

    pub image_shader: ShaderSource,
    pub primitive_shader: ShaderSource,

    /// Sampling parameters used when uploading the sprite atlas.
    pub atlas_params: TextureParams,
}

impl StageConfig {
    /// Default configuration at the given logical resolution.
    pub fn with_view(width: f32, height: f32) -> Self {
        Self {
            view: Viewport::new(width, height),
            ..Self::default()
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            view: Viewport::new(400.0, 240.0),
            display: None,
            y_axis: YAxis::Down,
            strategy: ResponsiveStrategy::Scale,
            aspect_lock: true,
            pixel_perfect: true,
            background: Color::BLACK,
            letterbox: Color::BLACK,
            composite_blend: Color::WHITE,
            image_shader: ShaderSource::image(),
            primitive_shader: ShaderSource::primitive(),
            atlas_params: TextureParams::pixelated(),
        }
    }
}

//! Draw protocol.
//!
//! Each function issues exactly one draw against the logical target, or none
//! when its arguments are rejected. Coordinates are logical pixels.
//!
//! Position matrix, in application order:
//! logical projection, translate(pos), scale(extents), caller transform,
//! translate(-origin / extents).

use std::f32::consts::TAU;
use std::fmt;

use crate::coords::{Rect, Vec2};
use crate::device::{GpuBackend, TextureId, Topology};
use crate::error::DrawError;
use crate::math::{AffineMatrix, YAxis};
use crate::paint::Color;
use crate::shader::UNIT_QUAD;
use crate::sprite::SpriteDefinition;

use super::context::RenderContext;

/// Caller transform applied in the sprite's scaled local frame.
pub type Transform<'a> = &'a dyn Fn(AffineMatrix) -> AffineMatrix;

/// Per-draw transform and blend color.
#[derive(Clone, Copy)]
pub struct DrawStyle<'a> {
    pub transform: Option<Transform<'a>>,
    pub blend: Color,
}

impl<'a> DrawStyle<'a> {
    pub fn with_blend(blend: Color) -> Self {
        Self {
            transform: None,
            blend,
        }
    }

    pub fn with_transform(transform: Transform<'a>) -> Self {
        Self {
            transform: Some(transform),
            blend: Color::WHITE,
        }
    }

    pub fn blend(self, blend: Color) -> Self {
        Self { blend, ..self }
    }
}

impl Default for DrawStyle<'_> {
    fn default() -> Self {
        Self {
            transform: None,
            blend: Color::WHITE,
        }
    }
}

impl fmt::Debug for DrawStyle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawStyle")
            .field("transform", &self.transform.is_some())
            .field("blend", &self.blend)
            .finish()
    }
}

/// Draws one image of `sprite` with its origin at `pos`.
///
/// `image` is floored and wrapped into the sprite's image range, so negative
/// indices count from the end.
pub fn sprite<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    sprite: &SpriteDefinition,
    image: f32,
    pos: Vec2,
    style: &DrawStyle<'_>,
) -> Result<(), DrawError> {
    check_blend(style.blend)?;
    let frame = sprite.image(image).ok_or(DrawError::EmptySprite)?;

    let extents = Vec2::new(sprite.width, sprite.height);
    let origin = match ctx.y_axis {
        YAxis::Down => sprite.origin,
        YAxis::Up => Vec2::new(sprite.origin.x, sprite.height - sprite.origin.y),
    };
    let position = position_matrix(ctx.projection(), pos, extents, origin, style);
    let texture_matrix = oriented(ctx.y_axis, frame.texture_matrix);

    ctx.activate_image(Some(&UNIT_QUAD));
    ctx.image.set_position_matrix(&mut ctx.backend, &position);
    ctx.image
        .set_texture_matrix(&mut ctx.backend, &texture_matrix);
    ctx.image.set_blend(&mut ctx.backend, style.blend);
    ctx.backend.draw(Topology::Triangles, 0, 6);
    Ok(())
}

/// Draws `sprite` animated by the frame timer at `speed` images per frame.
pub fn sprite_speed<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    sprite: &SpriteDefinition,
    speed: f32,
    pos: Vec2,
    style: &DrawStyle<'_>,
) -> Result<(), DrawError> {
    let index = ctx.timer().image_index(speed, sprite.image_count());
    self::sprite(ctx, sprite, index as f32, pos, style)
}

/// Draws an arbitrary texture stretched over `size`, then restores the atlas.
pub fn texture<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    texture: TextureId,
    size: Vec2,
    pos: Vec2,
    style: &DrawStyle<'_>,
) -> Result<(), DrawError> {
    check_blend(style.blend)?;
    let position = position_matrix(ctx.projection(), pos, size, Vec2::ZERO, style);

    ctx.activate_image(Some(&UNIT_QUAD));
    ctx.backend.bind_texture(Some(texture));
    ctx.image.set_position_matrix(&mut ctx.backend, &position);
    ctx.image
        .set_texture_matrix(&mut ctx.backend, &oriented(ctx.y_axis, AffineMatrix::IDENTITY));
    ctx.image.set_blend(&mut ctx.backend, style.blend);
    ctx.backend.draw(Topology::Triangles, 0, 6);

    let atlas = ctx.atlas;
    ctx.backend.bind_texture(atlas);
    Ok(())
}

/// Draws a one-pixel line from `from` to `to`.
pub fn line<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    from: Vec2,
    to: Vec2,
    style: &DrawStyle<'_>,
) -> Result<(), DrawError> {
    let d = to - from;
    primitive(ctx, Topology::Lines, &[0.0, 0.0, d.x, d.y], from, style)
}

/// Fills `rect`.
pub fn rect<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    rect: Rect,
    style: &DrawStyle<'_>,
) -> Result<(), DrawError> {
    check_blend(style.blend)?;
    let r = rect.normalized();
    let position = position_matrix(ctx.projection(), r.origin, r.size, Vec2::ZERO, style);
    flat(ctx, &position, &UNIT_QUAD, Topology::Triangles, style.blend);
    Ok(())
}

/// Fills a circle approximated by `segments` triangles around `center`.
pub fn circle<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    center: Vec2,
    radius: f32,
    segments: u32,
    style: &DrawStyle<'_>,
) -> Result<(), DrawError> {
    if segments < 3 {
        return Err(DrawError::Segments(segments));
    }
    check_blend(style.blend)?;

    let vertices = circle_fan(segments);
    let extents = Vec2::new(radius, radius);
    let position = position_matrix(ctx.projection(), center, extents, Vec2::ZERO, style);
    flat(ctx, &position, &vertices, Topology::TriangleFan, style.blend);
    Ok(())
}

/// Draws a caller-supplied vertex list (flat `x, y` pairs) offset by `pos`.
pub fn primitive<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    topology: Topology,
    vertices: &[f32],
    pos: Vec2,
    style: &DrawStyle<'_>,
) -> Result<(), DrawError> {
    let min_vertices = topology.min_vertices();
    if vertices.len() % 2 != 0 || vertices.len() / 2 < min_vertices as usize {
        return Err(DrawError::VertexCount {
            floats: vertices.len(),
            min_vertices,
        });
    }
    check_blend(style.blend)?;

    let position = position_matrix(ctx.projection(), pos, Vec2::new(1.0, 1.0), Vec2::ZERO, style);
    flat(ctx, &position, vertices, topology, style.blend);
    Ok(())
}

/// Center followed by `segments + 1` rim points; the last closes the fan.
fn circle_fan(segments: u32) -> Vec<f32> {
    let step = TAU / segments as f32;
    let mut vertices = Vec::with_capacity((segments as usize + 2) * 2);
    vertices.extend_from_slice(&[0.0, 0.0]);
    for i in 0..=segments {
        let p = Vec2::from_angle(step * i as f32);
        vertices.extend_from_slice(&[p.x, p.y]);
    }
    vertices
}

fn flat<B: GpuBackend>(
    ctx: &mut RenderContext<B>,
    position: &AffineMatrix,
    vertices: &[f32],
    topology: Topology,
    blend: Color,
) {
    ctx.activate_primitive(Some(vertices));
    ctx.primitive.set_position_matrix(&mut ctx.backend, position);
    ctx.primitive.set_blend(&mut ctx.backend, blend);
    ctx.backend
        .draw(topology, 0, (vertices.len() / 2) as u32);
}

/// Texture rows run top-down. With a y-up projection the quad's `v = 1` edge
/// is on top, so `v` is flipped before the atlas mapping.
fn oriented(y_axis: YAxis, texture_matrix: AffineMatrix) -> AffineMatrix {
    match y_axis {
        YAxis::Down => texture_matrix,
        YAxis::Up => texture_matrix.translate(0.0, 1.0).scale(1.0, -1.0),
    }
}

fn position_matrix(
    projection: AffineMatrix,
    pos: Vec2,
    extents: Vec2,
    origin: Vec2,
    style: &DrawStyle<'_>,
) -> AffineMatrix {
    let mut m = projection.translate(pos.x, pos.y).scale(extents.x, extents.y);
    if let Some(transform) = style.transform {
        m = transform(m);
    }
    m.translate(ratio(-origin.x, extents.x), ratio(-origin.y, extents.y))
}

/// `a / b`, or 0 for a zero-sized extent.
fn ratio(a: f32, b: f32) -> f32 {
    if b == 0.0 { 0.0 } else { a / b }
}

fn check_blend(blend: Color) -> Result<(), DrawError> {
    if blend.is_finite() {
        Ok(())
    } else {
        Err(DrawError::Color {
            channels: blend.to_array().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    use crate::config::StageConfig;
    use crate::device::recording::{Command, RecordingBackend};
    use crate::sprite::{AtlasFrame, SpriteDefinition};

    fn context() -> RenderContext<RecordingBackend> {
        let mut ctx =
            RenderContext::new(RecordingBackend::new(), StageConfig::default()).unwrap();
        ctx.begin_frame();
        ctx.backend_mut().take_commands();
        ctx
    }

    fn four_frame_sprite() -> SpriteDefinition {
        let frames: Vec<AtlasFrame> = (0..4)
            .map(|i| AtlasFrame::new(i as f32 * 16.0, 0.0))
            .collect();
        SpriteDefinition::from_atlas(16.0, 16.0, Vec2::new(8.0, 8.0), &frames, 64.0, 16.0)
    }

    fn last_matrices(commands: &[Command]) -> Vec<AffineMatrix> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::SetMatrix { matrix, .. } => Some(*matrix),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn sprite_position_matrix_centers_on_origin() {
        let mut ctx = context();
        let sprite = four_frame_sprite();

        self::sprite(&mut ctx, &sprite, 0.0, Vec2::new(100.0, 100.0), &DrawStyle::default())
            .unwrap();

        let position = last_matrices(&ctx.backend().commands)[0];
        // Unit quad corner (0, 0) lands at pos - origin.
        let (x, y) = position.transform_point(0.0, 0.0);
        let (ex, ey) = ctx.projection().transform_point(92.0, 92.0);
        assert_abs_diff_eq!(x, ex, epsilon = 1e-5);
        assert_abs_diff_eq!(y, ey, epsilon = 1e-5);

        assert_eq!(ctx.backend().draws(), vec![(Topology::Triangles, 0, 6)]);
    }

    #[test]
    fn sprite_image_index_wraps() {
        let mut ctx = context();
        let sprite = four_frame_sprite();

        self::sprite(&mut ctx, &sprite, -1.0, Vec2::ZERO, &DrawStyle::default()).unwrap();

        let texture_matrix = last_matrices(&ctx.backend().commands)[1];
        assert_eq!(texture_matrix, sprite.images[3].texture_matrix);
    }

    #[test]
    fn sprite_speed_follows_frame_timer() {
        let mut ctx =
            RenderContext::new(RecordingBackend::new(), StageConfig::default()).unwrap();
        let sprite = four_frame_sprite();

        let mut seen = Vec::new();
        for _ in 0..5 {
            ctx.begin_frame();
            ctx.backend_mut().take_commands();
            sprite_speed(&mut ctx, &sprite, 0.2, Vec2::ZERO, &DrawStyle::default()).unwrap();
            let texture_matrix = last_matrices(&ctx.backend().commands)[1];
            let index = sprite
                .images
                .iter()
                .position(|img| img.texture_matrix == texture_matrix)
                .unwrap();
            seen.push(index);
            ctx.end_frame();
        }

        assert_eq!(seen, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn empty_sprite_issues_no_commands() {
        let mut ctx = context();
        let empty = SpriteDefinition::from_atlas(8.0, 8.0, Vec2::ZERO, &[], 8.0, 8.0);

        let err = self::sprite(&mut ctx, &empty, 0.0, Vec2::ZERO, &DrawStyle::default())
            .unwrap_err();
        assert_eq!(err, DrawError::EmptySprite);
        assert!(ctx.backend().commands.is_empty());
    }

    #[test]
    fn non_finite_blend_is_rejected() {
        let mut ctx = context();
        let style = DrawStyle::with_blend(Color::rgba(f32::NAN, 0.0, 0.0, 1.0));

        let err = rect(&mut ctx, Rect::new(0.0, 0.0, 4.0, 4.0), &style).unwrap_err();
        assert!(matches!(err, DrawError::Color { .. }));
        assert!(ctx.backend().commands.is_empty());
    }

    #[test]
    fn circle_is_a_closed_fan() {
        let mut ctx = context();
        circle(&mut ctx, Vec2::new(50.0, 50.0), 10.0, 16, &DrawStyle::default()).unwrap();

        assert_eq!(ctx.backend().draws(), vec![(Topology::TriangleFan, 0, 18)]);

        let vertices = ctx
            .backend()
            .commands
            .iter()
            .find_map(|c| match c {
                Command::UploadVertices { data, .. } => Some(data.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(vertices.len(), 36);
        assert_abs_diff_eq!(vertices[2], vertices[34], epsilon = 1e-5);
        assert_abs_diff_eq!(vertices[3], vertices[35], epsilon = 1e-5);
    }

    #[test]
    fn circle_needs_three_segments() {
        let mut ctx = context();
        let err = circle(&mut ctx, Vec2::ZERO, 10.0, 2, &DrawStyle::default()).unwrap_err();
        assert_eq!(err, DrawError::Segments(2));
    }

    #[test]
    fn primitive_rejects_odd_or_short_lists() {
        let mut ctx = context();
        let style = DrawStyle::default();

        let odd = primitive(&mut ctx, Topology::Lines, &[0.0, 0.0, 1.0], Vec2::ZERO, &style);
        assert!(matches!(odd, Err(DrawError::VertexCount { floats: 3, .. })));

        let short = primitive(&mut ctx, Topology::Triangles, &[0.0, 0.0, 1.0, 1.0], Vec2::ZERO, &style);
        assert!(matches!(
            short,
            Err(DrawError::VertexCount {
                min_vertices: 3,
                ..
            })
        ));
        assert!(ctx.backend().commands.is_empty());
    }

    #[test]
    fn line_uses_primitive_program() {
        let mut ctx = context();
        line(
            &mut ctx,
            Vec2::new(10.0, 10.0),
            Vec2::new(30.0, 20.0),
            &DrawStyle::with_blend(Color::rgb(1.0, 0.0, 0.0)),
        )
        .unwrap();

        let commands = &ctx.backend().commands;
        assert_eq!(
            commands[0],
            Command::UseProgram(ctx.primitive_program().id())
        );
        assert!(commands.contains(&Command::UploadVertices {
            buffer: crate::device::BufferId(1),
            data: vec![0.0, 0.0, 20.0, 10.0],
        }));
        assert_eq!(ctx.backend().draws(), vec![(Topology::Lines, 0, 2)]);
    }

    #[test]
    fn transform_applies_in_scaled_frame() {
        let mut ctx = context();
        let sprite = four_frame_sprite();
        let nudge = |m: AffineMatrix| m.translate(1.0, 0.0);

        self::sprite(
            &mut ctx,
            &sprite,
            0.0,
            Vec2::new(100.0, 100.0),
            &DrawStyle::with_transform(&nudge),
        )
        .unwrap();

        // One sprite width to the right of the untransformed draw.
        let position = last_matrices(&ctx.backend().commands)[0];
        let (x, _) = position.transform_point(0.0, 0.0);
        let (ex, _) = ctx.projection().transform_point(108.0, 92.0);
        assert_abs_diff_eq!(x, ex, epsilon = 1e-5);
    }

    #[test]
    fn y_up_sprite_keeps_atlas_top_row_on_screen_top() {
        let config = StageConfig {
            y_axis: YAxis::Up,
            ..StageConfig::default()
        };
        let mut ctx = RenderContext::new(RecordingBackend::new(), config).unwrap();
        ctx.begin_frame();
        ctx.backend_mut().take_commands();

        // Pivot at the top-left pixel of a 16x16 frame.
        let frames = [AtlasFrame::new(0.0, 0.0)];
        let sprite = SpriteDefinition::from_atlas(16.0, 16.0, Vec2::ZERO, &frames, 16.0, 16.0);
        self::sprite(&mut ctx, &sprite, 0.0, Vec2::new(50.0, 50.0), &DrawStyle::default())
            .unwrap();

        let matrices = last_matrices(&ctx.backend().commands);
        let (position, texture_matrix) = (matrices[0], matrices[1]);

        // The quad's v = 1 edge is the top of the sprite on screen.
        let (_, top) = position.transform_point(0.0, 1.0);
        let (_, bottom) = position.transform_point(0.0, 0.0);
        assert!(top > bottom);

        // It lands on the pivot and samples the first atlas row.
        let (px, py) = ctx.projection().transform_point(50.0, 50.0);
        let (x, _) = position.transform_point(0.0, 1.0);
        assert_abs_diff_eq!(x, px, epsilon = 1e-5);
        assert_abs_diff_eq!(top, py, epsilon = 1e-5);
        let (_, v) = texture_matrix.transform_point(0.0, 1.0);
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn y_down_sprite_samples_atlas_top_at_quad_origin() {
        let mut ctx = context();
        let frames = [AtlasFrame::new(0.0, 0.0)];
        let sprite = SpriteDefinition::from_atlas(16.0, 16.0, Vec2::ZERO, &frames, 16.0, 16.0);
        self::sprite(&mut ctx, &sprite, 0.0, Vec2::ZERO, &DrawStyle::default()).unwrap();

        let texture_matrix = last_matrices(&ctx.backend().commands)[1];
        let (_, v) = texture_matrix.transform_point(0.0, 0.0);
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn texture_draw_restores_atlas() {
        let mut ctx = context();
        let atlas = ctx
            .create_texture(
                &crate::texture::TextureData::solid(4, 4, Color::WHITE).unwrap(),
                crate::texture::TextureParams::pixelated(),
            )
            .unwrap();
        let other = ctx
            .create_texture(
                &crate::texture::TextureData::solid(2, 2, Color::BLACK).unwrap(),
                crate::texture::TextureParams::pixelated(),
            )
            .unwrap();
        ctx.install_atlas(atlas);

        texture(&mut ctx, other, Vec2::new(32.0, 32.0), Vec2::ZERO, &DrawStyle::default())
            .unwrap();

        assert!(ctx.backend().commands.contains(&Command::BindTexture(Some(other))));
        assert_eq!(ctx.backend().bound_texture(), Some(atlas));
    }
}

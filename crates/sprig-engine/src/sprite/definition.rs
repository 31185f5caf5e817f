use crate::coords::Vec2;
use crate::math::AffineMatrix;
use crate::time::wrap_index;

/// Top-left pixel of one frame inside the atlas.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct AtlasFrame {
    pub x: f32,
    pub y: f32,
}

impl AtlasFrame {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One animation image of a sprite.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteImage {
    /// Maps the unit quad's texture coordinates onto the atlas sub-rectangle.
    pub texture_matrix: AffineMatrix,
    /// Atlas pixel offset of the image.
    pub offset: Vec2,
}

/// Size, pivot and images of a sprite.
///
/// Immutable once built; draw calls only read it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDefinition {
    pub width: f32,
    pub height: f32,
    /// Pivot in sprite pixels, measured from the image's top-left corner
    /// under either vertical axis convention.
    pub origin: Vec2,
    pub images: Vec<SpriteImage>,
}

impl SpriteDefinition {
    /// Sprite whose frames are `width` x `height` rectangles of an
    /// `atlas_width` x `atlas_height` atlas.
    pub fn from_atlas(
        width: f32,
        height: f32,
        origin: Vec2,
        frames: &[AtlasFrame],
        atlas_width: f32,
        atlas_height: f32,
    ) -> Self {
        let images = frames
            .iter()
            .map(|f| SpriteImage {
                texture_matrix: AffineMatrix::IDENTITY
                    .translate(f.x / atlas_width, f.y / atlas_height)
                    .scale(width / atlas_width, height / atlas_height),
                offset: Vec2::new(f.x, f.y),
            })
            .collect();

        Self {
            width,
            height,
            origin,
            images,
        }
    }

    /// Single image covering the whole bound texture.
    pub fn single(width: f32, height: f32, origin: Vec2) -> Self {
        Self {
            width,
            height,
            origin,
            images: vec![SpriteImage {
                texture_matrix: AffineMatrix::IDENTITY,
                offset: Vec2::ZERO,
            }],
        }
    }

    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Image at `index`, floored and wrapped into range. `None` only for a
    /// sprite without images.
    pub fn image(&self, index: f32) -> Option<&SpriteImage> {
        if self.images.is_empty() {
            return None;
        }
        self.images.get(wrap_index(index, self.images.len()))
    }
}

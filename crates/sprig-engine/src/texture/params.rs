/// Texture filter for minification and magnification.
///
/// Mipmap variants select the filter used within a level; textures are
/// uploaded with a single level, so they sample like their base filter.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl FilterMode {
    /// Filter applied within a single mip level.
    #[inline]
    pub fn is_linear(self) -> bool {
        matches!(
            self,
            FilterMode::Linear | FilterMode::LinearMipmapNearest | FilterMode::LinearMipmapLinear
        )
    }

    #[inline]
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, FilterMode::Nearest | FilterMode::Linear)
    }
}

/// Texture addressing outside `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum WrapMode {
    Repeat,
    #[default]
    ClampToEdge,
    MirroredRepeat,
}

/// Sampling parameters for an uploaded texture.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct TextureParams {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

impl TextureParams {
    /// Nearest filtering, clamped edges. Suitable for pixel art atlases.
    #[inline]
    pub const fn pixelated() -> Self {
        Self {
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
        }
    }

    #[inline]
    pub const fn smooth() -> Self {
        Self {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
        }
    }

    #[inline]
    pub fn with_wrap(self, wrap: WrapMode) -> Self {
        Self {
            wrap_s: wrap,
            wrap_t: wrap,
            ..self
        }
    }
}

use crate::error::DrawError;

/// Straight-alpha RGBA color.
///
/// Used as a multiplicative blend tint for draws and as the clear color of
/// render targets. Channels are nominally in `[0, 1]`; values above 1 brighten
/// the tinted texels and are passed through unchanged.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Creates a color from straight sRGB bytes (`0`–`255`).
    #[inline]
    pub fn from_rgba_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Normalizes a raw channel tuple.
    ///
    /// Missing channels default to 1: `[]` is opaque white, `[r, g, b]` is
    /// opaque, `[r]` keeps green, blue and alpha at 1. More than four channels
    /// or a non-finite channel is rejected.
    pub fn from_channels(channels: &[f32]) -> Result<Self, DrawError> {
        if channels.len() > 4 || channels.iter().any(|c| !c.is_finite()) {
            return Err(DrawError::Color {
                channels: channels.to_vec(),
            });
        }

        let mut rgba = [1.0f32; 4];
        rgba[..channels.len()].copy_from_slice(channels);
        Ok(Self::rgba(rgba[0], rgba[1], rgba[2], rgba[3]))
    }

    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Self::rgba(c[0], c[1], c[2], c[3])
    }
}

impl From<[f32; 3]> for Color {
    fn from(c: [f32; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }
}

impl TryFrom<&[f32]> for Color {
    type Error = DrawError;

    fn try_from(channels: &[f32]) -> Result<Self, Self::Error> {
        Self::from_channels(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tuple_is_opaque_white() {
        assert_eq!(Color::from_channels(&[]).unwrap(), Color::WHITE);
    }

    #[test]
    fn three_channels_default_alpha_to_one() {
        let c = Color::from_channels(&[0.2, 0.4, 0.6]).unwrap();
        assert_eq!(c, Color::rgba(0.2, 0.4, 0.6, 1.0));
    }

    #[test]
    fn incomplete_tuple_fills_with_one() {
        let c = Color::from_channels(&[0.5]).unwrap();
        assert_eq!(c, Color::rgba(0.5, 1.0, 1.0, 1.0));
    }

    #[test]
    fn too_many_channels_is_rejected() {
        let err = Color::from_channels(&[0.0, 0.0, 0.0, 0.0, 1.0]).unwrap_err();
        assert!(matches!(err, DrawError::Color { .. }));
    }

    #[test]
    fn non_finite_channel_is_rejected() {
        assert!(Color::from_channels(&[f32::NAN, 0.0, 0.0]).is_err());
    }

    #[test]
    fn default_is_white() {
        assert_eq!(Color::default(), Color::WHITE);
    }

    #[test]
    fn with_alpha_keeps_color_channels() {
        let shadow = Color::BLACK.with_alpha(0.35);
        assert_eq!(shadow, Color::rgba(0.0, 0.0, 0.0, 0.35));
        assert_eq!(Color::TRANSPARENT.with_alpha(1.0), Color::BLACK);
    }

    #[test]
    fn bytes_are_normalized() {
        let c = Color::from_rgba_u8(255, 0, 51, 255);
        assert_eq!(c.to_array(), [1.0, 0.0, 0.2, 1.0]);
    }
}

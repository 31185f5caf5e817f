use crate::error::ResourceError;
use crate::paint::Color;

/// Tightly packed RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureData {
    /// Wraps RGBA8 pixels, checking the buffer matches `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ResourceError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(ResourceError::InvalidSize {
                what: "texture data",
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-color texture.
    pub fn solid(width: u32, height: u32, color: Color) -> Result<Self, ResourceError> {
        let px = color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let pixels = px
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::from_rgba8(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(TextureData::from_rgba8(2, 2, vec![0; 15]).is_err());
        assert!(TextureData::from_rgba8(0, 2, vec![]).is_err());
    }

    #[test]
    fn solid_fills_every_pixel() {
        let t = TextureData::solid(2, 1, Color::rgba(1.0, 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(t.pixels(), &[255, 0, 0, 255, 255, 0, 0, 255]);
    }
}

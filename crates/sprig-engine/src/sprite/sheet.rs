use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::Vec2;
use crate::error::SheetError;

use super::definition::{AtlasFrame, SpriteDefinition};

/// Sprite entry as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SpriteEntry {
    width: f32,
    height: f32,
    /// Pivot in sprite pixels. Defaults to the top-left corner.
    #[serde(default)]
    origin: [f32; 2],
    /// Top-left atlas pixel of every image, in animation order.
    frames: Vec<[f32; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SheetFile {
    /// Atlas size in pixels.
    atlas: [f32; 2],
    sprites: HashMap<String, SpriteEntry>,
}

/// Named sprite definitions sharing one atlas.
///
/// JSON layout:
///
/// ```json
/// {
///   "atlas": [128, 64],
///   "sprites": {
///     "ball": { "width": 16, "height": 16, "origin": [8, 8], "frames": [[0, 0], [16, 0]] }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSheet {
    atlas_width: f32,
    atlas_height: f32,
    sprites: HashMap<String, SpriteDefinition>,
}

impl SpriteSheet {
    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        let file: SheetFile = serde_json::from_str(json)?;
        let [atlas_width, atlas_height] = file.atlas;
        if !(atlas_width > 0.0 && atlas_height > 0.0) {
            return Err(SheetError::InvalidAtlas {
                width: atlas_width,
                height: atlas_height,
            });
        }

        let mut sprites = HashMap::with_capacity(file.sprites.len());
        for (name, entry) in file.sprites {
            if !(entry.width > 0.0 && entry.height > 0.0) {
                return Err(SheetError::InvalidSprite {
                    name,
                    reason: "width and height must be positive",
                });
            }
            if entry.frames.is_empty() {
                return Err(SheetError::InvalidSprite {
                    name,
                    reason: "no frames",
                });
            }

            let frames: Vec<AtlasFrame> = entry
                .frames
                .iter()
                .map(|[x, y]| AtlasFrame::new(*x, *y))
                .collect();
            let definition = SpriteDefinition::from_atlas(
                entry.width,
                entry.height,
                Vec2::new(entry.origin[0], entry.origin[1]),
                &frames,
                atlas_width,
                atlas_height,
            );
            sprites.insert(name, definition);
        }

        Ok(Self {
            atlas_width,
            atlas_height,
            sprites,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    #[inline]
    pub fn atlas_size(&self) -> (f32, f32) {
        (self.atlas_width, self.atlas_height)
    }

    pub fn get(&self, name: &str) -> Option<&SpriteDefinition> {
        self.sprites.get(name)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sprites.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"{
        "atlas": [64, 32],
        "sprites": {
            "ball": { "width": 16, "height": 16, "origin": [8, 8], "frames": [[0, 0], [16, 0], [32, 0]] },
            "block": { "width": 32, "height": 16, "frames": [[0, 16]] }
        }
    }"#;

    #[test]
    fn parses_named_sprites() {
        let sheet = SpriteSheet::from_json(SHEET).unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.atlas_size(), (64.0, 32.0));

        let ball = sheet.get("ball").unwrap();
        assert_eq!(ball.image_count(), 3);
        assert_eq!(ball.origin, Vec2::new(8.0, 8.0));
        assert_eq!(ball.images[1].offset, Vec2::new(16.0, 0.0));

        let block = sheet.get("block").unwrap();
        assert_eq!(block.origin, Vec2::ZERO);
        assert_eq!(
            block.images[0].texture_matrix.transform_point(0.0, 0.0),
            (0.0, 0.5)
        );
    }

    #[test]
    fn rejects_sprite_without_frames() {
        let json = r#"{ "atlas": [8, 8], "sprites": { "x": { "width": 8, "height": 8, "frames": [] } } }"#;
        let err = SpriteSheet::from_json(json).unwrap_err();
        assert!(matches!(err, SheetError::InvalidSprite { ref name, .. } if name == "x"));
    }

    #[test]
    fn rejects_zero_atlas() {
        let json = r#"{ "atlas": [0, 8], "sprites": {} }"#;
        assert!(matches!(
            SpriteSheet::from_json(json),
            Err(SheetError::InvalidAtlas { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SpriteSheet::from_json("{ not json"),
            Err(SheetError::Parse(_))
        ));
    }
}

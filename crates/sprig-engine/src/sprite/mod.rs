//! Sprite definitions and atlas sprite sheets.

mod definition;
mod sheet;

pub use definition::{AtlasFrame, SpriteDefinition, SpriteImage};
pub use sheet::SpriteSheet;

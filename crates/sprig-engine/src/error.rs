//! Error types for the rendering pipeline.
//!
//! Construction-time errors (`ResourceError`, `ShaderError`) are fatal and are
//! propagated unchanged. `DrawError` is scoped to a single draw call and
//! `LoadError` to a single texture load.

use std::fmt;

/// Shader stage a compile error refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Semantic role of an attribute or uniform in a shader program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SemanticRole {
    Position,
    TexCoord,
    PositionMatrix,
    TextureMatrix,
    Blend,
    Texture,
    Sampler,
}

impl fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticRole::Position => "position",
            SemanticRole::TexCoord => "texCoord",
            SemanticRole::PositionMatrix => "positionMatrix",
            SemanticRole::TextureMatrix => "textureMatrix",
            SemanticRole::Blend => "blend",
            SemanticRole::Texture => "texture",
            SemanticRole::Sampler => "sampler",
        };
        f.write_str(name)
    }
}

/// Failure while building a shader program.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    /// A stage failed to parse or validate.
    Compile {
        label: String,
        stage: ShaderStage,
        log: String,
    },
    /// The stages compiled but cannot be combined into a program.
    Link { label: String, log: String },
    /// A name from the semantic table does not resolve to a usable slot.
    BindingResolution {
        label: String,
        role: SemanticRole,
        name: String,
        reason: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { label, stage, log } => {
                write!(f, "{stage} shader of '{label}' failed to compile: {log}")
            }
            ShaderError::Link { label, log } => {
                write!(f, "shader program '{label}' failed to link: {log}")
            }
            ShaderError::BindingResolution {
                label,
                role,
                name,
                reason,
            } => write!(
                f,
                "shader program '{label}': {role} binding '{name}' not resolved: {reason}"
            ),
        }
    }
}

impl std::error::Error for ShaderError {}

/// GPU object allocation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The backend refused to create the object.
    Allocation { what: &'static str, details: String },
    /// A handle did not refer to a live object.
    InvalidHandle { what: &'static str, index: usize },
    /// Requested dimensions are zero or exceed device limits.
    InvalidSize {
        what: &'static str,
        width: u32,
        height: u32,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Allocation { what, details } => {
                write!(f, "failed to allocate {what}: {details}")
            }
            ResourceError::InvalidHandle { what, index } => {
                write!(f, "invalid {what} handle #{index}")
            }
            ResourceError::InvalidSize {
                what,
                width,
                height,
            } => write!(f, "invalid {what} size {width}x{height}"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Per-draw argument error. The draw that produced it issued no GPU commands.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawError {
    /// Color tuple with more than four channels or non-finite values.
    Color { channels: Vec<f32> },
    /// Vertex list with an odd number of floats or too few vertices for the topology.
    VertexCount { floats: usize, min_vertices: u32 },
    /// Sprite definition with no images.
    EmptySprite,
    /// Circle approximated with fewer than three segments.
    Segments(u32),
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawError::Color { channels } => {
                write!(f, "cannot build a color from {channels:?}")
            }
            DrawError::VertexCount {
                floats,
                min_vertices,
            } => write!(
                f,
                "vertex list of {floats} floats is not a list of at least {min_vertices} 2D vertices"
            ),
            DrawError::EmptySprite => f.write_str("sprite has no images"),
            DrawError::Segments(n) => write!(f, "circle needs at least 3 segments, got {n}"),
        }
    }
}

impl std::error::Error for DrawError {}

/// Texture load failure, reported to the caller of the load.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Decode(String),
    Upload(ResourceError),
    /// The loader thread ended without delivering a result.
    Disconnected,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "texture I/O error: {e}"),
            LoadError::Decode(msg) => write!(f, "texture decode error: {msg}"),
            LoadError::Upload(e) => write!(f, "texture upload error: {e}"),
            LoadError::Disconnected => f.write_str("texture loader thread disconnected"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Upload(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ResourceError> for LoadError {
    fn from(e: ResourceError) -> Self {
        Self::Upload(e)
    }
}

/// Fatal failure while building a [`RenderContext`](crate::render::RenderContext).
#[derive(Debug, Clone, PartialEq)]
pub enum InitError {
    Shader(ShaderError),
    Resource(ResourceError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Shader(e) => write!(f, "shader initialization failed: {e}"),
            InitError::Resource(e) => write!(f, "resource initialization failed: {e}"),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::Shader(e) => Some(e),
            InitError::Resource(e) => Some(e),
        }
    }
}

impl From<ShaderError> for InitError {
    fn from(e: ShaderError) -> Self {
        Self::Shader(e)
    }
}

impl From<ResourceError> for InitError {
    fn from(e: ResourceError) -> Self {
        Self::Resource(e)
    }
}

/// Sprite sheet that cannot be read or does not describe valid sprites.
#[derive(Debug)]
pub enum SheetError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidAtlas { width: f32, height: f32 },
    InvalidSprite { name: String, reason: &'static str },
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::Io(e) => write!(f, "sprite sheet I/O error: {e}"),
            SheetError::Parse(e) => write!(f, "sprite sheet parse error: {e}"),
            SheetError::InvalidAtlas { width, height } => {
                write!(f, "invalid atlas size {width}x{height}")
            }
            SheetError::InvalidSprite { name, reason } => {
                write!(f, "invalid sprite '{name}': {reason}")
            }
        }
    }
}

impl std::error::Error for SheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetError::Io(e) => Some(e),
            SheetError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SheetError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

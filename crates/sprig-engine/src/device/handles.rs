//! Opaque handles and layout descriptors exchanged with a [`GpuBackend`](super::GpuBackend).

/// Linked shader program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub usize);

/// Vertex buffer owned by a shader program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(pub usize);

/// Sampled texture (atlas, loaded image or render-target color output).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub usize);

/// Off-screen render target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TargetId(pub usize);

/// Vertex input location of a resolved attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeSlot {
    pub location: u32,
}

/// Uniform binding in `@group(0)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformSlot {
    pub binding: u32,
}

/// Shape of a uniform value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    /// `mat3x3<f32>`, 48 bytes in a uniform buffer.
    Matrix3,
    /// `vec4<f32>`, 16 bytes.
    Vec4,
}

impl UniformKind {
    #[inline]
    pub const fn size(self) -> u64 {
        match self {
            UniformKind::Matrix3 => 48,
            UniformKind::Vec4 => 16,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformDesc {
    pub slot: UniformSlot,
    pub kind: UniformKind,
}

/// Texture and sampler bindings in `@group(1)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureBinding {
    pub texture: u32,
    pub sampler: u32,
}

/// Resolved resource layout of a program.
///
/// Every attribute is a `vec2<f32>`; the order of `attributes` is the vertex
/// buffer slot order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramLayout {
    pub attributes: Vec<AttributeSlot>,
    pub uniforms: Vec<UniformDesc>,
    pub texture: Option<TextureBinding>,
}

/// Validated stages and layout handed to the backend for linking.
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex: &'a naga::Module,
    pub vertex_entry: &'a str,
    pub fragment: &'a naga::Module,
    pub fragment_entry: &'a str,
    pub layout: &'a ProgramLayout,
}

/// Primitive topology of a draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    /// Expanded to a triangle list by backends without native fan support.
    TriangleFan,
}

impl Topology {
    /// Fewest vertices that produce a primitive.
    #[inline]
    pub const fn min_vertices(self) -> u32 {
        match self {
            Topology::Points => 1,
            Topology::Lines | Topology::LineStrip => 2,
            Topology::Triangles | Topology::TriangleStrip | Topology::TriangleFan => 3,
        }
    }
}

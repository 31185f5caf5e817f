use std::borrow::Cow;

const IMAGE_WGSL: &str = include_str!("wgsl/image.wgsl");
const PRIMITIVE_WGSL: &str = include_str!("wgsl/primitive.wgsl");

/// Maps semantic roles to the names used in shader source.
///
/// Attributes are looked up among the vertex entry point's `@location`
/// inputs; uniforms among `@group(0)` uniform globals.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticNames {
    pub position: Cow<'static, str>,
    pub tex_coord: Option<Cow<'static, str>>,
    pub position_matrix: Cow<'static, str>,
    pub texture_matrix: Option<Cow<'static, str>>,
    pub blend: Cow<'static, str>,
}

impl SemanticNames {
    /// Names used by the built-in textured shader.
    pub fn image() -> Self {
        Self {
            position: "a_position".into(),
            tex_coord: Some("a_tex_coord".into()),
            position_matrix: "u_position_matrix".into(),
            texture_matrix: Some("u_texture_matrix".into()),
            blend: "u_blend".into(),
        }
    }

    /// Names used by the built-in flat-color shader.
    pub fn primitive() -> Self {
        Self {
            position: "a_position".into(),
            tex_coord: None,
            position_matrix: "u_position_matrix".into(),
            texture_matrix: None,
            blend: "u_blend".into(),
        }
    }
}

/// WGSL source of a shader program plus its semantic-name table.
///
/// Vertex and fragment stages may come from the same text; each is compiled
/// as its own module and only its entry point is used.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub label: Cow<'static, str>,
    pub vertex: Cow<'static, str>,
    pub vertex_entry: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
    pub fragment_entry: Cow<'static, str>,
    pub names: SemanticNames,
}

impl ShaderSource {
    /// Single WGSL text holding both `vs_main` and `fs_main`.
    pub fn from_wgsl(
        label: impl Into<Cow<'static, str>>,
        wgsl: impl Into<Cow<'static, str>>,
        names: SemanticNames,
    ) -> Self {
        let wgsl = wgsl.into();
        Self {
            label: label.into(),
            vertex: wgsl.clone(),
            vertex_entry: "vs_main".into(),
            fragment: wgsl,
            fragment_entry: "fs_main".into(),
            names,
        }
    }

    /// Built-in textured program.
    pub fn image() -> Self {
        Self::from_wgsl("image", IMAGE_WGSL, SemanticNames::image())
    }

    /// Built-in flat-color program.
    pub fn primitive() -> Self {
        Self::from_wgsl("primitive", PRIMITIVE_WGSL, SemanticNames::primitive())
    }
}

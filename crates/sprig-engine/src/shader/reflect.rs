//! WGSL compilation and interface reflection on top of `naga`.
//!
//! "Compile" parses and validates one stage. "Link" checks that the chosen
//! entry points exist and that the fragment stage only reads varyings the
//! vertex stage writes. Resolution maps the semantic-name table onto vertex
//! input locations and `@group(0)` uniform bindings.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{
    AddressSpace, Binding, EntryPoint, Handle, ImageClass, ImageDimension, Module, ScalarKind,
    Type, TypeInner, VectorSize,
};

use crate::device::{
    AttributeSlot, ProgramLayout, TextureBinding, UniformDesc, UniformKind, UniformSlot,
};
use crate::error::{SemanticRole, ShaderError, ShaderStage};

use super::source::SemanticNames;

/// Bind group holding the per-draw uniforms.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group holding the sampled texture and its sampler.
pub const TEXTURE_GROUP: u32 = 1;

/// Parses and validates one stage.
pub fn compile_stage(label: &str, stage: ShaderStage, source: &str) -> Result<Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        label: label.to_string(),
        stage,
        log: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| ShaderError::Compile {
            label: label.to_string(),
            stage,
            log: e.emit_to_string(source),
        })?;

    Ok(module)
}

/// Checks that two compiled stages form a usable program.
pub fn link(
    label: &str,
    vertex: &Module,
    vertex_entry: &str,
    fragment: &Module,
    fragment_entry: &str,
) -> Result<(), ShaderError> {
    let link_err = |log: String| ShaderError::Link {
        label: label.to_string(),
        log,
    };

    let vs = find_entry(vertex, vertex_entry, naga::ShaderStage::Vertex)
        .ok_or_else(|| link_err(format!("no vertex entry point '{vertex_entry}'")))?;
    let fs = find_entry(fragment, fragment_entry, naga::ShaderStage::Fragment)
        .ok_or_else(|| link_err(format!("no fragment entry point '{fragment_entry}'")))?;

    let outputs = vertex_outputs(vertex, vs);
    for input in stage_inputs(fragment, fs) {
        if !outputs.contains(&input.location) {
            return Err(link_err(format!(
                "fragment input @location({}) is not written by the vertex stage",
                input.location
            )));
        }
    }

    for (_, var) in vertex.global_variables.iter() {
        let (Some(name), Some(binding)) = (&var.name, &var.binding) else {
            continue;
        };
        let clash = fragment.global_variables.iter().any(|(_, other)| {
            other.name.as_deref() == Some(name.as_str())
                && other.binding.as_ref().is_some_and(|b| b != binding)
        });
        if clash {
            return Err(link_err(format!(
                "global '{name}' is bound differently in the two stages"
            )));
        }
    }

    Ok(())
}

/// Slots resolved from a semantic-name table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlots {
    pub position: AttributeSlot,
    pub tex_coord: Option<AttributeSlot>,
    pub position_matrix: UniformSlot,
    pub texture_matrix: Option<UniformSlot>,
    pub blend: UniformSlot,
    pub texture: Option<TextureBinding>,
}

impl ResolvedSlots {
    /// Layout handed to the backend. Attributes are in slot order, uniforms
    /// sorted by binding.
    pub fn layout(&self) -> ProgramLayout {
        let mut attributes = vec![self.position];
        attributes.extend(self.tex_coord);

        let mut uniforms = vec![
            UniformDesc {
                slot: self.position_matrix,
                kind: UniformKind::Matrix3,
            },
            UniformDesc {
                slot: self.blend,
                kind: UniformKind::Vec4,
            },
        ];
        if let Some(slot) = self.texture_matrix {
            uniforms.push(UniformDesc {
                slot,
                kind: UniformKind::Matrix3,
            });
        }
        uniforms.sort_by_key(|u| u.slot.binding);

        ProgramLayout {
            attributes,
            uniforms,
            texture: self.texture,
        }
    }
}

/// Resolves every slot named by `names`.
///
/// Attributes come from the vertex entry point. Uniforms are searched in the
/// vertex module first, then the fragment module. A texture and sampler are
/// required only when a texture coordinate attribute is named.
pub fn resolve(
    label: &str,
    vertex: &Module,
    vertex_entry: &str,
    fragment: &Module,
    names: &SemanticNames,
) -> Result<ResolvedSlots, ShaderError> {
    let fail = |role: SemanticRole, name: &str, reason: &str| ShaderError::BindingResolution {
        label: label.to_string(),
        role,
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let vs = find_entry(vertex, vertex_entry, naga::ShaderStage::Vertex).ok_or_else(|| {
        ShaderError::Link {
            label: label.to_string(),
            log: format!("no vertex entry point '{vertex_entry}'"),
        }
    })?;
    let inputs = stage_inputs(vertex, vs);

    let attribute = |role: SemanticRole, name: &str| -> Result<AttributeSlot, ShaderError> {
        let input = inputs
            .iter()
            .find(|i| i.name == Some(name))
            .ok_or_else(|| fail(role, name, "no vertex input with this name"))?;
        if !is_vector(vertex, input.ty, VectorSize::Bi) {
            return Err(fail(role, name, "expected vec2<f32>"));
        }
        Ok(AttributeSlot {
            location: input.location,
        })
    };

    let position = attribute(SemanticRole::Position, &names.position)?;
    let tex_coord = names
        .tex_coord
        .as_deref()
        .map(|n| attribute(SemanticRole::TexCoord, n))
        .transpose()?;

    let used: Vec<u32> = std::iter::once(position.location)
        .chain(tex_coord.map(|t| t.location))
        .collect();
    if let Some(extra) = inputs.iter().find(|i| !used.contains(&i.location)) {
        return Err(ShaderError::Link {
            label: label.to_string(),
            log: format!(
                "vertex input @location({}) has no semantic role",
                extra.location
            ),
        });
    }

    let uniform = |role: SemanticRole,
                   name: &str,
                   kind: UniformKind|
     -> Result<UniformSlot, ShaderError> {
        let (module, var) = [vertex, fragment]
            .into_iter()
            .find_map(|m| {
                m.global_variables
                    .iter()
                    .find(|(_, v)| v.name.as_deref() == Some(name))
                    .map(|(_, v)| (m, v))
            })
            .ok_or_else(|| fail(role, name, "no global with this name"))?;

        if var.space != AddressSpace::Uniform {
            return Err(fail(role, name, "not in the uniform address space"));
        }
        let binding = var
            .binding
            .as_ref()
            .ok_or_else(|| fail(role, name, "missing @group/@binding"))?;
        if binding.group != UNIFORM_GROUP {
            return Err(fail(role, name, "uniforms must live in @group(0)"));
        }
        let type_ok = match kind {
            UniformKind::Matrix3 => is_mat3(module, var.ty),
            UniformKind::Vec4 => is_vector(module, var.ty, VectorSize::Quad),
        };
        if !type_ok {
            let expected = match kind {
                UniformKind::Matrix3 => "expected mat3x3<f32>",
                UniformKind::Vec4 => "expected vec4<f32>",
            };
            return Err(fail(role, name, expected));
        }
        Ok(UniformSlot {
            binding: binding.binding,
        })
    };

    let position_matrix = uniform(
        SemanticRole::PositionMatrix,
        &names.position_matrix,
        UniformKind::Matrix3,
    )?;
    let texture_matrix = names
        .texture_matrix
        .as_deref()
        .map(|n| uniform(SemanticRole::TextureMatrix, n, UniformKind::Matrix3))
        .transpose()?;
    let blend = uniform(SemanticRole::Blend, &names.blend, UniformKind::Vec4)?;

    let texture = if tex_coord.is_some() {
        Some(resolve_texture(vertex, fragment).map_err(|(role, reason)| {
            fail(role, "*", reason)
        })?)
    } else {
        None
    };

    let slots = ResolvedSlots {
        position,
        tex_coord,
        position_matrix,
        texture_matrix,
        blend,
        texture,
    };
    check_bindings(label, vertex, fragment, &slots)?;
    Ok(slots)
}

/// Rejects bound globals the layout would not describe. Every `@group(0)`
/// binding must be a resolved uniform, `@group(1)` may only hold the texture
/// and sampler of a textured program, and no other group is allowed.
fn check_bindings(
    label: &str,
    vertex: &Module,
    fragment: &Module,
    slots: &ResolvedSlots,
) -> Result<(), ShaderError> {
    let uniforms: Vec<u32> = [Some(slots.position_matrix), slots.texture_matrix, Some(slots.blend)]
        .into_iter()
        .flatten()
        .map(|s| s.binding)
        .collect();

    for module in [vertex, fragment] {
        for (_, var) in module.global_variables.iter() {
            let Some(binding) = &var.binding else {
                continue;
            };
            let known = match binding.group {
                UNIFORM_GROUP => uniforms.contains(&binding.binding),
                TEXTURE_GROUP => slots
                    .texture
                    .is_some_and(|t| binding.binding == t.texture || binding.binding == t.sampler),
                _ => false,
            };
            if !known {
                return Err(ShaderError::Link {
                    label: label.to_string(),
                    log: format!(
                        "global '{}' at @group({}) @binding({}) has no semantic role",
                        var.name.as_deref().unwrap_or("<unnamed>"),
                        binding.group,
                        binding.binding
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Finds the first 2D float texture and the first filtering sampler in
/// `@group(1)`, looking at the fragment module first.
fn resolve_texture(
    vertex: &Module,
    fragment: &Module,
) -> Result<TextureBinding, (SemanticRole, &'static str)> {
    let find = |pred: &dyn Fn(&TypeInner) -> bool| {
        [fragment, vertex].into_iter().find_map(|m| {
            m.global_variables.iter().find_map(|(_, v)| {
                let b = v.binding.as_ref()?;
                (b.group == TEXTURE_GROUP && pred(&m.types[v.ty].inner)).then_some(b.binding)
            })
        })
    };

    let texture = find(&|inner| {
        matches!(
            inner,
            TypeInner::Image {
                dim: ImageDimension::D2,
                arrayed: false,
                class: ImageClass::Sampled {
                    kind: ScalarKind::Float,
                    multi: false,
                },
            }
        )
    })
    .ok_or((SemanticRole::Texture, "no texture_2d<f32> in @group(1)"))?;

    let sampler = find(&|inner| matches!(inner, TypeInner::Sampler { comparison: false }))
        .ok_or((SemanticRole::Sampler, "no sampler in @group(1)"))?;

    Ok(TextureBinding { texture, sampler })
}

struct StageInput<'m> {
    name: Option<&'m str>,
    location: u32,
    ty: Handle<Type>,
}

fn find_entry<'m>(
    module: &'m Module,
    name: &str,
    stage: naga::ShaderStage,
) -> Option<&'m EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name && ep.stage == stage)
}

/// `@location` inputs of an entry point, flattening struct arguments.
fn stage_inputs<'m>(module: &'m Module, ep: &'m EntryPoint) -> Vec<StageInput<'m>> {
    let mut inputs = Vec::new();
    for arg in &ep.function.arguments {
        match &arg.binding {
            Some(Binding::Location { location, .. }) => inputs.push(StageInput {
                name: arg.name.as_deref(),
                location: *location,
                ty: arg.ty,
            }),
            Some(Binding::BuiltIn(_)) => {}
            None => {
                if let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for member in members {
                        if let Some(Binding::Location { location, .. }) = &member.binding {
                            inputs.push(StageInput {
                                name: member.name.as_deref(),
                                location: *location,
                                ty: member.ty,
                            });
                        }
                    }
                }
            }
        }
    }
    inputs
}

/// `@location` outputs of a vertex entry point.
fn vertex_outputs(module: &Module, ep: &EntryPoint) -> Vec<u32> {
    let Some(result) = &ep.function.result else {
        return Vec::new();
    };
    match &result.binding {
        Some(Binding::Location { location, .. }) => vec![*location],
        Some(Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[result.ty].inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|m| match &m.binding {
                    Some(Binding::Location { location, .. }) => Some(*location),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn is_vector(module: &Module, ty: Handle<Type>, size: VectorSize) -> bool {
    match &module.types[ty].inner {
        TypeInner::Vector { size: s, scalar } => {
            *s == size && scalar.kind == ScalarKind::Float && scalar.width == 4
        }
        _ => false,
    }
}

fn is_mat3(module: &Module, ty: Handle<Type>) -> bool {
    match &module.types[ty].inner {
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => {
            *columns == VectorSize::Tri
                && *rows == VectorSize::Tri
                && scalar.kind == ScalarKind::Float
                && scalar.width == 4
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderSource;

    fn compile_both(source: &ShaderSource) -> (Module, Module) {
        let vs = compile_stage(&source.label, ShaderStage::Vertex, &source.vertex).unwrap();
        let fs = compile_stage(&source.label, ShaderStage::Fragment, &source.fragment).unwrap();
        (vs, fs)
    }

    #[test]
    fn builtin_image_shader_resolves() {
        let source = ShaderSource::image();
        let (vs, fs) = compile_both(&source);
        link("image", &vs, "vs_main", &fs, "fs_main").unwrap();

        let slots = resolve("image", &vs, "vs_main", &fs, &source.names).unwrap();
        assert_eq!(slots.position, AttributeSlot { location: 0 });
        assert_eq!(slots.tex_coord, Some(AttributeSlot { location: 1 }));
        assert_eq!(slots.position_matrix, UniformSlot { binding: 0 });
        assert_eq!(slots.texture_matrix, Some(UniformSlot { binding: 1 }));
        assert_eq!(slots.blend, UniformSlot { binding: 2 });
        assert_eq!(
            slots.texture,
            Some(TextureBinding {
                texture: 0,
                sampler: 1
            })
        );

        let layout = slots.layout();
        let bindings: Vec<u32> = layout.uniforms.iter().map(|u| u.slot.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2]);
    }

    #[test]
    fn builtin_primitive_shader_has_no_texture() {
        let source = ShaderSource::primitive();
        let (vs, fs) = compile_both(&source);
        link("primitive", &vs, "vs_main", &fs, "fs_main").unwrap();

        let slots = resolve("primitive", &vs, "vs_main", &fs, &source.names).unwrap();
        assert!(slots.tex_coord.is_none());
        assert!(slots.texture.is_none());
        assert_eq!(slots.layout().attributes.len(), 1);
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let err = compile_stage("broken", ShaderStage::Vertex, "fn vs_main( {").unwrap_err();
        match err {
            ShaderError::Compile { stage, log, .. } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_entry_point_is_a_link_error() {
        let source = ShaderSource::primitive();
        let (vs, fs) = compile_both(&source);
        let err = link("primitive", &vs, "main", &fs, "fs_main").unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
    }

    #[test]
    fn unwritten_varying_is_a_link_error() {
        let vs_src = r#"
            @vertex
            fn vs_main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(p, 0.0, 1.0);
            }
        "#;
        let fs_src = r#"
            @fragment
            fn fs_main(@location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(uv, 0.0, 1.0);
            }
        "#;
        let vs = compile_stage("t", ShaderStage::Vertex, vs_src).unwrap();
        let fs = compile_stage("t", ShaderStage::Fragment, fs_src).unwrap();
        let err = link("t", &vs, "vs_main", &fs, "fs_main").unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
    }

    #[test]
    fn misnamed_uniform_fails_resolution() {
        let source = ShaderSource::primitive();
        let (vs, fs) = compile_both(&source);
        let mut names = source.names.clone();
        names.blend = "u_tint".into();

        let err = resolve("primitive", &vs, "vs_main", &fs, &names).unwrap_err();
        match err {
            ShaderError::BindingResolution { role, name, .. } => {
                assert_eq!(role, SemanticRole::Blend);
                assert_eq!(name, "u_tint");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mistyped_uniform_fails_resolution() {
        let source = ShaderSource::primitive();
        let (vs, fs) = compile_both(&source);
        let mut names = source.names.clone();
        // Points the matrix role at the vec4 blend uniform.
        names.position_matrix = "u_blend".into();

        let err = resolve("primitive", &vs, "vs_main", &fs, &names).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::BindingResolution {
                role: SemanticRole::PositionMatrix,
                ..
            }
        ));
    }

    fn resolve_wgsl(src: &str, names: &SemanticNames) -> Result<ResolvedSlots, ShaderError> {
        let vs = compile_stage("b", ShaderStage::Vertex, src).unwrap();
        let fs = compile_stage("b", ShaderStage::Fragment, src).unwrap();
        link("b", &vs, "vs_main", &fs, "fs_main")?;
        resolve("b", &vs, "vs_main", &fs, names)
    }

    fn assert_unmapped_binding(err: ShaderError, group: u32, binding: u32) {
        match err {
            ShaderError::Link { log, .. } => {
                assert!(
                    log.contains(&format!("@group({group}) @binding({binding})")),
                    "{log}"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unnamed_uniform_in_group_zero_is_rejected() {
        let src = r#"
            @group(0) @binding(0) var<uniform> u_position_matrix: mat3x3<f32>;
            @group(0) @binding(1) var<uniform> u_blend: vec4<f32>;
            @group(0) @binding(2) var<uniform> extra: vec4<f32>;

            @vertex
            fn vs_main(@location(0) a_position: vec2<f32>) -> @builtin(position) vec4<f32> {
                let p = u_position_matrix * vec3<f32>(a_position, 1.0);
                return vec4<f32>(p.xy, 0.0, 1.0);
            }

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return u_blend * extra;
            }
        "#;
        let err = resolve_wgsl(src, &SemanticNames::primitive()).unwrap_err();
        assert_unmapped_binding(err, 0, 2);
    }

    #[test]
    fn texture_on_untextured_program_is_rejected() {
        let src = r#"
            @group(0) @binding(0) var<uniform> u_position_matrix: mat3x3<f32>;
            @group(0) @binding(1) var<uniform> u_blend: vec4<f32>;
            @group(1) @binding(0) var t: texture_2d<f32>;
            @group(1) @binding(1) var s: sampler;

            @vertex
            fn vs_main(@location(0) a_position: vec2<f32>) -> @builtin(position) vec4<f32> {
                let p = u_position_matrix * vec3<f32>(a_position, 1.0);
                return vec4<f32>(p.xy, 0.0, 1.0);
            }

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return u_blend * textureSample(t, s, vec2<f32>(0.5, 0.5));
            }
        "#;
        let err = resolve_wgsl(src, &SemanticNames::primitive()).unwrap_err();
        assert_unmapped_binding(err, 1, 0);
    }

    #[test]
    fn binding_outside_known_groups_is_rejected() {
        let src = r#"
            @group(0) @binding(0) var<uniform> u_position_matrix: mat3x3<f32>;
            @group(0) @binding(1) var<uniform> u_blend: vec4<f32>;
            @group(2) @binding(0) var<uniform> fog: vec4<f32>;

            @vertex
            fn vs_main(@location(0) a_position: vec2<f32>) -> @builtin(position) vec4<f32> {
                let p = u_position_matrix * vec3<f32>(a_position, 1.0);
                return vec4<f32>(p.xy, 0.0, 1.0);
            }

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return u_blend + fog;
            }
        "#;
        let err = resolve_wgsl(src, &SemanticNames::primitive()).unwrap_err();
        assert_unmapped_binding(err, 2, 0);
    }

    #[test]
    fn struct_vertex_inputs_resolve() {
        let src = r#"
            @group(0) @binding(0) var<uniform> m: mat3x3<f32>;
            @group(0) @binding(1) var<uniform> c: vec4<f32>;

            struct In {
                @location(2) pos: vec2<f32>,
            };

            @vertex
            fn vs_main(input: In) -> @builtin(position) vec4<f32> {
                let p = m * vec3<f32>(input.pos, 1.0);
                return vec4<f32>(p.xy, 0.0, 1.0);
            }

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return c;
            }
        "#;
        let vs = compile_stage("s", ShaderStage::Vertex, src).unwrap();
        let fs = compile_stage("s", ShaderStage::Fragment, src).unwrap();
        let names = SemanticNames {
            position: "pos".into(),
            tex_coord: None,
            position_matrix: "m".into(),
            texture_matrix: None,
            blend: "c".into(),
        };

        let slots = resolve("s", &vs, "vs_main", &fs, &names).unwrap();
        assert_eq!(slots.position, AttributeSlot { location: 2 });
        assert_eq!(slots.blend, UniformSlot { binding: 1 });
    }
}

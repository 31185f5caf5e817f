use log::debug;

use crate::device::{AttributeSlot, BufferId, GpuBackend, ProgramDesc, ProgramId, UniformSlot};
use crate::error::{InitError, ShaderStage};
use crate::math::AffineMatrix;
use crate::paint::Color;

use super::reflect;
use super::source::ShaderSource;

/// Unit quad as two triangles, flat `x, y` pairs.
pub const UNIT_QUAD: [f32; 12] = [
    0.0, 0.0, //
    1.0, 0.0, //
    0.0, 1.0, //
    0.0, 1.0, //
    1.0, 0.0, //
    1.0, 1.0,
];

/// Degenerate single point uploaded when a flat-color program is activated
/// without vertices.
pub const DEGENERATE_POINT: [f32; 2] = [0.0, 0.0];

/// A linked program, its resolved slots and its vertex buffer.
///
/// Every slot is resolved before the backend is asked to link, so a failed
/// resolution never leaves a half-built program behind.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    label: String,
    id: ProgramId,
    buffer: BufferId,
    position: AttributeSlot,
    tex_coord: Option<AttributeSlot>,
    position_matrix: UniformSlot,
    texture_matrix: Option<UniformSlot>,
    blend: UniformSlot,
}

impl ShaderProgram {
    pub fn new<B: GpuBackend>(backend: &mut B, source: &ShaderSource) -> Result<Self, InitError> {
        let label = source.label.as_ref();

        let vertex = reflect::compile_stage(label, ShaderStage::Vertex, &source.vertex)?;
        let fragment = reflect::compile_stage(label, ShaderStage::Fragment, &source.fragment)?;
        reflect::link(
            label,
            &vertex,
            &source.vertex_entry,
            &fragment,
            &source.fragment_entry,
        )?;
        let slots = reflect::resolve(
            label,
            &vertex,
            &source.vertex_entry,
            &fragment,
            &source.names,
        )?;

        let layout = slots.layout();
        let buffer = backend.create_vertex_buffer(label)?;
        let id = backend.create_program(&ProgramDesc {
            label,
            vertex: &vertex,
            vertex_entry: &source.vertex_entry,
            fragment: &fragment,
            fragment_entry: &source.fragment_entry,
            layout: &layout,
        })?;

        debug!(
            "shader program '{label}' linked: {} attribute(s), {} uniform(s), textured={}",
            layout.attributes.len(),
            layout.uniforms.len(),
            layout.texture.is_some()
        );

        Ok(Self {
            label: label.to_string(),
            id,
            buffer,
            position: slots.position,
            tex_coord: slots.tex_coord,
            position_matrix: slots.position_matrix,
            texture_matrix: slots.texture_matrix,
            blend: slots.blend,
        })
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True when the program samples a texture through a texture coordinate.
    #[inline]
    pub fn is_textured(&self) -> bool {
        self.tex_coord.is_some()
    }

    /// Vertices uploaded by [`activate`](Self::activate) when none are given.
    pub fn default_vertices(&self) -> &'static [f32] {
        if self.is_textured() {
            &UNIT_QUAD
        } else {
            &DEGENERATE_POINT
        }
    }

    /// Makes this the active program and uploads `positions`.
    ///
    /// The bind is skipped when `active` already names this program. The
    /// upload and attribute wiring always happen. Texture coordinates read the
    /// same buffer as positions.
    pub fn activate<B: GpuBackend>(
        &self,
        backend: &mut B,
        active: &mut Option<ProgramId>,
        positions: Option<&[f32]>,
    ) {
        if *active != Some(self.id) {
            backend.use_program(self.id);
            *active = Some(self.id);
        }

        backend.upload_vertices(self.buffer, positions.unwrap_or(self.default_vertices()));
        backend.bind_attribute(self.position, self.buffer);
        if let Some(slot) = self.tex_coord {
            backend.bind_attribute(slot, self.buffer);
        }
    }

    pub fn set_position_matrix<B: GpuBackend>(&self, backend: &mut B, matrix: &AffineMatrix) {
        backend.set_matrix(self.position_matrix, matrix);
    }

    /// No-op for programs without a texture matrix.
    pub fn set_texture_matrix<B: GpuBackend>(&self, backend: &mut B, matrix: &AffineMatrix) {
        if let Some(slot) = self.texture_matrix {
            backend.set_matrix(slot, matrix);
        }
    }

    pub fn set_blend<B: GpuBackend>(&self, backend: &mut B, color: Color) {
        backend.set_color(self.blend, color);
    }
}

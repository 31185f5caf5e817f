use crate::error::{ResourceError, ShaderError};
use crate::math::AffineMatrix;
use crate::paint::Color;
use crate::texture::{TextureData, TextureParams};

use super::handles::{
    AttributeSlot, BufferId, ProgramDesc, ProgramId, TargetId, TextureId, Topology, UniformSlot,
};

/// GPU context collaborator.
///
/// A small bind-then-draw command surface. Implementations execute or record
/// commands synchronously in call order; state set by one call (bound program,
/// attributes, uniforms, texture, target, viewport) persists until changed.
///
/// Allocation methods fail with [`ResourceError`]; program linking fails with
/// [`ShaderError::Link`]. Binding and draw methods never fail: handles that do
/// not refer to live objects are ignored with a warning.
pub trait GpuBackend {
    /// Links validated shader stages into a program.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, ShaderError>;

    /// Allocates an (initially empty) vertex buffer.
    fn create_vertex_buffer(&mut self, label: &str) -> Result<BufferId, ResourceError>;

    /// Uploads RGBA8 pixels into a new sampled texture.
    fn create_texture(
        &mut self,
        data: &TextureData,
        params: TextureParams,
    ) -> Result<TextureId, ResourceError>;

    /// Allocates an off-screen color target whose output can be sampled.
    fn create_render_target(&mut self, width: u32, height: u32)
    -> Result<TargetId, ResourceError>;

    /// Reallocates the target's color storage. Previous contents are lost.
    fn resize_render_target(
        &mut self,
        target: TargetId,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError>;

    /// Texture handle of the target's color output.
    fn target_texture(&self, target: TargetId) -> Option<TextureId>;

    /// Sets the size of the display surface area composited into.
    fn resize_display(&mut self, width: u32, height: u32);

    fn use_program(&mut self, program: ProgramId);

    /// Replaces the contents of `buffer` with `data` (flat `x, y` pairs).
    fn upload_vertices(&mut self, buffer: BufferId, data: &[f32]);

    /// Points a `vec2<f32>` attribute of the bound program at `buffer`.
    fn bind_attribute(&mut self, slot: AttributeSlot, buffer: BufferId);

    fn set_matrix(&mut self, slot: UniformSlot, matrix: &AffineMatrix);

    fn set_color(&mut self, slot: UniformSlot, color: Color);

    /// Binds the texture sampled by textured programs. `None` unbinds.
    fn bind_texture(&mut self, texture: Option<TextureId>);

    /// Redirects output to an off-screen target, or to the display for `None`.
    fn bind_target(&mut self, target: Option<TargetId>);

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clears the whole bound target.
    fn clear(&mut self, color: Color);

    /// Draws `count` vertices starting at `first` from the bound attributes.
    fn draw(&mut self, topology: Topology, first: u32, count: u32);
}

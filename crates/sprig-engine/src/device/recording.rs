use crate::error::{ResourceError, ShaderError};
use crate::math::AffineMatrix;
use crate::paint::Color;
use crate::texture::{TextureData, TextureParams};

use super::GpuBackend;
use super::handles::{
    AttributeSlot, BufferId, ProgramDesc, ProgramId, ProgramLayout, TargetId, TextureId, Topology,
    UniformSlot,
};

/// One command received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UseProgram(ProgramId),
    UploadVertices { buffer: BufferId, data: Vec<f32> },
    BindAttribute { slot: AttributeSlot, buffer: BufferId },
    SetMatrix { slot: UniformSlot, matrix: AffineMatrix },
    SetColor { slot: UniformSlot, color: Color },
    BindTexture(Option<TextureId>),
    BindTarget(Option<TargetId>),
    Viewport { width: u32, height: u32 },
    Clear(Color),
    Draw { topology: Topology, first: u32, count: u32 },
    ResizeTarget { target: TargetId, width: u32, height: u32 },
    ResizeDisplay { width: u32, height: u32 },
}

/// Program linked by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedProgram {
    pub label: String,
    pub layout: ProgramLayout,
}

/// Headless backend that records every command in order.
///
/// Resource creation always succeeds unless `fail_allocations` is set. Used
/// for tests and for driving the pipeline without a device.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub commands: Vec<Command>,
    pub programs: Vec<RecordedProgram>,
    pub buffers: usize,
    pub textures: Vec<(u32, u32, TextureParams)>,
    /// Render targets as `(width, height, color texture)`.
    pub targets: Vec<(u32, u32, TextureId)>,
    pub fail_allocations: bool,

    bound_program: Option<ProgramId>,
    bound_target: Option<TargetId>,
    bound_texture: Option<TextureId>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently bound target; `None` means the display surface.
    pub fn bound_target(&self) -> Option<TargetId> {
        self.bound_target
    }

    pub fn bound_texture(&self) -> Option<TextureId> {
        self.bound_texture
    }

    pub fn bound_program(&self) -> Option<ProgramId> {
        self.bound_program
    }

    /// Drains and returns the recorded commands.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Draw commands only, in order.
    pub fn draws(&self) -> Vec<(Topology, u32, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw {
                    topology,
                    first,
                    count,
                } => Some((*topology, *first, *count)),
                _ => None,
            })
            .collect()
    }

    fn check_alloc(&self, what: &'static str) -> Result<(), ResourceError> {
        if self.fail_allocations {
            Err(ResourceError::Allocation {
                what,
                details: "allocation disabled on recording backend".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl GpuBackend for RecordingBackend {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, ShaderError> {
        self.programs.push(RecordedProgram {
            label: desc.label.to_string(),
            layout: desc.layout.clone(),
        });
        Ok(ProgramId(self.programs.len() - 1))
    }

    fn create_vertex_buffer(&mut self, _label: &str) -> Result<BufferId, ResourceError> {
        self.check_alloc("vertex buffer")?;
        self.buffers += 1;
        Ok(BufferId(self.buffers - 1))
    }

    fn create_texture(
        &mut self,
        data: &TextureData,
        params: TextureParams,
    ) -> Result<TextureId, ResourceError> {
        self.check_alloc("texture")?;
        self.textures.push((data.width(), data.height(), params));
        Ok(TextureId(self.textures.len() - 1))
    }

    fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<TargetId, ResourceError> {
        self.check_alloc("render target")?;
        self.textures
            .push((width, height, TextureParams::pixelated()));
        let texture = TextureId(self.textures.len() - 1);
        self.targets.push((width, height, texture));
        Ok(TargetId(self.targets.len() - 1))
    }

    fn resize_render_target(
        &mut self,
        target: TargetId,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError> {
        self.check_alloc("render target")?;
        let entry = self
            .targets
            .get_mut(target.0)
            .ok_or(ResourceError::InvalidHandle {
                what: "render target",
                index: target.0,
            })?;
        entry.0 = width;
        entry.1 = height;
        self.commands.push(Command::ResizeTarget {
            target,
            width,
            height,
        });
        Ok(())
    }

    fn target_texture(&self, target: TargetId) -> Option<TextureId> {
        self.targets.get(target.0).map(|t| t.2)
    }

    fn resize_display(&mut self, width: u32, height: u32) {
        self.commands.push(Command::ResizeDisplay { width, height });
    }

    fn use_program(&mut self, program: ProgramId) {
        self.bound_program = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn upload_vertices(&mut self, buffer: BufferId, data: &[f32]) {
        self.commands.push(Command::UploadVertices {
            buffer,
            data: data.to_vec(),
        });
    }

    fn bind_attribute(&mut self, slot: AttributeSlot, buffer: BufferId) {
        self.commands.push(Command::BindAttribute { slot, buffer });
    }

    fn set_matrix(&mut self, slot: UniformSlot, matrix: &AffineMatrix) {
        self.commands.push(Command::SetMatrix {
            slot,
            matrix: *matrix,
        });
    }

    fn set_color(&mut self, slot: UniformSlot, color: Color) {
        self.commands.push(Command::SetColor { slot, color });
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.bound_texture = texture;
        self.commands.push(Command::BindTexture(texture));
    }

    fn bind_target(&mut self, target: Option<TargetId>) {
        self.bound_target = target;
        self.commands.push(Command::BindTarget(target));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(Command::Viewport { width, height });
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(Command::Clear(color));
    }

    fn draw(&mut self, topology: Topology, first: u32, count: u32) {
        self.commands.push(Command::Draw {
            topology,
            first,
            count,
        });
    }
}

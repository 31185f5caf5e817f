//! [`GpuBackend`] on top of wgpu.
//!
//! Commands are recorded into passes as they arrive. Every draw snapshots the
//! vertices it reads and the uniform values of the bound program, so later
//! uploads never affect earlier draws. [`WgpuBackend::present`] packs the
//! snapshots into two per-frame buffers (vertices, and uniforms addressed by
//! dynamic offsets), encodes one render pass per target switch and presents.

use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroU64;

use log::{debug, warn};
use wgpu::SurfaceError;

use crate::error::{ResourceError, ShaderError};
use crate::math::AffineMatrix;
use crate::paint::Color;
use crate::texture::{TextureData, TextureParams, WrapMode};

use super::handles::{
    AttributeSlot, BufferId, ProgramDesc, ProgramId, ProgramLayout, TargetId, TextureId, Topology,
    UniformSlot,
};
use super::{Gpu, GpuBackend};

const VERTEX_STRIDE: u64 = 2 * std::mem::size_of::<f32>() as u64;
const INITIAL_VERTEX_BYTES: u64 = 16 * 1024;
const INITIAL_UNIFORM_BYTES: u64 = 64 * 1024;

struct ProgramEntry {
    label: String,
    layout: ProgramLayout,
    vertex: wgpu::ShaderModule,
    vertex_entry: String,
    fragment: wgpu::ShaderModule,
    fragment_entry: String,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<wgpu::PrimitiveTopology, wgpu::RenderPipeline>,
    /// Current bytes of each uniform, indexed like `layout.uniforms`.
    uniform_values: Vec<Vec<u8>>,
}

struct TextureEntry {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    width: u32,
    height: u32,
}

struct DrawCall {
    program: ProgramId,
    topology: wgpu::PrimitiveTopology,
    /// Byte offset in the frame vertex buffer, one per attribute slot.
    vertex_offsets: Vec<u64>,
    vertex_count: u32,
    /// Dynamic offsets into the frame uniform buffer, in binding order.
    uniform_offsets: Vec<u32>,
    texture: Option<TextureId>,
    viewport: (u32, u32),
}

struct Pass {
    target: Option<TargetId>,
    clear: Option<Color>,
    draws: Vec<DrawCall>,
}

/// wgpu implementation of [`GpuBackend`].
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    uniform_alignment: u64,

    programs: Vec<ProgramEntry>,
    buffers: Vec<Vec<f32>>,
    textures: Vec<TextureEntry>,
    targets: Vec<TextureId>,
    /// 1x1 white texture bound when a textured program has nothing bound.
    white: TextureId,
    display: (u32, u32),

    program: Option<ProgramId>,
    attributes: HashMap<u32, BufferId>,
    texture: Option<TextureId>,
    target: Option<TargetId>,
    viewport: (u32, u32),

    passes: Vec<Pass>,
    vertex_arena: Vec<f32>,
    uniform_arena: Vec<u8>,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
    uniform_buffer: wgpu::Buffer,
    uniform_capacity: u64,
    uniform_groups: HashMap<ProgramId, wgpu::BindGroup>,
    texture_groups: HashMap<(ProgramId, TextureId), wgpu::BindGroup>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Result<Self, ResourceError> {
        let device = gpu.device();
        let vertex_buffer = create_buffer(
            device,
            "sprig frame vertices",
            INITIAL_VERTEX_BYTES,
            wgpu::BufferUsages::VERTEX,
        );
        let uniform_buffer = create_buffer(
            device,
            "sprig frame uniforms",
            INITIAL_UNIFORM_BYTES,
            wgpu::BufferUsages::UNIFORM,
        );
        let size = gpu.size();

        let mut backend = Self {
            uniform_alignment: gpu.uniform_alignment().max(1),
            gpu,
            programs: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
            targets: Vec::new(),
            white: TextureId(0),
            display: (size.width, size.height),
            program: None,
            attributes: HashMap::new(),
            texture: None,
            target: None,
            viewport: (size.width, size.height),
            passes: Vec::new(),
            vertex_arena: Vec::new(),
            uniform_arena: Vec::new(),
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_BYTES,
            uniform_buffer,
            uniform_capacity: INITIAL_UNIFORM_BYTES,
            uniform_groups: HashMap::new(),
            texture_groups: HashMap::new(),
        };

        backend.white =
            backend.create_texture(&TextureData::solid(1, 1, Color::WHITE)?, TextureParams::pixelated())?;
        Ok(backend)
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    /// Surface resizes go through here; the display viewport is set
    /// separately through [`GpuBackend::resize_display`].
    #[inline]
    pub fn gpu_mut(&mut self) -> &mut Gpu<'w> {
        &mut self.gpu
    }

    #[inline]
    pub fn display_size(&self) -> (u32, u32) {
        self.display
    }

    /// Encodes and submits everything recorded since the last call, then
    /// presents the surface.
    ///
    /// Recorded work is consumed even when acquiring the surface fails.
    pub fn present(&mut self) -> Result<(), SurfaceError> {
        let passes = std::mem::take(&mut self.passes);
        let vertices = std::mem::take(&mut self.vertex_arena);
        let uniforms = std::mem::take(&mut self.uniform_arena);
        if passes.is_empty() {
            return Ok(());
        }

        let frame = self.gpu.acquire()?;

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&vertices);
        self.ensure_capacity(vertex_bytes.len() as u64, uniforms.len() as u64);
        if !vertex_bytes.is_empty() {
            self.gpu
                .queue()
                .write_buffer(&self.vertex_buffer, 0, vertex_bytes);
        }
        if !uniforms.is_empty() {
            self.gpu
                .queue()
                .write_buffer(&self.uniform_buffer, 0, &uniforms);
        }

        for draw in passes.iter().flat_map(|p| &p.draws) {
            self.ensure_pipeline(draw.program, draw.topology);
            self.ensure_uniform_group(draw.program);
            if let Some(texture) = draw.texture {
                self.ensure_texture_group(draw.program, texture);
            }
        }

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprig frame encoder"),
            });

        let surface_size = self.gpu.size();
        for pass in &passes {
            let (view, size) = match pass.target {
                None => (&frame.view, (surface_size.width, surface_size.height)),
                Some(target) => {
                    let Some(entry) = self.target_entry(target) else {
                        continue;
                    };
                    (&entry.view, (entry.width, entry.height))
                }
            };

            let load = match pass.clear {
                Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: c.r as f64,
                    g: c.g as f64,
                    b: c.b as f64,
                    a: c.a as f64,
                }),
                None => wgpu::LoadOp::Load,
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprig pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &pass.draws {
                let program = &self.programs[draw.program.0];
                let Some(pipeline) = program.pipelines.get(&draw.topology) else {
                    continue;
                };
                let Some(uniform_group) = self.uniform_groups.get(&draw.program) else {
                    continue;
                };

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, uniform_group, &draw.uniform_offsets);
                if let Some(texture) = draw.texture {
                    let Some(group) = self.texture_groups.get(&(draw.program, texture)) else {
                        continue;
                    };
                    rpass.set_bind_group(1, group, &[]);
                }

                let len = draw.vertex_count as u64 * VERTEX_STRIDE;
                for (slot, &offset) in draw.vertex_offsets.iter().enumerate() {
                    rpass.set_vertex_buffer(slot as u32, self.vertex_buffer.slice(offset..offset + len));
                }

                let [x, y, w, h] = viewport_rect(draw.viewport, size, pass.target.is_none());
                rpass.set_viewport(x, y, w, h, 0.0, 1.0);
                rpass.draw(0..draw.vertex_count, 0..1);
            }
        }

        self.gpu.queue().submit(std::iter::once(encoder.finish()));
        frame.texture.present();
        Ok(())
    }

    fn target_entry(&self, target: TargetId) -> Option<&TextureEntry> {
        let texture = self.targets.get(target.0)?;
        self.textures.get(texture.0)
    }

    fn current_pass(&mut self) -> &mut Pass {
        if self.passes.last().is_none_or(|p| p.target != self.target) {
            self.passes.push(Pass {
                target: self.target,
                clear: None,
                draws: Vec::new(),
            });
        }
        let last = self.passes.len() - 1;
        &mut self.passes[last]
    }

    fn write_uniform(&mut self, slot: UniformSlot, bytes: &[u8]) {
        let Some(program) = self.program.and_then(|p| self.programs.get_mut(p.0)) else {
            warn!("uniform set with no program bound");
            return;
        };
        let Some(index) = program.layout.uniforms.iter().position(|u| u.slot == slot) else {
            warn!(
                "program '{}' has no uniform at binding {}",
                program.label, slot.binding
            );
            return;
        };
        let value = &mut program.uniform_values[index];
        let n = value.len().min(bytes.len());
        value[..n].copy_from_slice(&bytes[..n]);
    }

    fn ensure_capacity(&mut self, vertex_bytes: u64, uniform_bytes: u64) {
        if vertex_bytes > self.vertex_capacity {
            self.vertex_capacity = vertex_bytes.next_power_of_two();
            self.vertex_buffer = create_buffer(
                self.gpu.device(),
                "sprig frame vertices",
                self.vertex_capacity,
                wgpu::BufferUsages::VERTEX,
            );
            debug!("frame vertex buffer grown to {} bytes", self.vertex_capacity);
        }
        if uniform_bytes > self.uniform_capacity {
            self.uniform_capacity = uniform_bytes.next_power_of_two();
            self.uniform_buffer = create_buffer(
                self.gpu.device(),
                "sprig frame uniforms",
                self.uniform_capacity,
                wgpu::BufferUsages::UNIFORM,
            );
            self.uniform_groups.clear();
            debug!("frame uniform buffer grown to {} bytes", self.uniform_capacity);
        }
    }

    fn ensure_pipeline(&mut self, program: ProgramId, topology: wgpu::PrimitiveTopology) {
        let format = self.gpu.surface_format();
        let Some(entry) = self.programs.get(program.0) else {
            return;
        };
        if entry.pipelines.contains_key(&topology) {
            return;
        }
        let pipeline = build_pipeline(self.gpu.device(), format, entry, topology);
        debug!("pipeline for '{}' ({topology:?}) created", entry.label);
        self.programs[program.0].pipelines.insert(topology, pipeline);
    }

    fn ensure_uniform_group(&mut self, program: ProgramId) {
        if self.uniform_groups.contains_key(&program) {
            return;
        }
        let Some(entry) = self.programs.get(program.0) else {
            return;
        };

        let entries: Vec<wgpu::BindGroupEntry> = entry
            .layout
            .uniforms
            .iter()
            .map(|u| wgpu::BindGroupEntry {
                binding: u.slot.binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &self.uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(u.kind.size()),
                }),
            })
            .collect();

        let group = self
            .gpu
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("sprig uniforms"),
                layout: &entry.uniform_layout,
                entries: &entries,
            });
        self.uniform_groups.insert(program, group);
    }

    fn ensure_texture_group(&mut self, program: ProgramId, texture: TextureId) {
        if self.texture_groups.contains_key(&(program, texture)) {
            return;
        }
        let Some(entry) = self.programs.get(program.0) else {
            return;
        };
        let (Some(binding), Some(layout)) = (entry.layout.texture, entry.texture_layout.as_ref())
        else {
            return;
        };
        let Some(tex) = self.textures.get(texture.0) else {
            return;
        };

        let group = self
            .gpu
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("sprig texture"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: binding.texture,
                        resource: wgpu::BindingResource::TextureView(&tex.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: binding.sampler,
                        resource: wgpu::BindingResource::Sampler(&tex.sampler),
                    },
                ],
            });
        self.texture_groups.insert((program, texture), group);
    }

    fn check_size(&self, what: &'static str, width: u32, height: u32) -> Result<(), ResourceError> {
        let max = self.gpu.max_texture_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(ResourceError::InvalidSize {
                what,
                width,
                height,
            });
        }
        Ok(())
    }

    fn allocate_target_texture(&self, width: u32, height: u32) -> TextureEntry {
        let device = self.gpu.device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprig logical target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.gpu.surface_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        TextureEntry {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler: create_sampler(device, TextureParams::pixelated()),
            _texture: texture,
            width,
            height,
        }
    }
}

impl GpuBackend for WgpuBackend<'_> {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, ShaderError> {
        let device = self.gpu.device();

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(desc.vertex.clone())),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(desc.fragment.clone())),
        });

        let uniform_entries: Vec<wgpu::BindGroupLayoutEntry> = desc
            .layout
            .uniforms
            .iter()
            .map(|u| wgpu::BindGroupLayoutEntry {
                binding: u.slot.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(u.kind.size()),
                },
                count: None,
            })
            .collect();
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprig uniform layout"),
            entries: &uniform_entries,
        });

        let texture_layout = desc.layout.texture.map(|binding| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sprig texture layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: binding.texture,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: binding.sampler,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            })
        });

        let mut group_layouts = vec![&uniform_layout];
        group_layouts.extend(texture_layout.as_ref());
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: &group_layouts,
            immediate_size: 0,
        });

        let entry = ProgramEntry {
            label: desc.label.to_string(),
            layout: desc.layout.clone(),
            vertex,
            vertex_entry: desc.vertex_entry.to_string(),
            fragment,
            fragment_entry: desc.fragment_entry.to_string(),
            uniform_layout,
            texture_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            uniform_values: desc
                .layout
                .uniforms
                .iter()
                .map(|u| vec![0u8; u.kind.size() as usize])
                .collect(),
        };

        let id = ProgramId(self.programs.len());
        self.programs.push(entry);
        // Sprites and the composite quad use triangle lists; build that one now.
        self.ensure_pipeline(id, wgpu::PrimitiveTopology::TriangleList);
        Ok(id)
    }

    fn create_vertex_buffer(&mut self, _label: &str) -> Result<BufferId, ResourceError> {
        self.buffers.push(Vec::new());
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn create_texture(
        &mut self,
        data: &TextureData,
        params: TextureParams,
    ) -> Result<TextureId, ResourceError> {
        let (width, height) = (data.width(), data.height());
        self.check_size("texture", width, height)?;

        let device = self.gpu.device();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprig texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        self.textures.push(TextureEntry {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler: create_sampler(device, params),
            _texture: texture,
            width,
            height,
        });
        Ok(TextureId(self.textures.len() - 1))
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> Result<TargetId, ResourceError> {
        self.check_size("render target", width, height)?;
        let entry = self.allocate_target_texture(width, height);
        self.textures.push(entry);
        self.targets.push(TextureId(self.textures.len() - 1));
        Ok(TargetId(self.targets.len() - 1))
    }

    fn resize_render_target(
        &mut self,
        target: TargetId,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError> {
        self.check_size("render target", width, height)?;
        let texture = *self
            .targets
            .get(target.0)
            .ok_or(ResourceError::InvalidHandle {
                what: "render target",
                index: target.0,
            })?;

        let entry = self.allocate_target_texture(width, height);
        self.textures[texture.0] = entry;
        self.texture_groups.retain(|(_, t), _| *t != texture);
        Ok(())
    }

    fn target_texture(&self, target: TargetId) -> Option<TextureId> {
        self.targets.get(target.0).copied()
    }

    fn resize_display(&mut self, width: u32, height: u32) {
        self.display = (width, height);
    }

    fn use_program(&mut self, program: ProgramId) {
        if program.0 >= self.programs.len() {
            warn!("use_program: unknown program #{}", program.0);
            return;
        }
        self.program = Some(program);
    }

    fn upload_vertices(&mut self, buffer: BufferId, data: &[f32]) {
        let Some(storage) = self.buffers.get_mut(buffer.0) else {
            warn!("upload_vertices: unknown buffer #{}", buffer.0);
            return;
        };
        storage.clear();
        storage.extend_from_slice(data);
    }

    fn bind_attribute(&mut self, slot: AttributeSlot, buffer: BufferId) {
        if buffer.0 >= self.buffers.len() {
            warn!("bind_attribute: unknown buffer #{}", buffer.0);
            return;
        }
        self.attributes.insert(slot.location, buffer);
    }

    fn set_matrix(&mut self, slot: UniformSlot, matrix: &AffineMatrix) {
        let columns = matrix.to_gpu_columns();
        self.write_uniform(slot, bytemuck::cast_slice(&columns));
    }

    fn set_color(&mut self, slot: UniformSlot, color: Color) {
        let rgba = color.to_array();
        self.write_uniform(slot, bytemuck::cast_slice(&rgba));
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        match texture {
            Some(t) if t.0 >= self.textures.len() => {
                warn!("bind_texture: unknown texture #{}", t.0);
            }
            _ => self.texture = texture,
        }
    }

    fn bind_target(&mut self, target: Option<TargetId>) {
        match target {
            Some(t) if t.0 >= self.targets.len() => {
                warn!("bind_target: unknown render target #{}", t.0);
            }
            _ => self.target = target,
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn clear(&mut self, color: Color) {
        let target = self.target;
        let pass = self.current_pass();
        if pass.draws.is_empty() {
            pass.clear = Some(color);
        } else {
            self.passes.push(Pass {
                target,
                clear: Some(color),
                draws: Vec::new(),
            });
        }
    }

    fn draw(&mut self, topology: Topology, first: u32, count: u32) {
        let Some(program_id) = self.program else {
            warn!("draw with no program bound");
            return;
        };
        if count < topology.min_vertices() {
            debug!("draw of {count} vertices skipped for {topology:?}");
            return;
        }

        let program = &self.programs[program_id.0];
        let needed = (first as usize + count as usize) * 2;
        let mut sources = Vec::with_capacity(program.layout.attributes.len());
        for attribute in &program.layout.attributes {
            let Some(&buffer) = self.attributes.get(&attribute.location) else {
                warn!(
                    "draw: attribute @location({}) of '{}' is not bound",
                    attribute.location, program.label
                );
                return;
            };
            if self.buffers[buffer.0].len() < needed {
                warn!("draw: buffer #{} holds fewer than {} vertices", buffer.0, first + count);
                return;
            }
            sources.push(buffer);
        }

        let indices = expand_indices(topology, first, count);

        let mut written: Vec<(BufferId, u64)> = Vec::with_capacity(sources.len());
        let mut vertex_offsets = Vec::with_capacity(sources.len());
        for buffer in sources {
            if let Some(&(_, offset)) = written.iter().find(|(b, _)| *b == buffer) {
                vertex_offsets.push(offset);
                continue;
            }
            let offset = (self.vertex_arena.len() * std::mem::size_of::<f32>()) as u64;
            let data = &self.buffers[buffer.0];
            for &i in &indices {
                let i = i as usize * 2;
                self.vertex_arena.extend_from_slice(&data[i..i + 2]);
            }
            written.push((buffer, offset));
            vertex_offsets.push(offset);
        }

        let mut uniform_offsets = Vec::with_capacity(program.uniform_values.len());
        for value in &program.uniform_values {
            let offset = align_up(self.uniform_arena.len() as u64, self.uniform_alignment);
            self.uniform_arena.resize(offset as usize, 0);
            self.uniform_arena.extend_from_slice(value);
            uniform_offsets.push(offset as u32);
        }

        let texture = program.layout.texture.map(|_| {
            let sampling_target = self
                .target
                .and_then(|t| self.targets.get(t.0))
                .is_some_and(|t| Some(*t) == self.texture);
            match self.texture {
                Some(t) if !sampling_target => t,
                Some(_) => {
                    warn!("draw samples the texture it renders into; using white");
                    self.white
                }
                None => self.white,
            }
        });

        let call = DrawCall {
            program: program_id,
            topology: map_topology(topology),
            vertex_offsets,
            vertex_count: indices.len() as u32,
            uniform_offsets,
            texture,
            viewport: self.viewport,
        };
        self.current_pass().draws.push(call);
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    program: &ProgramEntry,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    // One buffer per attribute; attributes sharing a buffer get the same slice.
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = program
        .layout
        .attributes
        .iter()
        .map(|a| {
            [wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: a.location,
            }]
        })
        .collect();
    let buffers: Vec<wgpu::VertexBufferLayout> = attributes
        .iter()
        .map(|a| wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: a,
        })
        .collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.label.as_str()),
        layout: Some(&program.pipeline_layout),
        vertex: wgpu::VertexState {
            module: &program.vertex,
            entry_point: Some(program.vertex_entry.as_str()),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.fragment,
            entry_point: Some(program.fragment_entry.as_str()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn create_buffer(
    device: &wgpu::Device,
    label: &str,
    size: u64,
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Textures carry a single level, so mipmap variants sample like their base
/// filter.
fn create_sampler(device: &wgpu::Device, params: TextureParams) -> wgpu::Sampler {
    let filter = |linear: bool| {
        if linear {
            wgpu::FilterMode::Linear
        } else {
            wgpu::FilterMode::Nearest
        }
    };
    let address = |wrap: WrapMode| match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    };

    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("sprig sampler"),
        address_mode_u: address(params.wrap_s),
        address_mode_v: address(params.wrap_t),
        mag_filter: filter(params.mag_filter.is_linear()),
        min_filter: filter(params.min_filter.is_linear()),
        ..Default::default()
    })
}

fn map_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::Points => wgpu::PrimitiveTopology::PointList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Topology::Triangles | Topology::TriangleFan => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// Source vertex indices of a draw. Fans become `(0, i, i + 1)` triangles.
fn expand_indices(topology: Topology, first: u32, count: u32) -> Vec<u32> {
    match topology {
        Topology::TriangleFan => (1..count - 1)
            .flat_map(|i| [first, first + i, first + i + 1])
            .collect(),
        _ => (first..first + count).collect(),
    }
}

/// Viewport inside an attachment. The display viewport is centered and the
/// rest of the surface keeps the letterbox clear color. A viewport larger
/// than the attachment is shrunk by one factor on both axes so its aspect
/// ratio survives.
fn viewport_rect(requested: (u32, u32), attachment: (u32, u32), centered: bool) -> [f32; 4] {
    let (aw, ah) = (attachment.0.max(1), attachment.1.max(1));
    let (rw, rh) = (requested.0.max(1), requested.1.max(1));
    let fit = (aw as f64 / rw as f64).min(ah as f64 / rh as f64).min(1.0);
    let w = ((rw as f64 * fit).round() as u32).clamp(1, aw);
    let h = ((rh as f64 * fit).round() as u32).clamp(1, ah);
    let (x, y) = if centered {
        ((aw - w) / 2, (ah - h) / 2)
    } else {
        (0, 0)
    };
    [x as f32, y as f32, w as f32, h as f32]
}

#[inline]
fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

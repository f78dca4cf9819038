// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The wgpu [`RenderBackend`] implementation.
//!
//! Native objects live in per-kind tables keyed by handle slot; the device
//! guarantees every handle it passes down has already been validated, so a
//! missing table entry here is a replay-time warning, never a panic.
//! Completion fences ride on `Queue::on_submitted_work_done`.

use super::context::WgpuContext;
use super::conversions::{depth_stencil_state, IntoWgpu};
use super::encoder::{RenderCommand, WgpuEncoder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessera_core::api::resource::Framebuffer;
use tessera_core::api::shader::{BindingKind, ResourceBinding};
use tessera_core::api::{
    AdapterInfo, BackendKind, BufferDescription, ClearValues, DeviceCapabilities, DeviceFeatures,
    DeviceOptions, DeviceType, FillMode, RenderTarget, SamplerDescription, TextureDescription,
    TextureFormat,
};
use tessera_core::error::{CompileError, DeviceError};
use tessera_core::math::{Extent3D, Origin3D};
use tessera_core::platform::SurfaceHandle;
use tessera_core::shader::{CompiledShaderSet, ShaderArtifact};
use tessera_core::traits::{CommandEncoder, FenceValue, PipelineDescription, RenderBackend};
use tessera_core::{
    BufferHandle, FramebufferHandle, PipelineHandle, SamplerHandle, ShaderHandle, TextureHandle,
};
use wgpu::util::DeviceExt;

/// Formats the abstract layer exposes; all of them are core wgpu formats
/// available on every adapter.
const SUPPORTED_FORMATS: [TextureFormat; 12] = [
    TextureFormat::R8Unorm,
    TextureFormat::Rg8Unorm,
    TextureFormat::Rgba8Unorm,
    TextureFormat::Rgba8UnormSrgb,
    TextureFormat::Bgra8Unorm,
    TextureFormat::Bgra8UnormSrgb,
    TextureFormat::R16Float,
    TextureFormat::Rgba16Float,
    TextureFormat::R32Float,
    TextureFormat::Rgba32Float,
    TextureFormat::Depth32Float,
    TextureFormat::Depth24PlusStencil8,
];

#[derive(Debug)]
struct TextureEntry {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

#[derive(Debug)]
struct ShaderEntry {
    vertex: wgpu::ShaderModule,
    vertex_entry: String,
    fragment: Option<(wgpu::ShaderModule, String)>,
}

#[derive(Debug)]
struct PipelineEntry {
    pipeline: wgpu::RenderPipeline,
    /// `None` when the shader takes no resources.
    layout: Option<wgpu::BindGroupLayout>,
    bindings: Vec<ResourceBinding>,
}

#[derive(Debug)]
struct FrameTarget {
    /// Present target; `None` when rendering headless.
    surface_texture: Option<wgpu::SurfaceTexture>,
    view: wgpu::TextureView,
}

/// What an encoder's current bind slot holds during replay.
#[derive(Debug, Clone, Copy)]
enum BoundResource {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Sampler(SamplerHandle),
}

/// The wgpu [`RenderBackend`].
pub struct WgpuBackend {
    context: WgpuContext,

    buffers: HashMap<u32, wgpu::Buffer>,
    textures: HashMap<u32, TextureEntry>,
    samplers: HashMap<u32, wgpu::Sampler>,
    framebuffers: HashMap<u32, Framebuffer>,
    shaders: HashMap<u32, ShaderEntry>,
    pipelines: HashMap<u32, PipelineEntry>,

    /// Headless backbuffer; `None` when a surface exists.
    offscreen: Option<TextureEntry>,
    frame: Option<FrameTarget>,

    submitted: u64,
    completed: Arc<AtomicU64>,
}

impl WgpuBackend {
    /// Initializes wgpu for `window` (headless when `None`), preferring the
    /// native API matching `kind`.
    pub fn new(
        kind: BackendKind,
        window: Option<SurfaceHandle>,
        options: &DeviceOptions,
    ) -> Result<Self, DeviceError> {
        let context = WgpuContext::new(kind, window, options)?;
        let offscreen = match context.surface {
            Some(_) => None,
            None => Some(Self::make_offscreen(&context)),
        };
        Ok(Self {
            context,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            framebuffers: HashMap::new(),
            shaders: HashMap::new(),
            pipelines: HashMap::new(),
            offscreen,
            frame: None,
            submitted: 0,
            completed: Arc::new(AtomicU64::new(0)),
        })
    }

    fn make_offscreen(context: &WgpuContext) -> TextureEntry {
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("headless backbuffer"),
            size: wgpu::Extent3d {
                width: context.surface_config.width,
                height: context.surface_config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: context.surface_config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        TextureEntry { texture, view }
    }

    /// Pops the innermost error scope, mapping a caught error into the
    /// shared taxonomy.
    fn finish_scope(&self, what: &str) -> Result<(), DeviceError> {
        match pollster::block_on(self.context.device.pop_error_scope()) {
            None => Ok(()),
            Some(wgpu::Error::OutOfMemory { .. }) => Err(DeviceError::ResourceExhaustion(
                format!("{what}: allocation refused"),
            )),
            Some(wgpu::Error::Validation { description, .. }) => Err(
                DeviceError::InvalidDescription(format!("{what}: {description}")),
            ),
            Some(wgpu::Error::Internal { description, .. }) => {
                Err(DeviceError::DeviceLost(format!("{what}: {description}")))
            }
        }
    }

    /// Builds the group-0 bind group layout a pipeline's reflection calls
    /// for, or `None` for shaders that take no resources.
    fn bind_group_layout(
        &self,
        label: Option<&str>,
        bindings: &[ResourceBinding],
    ) -> Option<wgpu::BindGroupLayout> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = bindings
            .iter()
            .filter(|binding| binding.group == 0)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding: binding.binding,
                visibility: binding.visibility.into_wgpu(),
                ty: match binding.kind {
                    BindingKind::UniformBuffer => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    BindingKind::StorageBuffer => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    BindingKind::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    BindingKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                },
                count: None,
            })
            .collect();
        if entries.is_empty() {
            return None;
        }
        if bindings.iter().any(|b| b.group != 0) {
            log::warn!(
                "pipeline {label:?}: reflection references bind groups beyond 0, \
                 which the encoder interface cannot bind"
            );
        }
        Some(
            self.context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label,
                    entries: &entries,
                }),
        )
    }

    /// Builds the bind group for the current slot assignments, `None` if a
    /// reflected binding has no resource bound yet.
    fn build_bind_group(
        &self,
        entry: &PipelineEntry,
        bound: &HashMap<u32, BoundResource>,
    ) -> Option<wgpu::BindGroup> {
        let layout = entry.layout.as_ref()?;
        let mut entries = Vec::with_capacity(entry.bindings.len());
        for binding in entry.bindings.iter().filter(|b| b.group == 0) {
            let resource = match (binding.kind, bound.get(&binding.binding)) {
                (
                    BindingKind::UniformBuffer | BindingKind::StorageBuffer,
                    Some(BoundResource::Buffer(handle)),
                ) => self
                    .buffers
                    .get(&handle.index())
                    .map(wgpu::Buffer::as_entire_binding),
                (BindingKind::Texture, Some(BoundResource::Texture(handle))) => self
                    .textures
                    .get(&handle.index())
                    .map(|t| wgpu::BindingResource::TextureView(&t.view)),
                (BindingKind::Sampler, Some(BoundResource::Sampler(handle))) => self
                    .samplers
                    .get(&handle.index())
                    .map(wgpu::BindingResource::Sampler),
                _ => None,
            };
            let Some(resource) = resource else {
                log::warn!(
                    "draw skipped: binding {} ('{}') has no matching resource bound",
                    binding.binding,
                    binding.name
                );
                return None;
            };
            entries.push(wgpu::BindGroupEntry {
                binding: binding.binding,
                resource,
            });
        }
        Some(
            self.context
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    label: None,
                    layout,
                    entries: &entries,
                }),
        )
    }

    /// Resolves a render target into cloned attachment views. Views are
    /// internally reference counted, so the clones are cheap and keep the
    /// attachments alive for the duration of the pass.
    fn resolve_attachments(
        &self,
        target: &RenderTarget,
    ) -> Option<(Vec<wgpu::TextureView>, Option<(wgpu::TextureView, bool)>)> {
        match target {
            RenderTarget::Backbuffer => {
                let Some(frame) = &self.frame else {
                    log::warn!("pass against the backbuffer with no acquired frame");
                    return None;
                };
                Some((vec![frame.view.clone()], None))
            }
            RenderTarget::Framebuffer(handle) => {
                let Some(record) = self.framebuffers.get(&handle.index()) else {
                    log::warn!("pass against an unknown framebuffer, skipped");
                    return None;
                };
                let mut colors = Vec::with_capacity(record.color_attachments.len());
                for attachment in &record.color_attachments {
                    colors.push(self.textures.get(&attachment.index())?.view.clone());
                }
                let depth = match record.depth_attachment {
                    Some(attachment) => {
                        let view = self.textures.get(&attachment.index())?.view.clone();
                        let stencil = record
                            .output
                            .depth_format
                            .is_some_and(|f| f.has_stencil());
                        Some((view, stencil))
                    }
                    None => None,
                };
                Some((colors, depth))
            }
        }
    }

    /// Replays one encoder's command list into real wgpu passes.
    fn replay(
        &self,
        out: &mut wgpu::CommandEncoder,
        label: Option<&str>,
        commands: Vec<RenderCommand>,
    ) {
        let mut index = 0;
        while index < commands.len() {
            let RenderCommand::BeginPass { target, clear } = &commands[index] else {
                log::warn!("command recorded before any render target, skipped");
                index += 1;
                continue;
            };
            index += 1;

            let Some((colors, depth)) = self.resolve_attachments(target) else {
                while index < commands.len()
                    && !matches!(commands[index], RenderCommand::BeginPass { .. })
                {
                    index += 1;
                }
                continue;
            };

            let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = colors
                .iter()
                .map(|view| {
                    Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: match clear {
                                Some(values) => wgpu::LoadOp::Clear(clear_color(values)),
                                None => wgpu::LoadOp::Load,
                            },
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })
                })
                .collect();
            let depth_stencil_attachment =
                depth
                    .as_ref()
                    .map(|(view, has_stencil)| wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: match clear {
                                Some(values) => wgpu::LoadOp::Clear(values.depth),
                                None => wgpu::LoadOp::Load,
                            },
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: has_stencil.then(|| wgpu::Operations {
                            load: match clear {
                                Some(values) => wgpu::LoadOp::Clear(values.stencil),
                                None => wgpu::LoadOp::Load,
                            },
                            store: wgpu::StoreOp::Store,
                        }),
                    });

            let mut pass = out.begin_render_pass(&wgpu::RenderPassDescriptor {
                label,
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut pipeline: Option<&PipelineEntry> = None;
            let mut bound: HashMap<u32, BoundResource> = HashMap::new();
            let mut group: Option<wgpu::BindGroup> = None;
            let mut group_dirty = true;

            while index < commands.len() {
                let command = &commands[index];
                if matches!(command, RenderCommand::BeginPass { .. }) {
                    break;
                }
                index += 1;

                match command {
                    RenderCommand::BeginPass { .. } => unreachable!(),
                    RenderCommand::SetViewport(v) => {
                        pass.set_viewport(v.x, v.y, v.width, v.height, v.min_depth, v.max_depth);
                    }
                    RenderCommand::SetScissor(r) => {
                        pass.set_scissor_rect(r.x, r.y, r.width, r.height);
                    }
                    RenderCommand::SetPipeline(handle) => {
                        match self.pipelines.get(&handle.index()) {
                            Some(entry) => {
                                pass.set_pipeline(&entry.pipeline);
                                pipeline = Some(entry);
                                group_dirty = true;
                            }
                            None => {
                                log::warn!("set_pipeline: unknown pipeline, draws will be skipped");
                                pipeline = None;
                            }
                        }
                    }
                    RenderCommand::BindVertexBuffer {
                        slot,
                        buffer,
                        offset,
                    } => match self.buffers.get(&buffer.index()) {
                        Some(b) => pass.set_vertex_buffer(*slot, b.slice(*offset..)),
                        None => log::warn!("bind_vertex_buffer: unknown buffer"),
                    },
                    RenderCommand::BindIndexBuffer {
                        buffer,
                        format,
                        offset,
                    } => match self.buffers.get(&buffer.index()) {
                        Some(b) => pass.set_index_buffer(b.slice(*offset..), format.into_wgpu()),
                        None => log::warn!("bind_index_buffer: unknown buffer"),
                    },
                    RenderCommand::BindUniformBuffer { slot, buffer } => {
                        bound.insert(*slot, BoundResource::Buffer(*buffer));
                        group_dirty = true;
                    }
                    RenderCommand::BindTexture {
                        slot,
                        texture,
                        sampler,
                    } => {
                        // The paired sampler lives at the next binding slot
                        // of the reflected layout.
                        bound.insert(*slot, BoundResource::Texture(*texture));
                        bound.insert(*slot + 1, BoundResource::Sampler(*sampler));
                        group_dirty = true;
                    }
                    RenderCommand::Draw { .. }
                    | RenderCommand::DrawIndexed { .. }
                    | RenderCommand::DrawIndirect { .. }
                    | RenderCommand::DrawIndexedIndirect { .. } => {
                        let Some(entry) = pipeline else {
                            log::warn!("draw skipped: no pipeline bound on this encoder");
                            continue;
                        };
                        if group_dirty {
                            group = self.build_bind_group(entry, &bound);
                            group_dirty = false;
                            if let Some(group) = &group {
                                pass.set_bind_group(0, group, &[]);
                            }
                        }
                        if entry.layout.is_some() && group.is_none() {
                            continue;
                        }
                        match command {
                            RenderCommand::Draw {
                                vertices,
                                instances,
                            } => pass.draw(vertices.clone(), instances.clone()),
                            RenderCommand::DrawIndexed {
                                indices,
                                base_vertex,
                                instances,
                            } => pass.draw_indexed(indices.clone(), *base_vertex, instances.clone()),
                            RenderCommand::DrawIndirect { buffer, offset } => {
                                match self.buffers.get(&buffer.index()) {
                                    Some(b) => pass.draw_indirect(b, *offset),
                                    None => log::warn!("draw_indirect: unknown buffer"),
                                }
                            }
                            RenderCommand::DrawIndexedIndirect { buffer, offset } => {
                                match self.buffers.get(&buffer.index()) {
                                    Some(b) => pass.draw_indexed_indirect(b, *offset),
                                    None => log::warn!("draw_indexed_indirect: unknown buffer"),
                                }
                            }
                            _ => unreachable!(),
                        }
                    }
                }
            }
        }
    }
}

fn clear_color(values: &ClearValues) -> wgpu::Color {
    wgpu::Color {
        r: values.color[0] as f64,
        g: values.color[1] as f64,
        b: values.color[2] as f64,
        a: values.color[3] as f64,
    }
}

fn shader_source(artifact: &ShaderArtifact) -> Result<wgpu::ShaderSource<'_>, DeviceError> {
    match artifact {
        ShaderArtifact::Text(wgsl) => Ok(wgpu::ShaderSource::Wgsl(wgsl.as_str().into())),
        ShaderArtifact::Binary(_) => Err(DeviceError::InvalidDescription(
            "the wgpu adapter consumes WGSL text, got binary shader artifact".into(),
        )),
    }
}

impl RenderBackend for WgpuBackend {
    fn capabilities(&self) -> DeviceCapabilities {
        let info = self.context.adapter.get_info();
        let mut features = DeviceFeatures::COMPUTE
            | DeviceFeatures::INDIRECT_DRAW
            | DeviceFeatures::MULTIPLE_RENDER_TARGETS
            | DeviceFeatures::ANISOTROPIC_FILTERING;
        if self
            .context
            .device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
        {
            features |= DeviceFeatures::WIREFRAME;
        }
        DeviceCapabilities {
            adapter: AdapterInfo {
                name: info.name.clone(),
                backend_kind: match info.backend {
                    wgpu::Backend::Vulkan => BackendKind::Vulkan,
                    wgpu::Backend::Metal => BackendKind::Metal,
                    wgpu::Backend::Gl => BackendKind::OpenGl,
                    _ => BackendKind::WebGpu,
                },
                device_type: match info.device_type {
                    wgpu::DeviceType::IntegratedGpu => DeviceType::IntegratedGpu,
                    wgpu::DeviceType::DiscreteGpu => DeviceType::DiscreteGpu,
                    wgpu::DeviceType::VirtualGpu => DeviceType::VirtualGpu,
                    wgpu::DeviceType::Cpu => DeviceType::Cpu,
                    wgpu::DeviceType::Other => DeviceType::Unknown,
                },
                api_version: if info.driver_info.is_empty() {
                    "unknown".to_string()
                } else {
                    info.driver_info.clone()
                },
            },
            features,
            supported_formats: SUPPORTED_FORMATS.to_vec(),
        }
    }

    fn shader_target(&self) -> BackendKind {
        // wgpu consumes WGSL whichever native API it sits on; the shader
        // cache keys on this, not on the adapter's reported backend.
        BackendKind::WebGpu
    }

    fn create_buffer(
        &mut self,
        handle: BufferHandle,
        desc: &BufferDescription<'_>,
        initial_data: Option<&[u8]>,
    ) -> Result<(), DeviceError> {
        self.context
            .device
            .push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = match initial_data {
            Some(contents) => {
                self.context
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: desc.label.as_deref(),
                        contents,
                        usage: desc.usage.into_wgpu(),
                    })
            }
            None => self.context.device.create_buffer(&wgpu::BufferDescriptor {
                label: desc.label.as_deref(),
                size: desc.size,
                usage: desc.usage.into_wgpu(),
                mapped_at_creation: false,
            }),
        };
        self.finish_scope("buffer creation")?;
        self.buffers.insert(handle.index(), buffer);
        Ok(())
    }

    fn destroy_buffer(&mut self, handle: BufferHandle) {
        let removed = self.buffers.remove(&handle.index());
        debug_assert!(removed.is_some(), "destroy of an unknown buffer");
    }

    fn write_buffer(
        &mut self,
        handle: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        let buffer = self
            .buffers
            .get(&handle.index())
            .ok_or(DeviceError::InvalidHandle { kind: "buffer" })?;
        self.context.queue.write_buffer(buffer, offset, data);
        Ok(())
    }

    fn create_texture(
        &mut self,
        handle: TextureHandle,
        desc: &TextureDescription<'_>,
    ) -> Result<(), DeviceError> {
        self.context
            .device
            .push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label.as_deref(),
            size: desc.size.into_wgpu(),
            mip_level_count: desc.mip_level_count,
            sample_count: desc.sample_count.as_u32(),
            dimension: desc.dimension.into_wgpu(),
            format: desc.format.into_wgpu(),
            usage: desc.usage.into_wgpu(),
            view_formats: &[],
        });
        self.finish_scope("texture creation")?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures
            .insert(handle.index(), TextureEntry { texture, view });
        Ok(())
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        let removed = self.textures.remove(&handle.index());
        debug_assert!(removed.is_some(), "destroy of an unknown texture");
    }

    fn write_texture(
        &mut self,
        handle: TextureHandle,
        data: &[u8],
        bytes_per_row: Option<u32>,
        origin: Origin3D,
        size: Extent3D,
    ) -> Result<(), DeviceError> {
        let entry = self
            .textures
            .get(&handle.index())
            .ok_or(DeviceError::InvalidHandle { kind: "texture" })?;
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: origin.into_wgpu(),
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row,
                rows_per_image: (size.depth_or_array_layers > 1).then_some(size.height),
            },
            size.into_wgpu(),
        );
        Ok(())
    }

    fn create_sampler(
        &mut self,
        handle: SamplerHandle,
        desc: &SamplerDescription<'_>,
    ) -> Result<(), DeviceError> {
        let sampler = self.context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: desc.label.as_deref(),
            address_mode_u: desc.address_mode_u.into_wgpu(),
            address_mode_v: desc.address_mode_v.into_wgpu(),
            address_mode_w: desc.address_mode_w.into_wgpu(),
            mag_filter: desc.mag_filter.into_wgpu(),
            min_filter: desc.min_filter.into_wgpu(),
            mipmap_filter: desc.mipmap_filter.into_wgpu(),
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            compare: desc.compare.map(IntoWgpu::into_wgpu),
            anisotropy_clamp: desc.anisotropy_clamp,
            border_color: None,
        });
        self.samplers.insert(handle.index(), sampler);
        Ok(())
    }

    fn destroy_sampler(&mut self, handle: SamplerHandle) {
        let removed = self.samplers.remove(&handle.index());
        debug_assert!(removed.is_some(), "destroy of an unknown sampler");
    }

    fn create_framebuffer(
        &mut self,
        handle: FramebufferHandle,
        record: &Framebuffer,
    ) -> Result<(), DeviceError> {
        // wgpu has no framebuffer object; passes are described per begin.
        // The validated record is all the replay needs.
        self.framebuffers.insert(handle.index(), record.clone());
        Ok(())
    }

    fn destroy_framebuffer(&mut self, handle: FramebufferHandle) {
        let removed = self.framebuffers.remove(&handle.index());
        debug_assert!(removed.is_some(), "destroy of an unknown framebuffer");
    }

    fn create_shader(
        &mut self,
        handle: ShaderHandle,
        compiled: &CompiledShaderSet,
    ) -> Result<(), DeviceError> {
        let vertex_source = shader_source(&compiled.vertex.artifact)?;
        let vertex = self
            .context
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&compiled.name),
                source: vertex_source,
            });
        let fragment = match &compiled.fragment {
            Some(stage) => {
                let source = shader_source(&stage.artifact)?;
                let module = self
                    .context
                    .device
                    .create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(&compiled.name),
                        source,
                    });
                Some((module, stage.entry_point.clone()))
            }
            None => None,
        };
        self.shaders.insert(
            handle.index(),
            ShaderEntry {
                vertex,
                vertex_entry: compiled.vertex.entry_point.clone(),
                fragment,
            },
        );
        Ok(())
    }

    fn destroy_shader(&mut self, handle: ShaderHandle) {
        let removed = self.shaders.remove(&handle.index());
        debug_assert!(removed.is_some(), "destroy of an unknown shader");
    }

    fn create_pipeline(
        &mut self,
        handle: PipelineHandle,
        desc: &PipelineDescription<'_>,
    ) -> Result<(), DeviceError> {
        let shader = self
            .shaders
            .get(&desc.shader.index())
            .ok_or(DeviceError::InvalidHandle { kind: "shader" })?;
        if desc.raster.fill_mode == FillMode::Wireframe
            && !self
                .context
                .device
                .features()
                .contains(wgpu::Features::POLYGON_MODE_LINE)
        {
            return Err(DeviceError::UnsupportedCapability(
                "wireframe rasterization".into(),
            ));
        }

        let layout = self.bind_group_layout(desc.label, desc.reflection);
        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = layout.iter().collect();
        let pipeline_layout =
            self.context
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: desc.label,
                    bind_group_layouts: &bind_group_layouts,
                    push_constant_ranges: &[],
                });

        let attribute_storage: Vec<Vec<wgpu::VertexAttribute>> = desc
            .vertex_layout
            .buffers
            .iter()
            .map(|buffer| {
                buffer
                    .attributes
                    .iter()
                    .map(|attr| wgpu::VertexAttribute {
                        format: attr.format.into_wgpu(),
                        offset: attr.offset,
                        shader_location: attr.shader_location,
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = desc
            .vertex_layout
            .buffers
            .iter()
            .zip(attribute_storage.iter())
            .map(|(buffer, attributes)| wgpu::VertexBufferLayout {
                array_stride: buffer.stride,
                step_mode: buffer.step_mode.into_wgpu(),
                attributes,
            })
            .collect();

        let targets: Vec<Option<wgpu::ColorTargetState>> = desc
            .output
            .color_formats
            .iter()
            .map(|format| {
                Some(wgpu::ColorTargetState {
                    format: format.into_wgpu(),
                    blend: desc.blend.into_wgpu(),
                    write_mask: desc.blend.write_mask.into_wgpu(),
                })
            })
            .collect();
        let depth_stencil = desc
            .output
            .depth_format
            .map(|format| depth_stencil_state(desc.depth, desc.stencil, format));

        self.context
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline =
            self.context
                .device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: desc.label,
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader.vertex,
                        entry_point: Some(&shader.vertex_entry),
                        buffers: &vertex_buffers,
                        compilation_options: Default::default(),
                    },
                    fragment: shader.fragment.as_ref().map(|(module, entry)| {
                        wgpu::FragmentState {
                            module,
                            entry_point: Some(entry),
                            targets: &targets,
                            compilation_options: Default::default(),
                        }
                    }),
                    primitive: desc.raster.into_wgpu(),
                    depth_stencil,
                    multisample: wgpu::MultisampleState {
                        count: desc.output.sample_count.as_u32(),
                        mask: !0,
                        alpha_to_coverage_enabled: false,
                    },
                    multiview: None,
                    cache: None,
                });
        if let Some(err) = pollster::block_on(self.context.device.pop_error_scope()) {
            let details = match err {
                wgpu::Error::Validation { description, .. } => description,
                other => other.to_string(),
            };
            return Err(DeviceError::Compilation(CompileError::ValidationFailed {
                name: desc.label.unwrap_or("pipeline").to_string(),
                details,
            }));
        }

        self.pipelines.insert(
            handle.index(),
            PipelineEntry {
                pipeline,
                layout,
                bindings: desc.reflection.to_vec(),
            },
        );
        Ok(())
    }

    fn destroy_pipeline(&mut self, handle: PipelineHandle) {
        let removed = self.pipelines.remove(&handle.index());
        debug_assert!(removed.is_some(), "destroy of an unknown pipeline");
    }

    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        // Pump completion callbacks from earlier submissions.
        if let Err(e) = self.context.device.poll(wgpu::PollType::Poll) {
            log::warn!("device poll failed: {e:?}");
        }

        let frame = match &self.context.surface {
            Some(surface) => {
                let surface_texture = match surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                        log::warn!("swap chain lost or outdated, reconfiguring");
                        surface.configure(&self.context.device, &self.context.surface_config);
                        surface.get_current_texture().map_err(|e| {
                            DeviceError::DeviceLost(format!("swap chain unrecoverable: {e}"))
                        })?
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        return Err(DeviceError::ResourceExhaustion(
                            "swap chain out of memory".into(),
                        ))
                    }
                    Err(e) => {
                        return Err(DeviceError::DeviceLost(format!("swap chain: {e}")))
                    }
                };
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                FrameTarget {
                    surface_texture: Some(surface_texture),
                    view,
                }
            }
            None => FrameTarget {
                surface_texture: None,
                view: self
                    .offscreen
                    .as_ref()
                    .expect("headless backbuffer exists")
                    .view
                    .clone(),
            },
        };
        self.frame = Some(frame);
        Ok(())
    }

    fn create_encoder(&mut self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(WgpuEncoder::new(label))
    }

    fn submit(&mut self, mut encoders: Vec<Box<dyn CommandEncoder>>) -> FenceValue {
        let mut out = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame submission"),
            });
        for boxed in &mut encoders {
            match boxed.as_any_mut().downcast_mut::<WgpuEncoder>() {
                Some(encoder) => {
                    let label = encoder.label().map(str::to_string);
                    let commands = encoder.take_commands();
                    self.replay(&mut out, label.as_deref(), commands);
                }
                None => log::warn!("submit: encoder from another backend ignored"),
            }
        }
        self.context.queue.submit(std::iter::once(out.finish()));

        self.submitted += 1;
        let value = self.submitted;
        let completed = Arc::clone(&self.completed);
        self.context.queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::AcqRel);
        });
        FenceValue(value)
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        match self.frame.take() {
            Some(FrameTarget {
                surface_texture: Some(texture),
                ..
            }) => texture.present(),
            Some(_) => {} // Headless: nothing to flip.
            None => log::warn!("present with no acquired frame"),
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        if self.context.surface.is_none() {
            self.offscreen = Some(Self::make_offscreen(&self.context));
        }
        log::debug!("swap chain resized to {width}x{height}");
    }

    fn pending_fence(&self) -> FenceValue {
        FenceValue(self.submitted + 1)
    }

    fn completed_fence(&self) -> FenceValue {
        FenceValue(self.completed.load(Ordering::Acquire))
    }

    fn wait_for_idle(&mut self) {
        if let Err(e) = self.context.device.poll(wgpu::PollType::Wait) {
            log::warn!("device poll failed while waiting for idle: {e:?}");
        }
        self.completed.fetch_max(self.submitted, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("context", &self.context)
            .field("buffers", &self.buffers.len())
            .field("textures", &self.textures.len())
            .field("pipelines", &self.pipelines.len())
            .field("submitted", &self.submitted)
            .finish()
    }
}

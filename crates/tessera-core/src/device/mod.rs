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

//! The device interface: the sole contract between frontend rendering code
//! and any backend.

mod destruction;

use crate::api::enums::{BackendKind, IndexFormat, SampleCount, ShaderStage};
use crate::api::framebuffer::{ClearValues, RenderTarget};
use crate::api::pipeline::{OutputFormat, PipelineKey};
use crate::api::resource::{
    Buffer, BufferHandle, Framebuffer, FramebufferHandle, Pipeline, PipelineHandle, Sampler,
    SamplerHandle, Shader, ShaderHandle, Texture, TextureHandle,
};
use crate::api::{
    BufferDescription, BufferUsage, DeviceCapabilities, DeviceFeatures, DeviceOptions,
    FramebufferDescription, SamplerDescription, ShaderDescription, TextureDescription,
    TextureUsage,
};
use crate::error::{contract_violation, DeviceError};
use crate::handle::ResourcePool;
use crate::math::{Extent3D, Origin3D, ScissorRect, Viewport};
use crate::shader::{CompiledShaderSet, ShaderCache};
use crate::traits::{CommandEncoder, PipelineDescription, RenderBackend};
use destruction::{DestructionQueue, Zombie};
use std::collections::HashMap;
use std::ops::Range;

/// Counters for the frame that just ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Index of the frame, starting at 1 for the first `begin_frame`.
    pub frame_index: u64,
    /// Draw calls recorded across every submitted encoder.
    pub draw_calls: u32,
    /// Encoders submitted, including the primary recorder.
    pub encoders_submitted: u32,
}

/// Per-frame recording state: the primary encoder, parallel encoders
/// awaiting submission, and the bind tracking that backs contract checks.
struct FrameState {
    recording: bool,
    frame_index: u64,
    primary: Option<Box<dyn CommandEncoder>>,
    merged: Vec<Box<dyn CommandEncoder>>,
    target_bound: bool,
    pipeline_bound: bool,
    index_bound: bool,
}

impl FrameState {
    fn new() -> Self {
        Self {
            recording: false,
            frame_index: 0,
            primary: None,
            merged: Vec::new(),
            target_bound: false,
            pipeline_bound: false,
            index_bound: false,
        }
    }
}

/// The graphics device.
///
/// Owns the handle pools, the shader and pipeline caches and the deferred
/// destruction queue; delegates native work to the backend adapter chosen
/// once at creation. Creation and destruction calls must stay on the
/// thread driving `begin_frame`/`end_frame`; parallel recording happens on
/// encoders obtained from [`Device::create_encoder`].
pub struct Device {
    backend: Box<dyn RenderBackend>,
    capabilities: DeviceCapabilities,

    buffers: ResourcePool<Buffer>,
    textures: ResourcePool<Texture>,
    samplers: ResourcePool<Sampler>,
    framebuffers: ResourcePool<Framebuffer>,
    shaders: ResourcePool<Shader>,
    pipelines: ResourcePool<Pipeline>,

    pipeline_cache: HashMap<PipelineKey, PipelineHandle>,
    shader_cache: ShaderCache,
    destruction: DestructionQueue,

    frame: FrameState,
    last_stats: FrameStats,
}

impl Device {
    /// Wraps an adapter into a device. Called by the factory; frontends
    /// normally go through `create_device` in the adapter crate.
    pub fn new(
        backend: Box<dyn RenderBackend>,
        options: &DeviceOptions,
    ) -> Result<Self, DeviceError> {
        let capabilities = backend.capabilities();
        let shader_cache = match &options.shader_cache_dir {
            Some(dir) => ShaderCache::with_dir(dir.clone())?,
            None => ShaderCache::in_memory(),
        };
        log::info!(
            "device created on {} ({}, {})",
            capabilities.adapter.name,
            capabilities.adapter.backend_kind,
            capabilities.adapter.api_version
        );
        Ok(Self {
            backend,
            capabilities,
            buffers: ResourcePool::new(),
            textures: ResourcePool::new(),
            samplers: ResourcePool::new(),
            framebuffers: ResourcePool::new(),
            shaders: ResourcePool::new(),
            pipelines: ResourcePool::new(),
            pipeline_cache: HashMap::new(),
            shader_cache,
            destruction: DestructionQueue::default(),
            frame: FrameState::new(),
            last_stats: FrameStats::default(),
        })
    }

    // --- Capability query ---

    /// What the active backend supports.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// The shader representation the active backend consumes.
    pub fn shader_target(&self) -> BackendKind {
        self.backend.shader_target()
    }

    /// Stats of the most recently ended frame.
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Shader cache hit/miss counters.
    pub fn shader_cache_stats(&self) -> crate::shader::CacheStats {
        self.shader_cache.stats()
    }

    // --- Resource lifecycle: buffers ---

    /// Creates a buffer.
    pub fn create_buffer(
        &mut self,
        desc: &BufferDescription<'_>,
    ) -> Result<BufferHandle, DeviceError> {
        self.validate_buffer_description(desc, None)?;
        let handle = self.buffers.allocate(Buffer {
            size: desc.size,
            usage: desc.usage,
        });
        if let Err(e) = self.backend.create_buffer(handle, desc, None) {
            self.buffers.release(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Creates a buffer initialized with `data`. More efficient than
    /// create-then-write for static geometry.
    pub fn create_buffer_with_data(
        &mut self,
        desc: &BufferDescription<'_>,
        data: &[u8],
    ) -> Result<BufferHandle, DeviceError> {
        self.validate_buffer_description(desc, Some(data))?;
        let handle = self.buffers.allocate(Buffer {
            size: desc.size,
            usage: desc.usage,
        });
        if let Err(e) = self.backend.create_buffer(handle, desc, Some(data)) {
            self.buffers.release(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Destroys a buffer. The handle is invalid immediately; the native
    /// buffer is released once the GPU is done with it. Destroying an
    /// already-destroyed handle is a no-op.
    pub fn destroy_buffer(&mut self, handle: BufferHandle) {
        if self.buffers.invalidate(handle).is_some() {
            self.destruction
                .defer(Zombie::Buffer(handle), self.backend.pending_fence());
        }
    }

    /// Uploads `data` into a buffer at `offset`, bounds-checked against
    /// the buffer's size.
    pub fn write_buffer(
        &mut self,
        handle: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        let buffer = self
            .buffers
            .try_get(handle)
            .ok_or(DeviceError::InvalidHandle { kind: "buffer" })?;
        if !buffer.usage.contains(BufferUsage::COPY_DST) {
            return Err(DeviceError::InvalidDescription(
                "buffer was not created with COPY_DST usage".into(),
            ));
        }
        let end = offset
            .checked_add(data.len() as u64)
            .filter(|end| *end <= buffer.size);
        if end.is_none() {
            return Err(DeviceError::InvalidDescription(format!(
                "write of {} bytes at offset {} overruns buffer of {} bytes",
                data.len(),
                offset,
                buffer.size
            )));
        }
        self.backend.write_buffer(handle, offset, data)
    }

    // --- Resource lifecycle: textures and samplers ---

    /// Creates a texture.
    pub fn create_texture(
        &mut self,
        desc: &TextureDescription<'_>,
    ) -> Result<TextureHandle, DeviceError> {
        self.validate_texture_description(desc)?;
        let handle = self.textures.allocate(Texture {
            size: desc.size,
            format: desc.format,
            dimension: desc.dimension,
            mip_level_count: desc.mip_level_count,
            sample_count: desc.sample_count,
            usage: desc.usage,
        });
        if let Err(e) = self.backend.create_texture(handle, desc) {
            self.textures.release(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Destroys a texture (deferred; see [`Device::destroy_buffer`]).
    pub fn destroy_texture(&mut self, handle: TextureHandle) {
        if self.textures.invalidate(handle).is_some() {
            self.destruction
                .defer(Zombie::Texture(handle), self.backend.pending_fence());
        }
    }

    /// Uploads texel data into a region of a texture.
    pub fn write_texture(
        &mut self,
        handle: TextureHandle,
        data: &[u8],
        bytes_per_row: Option<u32>,
        origin: Origin3D,
        size: Extent3D,
    ) -> Result<(), DeviceError> {
        let texture = self
            .textures
            .try_get(handle)
            .ok_or(DeviceError::InvalidHandle { kind: "texture" })?;
        if !texture.usage.contains(TextureUsage::COPY_DST) {
            return Err(DeviceError::InvalidDescription(
                "texture was not created with COPY_DST usage".into(),
            ));
        }
        let in_bounds = origin.x + size.width <= texture.size.width
            && origin.y + size.height <= texture.size.height
            && origin.z + size.depth_or_array_layers <= texture.size.depth_or_array_layers;
        if size.is_degenerate() || !in_bounds {
            return Err(DeviceError::InvalidDescription(
                "texture write region out of bounds".into(),
            ));
        }
        if let Some(bpt) = texture.format.bytes_per_texel() {
            let row = bytes_per_row.unwrap_or(size.width * bpt) as u64;
            let needed = row * (size.height as u64) * (size.depth_or_array_layers as u64);
            if (data.len() as u64) < needed {
                return Err(DeviceError::InvalidDescription(format!(
                    "texture write needs {needed} bytes, got {}",
                    data.len()
                )));
            }
        }
        self.backend
            .write_texture(handle, data, bytes_per_row, origin, size)
    }

    /// Creates a sampler.
    pub fn create_sampler(
        &mut self,
        desc: &SamplerDescription<'_>,
    ) -> Result<SamplerHandle, DeviceError> {
        if desc.anisotropy_clamp == 0 {
            return Err(DeviceError::InvalidDescription(
                "anisotropy_clamp must be at least 1".into(),
            ));
        }
        if desc.anisotropy_clamp > 1
            && !self.capabilities.supports(DeviceFeatures::ANISOTROPIC_FILTERING)
        {
            return Err(DeviceError::UnsupportedCapability(
                "anisotropic filtering".into(),
            ));
        }
        let handle = self.samplers.allocate(Sampler::default());
        if let Err(e) = self.backend.create_sampler(handle, desc) {
            self.samplers.release(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Destroys a sampler (deferred).
    pub fn destroy_sampler(&mut self, handle: SamplerHandle) {
        if self.samplers.invalidate(handle).is_some() {
            self.destruction
                .defer(Zombie::Sampler(handle), self.backend.pending_fence());
        }
    }

    // --- Resource lifecycle: framebuffers ---

    /// Creates a framebuffer from previously created attachments, checking
    /// that they exist, have compatible usages, and share one extent and
    /// sample count.
    pub fn create_framebuffer(
        &mut self,
        desc: &FramebufferDescription<'_>,
    ) -> Result<FramebufferHandle, DeviceError> {
        let record = self.validate_framebuffer_description(desc)?;
        let backend_view = record.clone();
        let handle = self.framebuffers.allocate(record);
        if let Err(e) = self.backend.create_framebuffer(handle, &backend_view) {
            self.framebuffers.release(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Destroys a framebuffer (deferred). The attachments are not owned by
    /// the framebuffer and stay alive.
    pub fn destroy_framebuffer(&mut self, handle: FramebufferHandle) {
        if self.framebuffers.invalidate(handle).is_some() {
            self.destruction
                .defer(Zombie::Framebuffer(handle), self.backend.pending_fence());
        }
    }

    // --- Resource lifecycle: shaders and pipelines ---

    /// Creates a shader set from portable bytecode, going through the
    /// shader cache: a repeat creation with identical bytecode performs no
    /// cross-compilation work.
    pub fn create_shader(
        &mut self,
        desc: &ShaderDescription<'_>,
    ) -> Result<ShaderHandle, DeviceError> {
        if desc.vertex_bytecode.is_empty() {
            return Err(DeviceError::InvalidDescription(
                "vertex bytecode must not be empty".into(),
            ));
        }
        let target = self.backend.shader_target();
        let vertex = self.shader_cache.get_or_compile(
            &desc.name,
            &desc.vertex_bytecode,
            ShaderStage::Vertex,
            target,
        )?;
        let fragment = match &desc.fragment_bytecode {
            Some(bytecode) => Some(self.shader_cache.get_or_compile(
                &desc.name,
                bytecode,
                ShaderStage::Fragment,
                target,
            )?),
            None => None,
        };

        let compiled = CompiledShaderSet {
            name: desc.name.to_string(),
            target,
            vertex: vertex.as_stage(),
            fragment: fragment.map(|entry| entry.as_stage()),
        };
        let reflection = compiled.merged_reflection();

        let handle = self.shaders.allocate(Shader {
            name: desc.name.to_string(),
            target,
            reflection,
        });
        if let Err(e) = self.backend.create_shader(handle, &compiled) {
            self.shaders.release(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Destroys a shader set (deferred). Pipelines already created from it
    /// keep working; new pipeline requests against it fail.
    pub fn destroy_shader(&mut self, handle: ShaderHandle) {
        if self.shaders.invalidate(handle).is_some() {
            self.destruction
                .defer(Zombie::Shader(handle), self.backend.pending_fence());
        }
    }

    /// Returns the pipeline for `key`, creating it on first request.
    ///
    /// A cache hit returns the existing handle with no backend
    /// interaction; a typical frame resolves every draw through hits.
    pub fn get_or_create_pipeline(
        &mut self,
        key: &PipelineKey,
    ) -> Result<PipelineHandle, DeviceError> {
        if let Some(&handle) = self.pipeline_cache.get(key) {
            debug_assert!(self.pipelines.contains(handle));
            return Ok(handle);
        }

        let shader = self
            .shaders
            .try_get(key.shader)
            .ok_or(DeviceError::InvalidHandle { kind: "shader" })?;
        if key.output.color_formats.len() > 1
            && !self
                .capabilities
                .supports(DeviceFeatures::MULTIPLE_RENDER_TARGETS)
        {
            return Err(DeviceError::UnsupportedCapability(
                "multiple render targets".into(),
            ));
        }

        let handle = self.pipelines.allocate(Pipeline { key: key.clone() });
        let desc = PipelineDescription {
            label: Some(shader.name.as_str()),
            shader: key.shader,
            reflection: &shader.reflection,
            raster: key.raster,
            depth: key.depth,
            blend: key.blend,
            stencil: key.stencil,
            vertex_layout: &key.vertex_layout,
            output: &key.output,
        };
        if let Err(e) = self.backend.create_pipeline(handle, &desc) {
            self.pipelines.release(handle);
            return Err(e);
        }
        log::debug!(
            "pipeline created for shader '{}' ({} cached)",
            shader.name,
            self.pipeline_cache.len() + 1
        );
        self.pipeline_cache.insert(key.clone(), handle);
        Ok(handle)
    }

    /// Destroys a pipeline (deferred) and evicts its cache key, so a later
    /// request with the same key recreates it.
    pub fn destroy_pipeline(&mut self, handle: PipelineHandle) {
        if let Some(record) = self.pipelines.invalidate(handle) {
            self.pipeline_cache.remove(&record.key);
            self.destruction
                .defer(Zombie::Pipeline(handle), self.backend.pending_fence());
        }
    }

    // --- Frame lifecycle ---

    /// Starts a frame. This is the sole point at which the deferred
    /// destruction queue is drained: entries whose GPU work has completed
    /// release their native resources and return their pool slots.
    pub fn begin_frame(&mut self) -> Result<(), DeviceError> {
        if self.frame.recording {
            return Err(contract_violation("begin_frame inside an open frame"));
        }
        self.backend.begin_frame()?;

        let completed = self.backend.completed_fence();
        let released = self.destruction.drain_completed(completed);
        if !released.is_empty() {
            log::debug!(
                "releasing {} deferred resources ({} still pending)",
                released.len(),
                self.destruction.len()
            );
        }
        for zombie in released {
            match zombie {
                Zombie::Buffer(h) => {
                    self.backend.destroy_buffer(h);
                    self.buffers.reclaim(h.index());
                }
                Zombie::Texture(h) => {
                    self.backend.destroy_texture(h);
                    self.textures.reclaim(h.index());
                }
                Zombie::Sampler(h) => {
                    self.backend.destroy_sampler(h);
                    self.samplers.reclaim(h.index());
                }
                Zombie::Framebuffer(h) => {
                    self.backend.destroy_framebuffer(h);
                    self.framebuffers.reclaim(h.index());
                }
                Zombie::Shader(h) => {
                    self.backend.destroy_shader(h);
                    self.shaders.reclaim(h.index());
                }
                Zombie::Pipeline(h) => {
                    self.backend.destroy_pipeline(h);
                    self.pipelines.reclaim(h.index());
                }
            }
        }

        self.frame.frame_index += 1;
        self.frame.primary = Some(self.backend.create_encoder(Some("primary")));
        self.frame.merged.clear();
        self.frame.recording = true;
        self.frame.target_bound = false;
        self.frame.pipeline_bound = false;
        self.frame.index_bound = false;
        Ok(())
    }

    /// Ends the frame: submits the primary recorder followed by every
    /// encoder handed to [`Device::submit_encoders`], in that order.
    pub fn end_frame(&mut self) -> Result<FrameStats, DeviceError> {
        if !self.frame.recording {
            return Err(contract_violation("end_frame without begin_frame"));
        }
        let primary = self.frame.primary.take().expect("primary encoder present");
        let mut encoders = Vec::with_capacity(1 + self.frame.merged.len());
        encoders.push(primary);
        encoders.append(&mut self.frame.merged);

        let draw_calls: u32 = encoders.iter().map(|e| e.draw_count()).sum();
        let encoders_submitted = encoders.len() as u32;
        self.backend.submit(encoders);
        self.frame.recording = false;

        self.last_stats = FrameStats {
            frame_index: self.frame.frame_index,
            draw_calls,
            encoders_submitted,
        };
        Ok(self.last_stats)
    }

    /// Presents the last ended frame. May block briefly on backends with
    /// bounded swap-chain queues.
    pub fn present(&mut self) -> Result<(), DeviceError> {
        if self.frame.recording {
            return Err(contract_violation("present inside an open frame"));
        }
        if self.frame.frame_index == 0 {
            return Err(contract_violation("present before the first frame"));
        }
        self.backend.present()
    }

    /// Reconfigures the swap chain. Legal only between frames.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        if self.frame.recording {
            return Err(contract_violation("resize inside an open frame"));
        }
        if width == 0 || height == 0 {
            return Err(DeviceError::InvalidDescription(
                "swap-chain dimensions must be non-zero".into(),
            ));
        }
        self.backend.resize(width, height);
        Ok(())
    }

    /// Blocks until all submitted GPU work completes. Used for clean
    /// shutdown and synchronous read-back.
    pub fn wait_for_idle(&mut self) {
        self.backend.wait_for_idle();
    }

    // --- Parallel recording ---

    /// Creates an additional command encoder for parallel recording on a
    /// worker thread. Encoders from one frame must be passed back to
    /// [`Device::submit_encoders`] before `end_frame`.
    pub fn create_encoder(
        &mut self,
        label: Option<&str>,
    ) -> Result<Box<dyn CommandEncoder>, DeviceError> {
        if !self.frame.recording {
            return Err(contract_violation("create_encoder outside an open frame"));
        }
        Ok(self.backend.create_encoder(label))
    }

    /// Queues parallel encoders for submission. Their GPU execution order
    /// is exactly the order of `encoders` here (after the primary
    /// recorder), regardless of wall-clock recording order.
    pub fn submit_encoders(
        &mut self,
        encoders: Vec<Box<dyn CommandEncoder>>,
    ) -> Result<(), DeviceError> {
        if !self.frame.recording {
            return Err(contract_violation("submit_encoders outside an open frame"));
        }
        self.frame.merged.extend(encoders);
        Ok(())
    }

    // --- Draw submission (single-threaded recording mode) ---

    /// Begins (or restarts) a pass on the primary recorder. Binding state
    /// is per-pass: pipeline and index-buffer binds must be re-issued
    /// after a target change.
    pub fn set_render_target(
        &mut self,
        target: RenderTarget,
        clear: Option<ClearValues>,
    ) -> Result<(), DeviceError> {
        if !self.frame.recording {
            return Err(contract_violation("draw-path call outside an open frame"));
        }
        if let RenderTarget::Framebuffer(handle) = target {
            if !self.framebuffers.contains(handle) {
                return Err(DeviceError::InvalidHandle {
                    kind: "framebuffer",
                });
            }
        }
        self.frame.target_bound = true;
        self.frame.pipeline_bound = false;
        self.frame.index_bound = false;
        self.primary().set_render_target(target, clear);
        Ok(())
    }

    /// Sets the viewport on the primary recorder.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), DeviceError> {
        self.ensure_pass_open()?;
        self.primary().set_viewport(viewport);
        Ok(())
    }

    /// Sets the scissor rectangle on the primary recorder.
    pub fn set_scissor(&mut self, rect: ScissorRect) -> Result<(), DeviceError> {
        self.ensure_pass_open()?;
        self.primary().set_scissor(rect);
        Ok(())
    }

    /// Binds a pipeline on the primary recorder.
    pub fn set_pipeline(&mut self, pipeline: PipelineHandle) -> Result<(), DeviceError> {
        self.ensure_pass_open()?;
        if !self.pipelines.contains(pipeline) {
            return Err(DeviceError::InvalidHandle { kind: "pipeline" });
        }
        self.frame.pipeline_bound = true;
        self.primary().set_pipeline(pipeline);
        Ok(())
    }

    /// Binds a vertex buffer on the primary recorder.
    pub fn bind_vertex_buffer(
        &mut self,
        slot: u32,
        buffer: BufferHandle,
        offset: u64,
    ) -> Result<(), DeviceError> {
        self.ensure_pass_open()?;
        self.ensure_buffer_usage(buffer, BufferUsage::VERTEX)?;
        self.primary().bind_vertex_buffer(slot, buffer, offset);
        Ok(())
    }

    /// Binds the index buffer on the primary recorder.
    pub fn bind_index_buffer(
        &mut self,
        buffer: BufferHandle,
        format: IndexFormat,
        offset: u64,
    ) -> Result<(), DeviceError> {
        self.ensure_pass_open()?;
        self.ensure_buffer_usage(buffer, BufferUsage::INDEX)?;
        self.frame.index_bound = true;
        self.primary().bind_index_buffer(buffer, format, offset);
        Ok(())
    }

    /// Binds a uniform buffer on the primary recorder.
    pub fn bind_uniform_buffer(
        &mut self,
        slot: u32,
        buffer: BufferHandle,
    ) -> Result<(), DeviceError> {
        self.ensure_pass_open()?;
        self.ensure_buffer_usage(buffer, BufferUsage::UNIFORM)?;
        self.primary().bind_uniform_buffer(slot, buffer);
        Ok(())
    }

    /// Binds a texture and its sampler on the primary recorder.
    pub fn bind_texture(
        &mut self,
        slot: u32,
        texture: TextureHandle,
        sampler: SamplerHandle,
    ) -> Result<(), DeviceError> {
        self.ensure_pass_open()?;
        let record = self
            .textures
            .try_get(texture)
            .ok_or(DeviceError::InvalidHandle { kind: "texture" })?;
        if !record.usage.contains(TextureUsage::SAMPLED) {
            return Err(DeviceError::InvalidDescription(
                "texture was not created with SAMPLED usage".into(),
            ));
        }
        if !self.samplers.contains(sampler) {
            return Err(DeviceError::InvalidHandle { kind: "sampler" });
        }
        self.primary().bind_texture(slot, texture, sampler);
        Ok(())
    }

    /// Records a non-indexed draw on the primary recorder.
    pub fn draw(
        &mut self,
        vertices: Range<u32>,
        instances: Range<u32>,
    ) -> Result<(), DeviceError> {
        self.ensure_draw_ready()?;
        self.primary().draw(vertices, instances);
        Ok(())
    }

    /// Records an indexed draw on the primary recorder.
    pub fn draw_indexed(
        &mut self,
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    ) -> Result<(), DeviceError> {
        self.ensure_draw_ready()?;
        if !self.frame.index_bound {
            return Err(contract_violation("draw_indexed without an index buffer"));
        }
        self.primary().draw_indexed(indices, base_vertex, instances);
        Ok(())
    }

    /// Records an indirect draw on the primary recorder.
    pub fn draw_indirect(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
    ) -> Result<(), DeviceError> {
        self.ensure_draw_ready()?;
        self.ensure_indirect(buffer)?;
        self.primary().draw_indirect(buffer, offset);
        Ok(())
    }

    /// Records an indexed indirect draw on the primary recorder.
    pub fn draw_indexed_indirect(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
    ) -> Result<(), DeviceError> {
        self.ensure_draw_ready()?;
        if !self.frame.index_bound {
            return Err(contract_violation(
                "draw_indexed_indirect without an index buffer",
            ));
        }
        self.ensure_indirect(buffer)?;
        self.primary().draw_indexed_indirect(buffer, offset);
        Ok(())
    }

    // --- Internal helpers ---

    fn primary(&mut self) -> &mut dyn CommandEncoder {
        self.frame
            .primary
            .as_deref_mut()
            .expect("recording state checked by caller")
    }

    fn ensure_pass_open(&self) -> Result<(), DeviceError> {
        if !self.frame.recording {
            return Err(contract_violation("draw-path call outside an open frame"));
        }
        if !self.frame.target_bound {
            return Err(contract_violation("draw-path call with no render target set"));
        }
        Ok(())
    }

    fn ensure_draw_ready(&self) -> Result<(), DeviceError> {
        self.ensure_pass_open()?;
        if !self.frame.pipeline_bound {
            return Err(contract_violation("draw without a pipeline bound"));
        }
        Ok(())
    }

    fn ensure_buffer_usage(
        &self,
        handle: BufferHandle,
        usage: BufferUsage,
    ) -> Result<(), DeviceError> {
        let buffer = self
            .buffers
            .try_get(handle)
            .ok_or(DeviceError::InvalidHandle { kind: "buffer" })?;
        if !buffer.usage.contains(usage) {
            return Err(DeviceError::InvalidDescription(format!(
                "buffer lacks required usage {usage:?}"
            )));
        }
        Ok(())
    }

    fn ensure_indirect(&self, buffer: BufferHandle) -> Result<(), DeviceError> {
        if !self.capabilities.supports(DeviceFeatures::INDIRECT_DRAW) {
            return Err(DeviceError::UnsupportedCapability("indirect draw".into()));
        }
        self.ensure_buffer_usage(buffer, BufferUsage::INDIRECT)
    }

    fn validate_buffer_description(
        &self,
        desc: &BufferDescription<'_>,
        data: Option<&[u8]>,
    ) -> Result<(), DeviceError> {
        if desc.size == 0 {
            return Err(DeviceError::InvalidDescription(
                "buffer size must be non-zero".into(),
            ));
        }
        if desc.usage.is_empty() {
            return Err(DeviceError::InvalidDescription(
                "buffer usage must not be empty".into(),
            ));
        }
        if let Some(data) = data {
            if data.len() as u64 != desc.size {
                return Err(DeviceError::InvalidDescription(format!(
                    "initial data is {} bytes but the buffer is {}",
                    data.len(),
                    desc.size
                )));
            }
        }
        Ok(())
    }

    fn validate_texture_description(
        &self,
        desc: &TextureDescription<'_>,
    ) -> Result<(), DeviceError> {
        if desc.size.is_degenerate() {
            return Err(DeviceError::InvalidDescription(
                "texture extent must be non-zero in every dimension".into(),
            ));
        }
        if desc.mip_level_count == 0 {
            return Err(DeviceError::InvalidDescription(
                "mip_level_count must be at least 1".into(),
            ));
        }
        if desc.usage.is_empty() {
            return Err(DeviceError::InvalidDescription(
                "texture usage must not be empty".into(),
            ));
        }
        if !self.capabilities.supports_format(desc.format) {
            return Err(DeviceError::UnsupportedCapability(format!(
                "texture format {:?}",
                desc.format
            )));
        }
        Ok(())
    }

    fn validate_framebuffer_description(
        &self,
        desc: &FramebufferDescription<'_>,
    ) -> Result<Framebuffer, DeviceError> {
        if desc.color_attachments.is_empty() && desc.depth_attachment.is_none() {
            return Err(DeviceError::InvalidDescription(
                "framebuffer needs at least one attachment".into(),
            ));
        }
        if desc.color_attachments.len() > 1
            && !self
                .capabilities
                .supports(DeviceFeatures::MULTIPLE_RENDER_TARGETS)
        {
            return Err(DeviceError::UnsupportedCapability(
                "multiple render targets".into(),
            ));
        }

        let mut extent: Option<Extent3D> = None;
        let mut sample_count: Option<SampleCount> = None;
        let mut check = |texture: &Texture| -> Result<(), DeviceError> {
            match extent {
                None => extent = Some(texture.size),
                Some(e) if e != texture.size => {
                    return Err(DeviceError::InvalidDescription(
                        "framebuffer attachments differ in extent".into(),
                    ))
                }
                Some(_) => {}
            }
            match sample_count {
                None => sample_count = Some(texture.sample_count),
                Some(s) if s != texture.sample_count => {
                    return Err(DeviceError::InvalidDescription(
                        "framebuffer attachments differ in sample count".into(),
                    ))
                }
                Some(_) => {}
            }
            Ok(())
        };

        let mut color_formats = Vec::with_capacity(desc.color_attachments.len());
        for &handle in &desc.color_attachments {
            let texture = self
                .textures
                .try_get(handle)
                .ok_or(DeviceError::InvalidHandle { kind: "texture" })?;
            if texture.format.is_depth_format()
                || !texture.usage.contains(TextureUsage::RENDER_TARGET)
            {
                return Err(DeviceError::InvalidDescription(
                    "color attachment must be a RENDER_TARGET color texture".into(),
                ));
            }
            check(texture)?;
            color_formats.push(texture.format);
        }

        let mut depth_format = None;
        if let Some(handle) = desc.depth_attachment {
            let texture = self
                .textures
                .try_get(handle)
                .ok_or(DeviceError::InvalidHandle { kind: "texture" })?;
            if !texture.format.is_depth_format()
                || !texture.usage.contains(TextureUsage::DEPTH_STENCIL)
            {
                return Err(DeviceError::InvalidDescription(
                    "depth attachment must be a DEPTH_STENCIL depth texture".into(),
                ));
            }
            check(texture)?;
            depth_format = Some(texture.format);
        }

        Ok(Framebuffer {
            color_attachments: desc.color_attachments.clone(),
            depth_attachment: desc.depth_attachment,
            extent: extent.expect("at least one attachment"),
            output: OutputFormat {
                color_formats,
                depth_format,
                sample_count: sample_count.expect("at least one attachment"),
            },
        })
    }
}

impl Drop for Device {
    /// Clean teardown: waits for the GPU, then releases everything still
    /// parked in the destruction queue.
    fn drop(&mut self) {
        self.backend.wait_for_idle();
        for zombie in self.destruction.drain_all() {
            match zombie {
                Zombie::Buffer(h) => self.backend.destroy_buffer(h),
                Zombie::Texture(h) => self.backend.destroy_texture(h),
                Zombie::Sampler(h) => self.backend.destroy_sampler(h),
                Zombie::Framebuffer(h) => self.backend.destroy_framebuffer(h),
                Zombie::Shader(h) => self.backend.destroy_shader(h),
                Zombie::Pipeline(h) => self.backend.destroy_pipeline(h),
            }
        }
        log::info!("device destroyed after {} frames", self.frame.frame_index);
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("backend", &self.capabilities.adapter.backend_kind)
            .field("frame_index", &self.frame.frame_index)
            .field("recording", &self.frame.recording)
            .field("buffers", &self.buffers)
            .field("textures", &self.textures)
            .field("pipelines", &self.pipelines)
            .field("pending_destructions", &self.destruction.len())
            .finish()
    }
}

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

//! The null adapter: accepts every valid call, allocates nothing.
//!
//! Useful headless in CI, in tests that exercise device semantics without a
//! GPU, and as the renderer of record for dedicated servers. Fences signal
//! with one frame of latency, which keeps the deferred-destruction path
//! honest instead of trivially immediate.

use std::collections::HashSet;
use tessera_core::api::resource::Framebuffer;
use tessera_core::api::{
    AdapterInfo, BackendKind, BufferDescription, DeviceCapabilities, DeviceFeatures, DeviceType,
    SamplerDescription, TextureDescription, TextureFormat,
};
use tessera_core::error::DeviceError;
use tessera_core::math::{Extent3D, Origin3D, ScissorRect, Viewport};
use tessera_core::shader::CompiledShaderSet;
use tessera_core::traits::{CommandEncoder, FenceValue, PipelineDescription, RenderBackend};
use tessera_core::{
    BufferHandle, ClearValues, FramebufferHandle, IndexFormat, PipelineHandle, RenderTarget,
    SamplerHandle, ShaderHandle, TextureHandle,
};

/// Every format the abstract layer knows is "supported" here.
const ALL_FORMATS: [TextureFormat; 12] = [
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

/// The no-op [`RenderBackend`].
#[derive(Debug, Default)]
pub struct NullBackend {
    // Live slot sets, only to catch adapter-contract misuse in debug runs.
    buffers: HashSet<u32>,
    textures: HashSet<u32>,
    samplers: HashSet<u32>,
    framebuffers: HashSet<u32>,
    shaders: HashSet<u32>,
    pipelines: HashSet<u32>,
    submitted: u64,
    completed: u64,
    in_frame: bool,
}

impl NullBackend {
    /// Creates a null backend.
    pub fn new() -> Self {
        log::info!("null backend created; all GPU work is discarded");
        Self::default()
    }
}

impl RenderBackend for NullBackend {
    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            adapter: AdapterInfo {
                name: "null".to_string(),
                backend_kind: BackendKind::Null,
                device_type: DeviceType::Cpu,
                api_version: "0".to_string(),
            },
            features: DeviceFeatures::COMPUTE
                | DeviceFeatures::INDIRECT_DRAW
                | DeviceFeatures::MULTIPLE_RENDER_TARGETS
                | DeviceFeatures::ANISOTROPIC_FILTERING
                | DeviceFeatures::WIREFRAME,
            supported_formats: ALL_FORMATS.to_vec(),
        }
    }

    fn shader_target(&self) -> BackendKind {
        BackendKind::Null
    }

    fn create_buffer(
        &mut self,
        handle: BufferHandle,
        _desc: &BufferDescription<'_>,
        _initial_data: Option<&[u8]>,
    ) -> Result<(), DeviceError> {
        self.buffers.insert(handle.index());
        Ok(())
    }

    fn destroy_buffer(&mut self, handle: BufferHandle) {
        let removed = self.buffers.remove(&handle.index());
        debug_assert!(removed, "destroy of an unknown handle");
    }

    fn write_buffer(
        &mut self,
        _handle: BufferHandle,
        _offset: u64,
        _data: &[u8],
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn create_texture(
        &mut self,
        handle: TextureHandle,
        _desc: &TextureDescription<'_>,
    ) -> Result<(), DeviceError> {
        self.textures.insert(handle.index());
        Ok(())
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        let removed = self.textures.remove(&handle.index());
        debug_assert!(removed, "destroy of an unknown handle");
    }

    fn write_texture(
        &mut self,
        _handle: TextureHandle,
        _data: &[u8],
        _bytes_per_row: Option<u32>,
        _origin: Origin3D,
        _size: Extent3D,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn create_sampler(
        &mut self,
        handle: SamplerHandle,
        _desc: &SamplerDescription<'_>,
    ) -> Result<(), DeviceError> {
        self.samplers.insert(handle.index());
        Ok(())
    }

    fn destroy_sampler(&mut self, handle: SamplerHandle) {
        let removed = self.samplers.remove(&handle.index());
        debug_assert!(removed, "destroy of an unknown handle");
    }

    fn create_framebuffer(
        &mut self,
        handle: FramebufferHandle,
        _record: &Framebuffer,
    ) -> Result<(), DeviceError> {
        self.framebuffers.insert(handle.index());
        Ok(())
    }

    fn destroy_framebuffer(&mut self, handle: FramebufferHandle) {
        let removed = self.framebuffers.remove(&handle.index());
        debug_assert!(removed, "destroy of an unknown handle");
    }

    fn create_shader(
        &mut self,
        handle: ShaderHandle,
        compiled: &CompiledShaderSet,
    ) -> Result<(), DeviceError> {
        log::debug!(
            "null backend accepted shader '{}' ({} reflection bindings)",
            compiled.name,
            compiled.merged_reflection().len()
        );
        self.shaders.insert(handle.index());
        Ok(())
    }

    fn destroy_shader(&mut self, handle: ShaderHandle) {
        let removed = self.shaders.remove(&handle.index());
        debug_assert!(removed, "destroy of an unknown handle");
    }

    fn create_pipeline(
        &mut self,
        handle: PipelineHandle,
        _desc: &PipelineDescription<'_>,
    ) -> Result<(), DeviceError> {
        self.pipelines.insert(handle.index());
        Ok(())
    }

    fn destroy_pipeline(&mut self, handle: PipelineHandle) {
        let removed = self.pipelines.remove(&handle.index());
        debug_assert!(removed, "destroy of an unknown handle");
    }

    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        // Everything submitted before this frame "completes" now.
        self.completed = self.submitted;
        self.in_frame = true;
        Ok(())
    }

    fn create_encoder(&mut self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(NullEncoder {
            label: label.map(str::to_string),
            draw_count: 0,
        })
    }

    fn submit(&mut self, encoders: Vec<Box<dyn CommandEncoder>>) -> FenceValue {
        let draws: u32 = encoders.iter().map(|e| e.draw_count()).sum();
        log::trace!("null submit: {} encoders, {draws} draws", encoders.len());
        self.submitted += 1;
        self.in_frame = false;
        FenceValue(self.submitted)
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn pending_fence(&self) -> FenceValue {
        FenceValue(self.submitted + 1)
    }

    fn completed_fence(&self) -> FenceValue {
        FenceValue(self.completed)
    }

    fn wait_for_idle(&mut self) {
        self.completed = self.submitted;
    }
}

/// The no-op [`CommandEncoder`]: counts draws, discards everything else.
#[derive(Debug)]
struct NullEncoder {
    #[allow(dead_code)]
    label: Option<String>,
    draw_count: u32,
}

impl CommandEncoder for NullEncoder {
    fn set_render_target(&mut self, _target: RenderTarget, _clear: Option<ClearValues>) {}

    fn set_viewport(&mut self, _viewport: Viewport) {}

    fn set_scissor(&mut self, _rect: ScissorRect) {}

    fn set_pipeline(&mut self, _pipeline: PipelineHandle) {}

    fn bind_vertex_buffer(&mut self, _slot: u32, _buffer: BufferHandle, _offset: u64) {}

    fn bind_index_buffer(&mut self, _buffer: BufferHandle, _format: IndexFormat, _offset: u64) {}

    fn bind_uniform_buffer(&mut self, _slot: u32, _buffer: BufferHandle) {}

    fn bind_texture(&mut self, _slot: u32, _texture: TextureHandle, _sampler: SamplerHandle) {}

    fn draw(&mut self, _vertices: std::ops::Range<u32>, _instances: std::ops::Range<u32>) {
        self.draw_count += 1;
    }

    fn draw_indexed(
        &mut self,
        _indices: std::ops::Range<u32>,
        _base_vertex: i32,
        _instances: std::ops::Range<u32>,
    ) {
        self.draw_count += 1;
    }

    fn draw_indirect(&mut self, _buffer: BufferHandle, _offset: u64) {
        self.draw_count += 1;
    }

    fn draw_indexed_indirect(&mut self, _buffer: BufferHandle, _offset: u64) {
        self.draw_count += 1;
    }

    fn draw_count(&self) -> u32 {
        self.draw_count
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_signal_one_frame_late() {
        let mut backend = NullBackend::new();
        backend.begin_frame().unwrap();
        let fence = backend.submit(Vec::new());
        assert!(backend.completed_fence() < fence);

        backend.begin_frame().unwrap();
        assert!(backend.completed_fence() >= fence);
    }

    #[test]
    fn wait_for_idle_completes_everything() {
        let mut backend = NullBackend::new();
        backend.begin_frame().unwrap();
        let fence = backend.submit(Vec::new());
        backend.wait_for_idle();
        assert!(backend.completed_fence() >= fence);
    }

    #[test]
    fn encoder_counts_draws() {
        let mut backend = NullBackend::new();
        let mut encoder = backend.create_encoder(Some("test"));
        encoder.draw(0..3, 0..1);
        encoder.draw_indexed(0..6, 0, 0..1);
        assert_eq!(encoder.draw_count(), 2);
    }
}

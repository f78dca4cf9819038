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

//! The adapter contract every backend implements.

use crate::api::enums::BackendKind;
use crate::api::pipeline::OutputFormat;
use crate::api::resource::{
    BufferHandle, Framebuffer, FramebufferHandle, PipelineHandle, SamplerHandle, ShaderHandle,
    TextureHandle,
};
use crate::api::shader::ResourceBinding;
use crate::api::state::{BlendState, DepthState, RasterState, StencilState};
use crate::api::vertex::VertexLayout;
use crate::api::{
    BufferDescription, DeviceCapabilities, SamplerDescription, TextureDescription,
};
use crate::error::DeviceError;
use crate::math::{Extent3D, Origin3D};
use crate::shader::CompiledShaderSet;
use crate::traits::CommandEncoder;
use std::fmt;

/// An opaque, monotonically comparable token marking a point in the GPU
/// command stream. A fence "signals" once all work submitted before that
/// point has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FenceValue(pub u64);

/// Everything pipeline creation needs besides the states already stored in
/// the key: the shader's native modules are looked up adapter-side by
/// handle, the reflection drives resource-binding layout.
#[derive(Debug, Clone, Copy)]
pub struct PipelineDescription<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// The shader set the pipeline binds. The adapter resolves it to the
    /// native modules it stored at `create_shader` time.
    pub shader: ShaderHandle,
    /// Merged resource layout of the shader set.
    pub reflection: &'a [ResourceBinding],
    /// Rasterizer state.
    pub raster: RasterState,
    /// Depth state.
    pub depth: DepthState,
    /// Blend state.
    pub blend: BlendState,
    /// Stencil state.
    pub stencil: StencilState,
    /// Vertex input layout.
    pub vertex_layout: &'a VertexLayout,
    /// Render-target signature.
    pub output: &'a OutputFormat,
}

/// The contract between the device interface and one underlying graphics
/// library.
///
/// The device validates descriptions and owns handle issuance; the adapter
/// owns the native objects, keyed by handle slot. Creation methods are only
/// called with already-validated descriptions. Destruction methods are
/// infallible: the device guarantees it passes each handle exactly once,
/// after the associated fence has signaled.
///
/// Adapters map native failures into [`DeviceError`] kinds; their own error
/// types never cross this boundary.
pub trait RenderBackend: Send + fmt::Debug {
    /// Capability snapshot of the underlying adapter.
    fn capabilities(&self) -> DeviceCapabilities;

    /// The shader representation this adapter consumes, used as the
    /// cross-compilation target and cache key component.
    fn shader_target(&self) -> BackendKind;

    /// Creates a buffer, optionally filled with `initial_data` (whose
    /// length equals the description size).
    fn create_buffer(
        &mut self,
        handle: BufferHandle,
        desc: &BufferDescription<'_>,
        initial_data: Option<&[u8]>,
    ) -> Result<(), DeviceError>;

    /// Releases the native buffer behind `handle`.
    fn destroy_buffer(&mut self, handle: BufferHandle);

    /// Uploads `data` at `offset`. Bounds were checked by the device.
    fn write_buffer(
        &mut self,
        handle: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Creates a texture.
    fn create_texture(
        &mut self,
        handle: TextureHandle,
        desc: &TextureDescription<'_>,
    ) -> Result<(), DeviceError>;

    /// Releases the native texture behind `handle`.
    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Uploads texel data into a region of a texture.
    fn write_texture(
        &mut self,
        handle: TextureHandle,
        data: &[u8],
        bytes_per_row: Option<u32>,
        origin: Origin3D,
        size: Extent3D,
    ) -> Result<(), DeviceError>;

    /// Creates a sampler.
    fn create_sampler(
        &mut self,
        handle: SamplerHandle,
        desc: &SamplerDescription<'_>,
    ) -> Result<(), DeviceError>;

    /// Releases the native sampler behind `handle`.
    fn destroy_sampler(&mut self, handle: SamplerHandle);

    /// Creates a framebuffer from the validated attachment record.
    fn create_framebuffer(
        &mut self,
        handle: FramebufferHandle,
        record: &Framebuffer,
    ) -> Result<(), DeviceError>;

    /// Releases the native framebuffer behind `handle`.
    fn destroy_framebuffer(&mut self, handle: FramebufferHandle);

    /// Builds the native shader modules for a compiled set.
    fn create_shader(
        &mut self,
        handle: ShaderHandle,
        compiled: &CompiledShaderSet,
    ) -> Result<(), DeviceError>;

    /// Releases the native shader modules behind `handle`.
    fn destroy_shader(&mut self, handle: ShaderHandle);

    /// Builds a native pipeline object. Called once per pipeline-cache
    /// miss; this is the expensive call the cache exists to amortize.
    fn create_pipeline(
        &mut self,
        handle: PipelineHandle,
        desc: &PipelineDescription<'_>,
    ) -> Result<(), DeviceError>;

    /// Releases the native pipeline behind `handle`.
    fn destroy_pipeline(&mut self, handle: PipelineHandle);

    /// Starts a frame: acquires the swap-chain image (or its headless
    /// stand-in) and refreshes fence completion state.
    fn begin_frame(&mut self) -> Result<(), DeviceError>;

    /// Creates a command encoder recording against this backend.
    fn create_encoder(&mut self, label: Option<&str>) -> Box<dyn CommandEncoder>;

    /// Submits encoders in merge order and returns the fence that signals
    /// when their GPU work completes. Within one encoder, commands run in
    /// issued order; across encoders, order is exactly the order of
    /// `encoders`.
    fn submit(&mut self, encoders: Vec<Box<dyn CommandEncoder>>) -> FenceValue;

    /// Presents the frame. May block briefly on bounded swap-chain queues.
    fn present(&mut self) -> Result<(), DeviceError>;

    /// Reconfigures the swap chain (or headless backbuffer) to a new size.
    fn resize(&mut self, width: u32, height: u32);

    /// The fence that will be returned by the next `submit`. Work recorded
    /// in the current frame completes no earlier than this fence.
    fn pending_fence(&self) -> FenceValue;

    /// The newest fence known to have signaled.
    fn completed_fence(&self) -> FenceValue;

    /// Blocks until every submitted fence has signaled.
    fn wait_for_idle(&mut self);
}

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

//! The command-recording contract.

use crate::api::enums::IndexFormat;
use crate::api::framebuffer::{ClearValues, RenderTarget};
use crate::api::resource::{BufferHandle, PipelineHandle, SamplerHandle, TextureHandle};
use crate::math::{ScissorRect, Viewport};
use std::any::Any;
use std::ops::Range;

/// Records state-binding and draw commands for one backend.
///
/// Encoders are handed out by the device: one primary encoder drives the
/// single-threaded recording mode, and any number of additional encoders
/// (each `Send`, movable to a worker thread) drive the parallel mode.
/// Commands within one encoder execute in issued order; ordering across
/// encoders is decided solely by the merge order at submission.
///
/// There is no implicit default state: a draw call without a render target
/// and pipeline bound on the same encoder is a contract violation.
///
/// Binding model: `slot` is the `@binding` index in bind group 0 of the
/// shader's reflected layout. `bind_texture` binds the texture at `slot`;
/// the sampler goes to the sampler binding the reflection pairs with it
/// (by convention, `slot + 1`).
pub trait CommandEncoder: Send {
    /// Begins (or restarts) a pass against `target`, clearing it when
    /// `clear` is given and loading the existing contents otherwise.
    fn set_render_target(&mut self, target: RenderTarget, clear: Option<ClearValues>);

    /// Sets the viewport for subsequent draws.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Sets the scissor rectangle for subsequent draws. Only applied by
    /// pipelines whose raster state enables scissoring.
    fn set_scissor(&mut self, rect: ScissorRect);

    /// Binds a pipeline for subsequent draws.
    fn set_pipeline(&mut self, pipeline: PipelineHandle);

    /// Binds a vertex buffer to input slot `slot`.
    fn bind_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle, offset: u64);

    /// Binds the index buffer used by `draw_indexed`.
    fn bind_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat, offset: u64);

    /// Binds a uniform buffer at `slot`.
    fn bind_uniform_buffer(&mut self, slot: u32, buffer: BufferHandle);

    /// Binds a texture (and its paired sampler) at `slot`.
    fn bind_texture(&mut self, slot: u32, texture: TextureHandle, sampler: SamplerHandle);

    /// Records a non-indexed draw.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    /// Records an indexed draw against the bound index buffer.
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);

    /// Records a draw whose arguments live in `buffer` at `offset`, laid
    /// out as [`DrawIndirectArgs`](crate::api::buffer::DrawIndirectArgs).
    fn draw_indirect(&mut self, buffer: BufferHandle, offset: u64);

    /// Indexed variant of `draw_indirect`, laid out as
    /// [`DrawIndexedIndirectArgs`](crate::api::buffer::DrawIndexedIndirectArgs).
    fn draw_indexed_indirect(&mut self, buffer: BufferHandle, offset: u64);

    /// Number of draw calls recorded so far, for frame stats.
    fn draw_count(&self) -> u32;

    /// Downcast hook for the owning adapter at submission time.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

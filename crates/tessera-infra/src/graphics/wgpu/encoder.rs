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

//! The wgpu command encoder.
//!
//! Recording is retained: the encoder is a plain command list, so it is
//! `Send` without touching any wgpu state and can record on a worker
//! thread. The backend replays the list into real wgpu passes at
//! submission, which is also what makes cross-encoder ordering exactly
//! the merge order and nothing else.

use std::any::Any;
use std::ops::Range;
use tessera_core::api::framebuffer::{ClearValues, RenderTarget};
use tessera_core::api::IndexFormat;
use tessera_core::math::{ScissorRect, Viewport};
use tessera_core::traits::CommandEncoder;
use tessera_core::{BufferHandle, PipelineHandle, SamplerHandle, TextureHandle};

/// One recorded command, replayed by [`WgpuBackend`](super::WgpuBackend)
/// at submission.
#[derive(Debug, Clone)]
pub(crate) enum RenderCommand {
    BeginPass {
        target: RenderTarget,
        clear: Option<ClearValues>,
    },
    SetViewport(Viewport),
    SetScissor(ScissorRect),
    SetPipeline(PipelineHandle),
    BindVertexBuffer {
        slot: u32,
        buffer: BufferHandle,
        offset: u64,
    },
    BindIndexBuffer {
        buffer: BufferHandle,
        format: IndexFormat,
        offset: u64,
    },
    BindUniformBuffer {
        slot: u32,
        buffer: BufferHandle,
    },
    BindTexture {
        slot: u32,
        texture: TextureHandle,
        sampler: SamplerHandle,
    },
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
    DrawIndirect {
        buffer: BufferHandle,
        offset: u64,
    },
    DrawIndexedIndirect {
        buffer: BufferHandle,
        offset: u64,
    },
}

/// The wgpu [`CommandEncoder`]: records into a command list consumed by
/// the backend's submit.
#[derive(Debug, Default)]
pub struct WgpuEncoder {
    label: Option<String>,
    commands: Vec<RenderCommand>,
    draws: u32,
}

impl WgpuEncoder {
    pub(crate) fn new(label: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_string),
            commands: Vec::new(),
            draws: 0,
        }
    }

    pub(crate) fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Takes the recorded commands, leaving the encoder empty.
    pub(crate) fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl CommandEncoder for WgpuEncoder {
    fn set_render_target(&mut self, target: RenderTarget, clear: Option<ClearValues>) {
        self.commands.push(RenderCommand::BeginPass { target, clear });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(RenderCommand::SetViewport(viewport));
    }

    fn set_scissor(&mut self, rect: ScissorRect) {
        self.commands.push(RenderCommand::SetScissor(rect));
    }

    fn set_pipeline(&mut self, pipeline: PipelineHandle) {
        self.commands.push(RenderCommand::SetPipeline(pipeline));
    }

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle, offset: u64) {
        self.commands.push(RenderCommand::BindVertexBuffer {
            slot,
            buffer,
            offset,
        });
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat, offset: u64) {
        self.commands.push(RenderCommand::BindIndexBuffer {
            buffer,
            format,
            offset,
        });
    }

    fn bind_uniform_buffer(&mut self, slot: u32, buffer: BufferHandle) {
        self.commands
            .push(RenderCommand::BindUniformBuffer { slot, buffer });
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureHandle, sampler: SamplerHandle) {
        self.commands.push(RenderCommand::BindTexture {
            slot,
            texture,
            sampler,
        });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.draws += 1;
        self.commands.push(RenderCommand::Draw {
            vertices,
            instances,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.draws += 1;
        self.commands.push(RenderCommand::DrawIndexed {
            indices,
            base_vertex,
            instances,
        });
    }

    fn draw_indirect(&mut self, buffer: BufferHandle, offset: u64) {
        self.draws += 1;
        self.commands
            .push(RenderCommand::DrawIndirect { buffer, offset });
    }

    fn draw_indexed_indirect(&mut self, buffer: BufferHandle, offset: u64) {
        self.draws += 1;
        self.commands
            .push(RenderCommand::DrawIndexedIndirect { buffer, offset });
    }

    fn draw_count(&self) -> u32 {
        self.draws
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_issued_order() {
        let mut encoder = WgpuEncoder::new(Some("test"));
        encoder.set_render_target(RenderTarget::Backbuffer, Some(ClearValues::BLACK));
        encoder.set_pipeline(PipelineHandle::INVALID);
        encoder.draw(0..3, 0..1);

        let commands = encoder.take_commands();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], RenderCommand::BeginPass { .. }));
        assert!(matches!(commands[2], RenderCommand::Draw { .. }));
        assert_eq!(encoder.draw_count(), 1);
        // Taking the commands leaves the list empty but keeps the counter.
        assert!(encoder.take_commands().is_empty());
    }
}

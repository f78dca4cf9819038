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

//! The resource records the device retains per live handle.
//!
//! These are the pool-stored values behind each [`Handle`]: the slice of a
//! creation description the device still needs after creation (sizes for
//! bounds checks, formats for attachment validation), never the native
//! backend objects, which stay inside the adapter.

use super::enums::{BackendKind, SampleCount, TextureFormat};
use super::pipeline::PipelineKey;
use super::shader::ResourceBinding;
use crate::api::buffer::BufferUsage;
use crate::api::texture::{TextureDimension, TextureUsage};
use crate::handle::Handle;
use crate::math::Extent3D;

/// Handle to a GPU buffer.
pub type BufferHandle = Handle<Buffer>;
/// Handle to a GPU texture.
pub type TextureHandle = Handle<Texture>;
/// Handle to a sampler.
pub type SamplerHandle = Handle<Sampler>;
/// Handle to a framebuffer.
pub type FramebufferHandle = Handle<Framebuffer>;
/// Handle to a compiled shader set.
pub type ShaderHandle = Handle<Shader>;
/// Handle to a compiled pipeline object.
pub type PipelineHandle = Handle<Pipeline>;

/// A live GPU buffer.
#[derive(Debug, Clone)]
pub struct Buffer {
    /// Size in bytes, retained for bounds-checked updates.
    pub size: u64,
    /// Allowed usages, retained for bind validation.
    pub usage: BufferUsage,
}

/// A live GPU texture.
#[derive(Debug, Clone)]
pub struct Texture {
    /// Texel dimensions, retained for attachment and upload validation.
    pub size: Extent3D,
    /// Texel format.
    pub format: TextureFormat,
    /// Dimensionality.
    pub dimension: TextureDimension,
    /// Mipmap chain length.
    pub mip_level_count: u32,
    /// Samples per texel.
    pub sample_count: SampleCount,
    /// Allowed usages.
    pub usage: TextureUsage,
}

/// A live sampler. Samplers carry no state the device needs after creation.
#[derive(Debug, Clone, Default)]
pub struct Sampler {}

/// A live framebuffer: validated attachment handles and the derived output
/// format.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    /// Color attachments, in output order.
    pub color_attachments: Vec<TextureHandle>,
    /// Optional depth/stencil attachment.
    pub depth_attachment: Option<TextureHandle>,
    /// Pixel extent shared by every attachment.
    pub extent: Extent3D,
    /// Color formats, depth format and sample count of the attachments.
    pub output: super::pipeline::OutputFormat,
}

/// A live compiled shader set.
#[derive(Debug, Clone)]
pub struct Shader {
    /// The name the shader was created under; keys its cache entries.
    pub name: String,
    /// The backend representation it was compiled for.
    pub target: BackendKind,
    /// Merged resource layout of all stages, consumed by pipeline creation.
    pub reflection: Vec<ResourceBinding>,
}

/// A live pipeline object.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// The cache key this pipeline was created under; used for eviction on
    /// destroy.
    pub key: PipelineKey,
}

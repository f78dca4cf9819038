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

//! Backend-agnostic value types: enums, immutable state objects, resource
//! descriptions, capability reporting and device options.

pub mod buffer;
pub mod capabilities;
pub mod enums;
pub mod framebuffer;
pub mod pipeline;
pub mod resource;
pub mod settings;
pub mod shader;
pub mod state;
pub mod texture;
pub mod vertex;

pub use buffer::{BufferDescription, BufferUsage, DrawIndexedIndirectArgs, DrawIndirectArgs};
pub use capabilities::{AdapterInfo, DeviceCapabilities, DeviceFeatures};
pub use enums::{
    BackendKind, BlendFactor, BlendOperation, CompareFunction, CullMode, DeviceType, FillMode,
    FrontFace, IndexFormat, SampleCount, ShaderStage, StencilOperation, TextureFormat,
};
pub use framebuffer::{ClearValues, FramebufferDescription, RenderTarget};
pub use pipeline::{OutputFormat, PipelineKey};
pub use resource::{
    Buffer, BufferHandle, Framebuffer, FramebufferHandle, Pipeline, PipelineHandle, Sampler,
    SamplerHandle, Shader, ShaderHandle, Texture, TextureHandle,
};
pub use settings::DeviceOptions;
pub use shader::{
    BindingKind, ResourceBinding, ShaderDescription, ShaderStageFlags,
};
pub use state::{
    BlendComponent, BlendState, ColorWrites, DepthState, RasterState, StencilFaceState,
    StencilState,
};
pub use texture::{
    AddressMode, FilterMode, SamplerDescription, TextureDescription, TextureDimension,
    TextureUsage,
};
pub use vertex::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexLayout, VertexStepMode};

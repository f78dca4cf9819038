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

//! Shader descriptions and the reflection data model.
//!
//! Reflection is a plain data contract produced by cross-compilation and
//! consumed by pipeline creation; it is not a runtime introspection
//! mechanism.

use super::enums::ShaderStage;
use crate::tessera_bitflags;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

tessera_bitflags! {
    /// Which shader stages can see a resource binding.
    #[derive(Serialize, Deserialize)]
    pub struct ShaderStageFlags: u32 {
        /// Visible to the vertex stage.
        const VERTEX = 1 << 0;
        /// Visible to the fragment stage.
        const FRAGMENT = 1 << 1;
        /// Visible to the compute stage.
        const COMPUTE = 1 << 2;
    }
}

impl ShaderStageFlags {
    /// The flag for a single stage.
    pub const fn from_stage(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::VERTEX,
            ShaderStage::Fragment => Self::FRAGMENT,
            ShaderStage::Compute => Self::COMPUTE,
        }
    }
}

/// What kind of resource a shader binding slot expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
    /// A uniform buffer.
    UniformBuffer,
    /// A read or read/write storage buffer.
    StorageBuffer,
    /// A sampled texture.
    Texture,
    /// A sampler.
    Sampler,
}

/// One entry of a shader's resource layout: which resource kind the shader
/// expects at which group and binding slot, visible to which stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBinding {
    /// Variable name in the shader source, for diagnostics.
    pub name: String,
    /// Bind group / descriptor set index.
    pub group: u32,
    /// Binding slot within the group.
    pub binding: u32,
    /// Expected resource kind.
    pub kind: BindingKind,
    /// Stages the binding is visible to.
    pub visibility: ShaderStageFlags,
}

/// Describes a shader set at creation time: one portable bytecode blob per
/// stage, produced offline by the build tooling. The device cross-compiles
/// (or cache-loads) each blob for the active backend.
#[derive(Debug, Clone)]
pub struct ShaderDescription<'a> {
    /// Name used for cache file identity and diagnostics.
    pub name: Cow<'a, str>,
    /// Portable bytecode of the vertex stage.
    pub vertex_bytecode: Cow<'a, [u8]>,
    /// Portable bytecode of the fragment stage. Optional for depth-only
    /// shadow shaders.
    pub fragment_bytecode: Option<Cow<'a, [u8]>>,
}

impl<'a> ShaderDescription<'a> {
    /// A vertex+fragment shader set from borrowed bytecode.
    pub fn new(name: &'a str, vertex: &'a [u8], fragment: &'a [u8]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            vertex_bytecode: Cow::Borrowed(vertex),
            fragment_bytecode: Some(Cow::Borrowed(fragment)),
        }
    }
}

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

//! The runtime half of the shader pipeline.
//!
//! The offline half, compiling source to portable SPIR-V, is build
//! tooling outside this crate; this module consumes its output. Given a
//! bytecode blob and a target backend, [`compile`] produces the native
//! representation plus reflection, and [`cache::ShaderCache`] memoizes that
//! work keyed by content hash, in memory and on disk.

pub mod cache;
pub mod compile;

pub use cache::{CacheStats, ShaderCache, ShaderCacheEntry};
pub use compile::{compile, content_hash};

use crate::api::enums::BackendKind;
use crate::api::shader::ResourceBinding;
use serde::{Deserialize, Serialize};

/// A backend-native shader representation: source text for text-consuming
/// backends (WGSL, MSL, GLSL), bytecode for binary-consuming ones (SPIR-V).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderArtifact {
    /// Native shader source text.
    Text(String),
    /// Native shader bytecode.
    Binary(Vec<u8>),
}

impl ShaderArtifact {
    /// Byte length of the artifact, for logs.
    pub fn len(&self) -> usize {
        match self {
            ShaderArtifact::Text(src) => src.len(),
            ShaderArtifact::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` for an empty artifact.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One compiled shader stage, ready for the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStage {
    /// Entry point name in the native representation.
    pub entry_point: String,
    /// The native representation.
    pub artifact: ShaderArtifact,
    /// Resource layout of this stage.
    pub reflection: Vec<ResourceBinding>,
}

/// A compiled shader set: everything an adapter needs to build its native
/// shader modules.
#[derive(Debug, Clone)]
pub struct CompiledShaderSet {
    /// The set's name, forwarded as a native debug label.
    pub name: String,
    /// The representation the stages were compiled to.
    pub target: BackendKind,
    /// The vertex stage.
    pub vertex: CompiledStage,
    /// The fragment stage, absent for depth-only shaders.
    pub fragment: Option<CompiledStage>,
}

impl CompiledShaderSet {
    /// Merged resource layout across stages: bindings present in several
    /// stages appear once with their visibilities OR-ed together.
    pub fn merged_reflection(&self) -> Vec<ResourceBinding> {
        let mut merged: Vec<ResourceBinding> = self.vertex.reflection.clone();
        if let Some(fragment) = &self.fragment {
            for binding in &fragment.reflection {
                match merged
                    .iter_mut()
                    .find(|b| b.group == binding.group && b.binding == binding.binding)
                {
                    Some(existing) => existing.visibility |= binding.visibility,
                    None => merged.push(binding.clone()),
                }
            }
        }
        merged.sort_by_key(|b| (b.group, b.binding));
        merged
    }
}

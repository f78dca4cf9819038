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

//! Cross-compilation of portable SPIR-V into backend-native shaders.
//!
//! Pure functions of their inputs: the same bytecode, stage and target
//! always produce the same artifact and reflection, which is what makes
//! the content-hash cache sound.

use crate::api::enums::{BackendKind, ShaderStage};
use crate::api::shader::{BindingKind, ResourceBinding, ShaderStageFlags};
use crate::error::CompileError;
use crate::shader::{CompiledStage, ShaderArtifact};

/// Computes the 32-byte content hash of a bytecode blob.
pub fn content_hash(bytecode: &[u8]) -> [u8; 32] {
    *blake3::hash(bytecode).as_bytes()
}

/// Lowercase hex rendering of a content hash, as used in cache file names.
pub fn hash_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Coordinate-system differences between the portable bytecode's clip
/// space and a target's. Resolved here, at compile time, never as runtime
/// branches in the draw path.
const fn adjust_coordinate_space(target: BackendKind) -> bool {
    match target {
        // OpenGL flips clip-space Y and uses a [-1, 1] depth range.
        BackendKind::OpenGl => true,
        BackendKind::Vulkan | BackendKind::Metal | BackendKind::WebGpu | BackendKind::Null => false,
    }
}

/// Cross-compiles one stage of portable SPIR-V for `target`.
///
/// Binary-consuming targets (`Vulkan`, `Null`) receive the bytecode
/// unmodified; text-consuming targets receive generated WGSL, MSL or GLSL.
/// Reflection is extracted from the parsed module either way.
pub fn compile(
    name: &str,
    bytecode: &[u8],
    stage: ShaderStage,
    target: BackendKind,
) -> Result<CompiledStage, CompileError> {
    let options = naga::front::spv::Options {
        adjust_coordinate_space: adjust_coordinate_space(target),
        strict_capabilities: false,
        ..Default::default()
    };
    let module =
        naga::front::spv::parse_u8_slice(bytecode, &options).map_err(|e| CompileError::ParseFailed {
            name: name.to_string(),
            details: e.to_string(),
        })?;

    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| CompileError::ValidationFailed {
        name: name.to_string(),
        details: format!("{e:?}"),
    })?;

    let naga_stage = to_naga_stage(stage);
    let (entry_index, entry_point) = module
        .entry_points
        .iter()
        .enumerate()
        .find(|(_, ep)| ep.stage == naga_stage)
        .ok_or(CompileError::MissingEntryPoint {
            name: name.to_string(),
            stage: stage_name(stage),
        })?;
    let entry_name = entry_point.name.clone();

    let reflection = extract_reflection(&module, &info, entry_index, stage);

    let artifact = match target {
        BackendKind::Vulkan | BackendKind::Null => ShaderArtifact::Binary(bytecode.to_vec()),
        BackendKind::WebGpu => {
            let wgsl =
                naga::back::wgsl::write_string(&module, &info, naga::back::wgsl::WriterFlags::empty())
                    .map_err(|e| target_failed(name, target, e))?;
            ShaderArtifact::Text(wgsl)
        }
        BackendKind::Metal => {
            let (msl, _) = naga::back::msl::write_string(
                &module,
                &info,
                &naga::back::msl::Options::default(),
                &naga::back::msl::PipelineOptions::default(),
            )
            .map_err(|e| target_failed(name, target, e))?;
            ShaderArtifact::Text(msl)
        }
        BackendKind::OpenGl => {
            let glsl_options = naga::back::glsl::Options {
                version: naga::back::glsl::Version::Desktop(330),
                ..Default::default()
            };
            let pipeline_options = naga::back::glsl::PipelineOptions {
                shader_stage: naga_stage,
                entry_point: entry_name.clone(),
                multiview: None,
            };
            let mut glsl = String::new();
            let mut writer = naga::back::glsl::Writer::new(
                &mut glsl,
                &module,
                &info,
                &glsl_options,
                &pipeline_options,
                naga::proc::BoundsCheckPolicies::default(),
            )
            .map_err(|e| target_failed(name, target, e))?;
            writer.write().map_err(|e| target_failed(name, target, e))?;
            ShaderArtifact::Text(glsl)
        }
    };

    log::debug!(
        "cross-compiled shader '{name}' ({}) for {target}: {} bytes",
        stage_name(stage),
        artifact.len()
    );

    Ok(CompiledStage {
        entry_point: entry_name,
        artifact,
        reflection,
    })
}

fn target_failed(
    name: &str,
    target: BackendKind,
    error: impl std::fmt::Display,
) -> CompileError {
    CompileError::TargetFailed {
        name: name.to_string(),
        target,
        details: error.to_string(),
    }
}

const fn to_naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
        ShaderStage::Compute => naga::ShaderStage::Compute,
    }
}

const fn stage_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
        ShaderStage::Compute => "compute",
    }
}

/// Walks the module's globals and reports the ones the entry point
/// actually uses, with their group/binding slots.
fn extract_reflection(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    entry_index: usize,
    stage: ShaderStage,
) -> Vec<ResourceBinding> {
    let fn_info = info.get_entry_point(entry_index);
    let mut bindings = Vec::new();

    for (handle, var) in module.global_variables.iter() {
        if fn_info[handle].is_empty() {
            continue;
        }
        let Some(resource) = &var.binding else {
            continue;
        };
        let kind = match &module.types[var.ty].inner {
            naga::TypeInner::Image { .. } => BindingKind::Texture,
            naga::TypeInner::Sampler { .. } => BindingKind::Sampler,
            _ => match var.space {
                naga::AddressSpace::Uniform => BindingKind::UniformBuffer,
                naga::AddressSpace::Storage { .. } => BindingKind::StorageBuffer,
                _ => continue,
            },
        };
        bindings.push(ResourceBinding {
            name: var.name.clone().unwrap_or_default(),
            group: resource.group,
            binding: resource.binding,
            kind,
            visibility: ShaderStageFlags::from_stage(stage),
        });
    }

    bindings.sort_by_key(|b| (b.group, b.binding));
    bindings
}

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

//! The runtime shader pipeline end to end: cross-compilation targets,
//! reflection extraction, and the two-level cache over real files.

use tessera_core::api::shader::BindingKind;
use tessera_core::api::{BackendKind, ShaderStage, ShaderStageFlags};
use tessera_core::shader::{compile, CompiledShaderSet, ShaderArtifact, ShaderCache};

/// A shader whose vertex stage reads the uniform block and whose fragment
/// stage reads all three bindings, so both stages produce reflection.
const SOURCE: &str = r#"
    struct Globals {
        tint: vec4<f32>,
    };

    @group(0) @binding(0) var<uniform> globals: Globals;
    @group(0) @binding(1) var sprite: texture_2d<f32>;
    @group(0) @binding(2) var sprite_sampler: sampler;

    struct VsOut {
        @builtin(position) position: vec4<f32>,
        @location(0) uv: vec2<f32>,
    };

    @vertex
    fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VsOut {
        var out: VsOut;
        out.position = vec4<f32>(position, 1.0) * globals.tint.w;
        out.uv = uv;
        return out;
    }

    @fragment
    fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
        return textureSample(sprite, sprite_sampler, in.uv) * globals.tint;
    }
"#;

fn spirv(source: &str) -> Vec<u8> {
    let module = naga::front::wgsl::parse_str(source).expect("fixture parses");
    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .expect("fixture validates");
    let words =
        naga::back::spv::write_vec(&module, &info, &naga::back::spv::Options::default(), None)
            .expect("fixture emits");
    bytemuck::cast_slice(&words).to_vec()
}

// --- Cross-compilation ---

#[test]
fn binary_targets_pass_spirv_through() {
    let bytecode = spirv(SOURCE);
    for target in [BackendKind::Vulkan, BackendKind::Null] {
        let stage = compile::compile("passthrough", &bytecode, ShaderStage::Vertex, target)
            .expect("compiles");
        assert_eq!(stage.entry_point, "vs_main");
        assert_eq!(stage.artifact, ShaderArtifact::Binary(bytecode.clone()));
    }
}

#[test]
fn text_targets_emit_native_source() {
    let bytecode = spirv(SOURCE);
    for target in [BackendKind::WebGpu, BackendKind::Metal, BackendKind::OpenGl] {
        let stage = compile::compile("textual", &bytecode, ShaderStage::Fragment, target)
            .expect("compiles");
        match &stage.artifact {
            ShaderArtifact::Text(source) => assert!(!source.is_empty()),
            ShaderArtifact::Binary(_) => panic!("{target} must produce source text"),
        }
    }
}

#[test]
fn missing_stage_is_reported() {
    let vertex_only = spirv(
        r#"
        @vertex
        fn vs_main() -> @builtin(position) vec4<f32> {
            return vec4<f32>(0.0, 0.0, 0.0, 1.0);
        }
        "#,
    );
    let result = compile::compile("depth_only", &vertex_only, ShaderStage::Fragment, BackendKind::Null);
    assert!(result.is_err());
}

#[test]
fn garbage_bytecode_is_a_parse_failure() {
    let result = compile::compile(
        "garbage",
        &[0xde, 0xad, 0xbe, 0xef],
        ShaderStage::Vertex,
        BackendKind::WebGpu,
    );
    assert!(result.is_err());
}

// --- Reflection ---

#[test]
fn reflection_reports_used_bindings_per_stage() {
    let bytecode = spirv(SOURCE);

    let vertex = compile::compile("reflected", &bytecode, ShaderStage::Vertex, BackendKind::WebGpu)
        .expect("compiles");
    // The vertex stage only touches the uniform block.
    assert_eq!(vertex.reflection.len(), 1);
    assert_eq!(vertex.reflection[0].binding, 0);
    assert_eq!(vertex.reflection[0].kind, BindingKind::UniformBuffer);
    assert_eq!(vertex.reflection[0].visibility, ShaderStageFlags::VERTEX);

    let fragment =
        compile::compile("reflected", &bytecode, ShaderStage::Fragment, BackendKind::WebGpu)
            .expect("compiles");
    let kinds: Vec<(u32, BindingKind)> = fragment
        .reflection
        .iter()
        .map(|b| (b.binding, b.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (0, BindingKind::UniformBuffer),
            (1, BindingKind::Texture),
            (2, BindingKind::Sampler),
        ]
    );

    // Merging the stages ORs the visibility of the shared uniform block.
    let set = CompiledShaderSet {
        name: "reflected".to_string(),
        target: BackendKind::WebGpu,
        vertex,
        fragment: Some(fragment),
    };
    let merged = set.merged_reflection();
    assert_eq!(merged.len(), 3);
    assert_eq!(
        merged[0].visibility,
        ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT
    );
    assert_eq!(merged[1].visibility, ShaderStageFlags::FRAGMENT);
}

// --- The two-level cache ---

#[test]
fn cache_file_carries_name_hash_and_target() {
    let dir = tempfile::tempdir().unwrap();
    let bytecode = spirv(SOURCE);
    let mut cache = ShaderCache::with_dir(dir.path()).unwrap();

    cache
        .get_or_compile("test_shader", &bytecode, ShaderStage::Vertex, BackendKind::Metal)
        .expect("compiles");

    let hash = compile::content_hash(&bytecode);
    let expected = ShaderCache::file_name("test_shader", &hash, BackendKind::Metal);
    assert!(expected.ends_with(".metal"));
    assert!(
        dir.path().join(&expected).is_file(),
        "cache file '{expected}' must exist after a miss"
    );

    // The second request is answered from memory, with no new compilation.
    cache
        .get_or_compile("test_shader", &bytecode, ShaderStage::Vertex, BackendKind::Metal)
        .expect("hits");
    let stats = cache.stats();
    assert_eq!(stats.cross_compiles, 1);
    assert_eq!(stats.memory_hits, 1);
}

#[test]
fn a_fresh_cache_instance_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let bytecode = spirv(SOURCE);

    let mut first = ShaderCache::with_dir(dir.path()).unwrap();
    let compiled = first
        .get_or_compile("warm", &bytecode, ShaderStage::Fragment, BackendKind::WebGpu)
        .expect("compiles");

    // A new cache over the same directory, as after a process restart.
    let mut second = ShaderCache::with_dir(dir.path()).unwrap();
    let loaded = second
        .get_or_compile("warm", &bytecode, ShaderStage::Fragment, BackendKind::WebGpu)
        .expect("loads");

    let stats = second.stats();
    assert_eq!(stats.cross_compiles, 0, "disk hit performs no compilation");
    assert_eq!(stats.disk_hits, 1);
    assert_eq!(loaded.artifact, compiled.artifact);
    assert_eq!(loaded.reflection, compiled.reflection);
}

#[test]
fn changed_bytecode_cannot_collide_with_stale_entries() {
    let dir = tempfile::tempdir().unwrap();
    let old = spirv(SOURCE);
    let new = spirv(&SOURCE.replace("tint: vec4<f32>,", "tint: vec4<f32>, exposure: vec4<f32>,"));
    assert_ne!(old, new);

    let mut cache = ShaderCache::with_dir(dir.path()).unwrap();
    cache
        .get_or_compile("evolving", &old, ShaderStage::Fragment, BackendKind::WebGpu)
        .unwrap();
    cache
        .get_or_compile("evolving", &new, ShaderStage::Fragment, BackendKind::WebGpu)
        .unwrap();

    // Both versions live side by side under distinct content hashes.
    assert_eq!(cache.stats().cross_compiles, 2);
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 2);
}

#[test]
fn a_corrupt_cache_file_is_recompiled_not_trusted() {
    let dir = tempfile::tempdir().unwrap();
    let bytecode = spirv(SOURCE);
    let hash = compile::content_hash(&bytecode);
    let path = dir
        .path()
        .join(ShaderCache::file_name("mangled", &hash, BackendKind::WebGpu));
    std::fs::write(&path, b"not a cache entry").unwrap();

    let mut cache = ShaderCache::with_dir(dir.path()).unwrap();
    cache
        .get_or_compile("mangled", &bytecode, ShaderStage::Vertex, BackendKind::WebGpu)
        .expect("recompiles past the corrupt file");
    let stats = cache.stats();
    assert_eq!(stats.disk_hits, 0);
    assert_eq!(stats.cross_compiles, 1);
}

#[test]
fn targets_do_not_share_entries() {
    let dir = tempfile::tempdir().unwrap();
    let bytecode = spirv(SOURCE);
    let mut cache = ShaderCache::with_dir(dir.path()).unwrap();

    let wgsl = cache
        .get_or_compile("multi", &bytecode, ShaderStage::Vertex, BackendKind::WebGpu)
        .unwrap();
    let msl = cache
        .get_or_compile("multi", &bytecode, ShaderStage::Vertex, BackendKind::Metal)
        .unwrap();
    let spv = cache
        .get_or_compile("multi", &bytecode, ShaderStage::Vertex, BackendKind::Vulkan)
        .unwrap();

    assert_eq!(cache.stats().cross_compiles, 3);
    assert_ne!(wgsl.artifact, msl.artifact);
    assert_eq!(spv.artifact, ShaderArtifact::Binary(bytecode));
}

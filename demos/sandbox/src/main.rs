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

// Tessera sandbox: a headless frame loop against a selectable backend.
//
// Usage: sandbox [null|webgpu|vulkan|metal|opengl]
//
// The offline half of the shader pipeline (source -> portable SPIR-V) is
// normally build tooling; here naga's WGSL front end stands in for it so
// the demo is self-contained.

use anyhow::{anyhow, Context, Result};
use std::mem;
use tessera_core::math::{Extent2D, Extent3D, Origin3D, Viewport};
use tessera_core::{
    BackendKind, BlendState, BufferDescription, ClearValues, DepthState, DeviceOptions,
    IndexFormat, OutputFormat, PipelineKey, RasterState, RenderTarget, SamplerDescription,
    ShaderDescription, StencilState, TextureDescription, TextureFormat, VertexFormat, VertexLayout,
};
use tessera_infra::create_device;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

const VERTICES: &[Vertex] = &[
    Vertex {
        position: [0.0, 0.5, 0.0],
        uv: [0.5, 0.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
        uv: [0.0, 1.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        uv: [1.0, 1.0],
    },
];

const INDICES: &[u16] = &[0, 1, 2];

const SHADER: &str = r#"
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
    out.position = vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(sprite, sprite_sampler, in.uv) * globals.tint;
}
"#;

/// Stand-in for the offline shader build: WGSL -> portable SPIR-V.
fn build_spirv(source: &str) -> Result<Vec<u8>> {
    let module =
        naga::front::wgsl::parse_str(source).map_err(|e| anyhow!("shader parse: {e:?}"))?;
    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("shader validation: {e:?}"))?;
    let words = naga::back::spv::write_vec(&module, &info, &naga::back::spv::Options::default(), None)
        .map_err(|e| anyhow!("SPIR-V emit: {e}"))?;
    Ok(bytemuck::cast_slice(&words).to_vec())
}

fn parse_backend(arg: Option<&str>) -> Result<BackendKind> {
    match arg.unwrap_or("null") {
        "null" => Ok(BackendKind::Null),
        "webgpu" => Ok(BackendKind::WebGpu),
        "vulkan" => Ok(BackendKind::Vulkan),
        "metal" => Ok(BackendKind::Metal),
        "opengl" => Ok(BackendKind::OpenGl),
        other => Err(anyhow!("unknown backend '{other}'")),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let kind = parse_backend(args.get(1).map(String::as_str))?;

    let options = DeviceOptions {
        width: 640,
        height: 360,
        vsync: false,
        shader_cache_dir: Some(std::env::temp_dir().join("tessera-sandbox-shaders")),
        ..Default::default()
    };
    let mut device = create_device(kind, None, &options).context("device creation")?;
    let caps = device.capabilities();
    log::info!(
        "running on '{}' ({}), shader target {}",
        caps.adapter.name,
        caps.adapter.backend_kind,
        device.shader_target()
    );

    let spirv = build_spirv(SHADER)?;
    let shader = device.create_shader(&ShaderDescription {
        name: "sprite".into(),
        vertex_bytecode: spirv.clone().into(),
        fragment_bytecode: Some(spirv.into()),
    })?;

    let vertex_buffer = device.create_buffer_with_data(
        &BufferDescription::vertex("triangle vertices", mem::size_of_val(VERTICES) as u64),
        bytemuck::cast_slice(VERTICES),
    )?;
    let index_buffer = device.create_buffer_with_data(
        &BufferDescription::index("triangle indices", mem::size_of_val(INDICES) as u64),
        bytemuck::cast_slice(INDICES),
    )?;
    let globals = device.create_buffer(&BufferDescription::uniform("globals", 16))?;
    device.write_buffer(globals, 0, bytemuck::cast_slice(&[1.0f32, 0.9, 0.8, 1.0]))?;

    let texture =
        device.create_texture(&TextureDescription::sampled_2d("white", 1, 1, TextureFormat::Rgba8Unorm))?;
    device.write_texture(
        texture,
        &[0xff, 0xff, 0xff, 0xff],
        None,
        Origin3D::default(),
        Extent3D::new_2d(1, 1),
    )?;
    let sampler = device.create_sampler(&SamplerDescription::default())?;

    let key = PipelineKey {
        shader,
        raster: RasterState::solid(),
        depth: DepthState::disabled(),
        blend: BlendState::alpha_blend(),
        stencil: StencilState::disabled(),
        vertex_layout: VertexLayout::packed(&[VertexFormat::Float32x3, VertexFormat::Float32x2]),
        output: OutputFormat::single_color(TextureFormat::Bgra8UnormSrgb),
    };

    for _ in 0..3 {
        device.begin_frame()?;
        let pipeline = device.get_or_create_pipeline(&key)?;

        device.set_render_target(
            RenderTarget::Backbuffer,
            Some(ClearValues::color([0.1, 0.2, 0.3, 1.0])),
        )?;
        device.set_viewport(Viewport::from_extent(Extent2D {
            width: options.width,
            height: options.height,
        }))?;
        device.set_pipeline(pipeline)?;
        device.bind_vertex_buffer(0, vertex_buffer, 0)?;
        device.bind_index_buffer(index_buffer, IndexFormat::Uint16, 0)?;
        device.bind_uniform_buffer(0, globals)?;
        device.bind_texture(1, texture, sampler)?;
        device.draw_indexed(0..INDICES.len() as u32, 0, 0..1)?;

        // A second encoder recorded on a worker thread, merged behind the
        // primary recorder.
        let mut overlay = device.create_encoder(Some("overlay"))?;
        let worker = std::thread::spawn(move || {
            overlay.set_render_target(RenderTarget::Backbuffer, None);
            overlay
        });
        let overlay = worker.join().expect("overlay recording panicked");
        device.submit_encoders(vec![overlay])?;

        let stats = device.end_frame()?;
        log::info!(
            "frame {}: {} draws across {} encoders",
            stats.frame_index,
            stats.draw_calls,
            stats.encoders_submitted
        );
        device.present()?;
    }

    // Destructions are deferred until the GPU is done; the next frame
    // boundary (or teardown) reclaims them.
    device.destroy_buffer(vertex_buffer);
    device.destroy_buffer(index_buffer);
    device.destroy_buffer(globals);
    device.destroy_texture(texture);
    device.destroy_sampler(sampler);
    device.destroy_shader(shader);

    let cache = device.shader_cache_stats();
    log::info!(
        "shader cache: {} memory hits, {} disk hits, {} cross-compiles",
        cache.memory_hits,
        cache.disk_hits,
        cache.cross_compiles
    );

    device.wait_for_idle();
    Ok(())
}

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

//! End-to-end frames through the factory and the null backend: the whole
//! resource -> pipeline -> record -> submit path without a GPU.

use tessera_core::math::{Extent2D, Extent3D, Origin3D, Viewport};
use tessera_core::{
    BackendKind, BufferDescription, ClearValues, Device, DeviceOptions, FramebufferDescription,
    IndexFormat, OutputFormat, PipelineKey, RenderTarget, SamplerDescription, ShaderDescription,
    TextureDescription, TextureFormat, VertexFormat, VertexLayout,
};
use tessera_infra::create_device;

fn spirv_fixture() -> Vec<u8> {
    let source = r#"
        @vertex
        fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(position, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 1.0, 1.0, 1.0);
        }
    "#;
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
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn headless_device() -> Device {
    let _ = env_logger::builder().is_test(true).try_init();
    create_device(
        BackendKind::Null,
        None,
        &DeviceOptions {
            width: 320,
            height: 240,
            vsync: false,
            ..Default::default()
        },
    )
    .expect("null device creation cannot fail")
}

#[test]
fn a_full_frame_renders_through_the_null_backend() {
    let mut device = headless_device();

    let spirv = spirv_fixture();
    let shader = device
        .create_shader(&ShaderDescription {
            name: "flat".into(),
            vertex_bytecode: spirv.clone().into(),
            fragment_bytecode: Some(spirv.into()),
        })
        .unwrap();

    let vertices = device
        .create_buffer_with_data(&BufferDescription::vertex("tri", 36), &[0u8; 36])
        .unwrap();
    let indices = device
        .create_buffer_with_data(&BufferDescription::index("tri", 6), &[0u8; 6])
        .unwrap();

    let key = PipelineKey::with_defaults(
        shader,
        VertexLayout::packed(&[VertexFormat::Float32x3]),
        OutputFormat::single_color(TextureFormat::Bgra8UnormSrgb),
    );

    for frame in 1..=2u64 {
        device.begin_frame().unwrap();
        let pipeline = device.get_or_create_pipeline(&key).unwrap();

        device
            .set_render_target(RenderTarget::Backbuffer, Some(ClearValues::BLACK))
            .unwrap();
        device
            .set_viewport(Viewport::from_extent(Extent2D {
                width: 320,
                height: 240,
            }))
            .unwrap();
        device.set_pipeline(pipeline).unwrap();
        device.bind_vertex_buffer(0, vertices, 0).unwrap();
        device
            .bind_index_buffer(indices, IndexFormat::Uint16, 0)
            .unwrap();
        device.draw_indexed(0..3, 0, 0..1).unwrap();

        let stats = device.end_frame().unwrap();
        assert_eq!(stats.frame_index, frame);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.encoders_submitted, 1);
        device.present().unwrap();
    }

    // Repeat pipeline requests all resolved through the cache.
    assert_eq!(device.shader_cache_stats().cross_compiles, 2);

    device.destroy_buffer(vertices);
    device.destroy_buffer(indices);
    device.destroy_shader(shader);
    device.wait_for_idle();
}

#[test]
fn offscreen_pass_with_texture_upload() {
    let mut device = headless_device();

    let color = device
        .create_texture(&TextureDescription::render_target(
            "offscreen color",
            64,
            64,
            TextureFormat::Rgba8Unorm,
        ))
        .unwrap();
    let depth = device
        .create_texture(&TextureDescription::render_target(
            "offscreen depth",
            64,
            64,
            TextureFormat::Depth32Float,
        ))
        .unwrap();
    let target = device
        .create_framebuffer(&FramebufferDescription {
            label: None,
            color_attachments: vec![color],
            depth_attachment: Some(depth),
        })
        .unwrap();

    let sprite = device
        .create_texture(&TextureDescription::sampled_2d(
            "sprite",
            2,
            2,
            TextureFormat::Rgba8Unorm,
        ))
        .unwrap();
    device
        .write_texture(
            sprite,
            &[0u8; 16],
            None,
            Origin3D::default(),
            Extent3D::new_2d(2, 2),
        )
        .unwrap();
    let sampler = device
        .create_sampler(&SamplerDescription::nearest_clamp("pixel"))
        .unwrap();

    device.begin_frame().unwrap();
    device
        .set_render_target(
            RenderTarget::Framebuffer(target),
            Some(ClearValues::color([0.0, 0.0, 0.0, 0.0])),
        )
        .unwrap();
    device.bind_texture(1, sprite, sampler).unwrap();
    device.end_frame().unwrap();

    device.destroy_framebuffer(target);
    device.destroy_texture(color);
    device.destroy_texture(depth);

    // Destructions drain at later frame boundaries without disturbing the
    // frames in between.
    for _ in 0..2 {
        device.begin_frame().unwrap();
        device.end_frame().unwrap();
    }
    device.wait_for_idle();
}

#[test]
fn worker_encoders_merge_in_submission_order() {
    let mut device = headless_device();

    device.begin_frame().unwrap();
    let encoders: Vec<_> = (0..4)
        .map(|i| {
            let mut encoder = device.create_encoder(Some("worker")).unwrap();
            let handle = std::thread::spawn(move || {
                encoder.set_render_target(RenderTarget::Backbuffer, None);
                for _ in 0..=i {
                    encoder.draw(0..3, 0..1);
                }
                encoder
            });
            handle.join().unwrap()
        })
        .collect();
    device.submit_encoders(encoders).unwrap();

    let stats = device.end_frame().unwrap();
    assert_eq!(stats.encoders_submitted, 5);
    assert_eq!(stats.draw_calls, 1 + 2 + 3 + 4);
}

#[test]
fn indirect_draws_require_an_indirect_argument_buffer() {
    let mut device = headless_device();
    let plain = device
        .create_buffer(&BufferDescription::vertex("plain", 64))
        .unwrap();

    device.begin_frame().unwrap();
    device
        .set_render_target(RenderTarget::Backbuffer, None)
        .unwrap();
    let spirv = spirv_fixture();
    let shader = device
        .create_shader(&ShaderDescription {
            name: "flat".into(),
            vertex_bytecode: spirv.clone().into(),
            fragment_bytecode: Some(spirv.into()),
        })
        .unwrap();
    let key = PipelineKey::with_defaults(
        shader,
        VertexLayout::packed(&[VertexFormat::Float32x3]),
        OutputFormat::single_color(TextureFormat::Bgra8UnormSrgb),
    );
    let pipeline = device.get_or_create_pipeline(&key).unwrap();
    device.set_pipeline(pipeline).unwrap();

    assert!(device.draw_indirect(plain, 0).is_err());
    device.end_frame().unwrap();
}

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

//! Device semantics against an instrumented mock adapter: frame lifecycle
//! contract checks, deferred destruction timing, and pipeline cache
//! behavior.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use tessera_core::api::resource::Framebuffer;
use tessera_core::api::{
    AdapterInfo, BackendKind, BufferDescription, ClearValues, DeviceCapabilities, DeviceFeatures,
    DeviceOptions, DeviceType, FramebufferDescription, IndexFormat, OutputFormat, PipelineKey,
    RenderTarget, SamplerDescription, ShaderDescription, TextureDescription, TextureFormat,
};
use tessera_core::error::DeviceError;
use tessera_core::math::{Extent3D, Origin3D, ScissorRect, Viewport};
use tessera_core::shader::CompiledShaderSet;
use tessera_core::traits::{CommandEncoder, FenceValue, PipelineDescription, RenderBackend};
use tessera_core::{
    BufferHandle, Device, FramebufferHandle, PipelineHandle, SamplerHandle, ShaderHandle,
    TextureHandle, VertexFormat, VertexLayout,
};

/// What the mock observed, shared with the test through an `Arc`.
#[derive(Debug, Default)]
struct MockState {
    pipeline_creates: u32,
    shader_creates: u32,
    destroyed_buffers: Vec<u32>,
    destroyed_textures: Vec<u32>,
    destroyed_framebuffers: Vec<u32>,
    live_buffers: HashSet<u32>,
    submitted: u64,
    completed: u64,
    /// Submissions a fence lags behind before it signals. Zero means
    /// everything submitted before a `begin_frame` has completed by then.
    fence_latency: u64,
}

#[derive(Debug)]
struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    fn with_latency(latency: u64) -> (Self, Arc<Mutex<MockState>>) {
        let state = Arc::new(Mutex::new(MockState {
            fence_latency: latency,
            ..MockState::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

const FORMATS: [TextureFormat; 5] = [
    TextureFormat::Rgba8Unorm,
    TextureFormat::Rgba8UnormSrgb,
    TextureFormat::Bgra8UnormSrgb,
    TextureFormat::Rgba16Float,
    TextureFormat::Depth32Float,
];

impl RenderBackend for MockBackend {
    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            adapter: AdapterInfo {
                name: "mock".to_string(),
                backend_kind: BackendKind::Null,
                device_type: DeviceType::Cpu,
                api_version: "0".to_string(),
            },
            features: DeviceFeatures::INDIRECT_DRAW | DeviceFeatures::MULTIPLE_RENDER_TARGETS,
            supported_formats: FORMATS.to_vec(),
        }
    }

    fn shader_target(&self) -> BackendKind {
        BackendKind::Null
    }

    fn create_buffer(
        &mut self,
        handle: BufferHandle,
        _desc: &BufferDescription<'_>,
        _initial_data: Option<&[u8]>,
    ) -> Result<(), DeviceError> {
        self.state.lock().unwrap().live_buffers.insert(handle.index());
        Ok(())
    }

    fn destroy_buffer(&mut self, handle: BufferHandle) {
        let mut state = self.state.lock().unwrap();
        state.live_buffers.remove(&handle.index());
        state.destroyed_buffers.push(handle.index());
    }

    fn write_buffer(
        &mut self,
        _handle: BufferHandle,
        _offset: u64,
        _data: &[u8],
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn create_texture(
        &mut self,
        _handle: TextureHandle,
        _desc: &TextureDescription<'_>,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.state
            .lock()
            .unwrap()
            .destroyed_textures
            .push(handle.index());
    }

    fn write_texture(
        &mut self,
        _handle: TextureHandle,
        _data: &[u8],
        _bytes_per_row: Option<u32>,
        _origin: Origin3D,
        _size: Extent3D,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn create_sampler(
        &mut self,
        _handle: SamplerHandle,
        _desc: &SamplerDescription<'_>,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn destroy_sampler(&mut self, _handle: SamplerHandle) {}

    fn create_framebuffer(
        &mut self,
        _handle: FramebufferHandle,
        _record: &Framebuffer,
    ) -> Result<(), DeviceError> {
        Ok(())
    }

    fn destroy_framebuffer(&mut self, handle: FramebufferHandle) {
        self.state
            .lock()
            .unwrap()
            .destroyed_framebuffers
            .push(handle.index());
    }

    fn create_shader(
        &mut self,
        _handle: ShaderHandle,
        _compiled: &CompiledShaderSet,
    ) -> Result<(), DeviceError> {
        self.state.lock().unwrap().shader_creates += 1;
        Ok(())
    }

    fn destroy_shader(&mut self, _handle: ShaderHandle) {}

    fn create_pipeline(
        &mut self,
        _handle: PipelineHandle,
        _desc: &PipelineDescription<'_>,
    ) -> Result<(), DeviceError> {
        self.state.lock().unwrap().pipeline_creates += 1;
        Ok(())
    }

    fn destroy_pipeline(&mut self, _handle: PipelineHandle) {}

    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.completed = state.submitted.saturating_sub(state.fence_latency);
        Ok(())
    }

    fn create_encoder(&mut self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(MockEncoder::default())
    }

    fn submit(&mut self, _encoders: Vec<Box<dyn CommandEncoder>>) -> FenceValue {
        let mut state = self.state.lock().unwrap();
        state.submitted += 1;
        FenceValue(state.submitted)
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn pending_fence(&self) -> FenceValue {
        FenceValue(self.state.lock().unwrap().submitted + 1)
    }

    fn completed_fence(&self) -> FenceValue {
        FenceValue(self.state.lock().unwrap().completed)
    }

    fn wait_for_idle(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.completed = state.submitted;
    }
}

#[derive(Debug, Default)]
struct MockEncoder {
    draws: u32,
}

impl CommandEncoder for MockEncoder {
    fn set_render_target(&mut self, _target: RenderTarget, _clear: Option<ClearValues>) {}
    fn set_viewport(&mut self, _viewport: Viewport) {}
    fn set_scissor(&mut self, _rect: ScissorRect) {}
    fn set_pipeline(&mut self, _pipeline: PipelineHandle) {}
    fn bind_vertex_buffer(&mut self, _slot: u32, _buffer: BufferHandle, _offset: u64) {}
    fn bind_index_buffer(&mut self, _buffer: BufferHandle, _format: IndexFormat, _offset: u64) {}
    fn bind_uniform_buffer(&mut self, _slot: u32, _buffer: BufferHandle) {}
    fn bind_texture(&mut self, _slot: u32, _texture: TextureHandle, _sampler: SamplerHandle) {}

    fn draw(&mut self, _vertices: Range<u32>, _instances: Range<u32>) {
        self.draws += 1;
    }

    fn draw_indexed(&mut self, _indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {
        self.draws += 1;
    }

    fn draw_indirect(&mut self, _buffer: BufferHandle, _offset: u64) {
        self.draws += 1;
    }

    fn draw_indexed_indirect(&mut self, _buffer: BufferHandle, _offset: u64) {
        self.draws += 1;
    }

    fn draw_count(&self) -> u32 {
        self.draws
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn mock_device(latency: u64) -> (Device, Arc<Mutex<MockState>>) {
    let (backend, state) = MockBackend::with_latency(latency);
    let device = Device::new(Box::new(backend), &DeviceOptions::default()).unwrap();
    (device, state)
}

/// A minimal vertex+fragment shader as portable SPIR-V, synthesized the
/// way the offline build step would.
fn spirv_fixture() -> Vec<u8> {
    let source = r#"
        @vertex
        fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(position, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 0.0, 1.0, 1.0);
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
    bytemuck::cast_slice(&words).to_vec()
}

fn fixture_shader(device: &mut Device) -> ShaderHandle {
    let spirv = spirv_fixture();
    device
        .create_shader(&ShaderDescription {
            name: "fixture".into(),
            vertex_bytecode: spirv.clone().into(),
            fragment_bytecode: Some(spirv.into()),
        })
        .expect("fixture shader compiles")
}

fn fixture_key(shader: ShaderHandle) -> PipelineKey {
    PipelineKey::with_defaults(
        shader,
        VertexLayout::packed(&[VertexFormat::Float32x3]),
        OutputFormat::single_color(TextureFormat::Rgba8UnormSrgb),
    )
}

fn run_empty_frame(device: &mut Device) {
    device.begin_frame().unwrap();
    device.end_frame().unwrap();
}

// --- Generation invariant & handle lifecycle ---

#[test]
fn stale_buffer_handle_never_aliases_the_slots_next_occupant() {
    let (mut device, _) = mock_device(0);
    let first = device
        .create_buffer(&BufferDescription::vertex("first", 64))
        .unwrap();
    device.destroy_buffer(first);

    // One frame to submit the destruction's fence, another to drain it.
    run_empty_frame(&mut device);
    run_empty_frame(&mut device);

    let second = device
        .create_buffer(&BufferDescription::vertex("second", 64))
        .unwrap();
    assert_eq!(second.index(), first.index(), "slot must be recycled");
    assert_ne!(second, first);

    // The stale handle fails validation instead of touching the new buffer.
    let result = device.write_buffer(first, 0, &[0u8; 4]);
    assert!(matches!(result, Err(DeviceError::InvalidHandle { .. })));
    device.write_buffer(second, 0, &[0u8; 4]).unwrap();
}

#[test]
fn double_destroy_is_a_noop() {
    let (mut device, state) = mock_device(0);
    let buffer = device
        .create_buffer(&BufferDescription::uniform("once", 16))
        .unwrap();
    device.destroy_buffer(buffer);
    device.destroy_buffer(buffer);

    run_empty_frame(&mut device);
    run_empty_frame(&mut device);
    assert_eq!(state.lock().unwrap().destroyed_buffers, vec![buffer.index()]);
}

// --- Deferred destruction ---

#[test]
fn destruction_waits_for_the_fence() {
    let (mut device, state) = mock_device(2);
    let buffer = device
        .create_buffer(&BufferDescription::vertex("deferred", 64))
        .unwrap();
    device.destroy_buffer(buffer);

    // The handle dies immediately even though the native buffer lives on.
    assert!(matches!(
        device.write_buffer(buffer, 0, &[0u8; 4]),
        Err(DeviceError::InvalidHandle { .. })
    ));

    // Fence latency 2: the zombie survives the next two frame boundaries.
    for _ in 0..2 {
        run_empty_frame(&mut device);
        assert!(state.lock().unwrap().destroyed_buffers.is_empty());
    }
    run_empty_frame(&mut device);
    run_empty_frame(&mut device);
    assert_eq!(state.lock().unwrap().destroyed_buffers, vec![buffer.index()]);
}

#[test]
fn parked_slot_is_not_recycled_before_the_fence_signals() {
    let (mut device, _) = mock_device(2);
    let first = device
        .create_buffer(&BufferDescription::vertex("parked", 64))
        .unwrap();
    device.destroy_buffer(first);

    run_empty_frame(&mut device);
    let early = device
        .create_buffer(&BufferDescription::vertex("early", 64))
        .unwrap();
    assert_ne!(
        early.index(),
        first.index(),
        "slot must stay parked while its fence is pending"
    );
}

#[test]
fn render_target_destroyed_mid_frame_outlives_the_frame() {
    let (mut device, state) = mock_device(0);
    let color = device
        .create_texture(&TextureDescription::render_target(
            "color",
            128,
            128,
            TextureFormat::Rgba8Unorm,
        ))
        .unwrap();
    let framebuffer = device
        .create_framebuffer(&FramebufferDescription {
            label: None,
            color_attachments: vec![color],
            depth_attachment: None,
        })
        .unwrap();

    let shader = fixture_shader(&mut device);
    let key = PipelineKey::with_defaults(
        shader,
        VertexLayout::packed(&[VertexFormat::Float32x3]),
        OutputFormat::single_color(TextureFormat::Rgba8Unorm),
    );

    device.begin_frame().unwrap();
    let pipeline = device.get_or_create_pipeline(&key).unwrap();
    device
        .set_render_target(RenderTarget::Framebuffer(framebuffer), Some(ClearValues::BLACK))
        .unwrap();
    device.set_pipeline(pipeline).unwrap();
    device.draw(0..3, 0..1).unwrap();

    // Destroying the attachment mid-frame must not rip it out from under
    // the draws already recorded against it.
    device.destroy_texture(color);
    assert!(state.lock().unwrap().destroyed_textures.is_empty());

    device.draw(0..3, 0..1).unwrap();
    let stats = device.end_frame().unwrap();
    assert_eq!(stats.draw_calls, 2);
    assert!(state.lock().unwrap().destroyed_textures.is_empty());

    // The frame boundary after the fence signals releases it.
    run_empty_frame(&mut device);
    assert_eq!(
        state.lock().unwrap().destroyed_textures,
        vec![color.index()]
    );
}

// --- Pipeline cache ---

#[test]
fn pipeline_cache_creates_the_backend_object_once() {
    let (mut device, state) = mock_device(0);
    let shader = fixture_shader(&mut device);
    let key = fixture_key(shader);

    let first = device.get_or_create_pipeline(&key).unwrap();
    let second = device.get_or_create_pipeline(&key).unwrap();
    let third = device.get_or_create_pipeline(&key).unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(state.lock().unwrap().pipeline_creates, 1);
}

#[test]
fn differing_state_objects_are_different_pipelines() {
    let (mut device, state) = mock_device(0);
    let shader = fixture_shader(&mut device);
    let opaque = fixture_key(shader);
    let mut blended = opaque.clone();
    blended.blend = tessera_core::BlendState::alpha_blend();

    let a = device.get_or_create_pipeline(&opaque).unwrap();
    let b = device.get_or_create_pipeline(&blended).unwrap();
    assert_ne!(a, b);
    assert_eq!(state.lock().unwrap().pipeline_creates, 2);
}

#[test]
fn destroying_a_pipeline_evicts_its_cache_key() {
    let (mut device, state) = mock_device(0);
    let shader = fixture_shader(&mut device);
    let key = fixture_key(shader);

    let first = device.get_or_create_pipeline(&key).unwrap();
    device.destroy_pipeline(first);
    let second = device.get_or_create_pipeline(&key).unwrap();

    assert_ne!(first, second);
    assert_eq!(state.lock().unwrap().pipeline_creates, 2);
}

#[test]
fn shader_cache_answers_repeat_creations_from_memory() {
    let (mut device, state) = mock_device(0);
    let a = fixture_shader(&mut device);
    let compiles_after_first = device.shader_cache_stats().cross_compiles;
    let b = fixture_shader(&mut device);

    assert_ne!(a, b, "each creation issues its own handle");
    assert_eq!(state.lock().unwrap().shader_creates, 2);
    let stats = device.shader_cache_stats();
    assert_eq!(stats.cross_compiles, compiles_after_first);
    assert!(stats.memory_hits >= 2, "vertex and fragment stage hits");
}

// --- Frame lifecycle contract ---

#[test]
fn draw_outside_a_frame_is_a_contract_violation() {
    let (mut device, _) = mock_device(0);
    assert!(matches!(
        device.draw(0..3, 0..1),
        Err(DeviceError::ContractViolation(_))
    ));
    assert!(matches!(
        device.end_frame(),
        Err(DeviceError::ContractViolation(_))
    ));
    assert!(matches!(
        device.present(),
        Err(DeviceError::ContractViolation(_))
    ));
}

#[test]
fn draws_require_target_pipeline_and_index_binds() {
    let (mut device, _) = mock_device(0);
    let shader = fixture_shader(&mut device);
    let key = fixture_key(shader);

    device.begin_frame().unwrap();
    // No render target yet.
    assert!(matches!(
        device.draw(0..3, 0..1),
        Err(DeviceError::ContractViolation(_))
    ));

    device
        .set_render_target(RenderTarget::Backbuffer, Some(ClearValues::BLACK))
        .unwrap();
    // Target but no pipeline.
    assert!(matches!(
        device.draw(0..3, 0..1),
        Err(DeviceError::ContractViolation(_))
    ));

    let pipeline = device.get_or_create_pipeline(&key).unwrap();
    device.set_pipeline(pipeline).unwrap();
    device.draw(0..3, 0..1).unwrap();

    // Indexed draws additionally need an index buffer.
    assert!(matches!(
        device.draw_indexed(0..3, 0, 0..1),
        Err(DeviceError::ContractViolation(_))
    ));
    let indices = device
        .create_buffer(&BufferDescription::index("indices", 6))
        .unwrap();
    device
        .bind_index_buffer(indices, IndexFormat::Uint16, 0)
        .unwrap();
    device.draw_indexed(0..3, 0, 0..1).unwrap();

    let stats = device.end_frame().unwrap();
    assert_eq!(stats.draw_calls, 2);
}

#[test]
fn nested_or_unbalanced_frames_are_rejected() {
    let (mut device, _) = mock_device(0);
    device.begin_frame().unwrap();
    assert!(matches!(
        device.begin_frame(),
        Err(DeviceError::ContractViolation(_))
    ));
    assert!(matches!(
        device.resize(32, 32),
        Err(DeviceError::ContractViolation(_))
    ));
    device.end_frame().unwrap();
    device.resize(32, 32).unwrap();
}

#[test]
fn parallel_encoders_merge_behind_the_primary() {
    let (mut device, _) = mock_device(0);

    assert!(matches!(
        device.create_encoder(Some("early")),
        Err(DeviceError::ContractViolation(_))
    ));

    device.begin_frame().unwrap();
    let mut left = device.create_encoder(Some("left")).unwrap();
    let mut right = device.create_encoder(Some("right")).unwrap();

    // Record on worker threads; merge order is what the submit call says,
    // not who finished first.
    let left = std::thread::spawn(move || {
        left.set_render_target(RenderTarget::Backbuffer, None);
        left.draw(0..3, 0..1);
        left
    })
    .join()
    .unwrap();
    let right = std::thread::spawn(move || {
        right.set_render_target(RenderTarget::Backbuffer, None);
        right.draw(0..3, 0..1);
        right.draw(0..3, 0..1);
        right
    })
    .join()
    .unwrap();

    device.submit_encoders(vec![left, right]).unwrap();
    let stats = device.end_frame().unwrap();
    assert_eq!(stats.encoders_submitted, 3, "primary plus two workers");
    assert_eq!(stats.draw_calls, 3);
}

// --- Creation-time validation ---

#[test]
fn invalid_descriptions_never_reach_the_backend() {
    let (mut device, state) = mock_device(0);

    assert!(matches!(
        device.create_buffer(&BufferDescription {
            label: None,
            size: 0,
            usage: tessera_core::BufferUsage::VERTEX,
        }),
        Err(DeviceError::InvalidDescription(_))
    ));

    let mut degenerate = TextureDescription::sampled_2d("bad", 16, 16, TextureFormat::Rgba8Unorm);
    degenerate.size.height = 0;
    assert!(matches!(
        device.create_texture(&degenerate),
        Err(DeviceError::InvalidDescription(_))
    ));

    // R8Unorm is not in the mock's supported format list.
    assert!(matches!(
        device.create_texture(&TextureDescription::sampled_2d(
            "unsupported",
            16,
            16,
            TextureFormat::R8Unorm
        )),
        Err(DeviceError::UnsupportedCapability(_))
    ));

    assert!(state.lock().unwrap().live_buffers.is_empty());
}

#[test]
fn framebuffer_attachments_must_share_an_extent() {
    let (mut device, _) = mock_device(0);
    let small = device
        .create_texture(&TextureDescription::render_target(
            "small",
            64,
            64,
            TextureFormat::Rgba8Unorm,
        ))
        .unwrap();
    let large = device
        .create_texture(&TextureDescription::render_target(
            "large",
            128,
            128,
            TextureFormat::Rgba8Unorm,
        ))
        .unwrap();

    assert!(matches!(
        device.create_framebuffer(&FramebufferDescription {
            label: None,
            color_attachments: vec![small, large],
            depth_attachment: None,
        }),
        Err(DeviceError::InvalidDescription(_))
    ));
}

#[test]
fn buffer_writes_are_bounds_checked() {
    let (mut device, _) = mock_device(0);
    let buffer = device
        .create_buffer(&BufferDescription::uniform("bounded", 16))
        .unwrap();

    device.write_buffer(buffer, 8, &[0u8; 8]).unwrap();
    assert!(matches!(
        device.write_buffer(buffer, 9, &[0u8; 8]),
        Err(DeviceError::InvalidDescription(_))
    ));
    assert!(matches!(
        device.write_buffer(buffer, u64::MAX, &[0u8; 8]),
        Err(DeviceError::InvalidDescription(_))
    ));
}

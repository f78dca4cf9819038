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

//! wgpu instance, adapter, device and surface initialization.

use tessera_core::api::{BackendKind, DeviceOptions};
use tessera_core::error::DeviceError;
use tessera_core::platform::SurfaceHandle;
use wgpu::SurfaceTargetUnsafe;

/// The core wgpu state behind the adapter: logical device, queue, and the
/// presentation surface (or its headless absence).
pub(crate) struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter: wgpu::Adapter,
    pub surface: Option<wgpu::Surface<'static>>,
    pub surface_config: wgpu::SurfaceConfiguration,
    // Keeps the native window alive as long as the surface exists.
    #[allow(dead_code)]
    window: Option<SurfaceHandle>,
}

impl std::fmt::Debug for WgpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuContext")
            .field("adapter", &self.adapter.get_info().name)
            .field("headless", &self.surface.is_none())
            .field("width", &self.surface_config.width)
            .field("height", &self.surface_config.height)
            .finish()
    }
}

/// Maps a requested backend kind to the wgpu backend mask to search.
fn backend_mask(kind: BackendKind) -> wgpu::Backends {
    match kind {
        BackendKind::Vulkan => wgpu::Backends::VULKAN,
        BackendKind::Metal => wgpu::Backends::METAL,
        BackendKind::OpenGl => wgpu::Backends::GL,
        BackendKind::WebGpu | BackendKind::Null => wgpu::Backends::all(),
    }
}

impl WgpuContext {
    /// Initializes wgpu for `window` (or headless when `None`), preferring
    /// the native API matching `kind`.
    pub(crate) fn new(
        kind: BackendKind,
        window: Option<SurfaceHandle>,
        options: &DeviceOptions,
    ) -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: backend_mask(kind),
            flags: if options.debug {
                wgpu::InstanceFlags::debugging()
            } else {
                wgpu::InstanceFlags::default()
            },
            ..Default::default()
        });

        let surface = match &window {
            Some(window) => {
                let target = unsafe { SurfaceTargetUnsafe::from_window(window) }.map_err(|e| {
                    DeviceError::DeviceLost(format!("failed to derive surface target: {e}"))
                })?;
                let surface = unsafe { instance.create_surface_unsafe(target) }.map_err(|e| {
                    DeviceError::DeviceLost(format!("failed to create surface: {e}"))
                })?;
                Some(surface)
            }
            None => None,
        };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface.as_ref(),
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            DeviceError::UnsupportedCapability(format!("no suitable {kind} adapter: {e}"))
        })?;

        let adapter_info = adapter.get_info();
        log::info!(
            "using adapter \"{}\" ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        // Optional features the layer can exploit, masked by availability.
        let wanted = wgpu::Features::POLYGON_MODE_LINE
            | wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        let features = adapter.features() & wanted;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: options.label.as_deref(),
            required_features: features,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .map_err(|e| DeviceError::ResourceExhaustion(format!("device creation failed: {e}")))?;

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("wgpu uncaptured error: {e}");
        }));

        let surface_config = match (&surface, &window) {
            (Some(surface), Some(_)) => {
                let caps = surface.get_capabilities(&adapter);
                let format = caps
                    .formats
                    .iter()
                    .copied()
                    .find(|f| f.is_srgb())
                    .unwrap_or(caps.formats[0]);
                let present_mode = if options.vsync {
                    wgpu::PresentMode::AutoVsync
                } else {
                    wgpu::PresentMode::AutoNoVsync
                };
                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format,
                    width: options.width.max(1),
                    height: options.height.max(1),
                    present_mode,
                    desired_maximum_frame_latency: 2,
                    alpha_mode: caps.alpha_modes[0],
                    view_formats: vec![],
                };
                surface.configure(&device, &config);
                config
            }
            // Headless: keep a config around purely as the source of truth
            // for backbuffer size and format.
            _ => wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: wgpu::TextureFormat::Bgra8UnormSrgb,
                width: options.width.max(1),
                height: options.height.max(1),
                present_mode: wgpu::PresentMode::AutoVsync,
                desired_maximum_frame_latency: 2,
                alpha_mode: wgpu::CompositeAlphaMode::Opaque,
                view_formats: vec![],
            },
        };

        Ok(Self {
            device,
            queue,
            adapter,
            surface,
            surface_config,
            window,
        })
    }

    /// Applies a new swap-chain size.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.surface_config);
        }
    }
}

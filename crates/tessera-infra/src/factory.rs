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

//! The device factory: resolves a backend kind to a concrete adapter once,
//! at creation. The returned [`Device`] never branches on the kind again.

use crate::graphics::null::NullBackend;
#[cfg(feature = "wgpu-backend")]
use crate::graphics::wgpu::WgpuBackend;
use tessera_core::api::{BackendKind, DeviceOptions};
use tessera_core::error::DeviceError;
use tessera_core::platform::SurfaceHandle;
use tessera_core::traits::RenderBackend;
use tessera_core::Device;

/// Creates a device on the requested backend.
///
/// `window` supplies the presentation surface and must outlive the device;
/// pass `None` to render headless into an offscreen backbuffer.
/// [`BackendKind::Null`] needs no GPU at all and is what CI and tests use.
pub fn create_device(
    kind: BackendKind,
    window: Option<SurfaceHandle>,
    options: &DeviceOptions,
) -> Result<Device, DeviceError> {
    log::info!(
        "creating {kind} device ({}x{}, vsync {}, debug {})",
        options.width,
        options.height,
        options.vsync,
        options.debug
    );
    let backend: Box<dyn RenderBackend> = match kind {
        BackendKind::Null => Box::new(NullBackend::new()),
        #[cfg(feature = "wgpu-backend")]
        _ => Box::new(WgpuBackend::new(kind, window, options)?),
        #[cfg(not(feature = "wgpu-backend"))]
        _ => {
            let _ = window;
            return Err(DeviceError::UnsupportedCapability(format!(
                "{kind} backend (built without the wgpu-backend feature)"
            )));
        }
    };
    Device::new(backend, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_device_reports_null_capabilities() {
        let device = create_device(BackendKind::Null, None, &DeviceOptions::default())
            .expect("null device always succeeds");
        assert_eq!(
            device.capabilities().adapter.backend_kind,
            BackendKind::Null
        );
        assert_eq!(device.shader_target(), BackendKind::Null);
    }
}

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

//! Capability reporting: what the active adapter can do.

use super::enums::{BackendKind, DeviceType, TextureFormat};
use crate::tessera_bitflags;

tessera_bitflags! {
    /// Optional device features a frontend can probe before relying on
    /// them.
    pub struct DeviceFeatures: u32 {
        /// Compute shader dispatch.
        const COMPUTE = 1 << 0;
        /// GPU-driven (indirect) draw calls.
        const INDIRECT_DRAW = 1 << 1;
        /// More than one color attachment per framebuffer.
        const MULTIPLE_RENDER_TARGETS = 1 << 2;
        /// Anisotropic texture filtering.
        const ANISOTROPIC_FILTERING = 1 << 3;
        /// Edge-only polygon rasterization.
        const WIREFRAME = 1 << 4;
    }
}

/// Identity of the adapter the device runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// Human-readable adapter name.
    pub name: String,
    /// The backend the adapter translates to.
    pub backend_kind: BackendKind,
    /// Physical device classification.
    pub device_type: DeviceType,
    /// Backend/driver version string, for logs and bug reports.
    pub api_version: String,
}

/// Everything a frontend can query about the active backend before
/// creating resources.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Adapter identification.
    pub adapter: AdapterInfo,
    /// Supported optional features.
    pub features: DeviceFeatures,
    /// Texture formats the backend accepts for textures and render
    /// targets.
    pub supported_formats: Vec<TextureFormat>,
}

impl DeviceCapabilities {
    /// Returns `true` if `format` can be used for textures and render
    /// targets on this device.
    pub fn supports_format(&self, format: TextureFormat) -> bool {
        self.supported_formats.contains(&format)
    }

    /// Returns `true` if every flag in `features` is available.
    pub fn supports(&self, features: DeviceFeatures) -> bool {
        self.features.contains(features)
    }
}

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

//! Device creation options.

use std::path::PathBuf;

/// Configuration consumed once by the device factory.
#[derive(Debug, Clone)]
pub struct DeviceOptions {
    /// Enables the backend's validation layers and verbose diagnostics.
    pub debug: bool,
    /// Initial swap-chain (or headless backbuffer) width in pixels.
    pub width: u32,
    /// Initial swap-chain (or headless backbuffer) height in pixels.
    pub height: u32,
    /// Synchronize presentation with the display refresh.
    pub vsync: bool,
    /// Directory for on-disk shader cache files. `None` keeps the shader
    /// cache in memory only.
    pub shader_cache_dir: Option<PathBuf>,
    /// Debug label applied to the native device objects.
    pub label: Option<String>,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            debug: cfg!(debug_assertions),
            width: 1280,
            height: 720,
            vsync: true,
            shader_cache_dir: None,
            label: None,
        }
    }
}

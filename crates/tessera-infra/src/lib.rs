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

//! # Tessera Infra
//!
//! Concrete implementations of the `tessera-core` backend contracts: the
//! wgpu adapter (windowed or headless), the null adapter for CI and tests,
//! and the [`create_device`] factory that resolves a
//! [`BackendKind`](tessera_core::BackendKind) to an adapter once at device
//! creation.

#![warn(missing_docs)]

mod factory;
pub mod graphics;

pub use factory::create_device;
pub use graphics::null::NullBackend;
#[cfg(feature = "wgpu-backend")]
pub use graphics::wgpu::WgpuBackend;

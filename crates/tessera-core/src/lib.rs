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

//! # Tessera Core
//!
//! Backend-agnostic graphics layer: a single rendering frontend drives
//! interchangeable backends through the [`Device`] interface without
//! depending on any backend's types.
//!
//! The pieces, leaves first:
//!
//! - [`handle`]: generation-validated handles and the slot pool behind
//!   every resource kind.
//! - [`api`]: immutable state objects, resource descriptions and the other
//!   value types of the contract.
//! - [`traits`]: the [`RenderBackend`](traits::RenderBackend) and
//!   [`CommandEncoder`](traits::CommandEncoder) contracts adapters
//!   implement (see the `tessera-infra` crate for the wgpu and null
//!   adapters).
//! - [`shader`]: the runtime shader pipeline, a content-hash-keyed cache
//!   over SPIR-V cross-compilation.
//! - [`device`]: the [`Device`] itself, owning pools, caches, the frame
//!   lifecycle and deferred destruction.

#![warn(missing_docs)]

pub mod api;
pub mod device;
pub mod error;
pub mod handle;
pub mod math;
pub mod platform;
pub mod shader;
pub mod traits;
pub mod utils;

pub use api::*;
pub use device::{Device, FrameStats};
pub use error::{CompileError, DeviceError};
pub use handle::{Handle, ResourcePool};
pub use platform::{SurfaceHandle, WindowHandle};
pub use shader::{CompiledShaderSet, CompiledStage, ShaderArtifact, ShaderCache};
pub use traits::{CommandEncoder, FenceValue, PipelineDescription, RenderBackend};

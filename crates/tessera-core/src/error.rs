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

//! The error hierarchy of the graphics layer.

use crate::api::enums::BackendKind;
use std::fmt;

/// An error raised by shader cross-compilation or the shader cache.
#[derive(Debug)]
pub enum CompileError {
    /// The portable bytecode could not be parsed.
    ParseFailed {
        /// Shader name, for diagnostics.
        name: String,
        /// Parser diagnostic text.
        details: String,
    },
    /// The parsed module failed semantic validation.
    ValidationFailed {
        /// Shader name.
        name: String,
        /// Validator diagnostic text.
        details: String,
    },
    /// Emitting the backend-native representation failed.
    TargetFailed {
        /// Shader name.
        name: String,
        /// The representation being emitted.
        target: BackendKind,
        /// Back-end writer diagnostic text.
        details: String,
    },
    /// The shader has no entry point for the requested stage.
    MissingEntryPoint {
        /// Shader name.
        name: String,
        /// The stage that was requested.
        stage: &'static str,
    },
    /// Reading or writing a cache file failed.
    Cache {
        /// The cache file involved.
        path: String,
        /// The underlying I/O or decode error.
        details: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::ParseFailed { name, details } => {
                write!(f, "failed to parse bytecode of shader '{name}': {details}")
            }
            CompileError::ValidationFailed { name, details } => {
                write!(f, "shader '{name}' failed validation: {details}")
            }
            CompileError::TargetFailed {
                name,
                target,
                details,
            } => {
                write!(
                    f,
                    "cross-compiling shader '{name}' for {target} failed: {details}"
                )
            }
            CompileError::MissingEntryPoint { name, stage } => {
                write!(f, "shader '{name}' has no {stage} entry point")
            }
            CompileError::Cache { path, details } => {
                write!(f, "shader cache file '{path}': {details}")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// An error returned by the device interface or an adapter.
///
/// Every adapter maps its native failures into these kinds; backend error
/// types never cross the interface boundary.
#[derive(Debug)]
pub enum DeviceError {
    /// A handle failed generation or index validation. The resource no
    /// longer exists; recoverable.
    InvalidHandle {
        /// The resource kind, for diagnostics.
        kind: &'static str,
    },
    /// A creation description failed validation before reaching the
    /// backend.
    InvalidDescription(String),
    /// A requested format or feature is not available on the active
    /// backend. The caller decides the fallback; the device never
    /// substitutes silently.
    UnsupportedCapability(String),
    /// Shader cross-compilation or pipeline creation failed. Carries the
    /// diagnostic text; only fixing the shader source resolves it.
    Compilation(CompileError),
    /// The backend refused an allocation. Recoverable by freeing resources
    /// and retrying.
    ResourceExhaustion(String),
    /// A call was made outside its required context, e.g. a draw outside a
    /// frame or with no pipeline bound. A frontend programming error.
    ContractViolation(&'static str),
    /// The backend reports its device or context is gone. Fatal to this
    /// device instance; tear down and recreate through the factory.
    DeviceLost(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::InvalidHandle { kind } => {
                write!(f, "invalid {kind} handle (stale or never issued)")
            }
            DeviceError::InvalidDescription(msg) => {
                write!(f, "invalid resource description: {msg}")
            }
            DeviceError::UnsupportedCapability(msg) => {
                write!(f, "unsupported capability: {msg}")
            }
            DeviceError::Compilation(err) => write!(f, "compilation failed: {err}"),
            DeviceError::ResourceExhaustion(msg) => {
                write!(f, "backend out of resources: {msg}")
            }
            DeviceError::ContractViolation(what) => {
                write!(f, "contract violation: {what}")
            }
            DeviceError::DeviceLost(msg) => write!(f, "device lost: {msg}"),
        }
    }
}

impl std::error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeviceError::Compilation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CompileError> for DeviceError {
    fn from(err: CompileError) -> Self {
        DeviceError::Compilation(err)
    }
}

/// Builds a [`DeviceError::ContractViolation`] and logs it loudly; the
/// frontend bug should be visible even when the returned error is dropped.
pub(crate) fn contract_violation(what: &'static str) -> DeviceError {
    log::error!("contract violation: {what}");
    DeviceError::ContractViolation(what)
}

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

//! The window-system boundary.
//!
//! The graphics layer never creates windows; it consumes a surface handle
//! supplied by the windowing collaborator and requires it to stay valid for
//! the device's lifetime.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

/// The windowing traits a surface provider must satisfy, combined so the
/// pair can travel as one trait object.
pub trait WindowHandle: HasWindowHandle + HasDisplayHandle {}

impl<T: HasWindowHandle + HasDisplayHandle> WindowHandle for T {}

/// A shared, thread-safe surface handle passed to the device factory.
pub type SurfaceHandle = Arc<dyn WindowHandle + Send + Sync>;

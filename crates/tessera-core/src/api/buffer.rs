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

//! GPU buffer descriptions and indirect-draw argument layouts.

use crate::tessera_bitflags;
use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;

tessera_bitflags! {
    /// Allowed usages of a buffer. The adapter uses these to choose memory
    /// placement and to validate binds.
    pub struct BufferUsage: u32 {
        /// Source of copy operations.
        const COPY_SRC = 1 << 0;
        /// Destination of copy operations and of `write_buffer`.
        const COPY_DST = 1 << 1;
        /// Bindable as a vertex buffer.
        const VERTEX = 1 << 2;
        /// Bindable as an index buffer.
        const INDEX = 1 << 3;
        /// Bindable as a uniform buffer.
        const UNIFORM = 1 << 4;
        /// Bindable as a storage buffer.
        const STORAGE = 1 << 5;
        /// Usable as the argument source of indirect draws.
        const INDIRECT = 1 << 6;
    }
}

/// Describes a buffer at creation time. Consumed by `create_buffer`; only
/// the size and usage are retained afterwards, for bounds-checked updates.
#[derive(Debug, Clone)]
pub struct BufferDescription<'a> {
    /// Optional debug label, forwarded to the native object.
    pub label: Option<Cow<'a, str>>,
    /// Total size in bytes. Must be non-zero.
    pub size: u64,
    /// Allowed usages.
    pub usage: BufferUsage,
}

impl<'a> BufferDescription<'a> {
    /// A vertex buffer of `size` bytes, updatable from the CPU.
    pub fn vertex(label: &'a str, size: u64) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            size,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
        }
    }

    /// An index buffer of `size` bytes, updatable from the CPU.
    pub fn index(label: &'a str, size: u64) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            size,
            usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
        }
    }

    /// A uniform buffer of `size` bytes, updatable from the CPU.
    pub fn uniform(label: &'a str, size: u64) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            size,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        }
    }
}

/// Argument layout of a non-indexed indirect draw, as stored in an
/// [`BufferUsage::INDIRECT`] buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndirectArgs {
    /// Number of vertices to draw.
    pub vertex_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// Index of the first vertex.
    pub first_vertex: u32,
    /// Index of the first instance.
    pub first_instance: u32,
}

/// Argument layout of an indexed indirect draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
    /// Number of indices to draw.
    pub index_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// Index of the first index.
    pub first_index: u32,
    /// Signed offset added to each index.
    pub base_vertex: i32,
    /// Index of the first instance.
    pub first_instance: u32,
}

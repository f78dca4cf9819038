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

//! Vertex input layout description.

/// The format of one vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One 32-bit float.
    Float32,
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// One 32-bit unsigned integer.
    Uint32,
    /// One 32-bit signed integer.
    Sint32,
    /// Four 8-bit unsigned integers.
    Uint8x4,
    /// Four 8-bit unsigned integers normalized to `[0, 1]`. Typical color.
    Unorm8x4,
}

impl VertexFormat {
    /// Size of the attribute in bytes.
    pub const fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 | VertexFormat::Sint32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
            VertexFormat::Uint8x4 | VertexFormat::Unorm8x4 => 4,
        }
    }
}

/// Whether a vertex buffer advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    /// Advance per vertex.
    #[default]
    Vertex,
    /// Advance per instance.
    Instance,
}

/// One attribute within a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The shader input location this attribute feeds.
    pub shader_location: u32,
    /// Data format of the attribute.
    pub format: VertexFormat,
    /// Byte offset from the start of a vertex.
    pub offset: u64,
}

/// Memory layout of one vertex buffer slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    /// Byte distance between consecutive elements.
    pub stride: u64,
    /// Per-vertex or per-instance stepping.
    pub step_mode: VertexStepMode,
    /// Attributes read from each element.
    pub attributes: Vec<VertexAttribute>,
}

/// The full vertex input layout of a pipeline: one entry per bound vertex
/// buffer slot. Participates in the pipeline cache key, hence `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    /// Per-slot buffer layouts, indexed by bind slot.
    pub buffers: Vec<VertexBufferLayout>,
}

impl VertexLayout {
    /// A single tightly-packed buffer whose attributes are laid out in
    /// declaration order at sequential shader locations.
    pub fn packed(formats: &[VertexFormat]) -> Self {
        let mut attributes = Vec::with_capacity(formats.len());
        let mut offset = 0;
        for (location, format) in formats.iter().enumerate() {
            attributes.push(VertexAttribute {
                shader_location: location as u32,
                format: *format,
                offset,
            });
            offset += format.size();
        }
        Self {
            buffers: vec![VertexBufferLayout {
                stride: offset,
                step_mode: VertexStepMode::Vertex,
                attributes,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_computes_offsets_and_stride() {
        let layout =
            VertexLayout::packed(&[VertexFormat::Float32x3, VertexFormat::Float32x2, VertexFormat::Unorm8x4]);
        let buffer = &layout.buffers[0];
        assert_eq!(buffer.stride, 12 + 8 + 4);
        assert_eq!(buffer.attributes[1].offset, 12);
        assert_eq!(buffer.attributes[2].shader_location, 2);
    }
}

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

//! The pipeline cache key and the output-format component of it.

use super::enums::{SampleCount, TextureFormat};
use super::resource::ShaderHandle;
use super::state::{BlendState, DepthState, RasterState, StencilState};
use super::vertex::VertexLayout;

/// The render-target signature a pipeline is compiled against: color
/// formats in output order, the optional depth format, and the sample
/// count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputFormat {
    /// Formats of the color attachments.
    pub color_formats: Vec<TextureFormat>,
    /// Format of the depth/stencil attachment, if any.
    pub depth_format: Option<TextureFormat>,
    /// Samples per pixel of every attachment.
    pub sample_count: SampleCount,
}

impl OutputFormat {
    /// A single color target without depth.
    pub fn single_color(format: TextureFormat) -> Self {
        Self {
            color_formats: vec![format],
            depth_format: None,
            sample_count: SampleCount::X1,
        }
    }

    /// A single color target with a depth attachment.
    pub fn color_depth(color: TextureFormat, depth: TextureFormat) -> Self {
        Self {
            color_formats: vec![color],
            depth_format: Some(depth),
            sample_count: SampleCount::X1,
        }
    }
}

/// The composite identity of a pipeline object.
///
/// Everything that feeds native pipeline creation is part of the key: the
/// shader set, all four state objects, the vertex input layout and the
/// output signature. Two draws sharing a key share one native pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// The compiled shader set.
    pub shader: ShaderHandle,
    /// Rasterizer state.
    pub raster: RasterState,
    /// Depth test state.
    pub depth: DepthState,
    /// Blend state.
    pub blend: BlendState,
    /// Stencil state.
    pub stencil: StencilState,
    /// Vertex input layout.
    pub vertex_layout: VertexLayout,
    /// Render-target signature.
    pub output: OutputFormat,
}

impl PipelineKey {
    /// A key with default raster/depth/blend/stencil state.
    pub fn with_defaults(
        shader: ShaderHandle,
        vertex_layout: VertexLayout,
        output: OutputFormat,
    ) -> Self {
        Self {
            shader,
            raster: RasterState::default(),
            depth: DepthState::default(),
            blend: BlendState::default(),
            stencil: StencilState::default(),
            vertex_layout,
            output,
        }
    }
}

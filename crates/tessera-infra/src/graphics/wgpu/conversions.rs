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

//! Conversions from the backend-agnostic value types into wgpu's.
//!
//! Pure functions of their input. Pipeline-relevant conversions run once
//! per pipeline-cache miss, never per draw call.

use tessera_core::api::state::{BlendState, ColorWrites, RasterState, StencilFaceState};
use tessera_core::api::texture::TextureDimension;
use tessera_core::api::{
    AddressMode, BlendFactor, BlendOperation, BufferUsage, CompareFunction, CullMode, DepthState,
    FillMode, FilterMode, FrontFace, IndexFormat, ShaderStageFlags, StencilOperation, StencilState,
    TextureFormat, TextureUsage, VertexFormat, VertexStepMode,
};
use tessera_core::math::{Extent3D, Origin3D};

/// Converts a backend-agnostic value into its wgpu equivalent.
pub(crate) trait IntoWgpu<W> {
    fn into_wgpu(self) -> W;
}

impl IntoWgpu<wgpu::TextureFormat> for TextureFormat {
    fn into_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
            TextureFormat::Rg8Unorm => wgpu::TextureFormat::Rg8Unorm,
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            TextureFormat::R16Float => wgpu::TextureFormat::R16Float,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
            TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
            TextureFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
        }
    }
}

impl IntoWgpu<wgpu::CompareFunction> for CompareFunction {
    fn into_wgpu(self) -> wgpu::CompareFunction {
        match self {
            CompareFunction::Never => wgpu::CompareFunction::Never,
            CompareFunction::Less => wgpu::CompareFunction::Less,
            CompareFunction::Equal => wgpu::CompareFunction::Equal,
            CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
            CompareFunction::Greater => wgpu::CompareFunction::Greater,
            CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
            CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
            CompareFunction::Always => wgpu::CompareFunction::Always,
        }
    }
}

impl IntoWgpu<wgpu::PolygonMode> for FillMode {
    fn into_wgpu(self) -> wgpu::PolygonMode {
        match self {
            FillMode::Solid => wgpu::PolygonMode::Fill,
            FillMode::Wireframe => wgpu::PolygonMode::Line,
        }
    }
}

impl IntoWgpu<Option<wgpu::Face>> for CullMode {
    fn into_wgpu(self) -> Option<wgpu::Face> {
        match self {
            CullMode::None => None,
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
        }
    }
}

impl IntoWgpu<wgpu::FrontFace> for FrontFace {
    fn into_wgpu(self) -> wgpu::FrontFace {
        match self {
            FrontFace::CounterClockwise => wgpu::FrontFace::Ccw,
            FrontFace::Clockwise => wgpu::FrontFace::Cw,
        }
    }
}

impl IntoWgpu<wgpu::BlendFactor> for BlendFactor {
    fn into_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFactor::Zero => wgpu::BlendFactor::Zero,
            BlendFactor::One => wgpu::BlendFactor::One,
            BlendFactor::Src => wgpu::BlendFactor::Src,
            BlendFactor::OneMinusSrc => wgpu::BlendFactor::OneMinusSrc,
            BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFactor::Dst => wgpu::BlendFactor::Dst,
            BlendFactor::OneMinusDst => wgpu::BlendFactor::OneMinusDst,
            BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        }
    }
}

impl IntoWgpu<wgpu::BlendOperation> for BlendOperation {
    fn into_wgpu(self) -> wgpu::BlendOperation {
        match self {
            BlendOperation::Add => wgpu::BlendOperation::Add,
            BlendOperation::Subtract => wgpu::BlendOperation::Subtract,
            BlendOperation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
            BlendOperation::Min => wgpu::BlendOperation::Min,
            BlendOperation::Max => wgpu::BlendOperation::Max,
        }
    }
}

impl IntoWgpu<wgpu::StencilOperation> for StencilOperation {
    fn into_wgpu(self) -> wgpu::StencilOperation {
        match self {
            StencilOperation::Keep => wgpu::StencilOperation::Keep,
            StencilOperation::Zero => wgpu::StencilOperation::Zero,
            StencilOperation::Replace => wgpu::StencilOperation::Replace,
            StencilOperation::Invert => wgpu::StencilOperation::Invert,
            StencilOperation::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
            StencilOperation::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
            StencilOperation::IncrementWrap => wgpu::StencilOperation::IncrementWrap,
            StencilOperation::DecrementWrap => wgpu::StencilOperation::DecrementWrap,
        }
    }
}

impl IntoWgpu<wgpu::IndexFormat> for IndexFormat {
    fn into_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

impl IntoWgpu<wgpu::AddressMode> for AddressMode {
    fn into_wgpu(self) -> wgpu::AddressMode {
        match self {
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

impl IntoWgpu<wgpu::FilterMode> for FilterMode {
    fn into_wgpu(self) -> wgpu::FilterMode {
        match self {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl IntoWgpu<wgpu::TextureDimension> for TextureDimension {
    fn into_wgpu(self) -> wgpu::TextureDimension {
        match self {
            TextureDimension::D1 => wgpu::TextureDimension::D1,
            TextureDimension::D2 => wgpu::TextureDimension::D2,
            TextureDimension::D3 => wgpu::TextureDimension::D3,
        }
    }
}

impl IntoWgpu<wgpu::VertexFormat> for VertexFormat {
    fn into_wgpu(self) -> wgpu::VertexFormat {
        match self {
            VertexFormat::Float32 => wgpu::VertexFormat::Float32,
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
            VertexFormat::Uint32 => wgpu::VertexFormat::Uint32,
            VertexFormat::Sint32 => wgpu::VertexFormat::Sint32,
            VertexFormat::Uint8x4 => wgpu::VertexFormat::Uint8x4,
            VertexFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
        }
    }
}

impl IntoWgpu<wgpu::VertexStepMode> for VertexStepMode {
    fn into_wgpu(self) -> wgpu::VertexStepMode {
        match self {
            VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
            VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}

impl IntoWgpu<wgpu::BufferUsages> for BufferUsage {
    fn into_wgpu(self) -> wgpu::BufferUsages {
        let mut usages = wgpu::BufferUsages::empty();
        if self.contains(BufferUsage::COPY_SRC) {
            usages |= wgpu::BufferUsages::COPY_SRC;
        }
        if self.contains(BufferUsage::COPY_DST) {
            usages |= wgpu::BufferUsages::COPY_DST;
        }
        if self.contains(BufferUsage::VERTEX) {
            usages |= wgpu::BufferUsages::VERTEX;
        }
        if self.contains(BufferUsage::INDEX) {
            usages |= wgpu::BufferUsages::INDEX;
        }
        if self.contains(BufferUsage::UNIFORM) {
            usages |= wgpu::BufferUsages::UNIFORM;
        }
        if self.contains(BufferUsage::STORAGE) {
            usages |= wgpu::BufferUsages::STORAGE;
        }
        if self.contains(BufferUsage::INDIRECT) {
            usages |= wgpu::BufferUsages::INDIRECT;
        }
        usages
    }
}

impl IntoWgpu<wgpu::TextureUsages> for TextureUsage {
    fn into_wgpu(self) -> wgpu::TextureUsages {
        let mut usages = wgpu::TextureUsages::empty();
        if self.contains(TextureUsage::COPY_SRC) {
            usages |= wgpu::TextureUsages::COPY_SRC;
        }
        if self.contains(TextureUsage::COPY_DST) {
            usages |= wgpu::TextureUsages::COPY_DST;
        }
        if self.contains(TextureUsage::SAMPLED) {
            usages |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if self.contains(TextureUsage::RENDER_TARGET)
            || self.contains(TextureUsage::DEPTH_STENCIL)
        {
            usages |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        usages
    }
}

impl IntoWgpu<wgpu::ShaderStages> for ShaderStageFlags {
    fn into_wgpu(self) -> wgpu::ShaderStages {
        let mut stages = wgpu::ShaderStages::NONE;
        if self.contains(ShaderStageFlags::VERTEX) {
            stages |= wgpu::ShaderStages::VERTEX;
        }
        if self.contains(ShaderStageFlags::FRAGMENT) {
            stages |= wgpu::ShaderStages::FRAGMENT;
        }
        if self.contains(ShaderStageFlags::COMPUTE) {
            stages |= wgpu::ShaderStages::COMPUTE;
        }
        stages
    }
}

impl IntoWgpu<wgpu::ColorWrites> for ColorWrites {
    fn into_wgpu(self) -> wgpu::ColorWrites {
        let mut writes = wgpu::ColorWrites::empty();
        if self.contains(ColorWrites::R) {
            writes |= wgpu::ColorWrites::RED;
        }
        if self.contains(ColorWrites::G) {
            writes |= wgpu::ColorWrites::GREEN;
        }
        if self.contains(ColorWrites::B) {
            writes |= wgpu::ColorWrites::BLUE;
        }
        if self.contains(ColorWrites::A) {
            writes |= wgpu::ColorWrites::ALPHA;
        }
        writes
    }
}

impl IntoWgpu<wgpu::Extent3d> for Extent3D {
    fn into_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.depth_or_array_layers,
        }
    }
}

impl IntoWgpu<wgpu::Origin3d> for Origin3D {
    fn into_wgpu(self) -> wgpu::Origin3d {
        wgpu::Origin3d {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

impl IntoWgpu<Option<wgpu::BlendState>> for BlendState {
    fn into_wgpu(self) -> Option<wgpu::BlendState> {
        if !self.enable {
            return None;
        }
        Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: self.color.src_factor.into_wgpu(),
                dst_factor: self.color.dst_factor.into_wgpu(),
                operation: self.color.operation.into_wgpu(),
            },
            alpha: wgpu::BlendComponent {
                src_factor: self.alpha.src_factor.into_wgpu(),
                dst_factor: self.alpha.dst_factor.into_wgpu(),
                operation: self.alpha.operation.into_wgpu(),
            },
        })
    }
}

impl IntoWgpu<wgpu::StencilFaceState> for StencilFaceState {
    fn into_wgpu(self) -> wgpu::StencilFaceState {
        wgpu::StencilFaceState {
            compare: self.compare.into_wgpu(),
            fail_op: self.fail_op.into_wgpu(),
            depth_fail_op: self.depth_fail_op.into_wgpu(),
            pass_op: self.pass_op.into_wgpu(),
        }
    }
}

impl IntoWgpu<wgpu::PrimitiveState> for RasterState {
    fn into_wgpu(self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: self.front_face.into_wgpu(),
            cull_mode: self.cull_mode.into_wgpu(),
            polygon_mode: self.fill_mode.into_wgpu(),
            unclipped_depth: self.depth_clamp,
            conservative: false,
        }
    }
}

/// Builds the wgpu depth/stencil descriptor from the depth and stencil
/// state objects and the attachment format.
pub(crate) fn depth_stencil_state(
    depth: DepthState,
    stencil: StencilState,
    format: TextureFormat,
) -> wgpu::DepthStencilState {
    let stencil_state = if stencil.test_enable {
        wgpu::StencilState {
            front: stencil.front.into_wgpu(),
            back: stencil.back.into_wgpu(),
            read_mask: stencil.read_mask,
            write_mask: stencil.write_mask,
        }
    } else {
        wgpu::StencilState::default()
    };
    wgpu::DepthStencilState {
        format: format.into_wgpu(),
        depth_write_enabled: depth.write_enable,
        depth_compare: if depth.test_enable {
            depth.compare.into_wgpu()
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: stencil_state,
        bias: wgpu::DepthBiasState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_blend_converts_to_none() {
        assert_eq!(BlendState::opaque().into_wgpu(), None);
        let alpha: Option<wgpu::BlendState> = BlendState::alpha_blend().into_wgpu();
        let alpha = alpha.expect("enabled blend must convert");
        assert_eq!(alpha.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(alpha.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn cull_mode_maps_to_optional_face() {
        assert_eq!(CullMode::None.into_wgpu(), None::<wgpu::Face>);
        assert_eq!(CullMode::Back.into_wgpu(), Some(wgpu::Face::Back));
        assert_eq!(CullMode::Front.into_wgpu(), Some(wgpu::Face::Front));
    }

    #[test]
    fn raster_state_carries_fill_and_winding() {
        let state: wgpu::PrimitiveState = RasterState::wireframe().into_wgpu();
        assert_eq!(state.polygon_mode, wgpu::PolygonMode::Line);
        assert_eq!(state.cull_mode, None);
        assert_eq!(state.front_face, wgpu::FrontFace::Ccw);
    }

    #[test]
    fn disabled_depth_test_compares_always() {
        let ds = depth_stencil_state(
            DepthState::disabled(),
            StencilState::disabled(),
            TextureFormat::Depth32Float,
        );
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Always);
        assert!(!ds.depth_write_enabled);
        assert_eq!(ds.format, wgpu::TextureFormat::Depth32Float);
    }

    #[test]
    fn usage_flags_translate_bit_by_bit() {
        let usage = BufferUsage::VERTEX | BufferUsage::COPY_DST;
        let wgpu_usage: wgpu::BufferUsages = usage.into_wgpu();
        assert!(wgpu_usage.contains(wgpu::BufferUsages::VERTEX));
        assert!(wgpu_usage.contains(wgpu::BufferUsages::COPY_DST));
        assert!(!wgpu_usage.contains(wgpu::BufferUsages::INDEX));

        let tex = TextureUsage::SAMPLED | TextureUsage::DEPTH_STENCIL;
        let wgpu_tex: wgpu::TextureUsages = tex.into_wgpu();
        assert!(wgpu_tex.contains(wgpu::TextureUsages::TEXTURE_BINDING));
        assert!(wgpu_tex.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
    }

    #[test]
    fn extent_and_origin_convert_fieldwise() {
        let extent = Extent3D {
            width: 640,
            height: 360,
            depth_or_array_layers: 6,
        };
        let w: wgpu::Extent3d = extent.into_wgpu();
        assert_eq!((w.width, w.height, w.depth_or_array_layers), (640, 360, 6));

        let origin = Origin3D { x: 1, y: 2, z: 3 };
        let w: wgpu::Origin3d = origin.into_wgpu();
        assert_eq!((w.x, w.y, w.z), (1, 2, 3));
    }
}

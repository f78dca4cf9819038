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

//! Backend-agnostic enums shared across descriptions, state objects and the
//! device contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a graphics backend, both for adapter selection at device
/// creation and as the target tag of shader cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Vulkan. Consumes SPIR-V unmodified.
    Vulkan,
    /// Apple's Metal. Consumes MSL source.
    Metal,
    /// OpenGL / OpenGL ES. Consumes GLSL source.
    OpenGl,
    /// WebGPU-shaped backends (wgpu). Consume WGSL source.
    WebGpu,
    /// The no-op backend used headless and in tests. Accepts SPIR-V.
    Null,
}

impl BackendKind {
    /// Stable lowercase name, used as the shader cache file suffix.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Vulkan => "vulkan",
            BackendKind::Metal => "metal",
            BackendKind::OpenGl => "opengl",
            BackendKind::WebGpu => "webgpu",
            BackendKind::Null => "null",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The programmable stage a shader module targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The fragment (pixel) shader stage.
    Fragment,
    /// The compute shader stage.
    Compute,
}

/// The physical type of the graphics device behind an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    /// A GPU integrated into the CPU package.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A virtualized GPU.
    VirtualGpu,
    /// A software rasterizer on the CPU.
    Cpu,
    /// Anything the backend could not classify.
    #[default]
    Unknown,
}

/// Texel format of a texture or render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit single channel, normalized.
    R8Unorm,
    /// 8-bit two channel, normalized.
    Rg8Unorm,
    /// 8-bit RGBA, normalized.
    Rgba8Unorm,
    /// 8-bit RGBA, normalized, sRGB-encoded.
    Rgba8UnormSrgb,
    /// 8-bit BGRA, normalized. Common swap-chain format.
    Bgra8Unorm,
    /// 8-bit BGRA, normalized, sRGB-encoded. Common swap-chain format.
    Bgra8UnormSrgb,
    /// 16-bit float single channel.
    R16Float,
    /// 16-bit float RGBA.
    Rgba16Float,
    /// 32-bit float single channel.
    R32Float,
    /// 32-bit float RGBA.
    Rgba32Float,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Returns `true` for depth and depth/stencil formats.
    pub const fn is_depth_format(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float | TextureFormat::Depth24PlusStencil8
        )
    }

    /// Returns `true` if the format carries a stencil aspect.
    pub const fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::Depth24PlusStencil8)
    }

    /// Returns `true` for sRGB-encoded formats.
    pub const fn is_srgb(&self) -> bool {
        matches!(
            self,
            TextureFormat::Rgba8UnormSrgb | TextureFormat::Bgra8UnormSrgb
        )
    }

    /// Bytes per texel for uncompressed color formats, `None` for
    /// depth/stencil formats whose layout is opaque to the CPU.
    pub const fn bytes_per_texel(&self) -> Option<u32> {
        match self {
            TextureFormat::R8Unorm => Some(1),
            TextureFormat::Rg8Unorm | TextureFormat::R16Float => Some(2),
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb
            | TextureFormat::R32Float => Some(4),
            TextureFormat::Rgba16Float => Some(8),
            TextureFormat::Rgba32Float => Some(16),
            TextureFormat::Depth32Float | TextureFormat::Depth24PlusStencil8 => None,
        }
    }
}

/// Comparison function for depth, stencil and shadow-sampler tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// Passes when the new value is less than the stored one.
    Less,
    /// Passes on equality.
    Equal,
    /// Passes when less than or equal.
    LessEqual,
    /// Passes when greater.
    Greater,
    /// Passes on inequality.
    NotEqual,
    /// Passes when greater than or equal.
    GreaterEqual,
    /// The test always passes.
    #[default]
    Always,
}

/// How polygons are filled during rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    /// Fill the polygon interior.
    #[default]
    Solid,
    /// Rasterize edges only.
    Wireframe,
}

/// Which triangle faces are discarded before rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Cull nothing.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    #[default]
    Back,
}

/// The vertex winding that makes a triangle front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise winding is the front face.
    #[default]
    CounterClockwise,
    /// Clockwise winding is the front face.
    Clockwise,
}

/// Multiplier applied to a blend input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`
    Zero,
    /// `1`
    One,
    /// Source color.
    Src,
    /// `1 - source color`
    OneMinusSrc,
    /// Source alpha.
    SrcAlpha,
    /// `1 - source alpha`
    OneMinusSrcAlpha,
    /// Destination color.
    Dst,
    /// `1 - destination color`
    OneMinusDst,
    /// Destination alpha.
    DstAlpha,
    /// `1 - destination alpha`
    OneMinusDstAlpha,
}

/// Operation combining the two weighted blend inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// `src * src_factor + dst * dst_factor`
    #[default]
    Add,
    /// `src * src_factor - dst * dst_factor`
    Subtract,
    /// `dst * dst_factor - src * src_factor`
    ReverseSubtract,
    /// Component-wise minimum, ignoring factors.
    Min,
    /// Component-wise maximum, ignoring factors.
    Max,
}

/// Action performed on a stencil buffer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Leave the stored value untouched.
    #[default]
    Keep,
    /// Store zero.
    Zero,
    /// Store the reference value.
    Replace,
    /// Bitwise-invert the stored value.
    Invert,
    /// Increment, clamping at the maximum.
    IncrementClamp,
    /// Decrement, clamping at zero.
    DecrementClamp,
    /// Increment with wraparound.
    IncrementWrap,
    /// Decrement with wraparound.
    DecrementWrap,
}

/// Data type of the entries of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    Uint16,
    /// 32-bit unsigned indices.
    #[default]
    Uint32,
}

/// Samples per pixel for multisample anti-aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleCount {
    /// Multisampling disabled.
    #[default]
    X1,
    /// 2x MSAA.
    X2,
    /// 4x MSAA.
    X4,
    /// 8x MSAA.
    X8,
}

impl SampleCount {
    /// The raw sample count.
    pub const fn as_u32(&self) -> u32 {
        match self {
            SampleCount::X1 => 1,
            SampleCount::X2 => 2,
            SampleCount::X4 => 4,
            SampleCount::X8 => 8,
        }
    }
}

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

//! Texture and sampler descriptions.

use super::enums::{CompareFunction, SampleCount, TextureFormat};
use crate::math::Extent3D;
use crate::tessera_bitflags;
use std::borrow::Cow;

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// One-dimensional.
    D1,
    /// Two-dimensional.
    #[default]
    D2,
    /// Three-dimensional (volumetric).
    D3,
}

/// How coordinates outside `[0, 1]` are resolved when sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Wrap around. `1.1` samples at `0.1`.
    #[default]
    Repeat,
    /// Clamp to the edge texel.
    ClampToEdge,
    /// Wrap, mirroring at each integer boundary.
    MirrorRepeat,
}

/// Texel filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest-texel point sampling.
    Nearest,
    /// Weighted average of neighboring texels.
    #[default]
    Linear,
}

tessera_bitflags! {
    /// Allowed usages of a texture.
    pub struct TextureUsage: u32 {
        /// Source of copy operations.
        const COPY_SRC = 1 << 0;
        /// Destination of copy operations and of `write_texture`.
        const COPY_DST = 1 << 1;
        /// Sampled from shaders.
        const SAMPLED = 1 << 2;
        /// Color attachment of a framebuffer.
        const RENDER_TARGET = 1 << 3;
        /// Depth/stencil attachment of a framebuffer.
        const DEPTH_STENCIL = 1 << 4;
    }
}

/// Describes a texture at creation time.
#[derive(Debug, Clone)]
pub struct TextureDescription<'a> {
    /// Optional debug label, forwarded to the native object.
    pub label: Option<Cow<'a, str>>,
    /// Texel dimensions. Must not be degenerate.
    pub size: Extent3D,
    /// Mipmap chain length, at least 1.
    pub mip_level_count: u32,
    /// Samples per texel, >1 only for render targets.
    pub sample_count: SampleCount,
    /// 1D, 2D or 3D.
    pub dimension: TextureDimension,
    /// Texel format. Must be supported by the active backend.
    pub format: TextureFormat,
    /// Allowed usages.
    pub usage: TextureUsage,
}

impl<'a> TextureDescription<'a> {
    /// A sampled 2D color texture with a single mip level.
    pub fn sampled_2d(label: &'a str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            size: Extent3D::new_2d(width, height),
            mip_level_count: 1,
            sample_count: SampleCount::X1,
            dimension: TextureDimension::D2,
            format,
            usage: TextureUsage::SAMPLED | TextureUsage::COPY_DST,
        }
    }

    /// A 2D render-target texture that can also be sampled.
    pub fn render_target(label: &'a str, width: u32, height: u32, format: TextureFormat) -> Self {
        let usage = if format.is_depth_format() {
            TextureUsage::DEPTH_STENCIL | TextureUsage::SAMPLED
        } else {
            TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED
        };
        Self {
            label: Some(Cow::Borrowed(label)),
            size: Extent3D::new_2d(width, height),
            mip_level_count: 1,
            sample_count: SampleCount::X1,
            dimension: TextureDimension::D2,
            format,
            usage,
        }
    }
}

/// Describes a sampler at creation time.
#[derive(Debug, Clone)]
pub struct SamplerDescription<'a> {
    /// Optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Addressing along U.
    pub address_mode_u: AddressMode,
    /// Addressing along V.
    pub address_mode_v: AddressMode,
    /// Addressing along W.
    pub address_mode_w: AddressMode,
    /// Filtering when the texture is magnified.
    pub mag_filter: FilterMode,
    /// Filtering when the texture is minified.
    pub min_filter: FilterMode,
    /// Filtering between mipmap levels.
    pub mipmap_filter: FilterMode,
    /// Comparison sampler function, for shadow sampling.
    pub compare: Option<CompareFunction>,
    /// Maximum anisotropy; 1 disables anisotropic filtering.
    pub anisotropy_clamp: u16,
}

impl Default for SamplerDescription<'_> {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
            compare: None,
            anisotropy_clamp: 1,
        }
    }
}

impl<'a> SamplerDescription<'a> {
    /// Point sampling with clamped coordinates, for UI and pixel art.
    pub fn nearest_clamp(label: &'a str) -> Self {
        Self {
            label: Some(Cow::Borrowed(label)),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            mipmap_filter: FilterMode::Nearest,
            ..Self::default()
        }
    }
}

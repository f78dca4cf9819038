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

//! Dimension and region types used by descriptions and draw-path calls.

/// A two-dimensional extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A three-dimensional extent: width, height and depth or array layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth for 3D textures, array layer count otherwise.
    pub depth_or_array_layers: u32,
}

impl Extent3D {
    /// A flat 2D extent with a single layer.
    pub const fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    /// Returns `true` if any dimension is zero.
    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth_or_array_layers == 0
    }
}

impl Default for Extent3D {
    fn default() -> Self {
        Self::new_2d(1, 1)
    }
}

/// A texel offset into a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Origin3D {
    /// X offset in texels.
    pub x: u32,
    /// Y offset in texels.
    pub y: u32,
    /// Z offset / array layer.
    pub z: u32,
}

/// A viewport rectangle with a depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Near depth bound, in `[0, 1]`.
    pub min_depth: f32,
    /// Far depth bound, in `[0, 1]`.
    pub max_depth: f32,
}

impl Viewport {
    /// A full-extent viewport with the standard `[0, 1]` depth range.
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// A scissor rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScissorRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Rectangle width.
    pub width: u32,
    /// Rectangle height.
    pub height: u32,
}

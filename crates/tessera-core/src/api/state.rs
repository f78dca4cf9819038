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

//! Immutable render-state value objects.
//!
//! These are pure data: structurally comparable, hashable, and never mutated
//! after construction. A changed configuration is a new value. They serve
//! both as draw-path parameters and as components of the pipeline cache key,
//! which is why every field type is `Eq + Hash`.

use super::enums::{
    BlendFactor, BlendOperation, CompareFunction, CullMode, FillMode, FrontFace, StencilOperation,
};
use crate::tessera_bitflags;

/// Rasterizer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    /// How polygon interiors are rasterized.
    pub fill_mode: FillMode,
    /// Which faces are discarded.
    pub cull_mode: CullMode,
    /// Winding order of front faces.
    pub front_face: FrontFace,
    /// If `true`, fragments outside the depth range are clamped instead of
    /// clipped.
    pub depth_clamp: bool,
    /// If `true`, the scissor rectangle set on the encoder applies.
    pub scissor_enable: bool,
}

impl RasterState {
    /// Solid fill, back-face culling, counter-clockwise front faces.
    pub const fn solid() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_clamp: false,
            scissor_enable: false,
        }
    }

    /// Edge-only rasterization with culling disabled.
    pub const fn wireframe() -> Self {
        Self {
            fill_mode: FillMode::Wireframe,
            cull_mode: CullMode::None,
            ..Self::solid()
        }
    }
}

impl Default for RasterState {
    fn default() -> Self {
        Self::solid()
    }
}

/// Depth test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    /// Enables the depth test.
    pub test_enable: bool,
    /// Enables writes to the depth buffer.
    pub write_enable: bool,
    /// Comparison deciding whether a fragment passes.
    pub compare: CompareFunction,
}

impl DepthState {
    /// Test and write, passing fragments closer than the stored depth.
    pub const fn read_write() -> Self {
        Self {
            test_enable: true,
            write_enable: true,
            compare: CompareFunction::LessEqual,
        }
    }

    /// Test without writing. Used for transparents drawn after opaques.
    pub const fn read_only() -> Self {
        Self {
            write_enable: false,
            ..Self::read_write()
        }
    }

    /// Depth test disabled entirely.
    pub const fn disabled() -> Self {
        Self {
            test_enable: false,
            write_enable: false,
            compare: CompareFunction::Always,
        }
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::read_write()
    }
}

tessera_bitflags! {
    /// Mask of color channels a pipeline writes.
    pub struct ColorWrites: u8 {
        /// Red channel.
        const R = 1 << 0;
        /// Green channel.
        const G = 1 << 1;
        /// Blue channel.
        const B = 1 << 2;
        /// Alpha channel.
        const A = 1 << 3;
        /// All four channels.
        const ALL = Self::R.bits() | Self::G.bits() | Self::B.bits() | Self::A.bits();
    }
}

/// One blend equation: two weighted inputs and the combining operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// Factor applied to the fragment shader output.
    pub src_factor: BlendFactor,
    /// Factor applied to the value already in the target.
    pub dst_factor: BlendFactor,
    /// How the two weighted values combine.
    pub operation: BlendOperation,
}

impl BlendComponent {
    /// Source replaces destination.
    pub const REPLACE: Self = Self {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        operation: BlendOperation::Add,
    };
}

/// Color/alpha blending configuration for a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Enables blending; when `false` the source value is written as-is.
    pub enable: bool,
    /// Equation for the RGB channels.
    pub color: BlendComponent,
    /// Equation for the alpha channel.
    pub alpha: BlendComponent,
    /// Channels written to the target.
    pub write_mask: ColorWrites,
}

impl BlendState {
    /// Blending disabled, all channels written.
    pub const fn opaque() -> Self {
        Self {
            enable: false,
            color: BlendComponent::REPLACE,
            alpha: BlendComponent::REPLACE,
            write_mask: ColorWrites::ALL,
        }
    }

    /// Classic premultiplied-style transparency:
    /// `src_alpha * src + (1 - src_alpha) * dst`.
    pub const fn alpha_blend() -> Self {
        Self {
            enable: true,
            color: BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
            write_mask: ColorWrites::ALL,
        }
    }

    /// Additive accumulation, used for light and particle passes.
    pub const fn additive() -> Self {
        Self {
            enable: true,
            color: BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Add,
            },
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Add,
            },
            write_mask: ColorWrites::ALL,
        }
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self::opaque()
    }
}

/// Stencil test and update operations for one face orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StencilFaceState {
    /// Comparison between the reference and stored value.
    pub compare: CompareFunction,
    /// Applied when the stencil test fails.
    pub fail_op: StencilOperation,
    /// Applied when the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// Applied when both tests pass.
    pub pass_op: StencilOperation,
}

/// Stencil configuration, front and back faces independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    /// Enables the stencil test.
    pub test_enable: bool,
    /// Operations for front-facing primitives.
    pub front: StencilFaceState,
    /// Operations for back-facing primitives.
    pub back: StencilFaceState,
    /// Bitmask applied when reading the stencil buffer.
    pub read_mask: u32,
    /// Bitmask applied when writing the stencil buffer.
    pub write_mask: u32,
}

impl StencilState {
    /// Stencil test disabled.
    pub const fn disabled() -> Self {
        Self {
            test_enable: false,
            front: StencilFaceState {
                compare: CompareFunction::Always,
                fail_op: StencilOperation::Keep,
                depth_fail_op: StencilOperation::Keep,
                pass_op: StencilOperation::Keep,
            },
            back: StencilFaceState {
                compare: CompareFunction::Always,
                fail_op: StencilOperation::Keep,
                depth_fail_op: StencilOperation::Keep,
                pass_op: StencilOperation::Keep,
            },
            read_mask: !0,
            write_mask: !0,
        }
    }
}

impl Default for StencilState {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn structurally_equal_blend_states_hash_identically() {
        let a = BlendState {
            enable: true,
            color: BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
            write_mask: ColorWrites::ALL,
        };
        let b = BlendState::alpha_blend();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn differing_field_breaks_equality() {
        let mut b = BlendState::alpha_blend();
        b.write_mask = ColorWrites::R | ColorWrites::G;
        assert_ne!(b, BlendState::alpha_blend());
    }

    #[test]
    fn presets_are_distinct() {
        assert_ne!(BlendState::opaque(), BlendState::alpha_blend());
        assert_ne!(BlendState::alpha_blend(), BlendState::additive());
        assert_ne!(DepthState::read_write(), DepthState::read_only());
        assert_ne!(RasterState::solid(), RasterState::wireframe());
    }

    #[test]
    fn wireframe_disables_culling() {
        let state = RasterState::wireframe();
        assert_eq!(state.cull_mode, CullMode::None);
        assert_eq!(state.fill_mode, FillMode::Wireframe);
        // The remaining fields follow the solid preset.
        assert_eq!(state.front_face, RasterState::solid().front_face);
    }
}

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

//! Framebuffer descriptions and render-target selection.

use super::resource::{FramebufferHandle, TextureHandle};
use std::borrow::Cow;

/// Describes a framebuffer as a set of previously created texture
/// attachments. All attachments must share one extent and sample count;
/// color attachments need a render-target usage, the depth attachment a
/// depth format.
#[derive(Debug, Clone)]
pub struct FramebufferDescription<'a> {
    /// Optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Color attachments, in output order. May be empty for depth-only
    /// passes.
    pub color_attachments: Vec<TextureHandle>,
    /// Optional depth/stencil attachment.
    pub depth_attachment: Option<TextureHandle>,
}

/// Where a pass renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The swap-chain image (or the headless offscreen equivalent).
    Backbuffer,
    /// A previously created framebuffer.
    Framebuffer(FramebufferHandle),
}

/// Clear values applied when a render target is (re)bound with a clear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValues {
    /// Color written to every color attachment.
    pub color: [f32; 4],
    /// Depth written to the depth attachment, if any.
    pub depth: f32,
    /// Stencil written to the stencil aspect, if any.
    pub stencil: u32,
}

impl ClearValues {
    /// Opaque black, far depth, zero stencil.
    pub const BLACK: Self = Self {
        color: [0.0, 0.0, 0.0, 1.0],
        depth: 1.0,
        stencil: 0,
    };

    /// A solid color with the standard depth/stencil clears.
    pub const fn color(color: [f32; 4]) -> Self {
        Self {
            color,
            depth: 1.0,
            stencil: 0,
        }
    }
}

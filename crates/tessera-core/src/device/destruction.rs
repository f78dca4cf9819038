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

//! The deferred-destruction queue.
//!
//! A destroy call invalidates the handle immediately but the native
//! resource may still be read by in-flight GPU work, so it is parked here
//! tagged with the fence covering everything submitted up to that point.
//! The queue drains at `begin_frame`, releasing only entries whose fence
//! has signaled.

use crate::api::resource::{
    BufferHandle, FramebufferHandle, PipelineHandle, SamplerHandle, ShaderHandle, TextureHandle,
};
use crate::traits::FenceValue;
use std::collections::VecDeque;

/// A destroyed resource awaiting GPU-side release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Zombie {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Sampler(SamplerHandle),
    Framebuffer(FramebufferHandle),
    Shader(ShaderHandle),
    Pipeline(PipelineHandle),
}

#[derive(Debug)]
struct PendingDestroy {
    fence: FenceValue,
    zombie: Zombie,
}

/// One unified queue for all resource kinds; the fence tag alone decides
/// drain eligibility. Entries are enqueued with non-decreasing fences, so
/// the completed prefix is always at the front.
#[derive(Debug, Default)]
pub(crate) struct DestructionQueue {
    entries: VecDeque<PendingDestroy>,
}

impl DestructionQueue {
    pub(crate) fn defer(&mut self, zombie: Zombie, fence: FenceValue) {
        debug_assert!(
            self.entries.back().is_none_or(|back| back.fence <= fence),
            "destruction fences must be non-decreasing"
        );
        self.entries.push_back(PendingDestroy { fence, zombie });
    }

    /// Removes and returns every entry whose fence has signaled.
    pub(crate) fn drain_completed(&mut self, completed: FenceValue) -> Vec<Zombie> {
        let mut released = Vec::new();
        while let Some(front) = self.entries.front() {
            if front.fence > completed {
                break;
            }
            released.push(self.entries.pop_front().expect("front checked").zombie);
        }
        released
    }

    /// Removes and returns everything, regardless of fences. Only valid
    /// once the GPU is known idle, i.e. at device teardown.
    pub(crate) fn drain_all(&mut self) -> Vec<Zombie> {
        self.entries.drain(..).map(|p| p.zombie).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    #[test]
    fn drains_only_the_signaled_prefix() {
        let mut queue = DestructionQueue::default();
        let a: BufferHandle = Handle::INVALID;
        queue.defer(Zombie::Buffer(a), FenceValue(1));
        queue.defer(Zombie::Sampler(Handle::INVALID), FenceValue(2));
        queue.defer(Zombie::Texture(Handle::INVALID), FenceValue(4));

        assert_eq!(queue.drain_completed(FenceValue(0)).len(), 0);
        assert_eq!(queue.drain_completed(FenceValue(2)).len(), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain_completed(FenceValue(4)).len(), 1);
        assert_eq!(queue.len(), 0);
    }
}

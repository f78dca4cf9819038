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

//! Slot-based resource storage with generation validation.

use super::Handle;
use std::fmt;

/// A slot allocator that owns resources of one kind and issues [`Handle`]s
/// to them.
///
/// The pool maintains one generation counter per slot. A lookup succeeds
/// only when the handle's generation exactly equals the slot's current
/// generation, so a handle captured before a slot was released and reused
/// fails validation instead of aliasing the new occupant.
pub struct ResourcePool<T> {
    resources: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl<T> ResourcePool<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Creates an empty pool with backing storage for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            resources: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free_list: Vec::new(),
        }
    }

    /// Stores `resource` and returns a handle to it. Never blocks.
    ///
    /// Reuses a free slot when one exists (the handle carries that slot's
    /// already-incremented generation), otherwise grows the backing storage.
    pub fn allocate(&mut self, resource: T) -> Handle<T> {
        if let Some(index) = self.free_list.pop() {
            let i = index as usize;
            debug_assert!(self.resources[i].is_none());
            self.resources[i] = Some(resource);
            return Handle::new(index, self.generations[i]);
        }

        let index = self.resources.len() as u32;
        self.resources.push(Some(resource));
        // Generation 0 is reserved for the invalid sentinel handle.
        self.generations.push(1);
        Handle::new(index, 1)
    }

    /// Resolves `handle`, returning `None` on index-out-of-range, a stale
    /// generation, or a slot awaiting reclamation. Never panics: callers
    /// routinely probe handles that may have been invalidated.
    pub fn try_get(&self, handle: Handle<T>) -> Option<&T> {
        let i = handle.index() as usize;
        if self.generations.get(i) != Some(&handle.generation()) {
            return None;
        }
        self.resources[i].as_ref()
    }

    /// Mutable variant of [`ResourcePool::try_get`].
    pub fn try_get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        let i = handle.index() as usize;
        if self.generations.get(i) != Some(&handle.generation()) {
            return None;
        }
        self.resources[i].as_mut()
    }

    /// Returns `true` if `handle` currently resolves.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.try_get(handle).is_some()
    }

    /// Removes the resource and immediately returns the slot to the free
    /// list.
    ///
    /// The slot's generation is incremented on the first (valid) release,
    /// permanently invalidating every handle issued for it. Releasing a
    /// stale handle is a defined no-op returning `None`; it does not touch
    /// the generation, which by then guards the slot's next occupant.
    pub fn release(&mut self, handle: Handle<T>) -> Option<T> {
        let resource = self.invalidate(handle)?;
        self.reclaim(handle.index());
        Some(resource)
    }

    /// Removes the resource and invalidates the handle without returning
    /// the slot to the free list.
    ///
    /// Used for deferred destruction: the slot stays parked until
    /// [`ResourcePool::reclaim`] is called once the GPU is done with the
    /// underlying native resource. Stale handles are a no-op returning
    /// `None`.
    pub fn invalidate(&mut self, handle: Handle<T>) -> Option<T> {
        let i = handle.index() as usize;
        if self.generations.get(i) != Some(&handle.generation()) {
            return None;
        }
        let resource = self.resources[i].take()?;
        self.generations[i] = next_generation(self.generations[i]);
        Some(resource)
    }

    /// Returns a previously [`invalidate`](ResourcePool::invalidate)d slot
    /// to the free list, making it available to `allocate` again.
    pub fn reclaim(&mut self, index: u32) {
        let i = index as usize;
        debug_assert!(
            i < self.resources.len() && self.resources[i].is_none(),
            "reclaim of a live or out-of-range slot"
        );
        self.free_list.push(index);
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.resources.iter().filter(|r| r.is_some()).count()
    }

    /// Returns `true` if the pool holds no live resources.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over live resources.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.resources.iter().filter_map(|r| r.as_ref())
    }
}

impl<T> Default for ResourcePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("slots", &self.resources.len())
            .field("live", &self.len())
            .field("free", &self.free_list.len())
            .finish()
    }
}

/// Generation 0 is reserved for the invalid sentinel, so wrap past it.
fn next_generation(generation: u32) -> u32 {
    match generation.wrapping_add(1) {
        0 => 1,
        g => g,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_then_get() {
        let mut pool = ResourcePool::new();
        let h = pool.allocate("red");
        assert_eq!(pool.try_get(h), Some(&"red"));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn stale_handle_fails_after_slot_reuse() {
        let mut pool = ResourcePool::new();
        let h1 = pool.allocate(1u32);
        assert_eq!(pool.release(h1), Some(1));

        let h2 = pool.allocate(2u32);
        assert_eq!(h2.index(), h1.index(), "slot must be reused");
        assert_ne!(h2.generation(), h1.generation());
        assert_eq!(pool.try_get(h1), None);
        assert_eq!(pool.try_get(h2), Some(&2));
    }

    #[test]
    fn double_release_is_a_noop() {
        let mut pool = ResourcePool::new();
        let h = pool.allocate(7u32);
        assert_eq!(pool.release(h), Some(7));
        assert_eq!(pool.release(h), None);
        // The second release must not disturb the next occupant.
        let h2 = pool.allocate(8u32);
        assert_eq!(pool.try_get(h2), Some(&8));
    }

    #[test]
    fn growth_keeps_existing_handles_valid() {
        let mut pool = ResourcePool::with_capacity(2);
        let handles: Vec<_> = (0..64u32).map(|n| pool.allocate(n)).collect();
        for (n, h) in handles.iter().enumerate() {
            assert_eq!(pool.try_get(*h), Some(&(n as u32)));
        }
    }

    #[test]
    fn invalid_sentinel_never_resolves() {
        let pool: ResourcePool<u32> = ResourcePool::new();
        assert_eq!(pool.try_get(Handle::INVALID), None);
        assert!(!Handle::<u32>::INVALID.is_some());
    }

    #[test]
    fn invalidate_parks_the_slot_until_reclaimed() {
        let mut pool = ResourcePool::new();
        let h = pool.allocate(3u32);
        assert_eq!(pool.invalidate(h), Some(3));
        assert_eq!(pool.try_get(h), None);

        // The slot is not on the free list yet: a fresh allocation grows.
        let h2 = pool.allocate(4u32);
        assert_ne!(h2.index(), h.index());

        pool.reclaim(h.index());
        let h3 = pool.allocate(5u32);
        assert_eq!(h3.index(), h.index());
        assert_eq!(pool.try_get(h3), Some(&5));
        assert_eq!(pool.try_get(h), None);
    }

    #[test]
    fn generations_are_monotonic_across_reuse() {
        let mut pool = ResourcePool::new();
        let mut last = 0;
        for n in 0..16u32 {
            let h = pool.allocate(n);
            assert!(h.generation() > last);
            last = h.generation();
            pool.release(h);
        }
    }
}

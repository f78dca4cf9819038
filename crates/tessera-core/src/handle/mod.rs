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

//! Type-tagged, generation-validated handles to pooled GPU resources.
//!
//! A [`Handle`] combines a slot index with a generation count to solve the
//! "ABA problem": when a resource is destroyed its slot can be recycled for
//! a new resource, but the generation is incremented, so handles captured
//! before the destruction can never alias the new occupant.

mod pool;

pub use pool::ResourcePool;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// An opaque reference to a resource stored in a [`ResourcePool`].
///
/// Handles are plain `Copy` values; holding one does not keep the resource
/// alive, and a handle whose resource was destroyed simply stops resolving.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The sentinel "points at nothing" handle. It never resolves.
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: 0,
        _kind: PhantomData,
    };

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _kind: PhantomData,
        }
    }

    /// The slot index inside the owning pool.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The generation the slot had when this handle was issued.
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns `true` unless this is the [`Handle::INVALID`] sentinel.
    ///
    /// A `true` result does not mean the resource still exists; only a pool
    /// lookup can tell.
    pub const fn is_some(&self) -> bool {
        self.generation != 0
    }
}

// Manual impls: a derive would put unnecessary bounds on `T`.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        if self.is_some() {
            write!(f, "Handle<{}>({}v{})", short, self.index, self.generation)
        } else {
            write!(f, "Handle<{}>(invalid)", short)
        }
    }
}

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

//! A macro to define bitflags in a structured way.

#[macro_export]
#[doc(hidden)]
macro_rules! tessera_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            pub(crate) bits: $ty,
        }

        impl $name {
            /// An empty set of flags.
            pub const EMPTY: Self = Self { bits: 0 };

            /// Creates a flag set from raw bits. Undefined bits are kept as-is.
            pub const fn from_bits(bits: $ty) -> Self {
                Self { bits }
            }

            /// Returns the raw value of the flag set.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Returns `true` if all flags in `other` are contained within `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if any flag in `other` is contained within `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Returns `true` if no flag is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Inserts the flags in `other` into `self`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Removes the flags in `other` from `self`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }

            /// Returns a new `Self` with `other` flags inserted.
            #[must_use]
            pub const fn with(mut self, other: Self) -> Self {
                self.bits |= other.bits;
                self
            }

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::ops::Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                Self { bits: !self.bits }
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut remaining = self.bits;
                let mut first = true;

                write!(f, "{}(", stringify!($name))?;
                $(
                    if ($flag_value != 0) && (remaining & $flag_value) == $flag_value {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag_name))?;
                        remaining &= !$flag_value;
                        first = false;
                    }
                )*
                if remaining != 0 {
                    if !first {
                        write!(f, " | ")?;
                    }
                    write!(f, "{:#x}", remaining)?;
                    first = false;
                }
                if first {
                    write!(f, "EMPTY")?;
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::tessera_bitflags;

    tessera_bitflags! {
        pub struct TestFlags: u32 {
            const A = 1 << 0;
            const B = 1 << 1;
            const C = 1 << 2;
            const AC = Self::A.bits() | Self::C.bits();
        }
    }

    #[test]
    fn empty_contains_nothing_but_empty() {
        let flags = TestFlags::EMPTY;
        assert!(flags.is_empty());
        assert!(flags.contains(TestFlags::EMPTY));
        assert!(!flags.contains(TestFlags::A));
        assert_eq!(format!("{:?}", flags), "TestFlags(EMPTY)");
    }

    #[test]
    fn union_and_contains() {
        let flags = TestFlags::A | TestFlags::C;
        assert_eq!(flags, TestFlags::AC);
        assert!(flags.contains(TestFlags::A));
        assert!(!flags.contains(TestFlags::B));
        assert!(flags.contains(TestFlags::A | TestFlags::C));
        assert_eq!(format!("{:?}", flags), "TestFlags(A | C)");
    }

    #[test]
    fn intersects_requires_any_common_bit() {
        let ab = TestFlags::A | TestFlags::B;
        assert!(ab.intersects(TestFlags::B | TestFlags::C));
        assert!(!ab.intersects(TestFlags::C));
        assert!(!ab.intersects(TestFlags::EMPTY));
    }

    #[test]
    fn insert_and_remove() {
        let mut flags = TestFlags::A;
        flags.insert(TestFlags::B);
        assert_eq!(flags.bits(), 0b011);
        flags.remove(TestFlags::A | TestFlags::C);
        assert_eq!(flags, TestFlags::B);
    }

    #[test]
    fn unknown_bits_survive_and_render_as_hex() {
        let flags = TestFlags::from_bits(1 << 8) | TestFlags::A;
        assert_eq!(format!("{:?}", flags), "TestFlags(A | 0x100)");
    }
}

use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

/// The default primitive storage for surface tag masks.
pub type FlagsContainer = u64;

/// Set of surface tags carried by colliders and matched by ground filters.
pub type TagMask = BitmaskFlags<FlagsContainer>;

/// Trait implemented by user-defined tag enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container used for surface tags.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn empty() -> Self {
        Self { bits: T::zero() }
    }

    /// Mask with a single tag set.
    pub fn of<U: FlagBitmask<Storage = T>>(tag: U) -> Self {
        Self { bits: tag.mask() }
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn has_any<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return false;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) != T::zero()
    }

    /// True when the two masks share at least one tag.
    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// Declare a tag enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// kcc::define_bitmask_flags!(SurfaceTag, u64, {
///     Walkable,
///     Ice,
///     Ladder,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

//! Packed identifiers for colliders and bodies owned by a physics backend.
//!
//! The controller never holds references into the physics world. It stores these
//! ids instead and asks the backend to resolve them, so a body destroyed mid-tick
//! simply fails to resolve.
//!
//! # Bit layout
//! Each id is a `u64` with the following layout (least-significant bit = bit 0):
//!
//! - bits 0..=31  : slot index (u32)
//! - bits 32..=63 : slot generation (u32)
//!
//! This mirrors the `(index, generation)` pair used by arena-backed handles, so a
//! backend can round-trip its own handles through [`ColliderId`] and [`BodyId`].

/// Packs an arena `(index, generation)` pair into a single `u64`.
pub fn pack_handle(index: u32, generation: u32) -> u64 {
    (index as u64) | ((generation as u64) << u32::BITS)
}

/// Extracts the `(index, generation)` pair from a packed handle.
pub fn unpack_handle(packed: u64) -> (u32, u32) {
    const INDEX_MASK: u64 = u32::MAX as u64;
    ((packed & INDEX_MASK) as u32, (packed >> u32::BITS) as u32)
}

macro_rules! define_packed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn from_raw_parts(index: u32, generation: u32) -> Self {
                Self(pack_handle(index, generation))
            }

            pub fn into_raw_parts(self) -> (u32, u32) {
                unpack_handle(self.0)
            }
        }
    };
}

define_packed_id!(
    /// Identifies one collider in the collision world.
    ColliderId
);

define_packed_id!(
    /// Identifies one rigid body in the collision world.
    BodyId
);

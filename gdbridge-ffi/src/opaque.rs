/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Stores an opaque native value of a certain size, with very restricted operations.
///
/// The bridge never looks inside: the bytes are only copied into call frames and handed to engine functions.
///
/// Note: due to `align(8)` and not `packed` repr, this type may be bigger than `N` bytes
/// (which is OK since the engine just needs to read/write those `N` bytes reliably).
#[cfg_attr(target_pointer_width = "32", repr(C, align(4)))]
#[cfg_attr(target_pointer_width = "64", repr(C, align(8)))]
#[derive(Copy, Clone)]
pub struct Opaque<const N: usize> {
    storage: [u8; N],
    marker: std::marker::PhantomData<*const u8>, // disable Send/Sync
}

impl<const N: usize> Opaque<N> {
    /// All-zero storage. Only meaningful as a placeholder that is overwritten before the engine reads it.
    pub const fn zeroed() -> Self {
        Self {
            storage: [0; N],
            marker: std::marker::PhantomData,
        }
    }
}

impl<const N: usize> std::fmt::Debug for Opaque<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Opaque<{N}>(")?;
        for byte in self.storage.iter() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Storage of one handle of each native type.
pub mod types {
    use super::Opaque;

    pub type OpaqueString = Opaque<8>;
    pub type OpaqueStringName = Opaque<8>;
    pub type OpaqueArray = Opaque<8>;
    pub type OpaqueDictionary = Opaque<8>;
    pub type OpaquePackedArray = Opaque<16>;
    pub type OpaqueVariant = Opaque<24>;
}

#[cfg(test)]
mod tests {
    use super::types::*;
    use crate::VariantType;

    #[test]
    fn opaque_sizes_match_frame_slots() {
        use std::mem::size_of;

        assert_eq!(size_of::<OpaqueString>(), VariantType::String.ptrcall_size());
        assert_eq!(size_of::<OpaqueStringName>(), VariantType::StringName.ptrcall_size());
        assert_eq!(size_of::<OpaqueArray>(), VariantType::Array.ptrcall_size());
        assert_eq!(size_of::<OpaqueDictionary>(), VariantType::Dictionary.ptrcall_size());
        assert_eq!(size_of::<OpaquePackedArray>(), VariantType::PackedInt32Array.ptrcall_size());
        assert_eq!(size_of::<OpaqueVariant>(), 24);
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::num::NonZeroU64;

/// Represents a non-zero instance ID.
///
/// This is its own type for type safety and to deal with the inconsistent representation in the engine as both `u64` (native)
/// and `i64` (scripts). You can usually treat this as an opaque value; there are conversion methods however.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[repr(transparent)]
pub struct InstanceId {
    // Signed i64 is the canonical representation in the public API.
    value: NonZeroU64,
}

impl InstanceId {
    /// Constructs an instance ID from an integer, or `None` if the integer is zero.
    ///
    /// This does *not* check if the instance is valid.
    pub fn try_from_i64(id: i64) -> Option<Self> {
        Self::try_from_u64(id as u64)
    }

    /// ⚠️ Constructs an instance ID from a non-zero integer, or panics.
    ///
    /// This does *not* check if the instance is valid.
    ///
    /// # Panics
    /// If `id` is zero.
    pub fn from_nonzero(id: i64) -> Self {
        Self::try_from_i64(id).unwrap_or_else(|| panic!("expected non-zero instance ID"))
    }

    pub(crate) fn try_from_u64(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(|value| Self { value })
    }

    pub fn to_i64(self) -> i64 {
        self.to_u64() as i64
    }

    /// Returns if the object being referred-to is inheriting `RefCounted`.
    ///
    /// This involves no engine round-trip, as the information is encoded in the ID itself.
    pub fn is_ref_counted(self) -> bool {
        self.to_u64() & (1u64 << 63) != 0
    }

    pub(crate) fn to_u64(self) -> u64 {
        self.value.get()
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_i64())
    }
}

impl Debug for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "InstanceId({})", self.to_i64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_an_id() {
        assert_eq!(InstanceId::try_from_i64(0), None);
        assert_eq!(InstanceId::try_from_i64(7).map(InstanceId::to_i64), Some(7));
    }

    #[test]
    fn ref_counted_bit() {
        let manual = InstanceId::from_nonzero(42);
        assert!(!manual.is_ref_counted());

        let ref_counted = InstanceId::try_from_u64(42 | (1 << 63)).expect("non-zero");
        assert!(ref_counted.is_ref_counted());
        assert!(ref_counted.to_i64() < 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_as_integer() {
        let id = InstanceId::from_nonzero(1234);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "1234");

        let back: InstanceId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Conversions between Rust scalars and their ABI counterparts.

use std::mem::size_of;

use crate as sys;
use crate::static_assert;

/// Infallibly convert `u32` into a `usize`.
///
/// Only targets where `u32` fits into `usize` are supported.
pub fn u32_to_usize(i: u32) -> usize {
    static_assert!(
        size_of::<u32>() <= size_of::<usize>(),
        "only targets where u32 <= usize are supported"
    );

    i as usize
}

/// Converts a rust-bool into a sys-bool.
pub const fn bool_to_sys(value: bool) -> sys::GDExtensionBool {
    value as sys::GDExtensionBool
}

/// Any non-zero byte is `true`, as on the native side.
pub const fn bool_from_sys(value: sys::GDExtensionBool) -> bool {
    value != 0
}

pub const SYS_TRUE: sys::GDExtensionBool = bool_to_sys(true);
pub const SYS_FALSE: sys::GDExtensionBool = bool_to_sys(false);

/// Index or length from the engine (`int`) into a Rust `usize`.
///
/// Negative values are a contract violation by the engine and panic.
pub fn int_to_usize(value: sys::GDExtensionInt) -> usize {
    usize::try_from(value).unwrap_or_else(|_| panic!("engine returned negative size/index {value}"))
}

pub fn usize_to_int(value: usize) -> sys::GDExtensionInt {
    sys::GDExtensionInt::try_from(value).unwrap_or_else(|_| panic!("index {value} exceeds i64::MAX"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sys_bool() {
        assert_eq!(bool_to_sys(true), SYS_TRUE);
        assert_eq!(bool_to_sys(false), SYS_FALSE);
        assert!(bool_from_sys(2));
        assert!(!bool_from_sys(SYS_FALSE));
    }

    #[test]
    fn int_usize_conversions() {
        assert_eq!(int_to_usize(17), 17);
        assert_eq!(usize_to_int(usize::MIN), 0);
        assert_eq!(u32_to_usize(u32::MAX), u32::MAX as usize);

        let negative = std::panic::catch_unwind(|| int_to_usize(-1));
        assert!(negative.is_err());
    }
}

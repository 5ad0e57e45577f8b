/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Functions and macros that are not very specific to the bridge, but come in handy.

use std::ffi::{c_char, CStr, CString};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros

/// Verifies a condition at compile time.
#[macro_export]
macro_rules! static_assert {
    ($cond:expr) => {
        const _: () = assert!($cond);
    };
    ($cond:expr, $msg:literal) => {
        const _: () = assert!($cond, $msg);
    };
}

/// Verifies at compile time that two types `T` and `U` have the same size.
#[macro_export]
macro_rules! static_assert_eq_size {
    ($T:ty, $U:ty) => {
        $crate::static_assert!(std::mem::size_of::<$T>() == std::mem::size_of::<$U>());
    };
    ($T:ty, $U:ty, $msg:literal) => {
        $crate::static_assert!(std::mem::size_of::<$T>() == std::mem::size_of::<$U>(), $msg);
    };
}

/// Trace output.
#[cfg(feature = "debug-log")]
#[macro_export]
macro_rules! out {
    ()                          => (eprintln!());
    ($fmt:literal)              => (eprintln!($fmt));
    ($fmt:literal, $($arg:tt)*) => (eprintln!($fmt, $($arg)*));
}

/// Trace output.
#[cfg(not(feature = "debug-log"))]
// Sink-writing keeps the arguments "used" without printing them.
#[macro_export]
macro_rules! out {
    ()                          => ({});
    ($fmt:literal)              => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt); });
    ($fmt:literal, $($arg:tt)*) => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt, $($arg)*); });
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Utility functions

/// Explicitly cast away `const` from a pointer, similar to C++ `const_cast`.
///
/// The `as` conversion simultaneously doing 10 other things, potentially causing unintended transmutations.
pub fn force_mut_ptr<T>(ptr: *const T) -> *mut T {
    ptr as *mut T
}

/// Add `const` to a mut ptr.
pub fn to_const_ptr<T>(ptr: *mut T) -> *const T {
    ptr as *const T
}

/// If `ptr` is not null, returns `Some(mapper(ptr))`; otherwise `None`.
#[inline]
pub fn ptr_then<T, R, F>(ptr: *mut T, mapper: F) -> Option<R>
where
    F: FnOnce(*mut T) -> R,
{
    if ptr.is_null() {
        None
    } else {
        Some(mapper(ptr))
    }
}

/// Class and method names handed to the engine as C strings.
///
/// Names come from static method lists and Rust identifiers, so an interior NUL is a programming error.
pub fn c_string(name: &str) -> CString {
    CString::new(name).unwrap_or_else(|_| panic!("name {name:?} contains a NUL byte"))
}

/// Reads a C string received from the engine. Invalid UTF-8 is replaced.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid for `'a`.
pub unsafe fn str_from_c<'a>(ptr: *const c_char) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        return std::borrow::Cow::Borrowed("");
    }

    CStr::from_ptr(ptr).to_string_lossy()
}

/// Joins items with `", "` using their `Debug` representation.
pub fn join_debug<T: std::fmt::Debug>(iter: impl IntoIterator<Item = T>) -> String {
    join_with(iter, ", ", |item| format!("{item:?}"))
}

pub fn join_with<T, I, F>(iter: I, sep: &str, mut format_elem: F) -> String
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> String,
{
    let mut result = String::new();
    let mut iter = iter.into_iter();

    if let Some(first) = iter.next() {
        result.push_str(&format_elem(&first));

        for item in iter {
            result.push_str(sep);
            result.push_str(&format_elem(&item));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_lists() {
        assert_eq!(join_debug(["a", "b"]), r#""a", "b""#);
        assert_eq!(join_with(Vec::<i32>::new(), ", ", |i| i.to_string()), "");
        assert_eq!(join_with([1, 2, 3], " | ", |i| i.to_string()), "1 | 2 | 3");
    }

    #[test]
    fn c_strings_roundtrip() {
        let name = c_string("get_child_count");
        let back = unsafe { str_from_c(name.as_ptr()) };
        assert_eq!(back, "get_child_count");

        assert_eq!(unsafe { str_from_c(std::ptr::null()) }, "");
    }
}

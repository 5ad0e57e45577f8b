/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_char;
use std::fmt;

use crate::builtin::StringName;
use crate::meta::builtin_ptrcall;
use crate::sys;
use sys::{interface_fn, GodotFfi, ReturnMeta, VariantType};

impl_builtin_stub!(
    /// Engine string type, `String` in GDScript.
    ///
    /// Strings are copy-on-write values on the engine side: cloning is cheap, and mutating one copy never affects the other.
    /// Converting from and to Rust [`String`] always copies the characters.
    GString => String, OpaqueString
);

impl_builtin_traits! {
    for GString => String {
        Default;
        Clone;
        Drop;
    }
}

impl GString {
    /// Constructs an empty string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of characters (Unicode code points).
    pub fn len(&self) -> usize {
        // SAFETY: `self` is a live string.
        let len: i64 = unsafe { builtin_ptrcall(VariantType::String, "length", self.sys(), ()) };
        sys::int_to_usize(len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lets the engine write a fresh string, e.g. the result of `variant_stringify`.
    ///
    /// # Safety
    /// `init_fn` must fully initialize the string.
    pub(crate) unsafe fn from_string_sys_init(init_fn: impl FnOnce(sys::GDExtensionUninitializedStringPtr)) -> Self {
        Self::from_sys_init(init_fn)
    }

    pub(crate) fn string_sys(&self) -> sys::GDExtensionConstStringPtr {
        self.sys_const()
    }

    fn to_utf8(&self) -> String {
        let get_chars = interface_fn!(string_to_utf8_chars);

        // SAFETY: a null buffer with length 0 only queries the length; the second call writes at most `len` bytes.
        unsafe {
            let len = get_chars(self.string_sys(), std::ptr::null_mut(), 0);
            let mut buf = vec![0u8; sys::int_to_usize(len)];
            get_chars(self.string_sys(), buf.as_mut_ptr() as *mut c_char, len);

            String::from_utf8_lossy(&buf).into_owned()
        }
    }
}

impl From<&str> for GString {
    fn from(s: &str) -> Self {
        let bytes = s.as_bytes();

        // SAFETY: the engine copies `bytes.len()` bytes of valid UTF-8 into the new string.
        unsafe {
            Self::from_string_sys_init(|string_ptr| {
                let ctor = interface_fn!(string_new_with_utf8_chars_and_len);
                ctor(string_ptr, bytes.as_ptr() as *const c_char, sys::usize_to_int(bytes.len()));
            })
        }
    }
}

impl From<&String> for GString {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&StringName> for GString {
    fn from(name: &StringName) -> Self {
        let ctor = sys::builtin_lifecycle().string_from_string_name;

        // SAFETY: conversion constructor with exactly one `StringName` argument, alive during the call.
        unsafe {
            Self::from_string_sys_init(|string_ptr| {
                let args = [name.sys_const()];
                ctor(string_ptr, args.as_ptr());
            })
        }
    }
}

impl From<&GString> for String {
    fn from(string: &GString) -> Self {
        string.to_utf8()
    }
}

impl PartialEq for GString {
    fn eq(&self, other: &Self) -> bool {
        self.to_utf8() == other.to_utf8()
    }
}

impl Eq for GString {}

impl PartialEq<&str> for GString {
    fn eq(&self, other: &&str) -> bool {
        self.to_utf8() == *other
    }
}

impl fmt::Display for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_utf8())
    }
}

/// Uses literal syntax from GDScript: `"string"`
impl fmt::Debug for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.to_utf8().escape_debug())
    }
}

impl_builtin_convert!(GString => "String");

pub(crate) static STRING_METHODS: &[sys::MethodSpec] = &[sys::MethodSpec::builtin(
    VariantType::String,
    "length",
    3173160232,
    &[],
    ReturnMeta::value(VariantType::Int),
)];

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::GString;
use crate::sys;
use sys::GodotFfi;

impl_builtin_stub!(
    /// An interned string, used by the engine for class, method and property names.
    ///
    /// Two `StringName`s with the same content share their storage in the engine. Conversions from Rust strings go
    /// through [`GString`] and copy.
    StringName => StringName, OpaqueStringName
);

impl_builtin_traits! {
    for StringName => StringName {
        Default;
        Clone;
        Drop;
    }
}

impl StringName {
    pub fn is_empty(&self) -> bool {
        GString::from(self).is_empty()
    }
}

impl From<&GString> for StringName {
    fn from(string: &GString) -> Self {
        let ctor = sys::builtin_lifecycle().string_name_from_string;

        // SAFETY: conversion constructor with exactly one `String` argument, alive during the call.
        unsafe {
            Self::from_sys_init(|name_ptr| {
                let args = [string.sys_const()];
                ctor(name_ptr, args.as_ptr());
            })
        }
    }
}

impl From<&str> for StringName {
    fn from(s: &str) -> Self {
        Self::from(&GString::from(s))
    }
}

impl PartialEq for StringName {
    fn eq(&self, other: &Self) -> bool {
        GString::from(self) == GString::from(other)
    }
}

impl Eq for StringName {}

impl PartialEq<&str> for StringName {
    fn eq(&self, other: &&str) -> bool {
        GString::from(self) == *other
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&GString::from(self), f)
    }
}

/// Uses literal syntax from GDScript: `&"string_name"`
impl fmt::Debug for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{:?}", GString::from(self))
    }
}

impl_builtin_convert!(StringName => "StringName");

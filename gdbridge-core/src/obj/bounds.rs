/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Different ways how bounds of a `GodotClass` can be checked.
//!
//! The memory strategy of a class decides which constructors are available ([`NewAlloc`](crate::obj::NewAlloc) or
//! [`NewGd`](crate::obj::NewGd)) and whether [`Gd::free()`](crate::obj::Gd::free) makes sense.
//!
//! At runtime, the ownership of each individual handle decides what happens on clone and drop. A `Gd<Object>` may well point
//! to a ref-counted object; the handle table knows.

use private::Sealed;

pub(super) mod private {
    pub trait Sealed {}
}

/// Specifies the memory strategy of the static type.
pub trait Memory: Sealed {
    /// Whether instances are destroyed by the engine when the last reference goes away.
    const IS_REF_COUNTED: bool;
}

/// Memory managed through the engine's reference count. Used by `RefCounted` and all its subclasses.
pub enum MemRefCounted {}
impl Sealed for MemRefCounted {}
impl Memory for MemRefCounted {
    const IS_REF_COUNTED: bool = true;
}

/// Memory managed by whoever owns the object; either a Rust `Gd` or the engine (e.g. a parent node).
pub enum MemManual {}
impl Sealed for MemManual {}
impl Memory for MemManual {
    const IS_REF_COUNTED: bool = false;
}

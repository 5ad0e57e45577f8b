/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub use super::builtin::__prelude_reexport::*;
pub use super::classes::{
    InternalMode, Node, Node2D, Node2DApi, NodeApi, Object, ObjectApi, RefCounted, RefCountedApi, Resource, ResourceApi,
};
pub use super::global::{godot_error, godot_print, godot_warn};
pub use super::init::{ExtensionLibrary, InitLevel};
pub use super::meta::error::{CallError, ConvertError};
pub use super::meta::{FromGodot, GodotConvert, ToGodot};
pub use super::obj::{Base, Gd, GdMut, GdRef, GodotClass, Inherits, InstanceId, UserClass};
pub use super::registry::{ClassBuilder, ClassRegistrar, RegisterError};
pub use super::{declare_class, gdextension_entry};

// Make trait methods available.
#[rustfmt::skip] // One per line.
mod trait_reexports {
    pub use crate::obj::NewAlloc as _;
    pub use crate::obj::NewGd as _;
}

pub use trait_reexports::*;

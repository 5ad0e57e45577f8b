/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Wrappers of engine classes.
//!
//! Each class is a marker type: objects are only ever accessed through [`Gd<T>`](crate::obj::Gd). The methods of a class live in a
//! capability trait (`ObjectApi`, `NodeApi`, ...), implemented for every `Gd<T>` whose `T` inherits that class. A `Gd<Node2D>`
//! thus has all methods of `Node2D`, `Node` and `Object` without any upcast.
//!
//! Every method that a wrapper calls is declared in a static method list, together with its hash, parameter types, defaults and
//! the ownership of its return value. The lists are resolved once at startup; see [`sys::MethodTable`](crate::sys::MethodTable).

#[macro_use]
mod class_macros;

mod node;
mod node_2d;
mod object;
mod ref_counted;
mod resource;

pub use node::{InternalMode, Node, NodeApi};
pub use node_2d::{Node2D, Node2DApi};
pub use object::{Object, ObjectApi};
pub use ref_counted::{RefCounted, RefCountedApi};
pub use resource::{Resource, ResourceApi};

/// Method lists of all engine classes, resolved once at startup.
pub(crate) fn method_lists() -> [&'static [crate::sys::MethodSpec]; 5] {
    [
        object::OBJECT_METHODS,
        ref_counted::REF_COUNTED_METHODS,
        resource::RESOURCE_METHODS,
        node::NODE_METHODS,
        node_2d::NODE_2D_METHODS,
    ]
}

/// Metadata of `real` parameters: `float` slots are always 64-bit, the declared width follows the engine build.
#[cfg(not(feature = "double-precision"))]
pub(crate) const REAL_METADATA: crate::sys::ArgumentMetadata = crate::sys::ArgumentMetadata::RealIsFloat;
#[cfg(feature = "double-precision")]
pub(crate) const REAL_METADATA: crate::sys::ArgumentMetadata = crate::sys::ArgumentMetadata::None;

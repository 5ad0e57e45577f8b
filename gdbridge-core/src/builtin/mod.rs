/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Built-in types like `Vector2`, `GString` and `Variant`.
//!
//! # Value and reference types
//!
//! Math types (`Vector2`, `Color`, ...) are plain Rust structs with the same layout as on the engine side; they are copied into
//! call frames as-is. Strings, containers and `Variant` have native storage owned by the engine: the Rust type holds an opaque
//! handle and runs the engine's constructor, copy constructor and destructor through the builtin lifecycle table.
//!
//! Among those, [`Array`] and [`Dictionary`] are shared on clone, while strings and packed arrays behave like values.

pub use crate::sys::VariantType;

#[doc(hidden)]
pub mod __prelude_reexport {
    use super::*;

    pub use collections::{
        Array, Dictionary, PackedArray, PackedByteArray, PackedFloat32Array, PackedFloat64Array, PackedInt32Array,
        PackedInt64Array, PackedStringArray,
    };
    pub use color::*;
    pub use real_inner::real;
    pub use strings::{GString, StringName};
    pub use variant::*;
    pub use vectors::*;

    pub use super::VariantType;
}

pub use __prelude_reexport::*;
pub use collections::PackedArrayElement;

/// Iterator types for arrays and dictionaries.
pub mod iter {
    pub use super::collections::iterators::*;
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation

// Modules exporting declarative macros must appear first.
mod macros;

// Other modules
mod collections;
mod color;
mod strings;
mod variant;
mod vectors;

// Renamed, because the module would shadow the re-exported `real` type.
#[path = "real.rs"]
mod real_inner;

pub(crate) use real_inner::{RVec2, RVec3};

/// Method lists of all builtin types, resolved once at startup.
pub(crate) fn method_lists() -> [&'static [crate::sys::MethodSpec]; 4] {
    [
        strings::STRING_METHODS,
        collections::ARRAY_METHODS,
        collections::DICTIONARY_METHODS,
        collections::PACKED_ARRAY_METHODS,
    ]
}

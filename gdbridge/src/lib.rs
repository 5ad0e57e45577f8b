/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Typed call bridge for the engine's extension interface
//!
//! Rust code talks to the engine exclusively through the C extension interface: a table of function pointers handed over when
//! the library is loaded. This crate puts a typed layer on top of it.
//!
//! ## Calls into the engine
//!
//! Every engine method that the wrappers use is declared once, with its hash, parameter types, default values and the ownership
//! of its return value. At startup, all declarations are resolved against the engine and frozen into a method table. A wrapper
//! call like `node.get_child_count()` then looks up its binding, encodes the arguments into a call frame laid out per the
//! declaration, fills in omitted defaults, calls the engine and decodes the return value.
//!
//! A declaration that the engine does not know makes loading the library fail, listing every unresolved method.
//!
//! ## Objects and ownership
//!
//! Objects are accessed through [`Gd<T>`](obj::Gd), which holds a slot in a handle table instead of a raw pointer. Each slot
//! records whether the handle owns the object, borrows it, or holds a reference count. Released slots are invalidated, so a
//! handle can never be released twice or used after its object was destroyed elsewhere.
//!
//! ## Calls from the engine
//!
//! User classes declared with [`declare_class!`] can override virtual methods of their engine base class. Overrides are
//! validated against the engine's declaration when the class is registered. Panics in overrides are caught at the boundary and
//! reported through [`godot_error!`].
//!
//! ## Cargo features
//!
//! * **`double-precision`**: `real` is `f64` instead of `f32`, matching an engine built with `precision=double`.
//! * **`serde`**: `Serialize`/`Deserialize` for value types like `Vector2`, `Color` and `VariantValue`.

#[doc(inline)]
pub use gdbridge_core::{builtin, classes, global, init, meta, obj, registry};

#[doc(hidden)]
pub use gdbridge_core::{private, sys};

pub use gdbridge_core::{declare_class, gdextension_entry, godot_error, godot_print, godot_warn};

pub mod prelude;

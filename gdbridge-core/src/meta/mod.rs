/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Meta-information about engine types, their properties and conversions between them.
//!
//! # Conversions between types
//!
//! ## Godot representation
//!
//! The library provides two traits [`FromGodot`] and [`ToGodot`], which are used at the Rust <-> engine boundary, both in user-defined
//! overrides and engine methods. Their `to_godot()` and `from_godot()` methods convert types from/to their _closest possible engine
//! type_ (e.g. `GString` instead of Rust `String`). You usually don't need to call these methods yourself, they are automatically
//! invoked when passing objects to/from the engine.
//!
//! Most often, the two traits appear in pairs, however there are cases where only one of the two is implemented. For example,
//! `&str` implements only `ToGodot`, since the engine hands out strings it owns.
//!
//! ## The `GodotConvert` trait
//!
//! The [`GodotConvert`] trait serves as a base trait for [`FromGodot`] and [`ToGodot`]. It has an associated type `Via`, which is the
//! closest possible engine type. For example, `String` has `Via = GString`.
//!
//! ## Copies at the boundary
//!
//! Host types are always copied when converted: a `Vec<T>` becomes a fresh `Array` and back. Engine containers (`Array`,
//! `Dictionary`) are shared references instead; see their documentation.

mod godot_convert;
mod param_tuple;
mod signature;
mod traits;

pub(crate) mod sealed;

pub mod error;

pub use godot_convert::{FromGodot, GodotConvert, ToGodot};
pub use param_tuple::{InParamTuple, OutParamTuple, ParamTuple};
pub use traits::{GodotFfi, GodotFfiVariant, GodotNullableFfi, GodotType};

#[doc(hidden)]
pub use signature::*;

pub(crate) use traits::frame_signature;
pub use crate::sys::{ArgumentMetadata, SlotType, VariantType};

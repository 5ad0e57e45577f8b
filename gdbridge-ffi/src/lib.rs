/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Low level bridge to the engine's C extension interface.
//!
//! Contains the raw ABI, and the machinery every typed call goes through: the [handle table](handles), the frozen
//! [method table](method_table) and [call frames](CallFrame).

mod binding;
mod call_frame;
mod conv;
mod global;
mod godot_ffi;
mod handle_table;
mod interface;
mod lifecycle_table;
mod method_table;
mod opaque;
mod toolbox;
mod variant_type;

pub use binding::*;
pub use call_frame::*;
pub use conv::*;
pub use global::*;
pub use godot_ffi::*;
pub use handle_table::*;
pub use interface::*;
pub use lifecycle_table::*;
pub use method_table::*;
pub use opaque::{types, Opaque};
pub use toolbox::*;
pub use variant_type::*;

/// Fetches an engine function from the bound interface.
///
/// Panics with the name of the entry if the engine did not provide it.
#[macro_export]
macro_rules! interface_fn {
    ($name:ident) => {{
        match $crate::get_interface().$name {
            Some(function) => function,
            None => $crate::interface_fn_missing(stringify!($name)),
        }
    }};
}

#[cold]
#[doc(hidden)]
pub fn interface_fn_missing(name: &str) -> ! {
    panic!("engine interface does not provide `{name}`")
}

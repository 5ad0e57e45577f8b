/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::meta::error::CallError;
use crate::meta::CallContext;
use crate::sys;

mod impls;

/// Represents a parameter list as Rust tuple where each tuple element is one parameter.
///
/// This trait only contains metadata for the parameter list, the actual functionality is contained in [`InParamTuple`] and
/// [`OutParamTuple`].
pub trait ParamTuple: Sized {
    /// The number of elements in this parameter list.
    const LEN: usize;

    /// `(slot type, metadata)` of each parameter, in declaration order.
    fn param_signature() -> Vec<(sys::SlotType, sys::ArgumentMetadata)>;
}

/// Represents a parameter list that is received from the engine, i.e. the arguments of a virtual call.
pub trait InParamTuple: ParamTuple {
    /// Copies the engine's arguments into `Self`.
    ///
    /// # Safety
    ///
    /// - `args_ptr` must be a pointer to a valid array of length [`Self::LEN`](ParamTuple::LEN).
    /// - Each element of `args_ptr` must point to a value of the engine type of the corresponding element of `Self`,
    ///   which stays owned by the engine.
    #[doc(hidden)]
    unsafe fn from_ptrcall_args(args_ptr: *const sys::GDExtensionConstTypePtr, call_ctx: &CallContext)
        -> Result<Self, CallError>;
}

/// Represents a parameter list that is used to call the engine.
pub trait OutParamTuple: ParamTuple {
    /// Converts all parameters to their FFI representation, writes them into `frame` and runs `call`.
    ///
    /// The converted values live on this function's stack until `call` returns, so the frame's bitwise copies stay valid.
    ///
    /// # Safety
    /// `call` may perform the native call with the frame's contents.
    #[doc(hidden)]
    unsafe fn with_frame_args<R>(
        self,
        frame: &mut sys::CallFrame<'_>,
        call_ctx: &CallContext,
        call: impl FnOnce(&mut sys::CallFrame<'_>) -> R,
    ) -> Result<R, CallError>;
}

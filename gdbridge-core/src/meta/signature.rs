/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::marker::PhantomData;

use sys::GodotFfi;

use crate::meta::error::CallError;
use crate::meta::traits::frame_signature;
use crate::meta::{FromGodot, GodotConvert, GodotType, InParamTuple, OutParamTuple, ParamTuple, ToGodot};
use crate::sys;

/// A full signature for a function.
///
/// For in-calls (the engine calling a virtual method overridden in Rust) `Params` will implement [`InParamTuple`] and `Ret`
/// will implement [`ToGodot`].
///
/// For out-calls (Rust calling an engine method) `Params` will implement [`OutParamTuple`] and `Ret` will implement [`FromGodot`].
#[doc(hidden)]
pub struct Signature<Params, Ret> {
    _p: PhantomData<Params>,
    _r: PhantomData<Ret>,
}

impl<Params: ParamTuple, Ret: GodotConvert> Signature<Params, Ret> {
    /// `(slot type, metadata)` of each parameter, then of the return value.
    pub fn frame_signature() -> (Vec<(sys::SlotType, sys::ArgumentMetadata)>, (sys::SlotType, sys::ArgumentMetadata)) {
        (Params::param_signature(), frame_signature::<Ret::Via>())
    }
}

/// In-calls:
///
/// Called by the engine through a virtual-call trampoline.
impl<Params: InParamTuple, Ret: ToGodot> Signature<Params, Ret> {
    /// Decodes the arguments, runs `func` and encodes its return value into `ret`.
    ///
    /// # Safety
    /// - `args_ptr` must point to [`Params::LEN`](ParamTuple::LEN) argument pointers of the declared types.
    /// - `ret` must point to an initialized value of `Ret`'s engine type. It is replaced; the previous value is destroyed.
    pub unsafe fn in_ptrcall(
        call_ctx: &CallContext,
        args_ptr: *const sys::GDExtensionConstTypePtr,
        ret: sys::GDExtensionTypePtr,
        func: impl FnOnce(Params) -> Ret,
    ) -> Result<(), CallError> {
        sys::out!("in_ptrcall: {call_ctx}");

        let args = Params::from_ptrcall_args(args_ptr, call_ctx)?;
        let rust_result = func(args);

        let ffi = <Ret::Via as GodotType>::into_ffi(rust_result.to_godot());
        ffi.move_return_ptr(ret);
        Ok(())
    }
}

/// Outbound calls:
///
/// Rust calling an engine method, through a binding resolved at startup.
impl<Params: OutParamTuple, Ret: FromGodot> Signature<Params, Ret> {
    /// Calls a method of an engine class on `object_ptr`.
    ///
    /// Omitted trailing parameters are filled with their declared defaults.
    ///
    /// # Safety
    /// `binding` must be a class method, and `object_ptr` a live object of a class that has this method.
    pub unsafe fn out_class_ptrcall(
        binding: &sys::MethodBinding,
        object_ptr: sys::GDExtensionObjectPtr,
        args: Params,
    ) -> Result<Ret, CallError> {
        debug_assert!(matches!(binding.spec().kind, sys::MethodKind::Class));
        Self::out_ptrcall(binding, object_ptr, args)
    }

    /// Calls a method of a builtin type on the value at `type_ptr`.
    ///
    /// # Safety
    /// `binding` must be a method of the builtin type that `type_ptr` points to.
    pub unsafe fn out_builtin_ptrcall(
        binding: &sys::MethodBinding,
        type_ptr: sys::GDExtensionTypePtr,
        args: Params,
    ) -> Result<Ret, CallError> {
        debug_assert!(matches!(binding.spec().kind, sys::MethodKind::Builtin(_)));
        Self::out_ptrcall(binding, type_ptr, args)
    }

    unsafe fn out_ptrcall(
        binding: &sys::MethodBinding,
        base: sys::GDExtensionTypePtr,
        args: Params,
    ) -> Result<Ret, CallError> {
        let call_ctx = CallContext::outbound(binding.class_name(), binding.method_name());
        sys::out!("out_ptrcall: {call_ctx}");

        let ret_meta = binding.spec().ret;
        CallError::check_return_type(&call_ctx, (ret_meta.ty, ret_meta.metadata), frame_signature::<Ret::Via>())?;

        let mut frame = sys::CallFrame::new(binding);
        args.with_frame_args(&mut frame, &call_ctx, |frame| {
            frame
                .fill_defaults()
                .map_err(|err| CallError::failed_encoding(&call_ctx, err))?;

            frame.ptrcall(base);

            // Borrowed values still belong to the engine; only a copy may be kept.
            let ffi = match ret_meta.ownership {
                sys::Ownership::Borrowed => frame.copy_return::<<Ret::Via as GodotType>::Ffi>(),
                _ => frame.take_return::<<Ret::Via as GodotType>::Ffi>(),
            };

            <Ret::Via as GodotType>::try_from_return(ffi, ret_meta.ownership)
                .and_then(Ret::try_from_godot)
                .map_err(|err| CallError::failed_return_conversion(&call_ctx, err))
        })?
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Call context

/// Information about the function being called, for error messages.
pub struct CallContext<'a> {
    pub(crate) class_name: &'a str,
    pub(crate) function_name: &'a str,
}

impl<'a> CallContext<'a> {
    /// Call from the engine into a Rust override.
    pub const fn func(class_name: &'a str, function_name: &'a str) -> Self {
        Self {
            class_name,
            function_name,
        }
    }

    /// Outbound call from Rust into the engine, class/builtin APIs.
    pub const fn outbound(class_name: &'a str, function_name: &'a str) -> Self {
        Self {
            class_name,
            function_name,
        }
    }
}

impl fmt::Display for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class_name, self.function_name)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Convenience for wrapper code

/// Resolves `class::method` in the frozen method table and calls it on an object.
///
/// # Panics
/// If the method was not declared at startup, or if the call fails. Wrapper signatures are fixed at compile time,
/// so a failure here is a bug in the wrapper declaration.
///
/// # Safety
/// `object_ptr` must be a live object of (a subclass of) `class`.
#[doc(hidden)]
pub unsafe fn class_ptrcall<Params: OutParamTuple, Ret: FromGodot>(
    class: &str,
    method: &str,
    object_ptr: sys::GDExtensionObjectPtr,
    args: Params,
) -> Ret {
    let binding = sys::method_table().resolve(class, method);

    Signature::<Params, Ret>::out_class_ptrcall(binding, object_ptr, args).unwrap_or_else(|err| panic!("{err}"))
}

/// Like [`class_ptrcall()`], for methods of builtin types.
///
/// # Safety
/// `type_ptr` must point to a live value of the builtin type `builtin`.
#[doc(hidden)]
pub unsafe fn builtin_ptrcall<Params: OutParamTuple, Ret: FromGodot>(
    builtin: sys::VariantType,
    method: &str,
    type_ptr: sys::GDExtensionTypePtr,
    args: Params,
) -> Ret {
    let binding = sys::method_table().resolve(builtin.name(), method);

    Signature::<Params, Ret>::out_builtin_ptrcall(binding, type_ptr, args).unwrap_or_else(|err| panic!("{err}"))
}

/// Fallible variant of [`class_ptrcall()`], which also reports methods missing from the table.
///
/// # Safety
/// See [`class_ptrcall()`].
#[doc(hidden)]
pub unsafe fn try_class_ptrcall<Params: OutParamTuple, Ret: FromGodot>(
    class: &str,
    method: &str,
    object_ptr: sys::GDExtensionObjectPtr,
    args: Params,
) -> Result<Ret, CallError> {
    let binding = sys::method_table()
        .try_resolve(class, method)
        .map_err(|err| CallError::failed_resolve(&CallContext::outbound(class, method), err))?;

    Signature::<Params, Ret>::out_class_ptrcall(binding, object_ptr, args)
}

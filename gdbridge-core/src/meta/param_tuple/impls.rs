/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![deny(unsafe_op_in_unsafe_fn)]

use sys::GodotFfi;

use crate::meta::error::CallError;
use crate::meta::traits::frame_signature;
use crate::meta::{CallContext, FromGodot, GodotConvert, GodotType, InParamTuple, OutParamTuple, ParamTuple, ToGodot};
use crate::sys;

macro_rules! count_idents {
    () => { 0 };
    ($id:ident $($rest:ident)*) => { 1 + count_idents!($($rest)*)};
}

macro_rules! unsafe_impl_param_tuple {
    ($(($p:ident, $n:tt): $P:ident),*) => {
        impl<$($P),*> ParamTuple for ($($P,)*) where $($P: GodotConvert),* {
            const LEN: usize = count_idents!($($P)*);

            fn param_signature() -> Vec<(sys::SlotType, sys::ArgumentMetadata)> {
                vec![$( frame_signature::<$P::Via>() ),*]
            }
        }

        impl<$($P),*> InParamTuple for ($($P,)*) where $($P: FromGodot),* {
            #[allow(unused_variables)]
            unsafe fn from_ptrcall_args(
                args_ptr: *const sys::GDExtensionConstTypePtr,
                call_ctx: &CallContext,
            ) -> Result<Self, CallError> {
                let tuple = ($(
                    {
                        // SAFETY: `args_ptr` has `Self::LEN` elements, each pointing to an engine-owned value of the right type.
                        let arg_ptr = unsafe { *args_ptr.add($n) };
                        let ffi = unsafe {
                            <<$P::Via as GodotType>::Ffi as GodotFfi>::from_arg_ptr(sys::force_mut_ptr(arg_ptr))
                        };

                        <$P::Via as GodotType>::try_from_ffi(ffi)
                            .and_then($P::try_from_godot)
                            .map_err(|err| CallError::failed_param_conversion(call_ctx, $n, err))?
                    },
                )*);

                Ok(tuple)
            }
        }

        impl<$($P),*> OutParamTuple for ($($P,)*) where $($P: ToGodot),* {
            #[allow(unused_variables, clippy::unused_unit)]
            unsafe fn with_frame_args<R>(
                self,
                frame: &mut sys::CallFrame<'_>,
                call_ctx: &CallContext,
                call: impl FnOnce(&mut sys::CallFrame<'_>) -> R,
            ) -> Result<R, CallError> {
                let ($($p,)*) = self;

                // Keep the `Via` value next to its FFI view: `to_ffi()` does not transfer ownership (a `Gd` keeps its reference),
                // and the caller's value stays responsible for releasing it.
                $(
                    let $p = {
                        let via = $p.to_godot();
                        let ffi = <$P::Via as GodotType>::to_ffi(&via);
                        (via, ffi)
                    };
                )*

                $(
                    let (slot_type, metadata) = frame_signature::<$P::Via>();

                    // SAFETY: `$p` lives until the end of this function, after `call` completed.
                    unsafe { frame.push_arg(slot_type, metadata, $p.1.sys_const()) }
                        .map_err(|err| CallError::failed_encoding(call_ctx, err))?;
                )*

                // Converted arguments are dropped on return, after the native call.
                Ok(call(frame))
            }
        }
    };
}

unsafe_impl_param_tuple!();
unsafe_impl_param_tuple!((p0, 0): P0);
unsafe_impl_param_tuple!((p0, 0): P0, (p1, 1): P1);
unsafe_impl_param_tuple!((p0, 0): P0, (p1, 1): P1, (p2, 2): P2);
unsafe_impl_param_tuple!((p0, 0): P0, (p1, 1): P1, (p2, 2): P2, (p3, 3): P3);
unsafe_impl_param_tuple!((p0, 0): P0, (p1, 1): P1, (p2, 2): P2, (p3, 3): P3, (p4, 4): P4);
unsafe_impl_param_tuple!((p0, 0): P0, (p1, 1): P1, (p2, 2): P2, (p3, 3): P3, (p4, 4): P4, (p5, 5): P5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_of_tuples() {
        assert_eq!(<() as ParamTuple>::LEN, 0);
        assert!(<() as ParamTuple>::param_signature().is_empty());

        type Params = (i64, i32, f32, bool);
        assert_eq!(<Params as ParamTuple>::LEN, 4);

        let int = sys::SlotType::Value(sys::VariantType::Int);
        let float = sys::SlotType::Value(sys::VariantType::Float);
        let bool_ = sys::SlotType::Value(sys::VariantType::Bool);
        assert_eq!(
            <Params as ParamTuple>::param_signature(),
            vec![
                (int, sys::ArgumentMetadata::None),
                (int, sys::ArgumentMetadata::IntIsInt32),
                (float, sys::ArgumentMetadata::RealIsFloat),
                (bool_, sys::ArgumentMetadata::None),
            ]
        );
    }
}

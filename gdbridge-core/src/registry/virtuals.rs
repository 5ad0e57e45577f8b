/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::meta::error::CallError;
use crate::meta::CallContext;
use crate::sys;
use sys::{ArgumentMetadata, ParamMeta, ReturnMeta, SlotType};

/// Signature of a virtual method that an engine class declares and user classes may override.
///
/// The engine passes arguments and expects the return value in the same slot layout as for outbound calls, so the
/// declaration uses the same [`ParamMeta`] and [`ReturnMeta`] as method specs.
#[derive(Copy, Clone, Debug)]
pub struct VirtualMethodSpec {
    pub name: &'static str,
    pub params: &'static [ParamMeta],
    pub ret: ReturnMeta,
}

impl VirtualMethodSpec {
    pub const fn new(name: &'static str, params: &'static [ParamMeta], ret: ReturnMeta) -> Self {
        Self { name, params, ret }
    }

    /// `(slot type, metadata)` of each parameter, then of the return value.
    pub fn frame_signature(&self) -> (Vec<(SlotType, ArgumentMetadata)>, (SlotType, ArgumentMetadata)) {
        let params = self.params.iter().map(|p| (p.ty, p.metadata)).collect();
        (params, (self.ret.ty, self.ret.metadata))
    }
}

impl fmt::Display for VirtualMethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = sys::join_with(self.params.iter(), ", ", |p| format!("{}: {}", p.name, p.ty));
        write!(f, "{}({params})", self.name)?;

        if !self.ret.ty.is_void() {
            write!(f, " -> {}", self.ret.ty)?;
        }
        Ok(())
    }
}

/// Where a `(class, virtual method)` pair stands.
///
/// Moves from `Unregistered` to `Registered` when a user class declares the override, and to `Invoked` on the first call
/// from the engine.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VirtualState {
    Unregistered,
    Registered,
    Invoked,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

type ErasedVirtual<T> = Box<
    dyn Fn(&mut T, *const sys::GDExtensionConstTypePtr, sys::GDExtensionTypePtr, &CallContext) -> Result<(), CallError>,
>;

/// Type-erased override of one virtual method, bound to the user class `T`.
///
/// The engine holds a pointer to this entry as "virtual call data" and hands it back on every call.
pub(crate) struct VirtualEntry<T> {
    method_name: &'static str,
    invoke: ErasedVirtual<T>,
    invoked: Arc<AtomicBool>,
}

impl<T> VirtualEntry<T> {
    pub(crate) fn new(method_name: &'static str, invoke: ErasedVirtual<T>) -> Self {
        Self {
            method_name,
            invoke,
            invoked: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn method_name(&self) -> &'static str {
        self.method_name
    }

    /// Flag shared with the class registry, for [`VirtualState`] queries.
    pub(crate) fn invoked_flag(&self) -> Arc<AtomicBool> {
        self.invoked.clone()
    }

    /// # Safety
    /// `args` and `ret` must match the frame signature this entry was validated against.
    pub(crate) unsafe fn call(
        &self,
        instance: &mut T,
        args: *const sys::GDExtensionConstTypePtr,
        ret: sys::GDExtensionTypePtr,
        call_ctx: &CallContext,
    ) -> Result<(), CallError> {
        self.invoked.store(true, Ordering::Release);
        (self.invoke)(instance, args, ret, call_ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sys::{DefaultArg, VariantType};

    static PROCESS: VirtualMethodSpec = VirtualMethodSpec::new(
        "_process",
        &[ParamMeta::value("delta", VariantType::Float)],
        ReturnMeta::VOID,
    );

    static GET: VirtualMethodSpec = VirtualMethodSpec::new(
        "_get",
        &[ParamMeta::value("property", VariantType::StringName).with_default(DefaultArg::Empty)],
        ReturnMeta::owned(SlotType::Variant),
    );

    #[test]
    fn display_signature() {
        assert_eq!(PROCESS.to_string(), "_process(delta: float)");
        assert_eq!(GET.to_string(), "_get(property: StringName) -> Variant");
    }

    #[test]
    fn frame_signature_of_spec() {
        let (params, ret) = PROCESS.frame_signature();
        assert_eq!(params, vec![(SlotType::Value(VariantType::Float), ArgumentMetadata::None)]);
        assert_eq!(ret, (SlotType::VOID, ArgumentMetadata::None));
    }
}

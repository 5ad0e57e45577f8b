/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Argument buffers for ptrcalls.
//!
//! A [`CallFrame`] is one contiguous, 8-byte aligned buffer: the return slot first, then one slot per declared parameter.
//! Fixed-size values are stored inline; values with native storage are represented by their opaque handle, which the frame
//! copies bitwise without taking ownership. The native function receives an array of pointers into the buffer.

use std::fmt;
use std::marker::PhantomData;

use crate as sys;
use crate::{ArgumentMetadata, DefaultArg, GodotFfi, MethodBinding, ParamMeta, ReturnMeta, SlotType, VariantType};

const WORD: usize = std::mem::size_of::<u64>();

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Slot {
    offset: usize,
    size: usize,
}

/// Byte offsets of all slots of one method's call frame, computed once when the method is resolved.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FrameLayout {
    ret: Slot,
    params: Box<[Slot]>,
    words: usize,
}

impl FrameLayout {
    pub fn new(params: &[ParamMeta], ret: &ReturnMeta) -> Self {
        let mut offset = 0;
        let mut next_slot = |size: usize| {
            let slot = Slot { offset, size };
            // Every slot starts word-aligned; empty slots (void return) still get one word, so the pointer stays distinct.
            offset += size.max(1).div_ceil(WORD) * WORD;
            slot
        };

        let ret = next_slot(ret.ty.size());
        let params = params.iter().map(|p| next_slot(p.ty.size())).collect();

        Self {
            ret,
            params,
            words: offset / WORD,
        }
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn param_offset(&self, index: usize) -> Option<usize> {
        self.params.get(index).map(|slot| slot.offset)
    }

    pub fn return_offset(&self) -> usize {
        self.ret.offset
    }

    pub fn size_bytes(&self) -> usize {
        self.words * WORD
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FrameError {
    /// More arguments than the method declares.
    TooManyArgs { method: &'static str, declared: usize },

    /// Argument type or numeric width differs from the declaration.
    TypeMismatch {
        method: &'static str,
        param: &'static str,
        expected: (SlotType, ArgumentMetadata),
        actual: (SlotType, ArgumentMetadata),
    },

    /// An omitted parameter has no default.
    MissingArg { method: &'static str, param: &'static str },

    /// A declared default does not fit the parameter type.
    InvalidDefault { method: &'static str, param: &'static str },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyArgs { method, declared } => {
                write!(f, "`{method}` declares {declared} parameter(s), more were passed")
            }
            Self::TypeMismatch {
                method,
                param,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "parameter `{param}` of `{method}` is declared as {} ({:?}), but {} ({:?}) was passed",
                    expected.0, expected.1, actual.0, actual.1
                )
            }
            Self::MissingArg { method, param } => {
                write!(f, "parameter `{param}` of `{method}` was omitted but has no default")
            }
            Self::InvalidDefault { method, param } => {
                write!(f, "default of parameter `{param}` of `{method}` does not match its type")
            }
        }
    }
}

impl std::error::Error for FrameError {}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Encoded arguments and return slot of exactly one native call.
///
/// Not `Send`/`Sync`: a frame is built, used and dropped on the calling thread.
pub struct CallFrame<'a> {
    binding: &'a MethodBinding,
    arena: Vec<u64>,
    written: usize,

    // Defaults constructed by the frame itself, destroyed on drop.
    temporaries: Vec<(SlotType, usize)>,

    // Return slot holding a constructed value that nobody took yet.
    return_live: Option<SlotType>,

    _not_send: PhantomData<*const ()>,
}

impl<'a> CallFrame<'a> {
    pub fn new(binding: &'a MethodBinding) -> Self {
        Self {
            binding,
            arena: vec![0; binding.layout().words],
            written: 0,
            temporaries: Vec::new(),
            return_live: None,
            _not_send: PhantomData,
        }
    }

    pub fn binding(&self) -> &'a MethodBinding {
        self.binding
    }

    /// Number of arguments written so far, including defaults.
    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Appends the next argument.
    ///
    /// The slot type and metadata of the value must match the declared parameter exactly; widening or narrowing is refused.
    ///
    /// # Safety
    /// `src` must point to a value of `ty` that stays alive and unmodified until the call completes.
    /// The frame only copies its bytes; ownership stays with the caller.
    pub unsafe fn push_arg(
        &mut self,
        ty: SlotType,
        metadata: ArgumentMetadata,
        src: sys::GDExtensionConstTypePtr,
    ) -> Result<(), FrameError> {
        let index = self.written;
        let param = self.param(index)?;

        if (param.ty, param.metadata) != (ty, metadata) {
            return Err(FrameError::TypeMismatch {
                method: self.binding.method_name(),
                param: param.name,
                expected: (param.ty, param.metadata),
                actual: (ty, metadata),
            });
        }

        let dst = self.slot_ptr(index);
        std::ptr::copy_nonoverlapping(src as *const u8, dst, ty.size());

        self.written += 1;
        Ok(())
    }

    /// Appends a typed argument. See [`push_arg()`](Self::push_arg).
    ///
    /// # Safety
    /// `value` must stay alive and unmodified until the call completes.
    pub unsafe fn push<T: GodotFfi>(&mut self, value: &T, metadata: ArgumentMetadata) -> Result<(), FrameError> {
        self.push_arg(T::slot_type(), metadata, value.sys_const())
    }

    /// Writes the declared defaults of all parameters not supplied yet.
    pub fn fill_defaults(&mut self) -> Result<(), FrameError> {
        while self.written < self.binding.layout().param_count() {
            let index = self.written;
            let param = self.param(index)?;

            let default = param.default.ok_or(FrameError::MissingArg {
                method: self.binding.method_name(),
                param: param.name,
            })?;

            // SAFETY: slot belongs to this parameter and has its declared size.
            unsafe { self.write_default(index, param, default)? };
            self.written += 1;
        }

        Ok(())
    }

    /// Pointer array handed to the native function.
    ///
    /// Must be called after all arguments are written (explicitly or through [`fill_defaults()`](Self::fill_defaults)).
    pub fn arg_ptrs(&mut self) -> Vec<sys::GDExtensionConstTypePtr> {
        assert_eq!(
            self.written,
            self.binding.layout().param_count(),
            "call frame of `{}` is incomplete",
            self.binding.method_name()
        );

        (0..self.written)
            .map(|index| self.slot_ptr(index) as sys::GDExtensionConstTypePtr)
            .collect()
    }

    /// The reserved return slot.
    pub fn return_ptr(&mut self) -> sys::GDExtensionTypePtr {
        let offset = self.binding.layout().return_offset();
        self.byte_ptr(offset) as sys::GDExtensionTypePtr
    }

    /// Moves the returned value out of the return slot.
    ///
    /// # Safety
    /// The native call must have initialized the return slot with a value of type `T`, which the caller now owns.
    /// Must be called at most once.
    pub unsafe fn take_return<T: GodotFfi>(&mut self) -> T {
        self.return_live = None;
        T::from_sys(self.return_ptr())
    }

    /// Copies a returned value that remains owned by the engine.
    ///
    /// # Safety
    /// The native call must have initialized the return slot with a value of type `T` that is borrowed from the engine.
    pub unsafe fn copy_return<T: GodotFfi>(&mut self) -> T {
        T::from_arg_ptr(self.return_ptr())
    }

    /// Performs the call.
    ///
    /// The engine assigns to the return slot, so values with native storage are default-constructed there first. If the
    /// caller does not [take](Self::take_return) the result, the frame destroys it on drop.
    ///
    /// # Safety
    /// `base` must be a live object (class methods) or point to a live builtin of the method's type (builtin methods).
    /// Must be called at most once.
    pub unsafe fn ptrcall(&mut self, base: sys::GDExtensionTypePtr) {
        let args = self.arg_ptrs();
        self.construct_return();
        let ret = self.return_ptr();

        sys::out!("ptrcall {}::{}", self.binding.class_name(), self.binding.method_name());
        match self.binding.target() {
            sys::BindTarget::Class(bind) => {
                sys::interface_fn!(object_method_bind_ptrcall)(bind.as_ptr(), base, args.as_ptr(), ret);
            }
            sys::BindTarget::Builtin(method) => {
                let argc = std::ffi::c_int::try_from(args.len()).unwrap_or(std::ffi::c_int::MAX);
                method(base, args.as_ptr(), ret, argc);
            }
        }
    }

    unsafe fn construct_return(&mut self) {
        let ty = self.binding.spec().ret.ty;
        let dst = self.return_ptr();

        match ty {
            SlotType::Variant => {
                sys::interface_fn!(variant_new_nil)(dst as sys::GDExtensionUninitializedVariantPtr);
            }
            SlotType::Value(value_ty) if value_ty.has_native_storage() => {
                let storage = sys::builtin_lifecycle().storage(value_ty);
                (storage.construct_default)(dst as sys::GDExtensionUninitializedTypePtr, std::ptr::null());
            }
            // Plain values and object pointers are overwritten bitwise.
            SlotType::Value(_) => return,
        }
        self.return_live = Some(ty);
    }

    fn param(&self, index: usize) -> Result<&'static ParamMeta, FrameError> {
        let spec = self.binding.spec();

        spec.params.get(index).ok_or(FrameError::TooManyArgs {
            method: spec.method,
            declared: spec.params.len(),
        })
    }

    fn slot_ptr(&mut self, index: usize) -> *mut u8 {
        let offset = self.binding.layout().params[index].offset;
        self.byte_ptr(offset)
    }

    fn byte_ptr(&mut self, offset: usize) -> *mut u8 {
        debug_assert!(offset < self.arena.len() * WORD);

        // SAFETY: offset lies within the arena, checked by the layout construction.
        unsafe { (self.arena.as_mut_ptr() as *mut u8).add(offset) }
    }

    unsafe fn write_default(&mut self, index: usize, param: &'static ParamMeta, default: DefaultArg) -> Result<(), FrameError> {
        let method = self.binding.method_name();
        let invalid = || FrameError::InvalidDefault {
            method,
            param: param.name,
        };

        let dst = self.slot_ptr(index);
        match (default, param.ty) {
            (DefaultArg::Bool(value), SlotType::Value(VariantType::Bool)) => {
                *dst = sys::bool_to_sys(value);
            }
            (DefaultArg::Int(value), SlotType::Value(VariantType::Int)) => {
                (dst as *mut i64).write(value);
            }
            (DefaultArg::Float(value), SlotType::Value(VariantType::Float)) => {
                (dst as *mut f64).write(value);
            }
            (DefaultArg::NullObject, SlotType::Value(VariantType::Object)) => {
                (dst as *mut sys::GDExtensionObjectPtr).write(std::ptr::null_mut());
            }
            (DefaultArg::Nil, SlotType::Variant) => {
                sys::interface_fn!(variant_new_nil)(dst as sys::GDExtensionUninitializedVariantPtr);
                self.temporaries.push((SlotType::Variant, index));
            }
            (DefaultArg::Empty, SlotType::Value(ty)) if ty.has_native_storage() => {
                let storage = sys::builtin_lifecycle().storage(ty);
                (storage.construct_default)(dst as sys::GDExtensionUninitializedTypePtr, std::ptr::null());
                self.temporaries.push((param.ty, index));
            }
            (DefaultArg::Empty, SlotType::Value(ty)) if ty != VariantType::Object && ty != VariantType::Nil => {
                // Value types: all-zero is the default (zero vector, black transparent color). The arena is zeroed already.
            }
            _ => return Err(invalid()),
        }

        Ok(())
    }
}

impl Drop for CallFrame<'_> {
    fn drop(&mut self) {
        for (ty, index) in std::mem::take(&mut self.temporaries) {
            let ptr = self.slot_ptr(index);

            // SAFETY: the slot was initialized by `write_default()` and is destroyed exactly once.
            unsafe { destroy_slot(ty, ptr) };
        }

        if let Some(ty) = self.return_live.take() {
            let ptr = self.return_ptr() as *mut u8;

            // SAFETY: the slot was constructed by `construct_return()` and was not moved out.
            unsafe { destroy_slot(ty, ptr) };
        }
    }
}

unsafe fn destroy_slot(ty: SlotType, ptr: *mut u8) {
    match ty {
        SlotType::Variant => sys::interface_fn!(variant_destroy)(ptr as sys::GDExtensionVariantPtr),
        SlotType::Value(ty) => (sys::builtin_lifecycle().storage(ty).destroy)(ptr as sys::GDExtensionTypePtr),
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BindTarget, ClassMethodBind, MethodSpec, Ownership};

    static CHECK: MethodSpec = MethodSpec::class(
        "BridgeCheck",
        "check",
        1,
        &[
            ParamMeta::value("number", VariantType::Int),
            ParamMeta::value("ratio", VariantType::Float).with_metadata(ArgumentMetadata::RealIsFloat),
            ParamMeta::value("flag", VariantType::Bool).with_default(DefaultArg::Bool(true)),
            ParamMeta::value("count", VariantType::Int)
                .with_metadata(ArgumentMetadata::IntIsInt32)
                .with_default(DefaultArg::Int(-3)),
        ],
        ReturnMeta::value(VariantType::Bool),
    );

    static GET_CHILD: MethodSpec = MethodSpec::class(
        "Node",
        "get_child",
        2,
        &[ParamMeta::value("idx", VariantType::Int).with_metadata(ArgumentMetadata::IntIsInt32)],
        ReturnMeta::value(VariantType::Object).with_ownership(Ownership::Borrowed),
    );

    fn binding(spec: &'static MethodSpec) -> MethodBinding {
        // The bind is never called in these tests.
        let bind = ClassMethodBind::from_ptr(1usize as sys::GDExtensionMethodBindPtr);
        MethodBinding::new(spec, BindTarget::Class(bind))
    }

    #[test]
    fn layout_is_word_aligned() {
        let layout = FrameLayout::new(CHECK.params, &CHECK.ret);

        // bool return (1 byte) still takes one word.
        assert_eq!(layout.return_offset(), 0);
        assert_eq!(layout.param_offset(0), Some(8));
        assert_eq!(layout.param_offset(1), Some(16));
        assert_eq!(layout.param_offset(2), Some(24));
        assert_eq!(layout.param_offset(3), Some(32));
        assert_eq!(layout.param_offset(4), None);
        assert_eq!(layout.size_bytes(), 40);
    }

    #[test]
    fn layout_of_wide_slots() {
        static SPEC: MethodSpec = MethodSpec::class(
            "Object",
            "set_meta",
            3,
            &[
                ParamMeta::value("name", VariantType::StringName),
                ParamMeta::new("value", SlotType::Variant),
                ParamMeta::value("color", VariantType::Color),
            ],
            ReturnMeta::owned(SlotType::Variant),
        );

        let layout = FrameLayout::new(SPEC.params, &SPEC.ret);
        assert_eq!(layout.param_offset(0), Some(24));
        assert_eq!(layout.param_offset(1), Some(32));
        assert_eq!(layout.param_offset(2), Some(56));
        assert_eq!(layout.size_bytes(), 72);
    }

    #[test]
    fn arguments_are_encoded_inline() {
        let binding = binding(&CHECK);
        let mut frame = CallFrame::new(&binding);

        let number = 42i64;
        let ratio = 0.5f64;
        unsafe {
            frame.push(&number, ArgumentMetadata::None).unwrap();
            frame.push(&ratio, ArgumentMetadata::RealIsFloat).unwrap();
        }
        frame.fill_defaults().unwrap();
        assert_eq!(frame.len(), 4);

        let ptrs = frame.arg_ptrs();
        unsafe {
            assert_eq!(*(ptrs[0] as *const i64), 42);
            assert_eq!(*(ptrs[1] as *const f64), 0.5);
            assert_eq!(*(ptrs[2] as *const u8), 1);
            assert_eq!(*(ptrs[3] as *const i64), -3);
        }
    }

    #[test]
    fn width_mismatch_is_refused() {
        let binding = binding(&GET_CHILD);
        let mut frame = CallFrame::new(&binding);

        // Declared as 32-bit int; an i64-typed value must not be accepted silently.
        let idx = 3i64;
        let err = unsafe { frame.push(&idx, ArgumentMetadata::IntIsInt64) }.unwrap_err();

        assert_eq!(
            err,
            FrameError::TypeMismatch {
                method: "get_child",
                param: "idx",
                expected: (SlotType::Value(VariantType::Int), ArgumentMetadata::IntIsInt32),
                actual: (SlotType::Value(VariantType::Int), ArgumentMetadata::IntIsInt64),
            }
        );
        assert!(frame.is_empty());
    }

    #[test]
    fn type_mismatch_is_refused() {
        let binding = binding(&CHECK);
        let mut frame = CallFrame::new(&binding);

        let err = unsafe { frame.push(&true, ArgumentMetadata::None) }.unwrap_err();
        assert!(matches!(err, FrameError::TypeMismatch { param: "number", .. }), "{err}");
    }

    #[test]
    fn too_many_and_missing_args() {
        let binding = binding(&GET_CHILD);

        let mut frame = CallFrame::new(&binding);
        assert_eq!(
            frame.fill_defaults(),
            Err(FrameError::MissingArg {
                method: "get_child",
                param: "idx"
            })
        );

        let mut frame = CallFrame::new(&binding);
        let idx = 1i64;
        unsafe {
            frame.push(&idx, ArgumentMetadata::IntIsInt32).unwrap();
            let err = frame.push(&idx, ArgumentMetadata::IntIsInt32).unwrap_err();
            assert_eq!(
                err,
                FrameError::TooManyArgs {
                    method: "get_child",
                    declared: 1
                }
            );
        }
    }

    #[test]
    fn return_slot_roundtrip() {
        let binding = binding(&CHECK);
        let mut frame = CallFrame::new(&binding);

        unsafe {
            (frame.return_ptr() as *mut bool).write(true);
            assert!(frame.take_return::<bool>());
        }
    }

    #[test]
    #[should_panic(expected = "incomplete")]
    fn incomplete_frame_panics() {
        let binding = binding(&CHECK);
        let mut frame = CallFrame::new(&binding);
        frame.arg_ptrs();
    }
}

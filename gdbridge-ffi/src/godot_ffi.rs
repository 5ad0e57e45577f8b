/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate as sys;

/// Types that can directly and fully represent some engine type in a call frame.
///
/// Adds methods to convert from and to FFI pointers. See [`ffi_methods!`][crate::ffi_methods] for ergonomic implementation.
///
/// # Safety
///
/// The in-memory representation of `Self` at [`sys()`](GodotFfi::sys) must be exactly what the engine expects for
/// [`variant_type()`](GodotFfi::variant_type), and at least [`VariantType::ptrcall_size()`](sys::VariantType::ptrcall_size)
/// bytes long. Call frames copy that many bytes from it.
#[doc(hidden)] // shows up in implementors otherwise
pub unsafe trait GodotFfi {
    fn variant_type() -> sys::VariantType;

    /// Call frame slot holding this type. Only `Variant` differs from the plain value slot of its variant type.
    fn slot_type() -> sys::SlotType {
        sys::SlotType::Value(Self::variant_type())
    }

    /// Takes over the value stored at `ptr`.
    ///
    /// # Safety
    /// `ptr` must point to an initialized value of this type, which the caller gives up: it must not be destroyed
    /// or read as owned again.
    unsafe fn from_sys(ptr: sys::GDExtensionTypePtr) -> Self;

    /// Construct uninitialized opaque data, then initialize it with `init_fn` function.
    ///
    /// # Safety
    /// `init_fn` must fully initialize the value behind the pointer it receives.
    unsafe fn from_sys_init(init_fn: impl FnOnce(sys::GDExtensionUninitializedTypePtr)) -> Self;

    /// Return FFI pointer, for an immutable operation.
    ///
    /// Note that this is a `*mut` pointer despite taking `&self` by shared-ref,
    /// because most of the engine API is not const-correct.
    fn sys(&self) -> sys::GDExtensionTypePtr;

    /// Return FFI pointer, for a mutable operation.
    fn sys_mut(&mut self) -> sys::GDExtensionTypePtr {
        self.sys()
    }

    fn sys_const(&self) -> sys::GDExtensionConstTypePtr {
        self.sys()
    }

    /// Copies a value that the caller only borrows, such as an argument of a virtual call or a borrowed return.
    ///
    /// For types with native storage, this runs the engine's copy constructor; the value at `ptr` stays untouched.
    ///
    /// # Safety
    /// `ptr` must point to an initialized value of this type.
    unsafe fn from_arg_ptr(ptr: sys::GDExtensionTypePtr) -> Self;

    /// Moves `self` into the initialized slot `dst`, destroying the value that was there.
    ///
    /// # Safety
    /// `dst` must point to an initialized value of this type.
    unsafe fn move_return_ptr(self, dst: sys::GDExtensionTypePtr);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Types that can represent null-values.
///
/// Used to blanket implement various conversions over `Option<T>`.
pub trait GodotNullableFfi: Sized + GodotFfi {
    fn null() -> Self;

    fn is_null(&self) -> bool;

    fn flatten_option(opt: Option<Self>) -> Self {
        opt.unwrap_or_else(Self::null)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros to choose a certain implementation of `GodotFfi` trait.
// See doc comment of `ffi_methods!` for information

#[macro_export]
#[doc(hidden)]
macro_rules! ffi_methods_one {
    // type $Ptr = *mut Opaque
    (OpaquePtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $from_sys:ident = from_sys) => {
        $( #[$attr] )? $vis
        unsafe fn $from_sys(ptr: $Ptr) -> Self {
            let opaque = std::ptr::read(ptr as *const _);
            Self::from_opaque(opaque)
        }
    };
    (OpaquePtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $from_sys_init:ident = from_sys_init) => {
        $( #[$attr] )? $vis
        unsafe fn $from_sys_init(init: impl FnOnce($Ptr)) -> Self {
            let mut raw = std::mem::MaybeUninit::uninit();
            init(raw.as_mut_ptr() as $Ptr);

            Self::from_opaque(raw.assume_init())
        }
    };
    (OpaquePtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $sys:ident = sys) => {
        $( #[$attr] )? $vis
        fn $sys(&self) -> $Ptr {
            &self.opaque as *const _ as $Ptr
        }
    };
    (OpaquePtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $from_arg_ptr:ident = from_arg_ptr) => {
        $( #[$attr] )? $vis
        unsafe fn $from_arg_ptr(ptr: $Ptr) -> Self {
            // The bitwise copy aliases the caller's value; it must never be dropped.
            let borrowed = std::mem::ManuallyDrop::new(Self::from_sys(ptr));
            std::clone::Clone::clone(&*borrowed)
        }
    };
    (OpaquePtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $move_return_ptr:ident = move_return_ptr) => {
        $( #[$attr] )? $vis
        unsafe fn $move_return_ptr(mut self, dst: $Ptr) {
            // After the swap, `self` holds the previous value and destroys it when dropped.
            std::ptr::swap(dst as *mut _, std::ptr::addr_of_mut!(self.opaque))
        }
    };

    // type $Ptr = *mut Self
    (SelfPtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $from_sys:ident = from_sys) => {
        $( #[$attr] )? $vis
        unsafe fn $from_sys(ptr: $Ptr) -> Self {
            *(ptr as *mut Self)
        }
    };
    (SelfPtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $from_sys_init:ident = from_sys_init) => {
        $( #[$attr] )? $vis
        unsafe fn $from_sys_init(init: impl FnOnce($Ptr)) -> Self {
            let mut raw = std::mem::MaybeUninit::<Self>::uninit();
            init(raw.as_mut_ptr() as $Ptr);

            raw.assume_init()
        }
    };
    (SelfPtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $sys:ident = sys) => {
        $( #[$attr] )? $vis
        fn $sys(&self) -> $Ptr {
            self as *const Self as $Ptr
        }
    };
    (SelfPtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $from_arg_ptr:ident = from_arg_ptr) => {
        $( #[$attr] )? $vis
        unsafe fn $from_arg_ptr(ptr: $Ptr) -> Self {
            *(ptr as *mut Self)
        }
    };
    (SelfPtr $Ptr:ty; $( #[$attr:meta] )? $vis:vis $move_return_ptr:ident = move_return_ptr) => {
        $( #[$attr] )? $vis
        unsafe fn $move_return_ptr(self, dst: $Ptr) {
            *(dst as *mut Self) = self
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! ffi_methods_rest {
    ( // impl T: each method has a custom name and is annotated with 'pub'
        $Impl:ident $Ptr:ty; $( fn $user_fn:ident = $sys_fn:ident; )*
    ) => {
        $( $crate::ffi_methods_one!($Impl $Ptr; #[doc(hidden)] pub $user_fn = $sys_fn); )*
    };

    ( // impl GodotFfi for T: methods have given names, no 'pub' needed
        $Impl:ident $Ptr:ty; $( fn $sys_fn:ident; )*
    ) => {
        $( $crate::ffi_methods_one!($Impl $Ptr; $sys_fn = $sys_fn); )*
    };

    ( // impl GodotFfi for T (default all 5)
        $Impl:ident $Ptr:ty; ..
    ) => {
        $crate::ffi_methods_one!($Impl $Ptr; from_sys = from_sys);
        $crate::ffi_methods_one!($Impl $Ptr; from_sys_init = from_sys_init);
        $crate::ffi_methods_one!($Impl $Ptr; sys = sys);
        $crate::ffi_methods_one!($Impl $Ptr; from_arg_ptr = from_arg_ptr);
        $crate::ffi_methods_one!($Impl $Ptr; move_return_ptr = move_return_ptr);
    };
}

/// Provides "sys" style methods for FFI and ptrcall integration.
///
/// The generated implementations follow one of two patterns:
///
/// * `*mut Opaque`<br>
///   For a type with native storage (strings, containers, variants) held in an `opaque` field.
///   The **address of** the `Opaque` field is used as the sys pointer.
///   Expects a `from_opaque()` constructor and `Clone` (for [`GodotFfi::from_arg_ptr`]).
///
/// * `*mut Self`<br>
///   For a `Copy` type implemented with standard Rust fields whose layout equals the engine's (`bool`, `i64`, vectors).
///   The address of `Self` is directly reinterpreted as the sys pointer.
#[macro_export]
macro_rules! ffi_methods {
    ( // Sys pointer = address of opaque
        type $Ptr:ty = *mut Opaque;
        $( $rest:tt )*
    ) => {
        $crate::ffi_methods_rest!(OpaquePtr $Ptr; $($rest)*);
    };

    ( // Sys pointer = address of self
        type $Ptr:ty = *mut Self;
        $( $rest:tt )*
    ) => {
        $crate::ffi_methods_rest!(SelfPtr $Ptr; $($rest)*);
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation for common types (needs to be this crate due to orphan rule)

mod scalars {
    use super::GodotFfi;
    use crate as sys;

    // `bool` is a single byte on both sides; the engine only ever writes 0 or 1.
    unsafe impl GodotFfi for bool {
        fn variant_type() -> sys::VariantType {
            sys::VariantType::Bool
        }

        ffi_methods! { type sys::GDExtensionTypePtr = *mut Self; .. }
    }

    unsafe impl GodotFfi for i64 {
        fn variant_type() -> sys::VariantType {
            sys::VariantType::Int
        }

        ffi_methods! { type sys::GDExtensionTypePtr = *mut Self; .. }
    }

    unsafe impl GodotFfi for f64 {
        fn variant_type() -> sys::VariantType {
            sys::VariantType::Float
        }

        ffi_methods! { type sys::GDExtensionTypePtr = *mut Self; .. }
    }

    unsafe impl GodotFfi for () {
        fn variant_type() -> sys::VariantType {
            sys::VariantType::Nil
        }

        unsafe fn from_sys(_ptr: sys::GDExtensionTypePtr) -> Self {
            // Do nothing
        }

        unsafe fn from_sys_init(_init: impl FnOnce(sys::GDExtensionUninitializedTypePtr)) -> Self {
            // Do nothing
        }

        fn sys(&self) -> sys::GDExtensionTypePtr {
            // ZST dummy pointer
            self as *const _ as sys::GDExtensionTypePtr
        }

        unsafe fn from_arg_ptr(_ptr: sys::GDExtensionTypePtr) -> Self {}

        unsafe fn move_return_ptr(self, _dst: sys::GDExtensionTypePtr) {
            // Do nothing
        }
    }
}

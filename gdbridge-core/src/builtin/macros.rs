/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![macro_use]

// Lifecycle functions come from the builtin lifecycle table, keyed by the type's `VariantType`.
macro_rules! impl_builtin_traits_inner {
    ( Default for $Type:ty => $Variant:ident ) => {
        impl Default for $Type {
            #[inline]
            fn default() -> Self {
                let storage = $crate::sys::builtin_lifecycle().storage($crate::sys::VariantType::$Variant);

                // SAFETY: the default constructor fully initializes the value.
                unsafe {
                    <Self as $crate::sys::GodotFfi>::from_sys_init(|self_ptr| {
                        (storage.construct_default)(self_ptr, std::ptr::null());
                    })
                }
            }
        }
    };

    ( Clone for $Type:ty => $Variant:ident ) => {
        impl Clone for $Type {
            #[inline]
            fn clone(&self) -> Self {
                let storage = $crate::sys::builtin_lifecycle().storage($crate::sys::VariantType::$Variant);

                // SAFETY: `self` is alive for the duration of the copy constructor.
                unsafe {
                    <Self as $crate::sys::GodotFfi>::from_sys_init(|self_ptr| {
                        let args = [$crate::sys::GodotFfi::sys_const(self)];
                        (storage.construct_copy)(self_ptr, args.as_ptr());
                    })
                }
            }
        }
    };

    ( Drop for $Type:ty => $Variant:ident ) => {
        impl Drop for $Type {
            #[inline]
            fn drop(&mut self) {
                let storage = $crate::sys::builtin_lifecycle().storage($crate::sys::VariantType::$Variant);

                // SAFETY: `self` is initialized and never used again.
                unsafe {
                    (storage.destroy)($crate::sys::GodotFfi::sys_mut(self));
                }
            }
        }
    };
}

macro_rules! impl_builtin_traits {
    (
        for $Type:ty => $Variant:ident {
            $( $Trait:ident; )*
        }
    ) => (
        $(
            impl_builtin_traits_inner! {
                $Trait for $Type => $Variant
            }
        )*
    )
}

/// Declares an RAII wrapper around the opaque handle of a builtin with native storage.
macro_rules! impl_builtin_stub {
    ($(#[$attr:meta])* $Class:ident => $Variant:ident, $OpaqueTy:ident) => {
        $(#[$attr])*
        #[repr(transparent)]
        pub struct $Class {
            opaque: $crate::sys::types::$OpaqueTy,
        }

        impl $Class {
            fn from_opaque(opaque: $crate::sys::types::$OpaqueTy) -> Self {
                Self { opaque }
            }
        }

        // SAFETY:
        // This is simply a wrapper around an `Opaque` value representing a value of the type.
        unsafe impl $crate::sys::GodotFfi for $Class {
            fn variant_type() -> $crate::sys::VariantType {
                $crate::sys::VariantType::$Variant
            }

            $crate::sys::ffi_methods! { type $crate::sys::GDExtensionTypePtr = *mut Opaque; .. }
        }
    };
}

/// Implements [`GodotFfiVariant`](crate::meta::GodotFfiVariant) through the variant converters of the lifecycle table.
macro_rules! impl_ffi_variant {
    ($($T:ty),* $(,)?) => {
        $(
            impl $crate::meta::GodotFfiVariant for $T {
                fn ffi_to_variant(&self) -> $crate::builtin::Variant {
                    $crate::builtin::Variant::from_ffi_value(self)
                }

                fn ffi_from_variant(
                    variant: &$crate::builtin::Variant,
                ) -> Result<Self, $crate::meta::error::ConvertError> {
                    variant.to_ffi_value::<$T>()
                }
            }
        )*
    };
}

/// Implements all conversion traits for a builtin that is its own FFI representation.
macro_rules! impl_builtin_convert {
    ($($T:ident => $name:literal),* $(,)?) => {
        $(
            $crate::impl_builtin_godot_type!($T, $name);
            impl_ffi_variant!($T);
        )*
    };
}

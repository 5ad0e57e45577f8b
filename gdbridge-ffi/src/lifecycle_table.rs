/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Constructors, destructors and variant conversions of builtin types, loaded once at startup.

use std::collections::HashMap;

use crate as sys;
use crate::{InitError, VariantType};

pub type PtrConstructor =
    unsafe extern "C" fn(p_base: sys::GDExtensionUninitializedTypePtr, p_args: *const sys::GDExtensionConstTypePtr);
pub type PtrDestructor = unsafe extern "C" fn(p_base: sys::GDExtensionTypePtr);
pub type VariantFromType = unsafe extern "C" fn(sys::GDExtensionUninitializedVariantPtr, sys::GDExtensionTypePtr);
pub type TypeFromVariant = unsafe extern "C" fn(sys::GDExtensionUninitializedTypePtr, sys::GDExtensionVariantPtr);

/// Index of the copy constructor; index 0 is the default constructor for every type.
const COPY_CONSTRUCTOR: i32 = 1;

/// Index of the String <-> StringName conversion constructors.
const CONVERSION_CONSTRUCTOR: i32 = 2;

/// Lifecycle of a type with native storage.
#[derive(Copy, Clone, Debug)]
pub struct NativeStorage {
    pub construct_default: PtrConstructor,
    pub construct_copy: PtrConstructor,
    pub destroy: PtrDestructor,
}

#[derive(Copy, Clone, Debug)]
pub struct VariantConversion {
    pub from_type: VariantFromType,
    pub to_type: TypeFromVariant,
}

#[derive(Debug)]
pub struct BuiltinLifecycleTable {
    storage: HashMap<VariantType, NativeStorage>,
    conversions: HashMap<VariantType, VariantConversion>,
    pub string_from_string_name: PtrConstructor,
    pub string_name_from_string: PtrConstructor,
}

impl BuiltinLifecycleTable {
    /// Loads all entries. Every missing entry is reported, not only the first.
    ///
    /// # Safety
    /// The interface's function pointers must be valid.
    pub unsafe fn load(interface: &sys::GDExtensionInterface) -> Result<Self, InitError> {
        let get_constructor = interface
            .variant_get_ptr_constructor
            .ok_or(InitError::MissingInterfaceFunction("variant_get_ptr_constructor"))?;
        let get_destructor = interface
            .variant_get_ptr_destructor
            .ok_or(InitError::MissingInterfaceFunction("variant_get_ptr_destructor"))?;
        let get_from_type = interface
            .get_variant_from_type_constructor
            .ok_or(InitError::MissingInterfaceFunction("get_variant_from_type_constructor"))?;
        let get_to_type = interface
            .get_variant_to_type_constructor
            .ok_or(InitError::MissingInterfaceFunction("get_variant_to_type_constructor"))?;

        let mut missing = Vec::new();
        let mut storage = HashMap::new();
        let mut conversions = HashMap::new();

        for &ty in VariantType::ALL.iter().filter(|&&ty| ty != VariantType::Nil) {
            let sys_ty = ty.sys();

            let from_type = get_from_type(sys_ty);
            let to_type = get_to_type(sys_ty);
            match (from_type, to_type) {
                (Some(from_type), Some(to_type)) => {
                    conversions.insert(ty, VariantConversion { from_type, to_type });
                }
                _ => missing.push(format!("{ty} <-> Variant")),
            }

            if !ty.has_native_storage() {
                continue;
            }

            let construct_default = get_constructor(sys_ty, 0);
            let construct_copy = get_constructor(sys_ty, COPY_CONSTRUCTOR);
            let destroy = get_destructor(sys_ty);
            match (construct_default, construct_copy, destroy) {
                (Some(construct_default), Some(construct_copy), Some(destroy)) => {
                    storage.insert(
                        ty,
                        NativeStorage {
                            construct_default,
                            construct_copy,
                            destroy,
                        },
                    );
                }
                _ => missing.push(format!("{ty} constructors/destructor")),
            }
        }

        let string_from_string_name = get_constructor(VariantType::String.sys(), CONVERSION_CONSTRUCTOR);
        let string_name_from_string = get_constructor(VariantType::StringName.sys(), CONVERSION_CONSTRUCTOR);

        match (string_from_string_name, string_name_from_string) {
            (Some(string_from_string_name), Some(string_name_from_string)) if missing.is_empty() => Ok(Self {
                storage,
                conversions,
                string_from_string_name,
                string_name_from_string,
            }),
            (from, to) => {
                if from.is_none() {
                    missing.push("String(StringName) constructor".to_string());
                }
                if to.is_none() {
                    missing.push("StringName(String) constructor".to_string());
                }
                Err(InitError::MissingLifecycle(missing))
            }
        }
    }

    /// # Panics
    /// If `ty` has no native storage; the caller's type determines that statically.
    pub fn storage(&self, ty: VariantType) -> &NativeStorage {
        self.storage
            .get(&ty)
            .unwrap_or_else(|| panic!("{ty} has no native storage"))
    }

    /// # Panics
    /// For `Nil`, which has no typed representation.
    pub fn conversion(&self, ty: VariantType) -> &VariantConversion {
        self.conversions
            .get(&ty)
            .unwrap_or_else(|| panic!("{ty} has no variant conversion"))
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The C ABI of the extension interface: pointer aliases, callback signatures and the function table handed over by the engine.
//!
//! Names follow `gdextension_interface.h`, so that code written against the C header reads the same here.

#![allow(non_camel_case_types, non_upper_case_globals)]

use std::ffi::{c_char, c_int, c_void};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scalars

pub type GDExtensionBool = u8;
pub type GDExtensionInt = i64;
pub type GDObjectInstanceID = u64;
pub type GDExtensionVariantType = u32;
pub type GDExtensionClassMethodArgumentMetadata = u32;
pub type GDExtensionInitializationLevel = u32;

pub const GDEXTENSION_INITIALIZATION_CORE: GDExtensionInitializationLevel = 0;
pub const GDEXTENSION_INITIALIZATION_SERVERS: GDExtensionInitializationLevel = 1;
pub const GDEXTENSION_INITIALIZATION_SCENE: GDExtensionInitializationLevel = 2;
pub const GDEXTENSION_INITIALIZATION_EDITOR: GDExtensionInitializationLevel = 3;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Pointers

pub type GDExtensionVariantPtr = *mut c_void;
pub type GDExtensionConstVariantPtr = *const c_void;
pub type GDExtensionUninitializedVariantPtr = *mut c_void;
pub type GDExtensionStringPtr = *mut c_void;
pub type GDExtensionConstStringPtr = *const c_void;
pub type GDExtensionUninitializedStringPtr = *mut c_void;
pub type GDExtensionStringNamePtr = *mut c_void;
pub type GDExtensionConstStringNamePtr = *const c_void;
pub type GDExtensionUninitializedStringNamePtr = *mut c_void;
pub type GDExtensionTypePtr = *mut c_void;
pub type GDExtensionConstTypePtr = *const c_void;
pub type GDExtensionUninitializedTypePtr = *mut c_void;
pub type GDExtensionObjectPtr = *mut c_void;
pub type GDExtensionConstObjectPtr = *const c_void;
pub type GDExtensionMethodBindPtr = *const c_void;
pub type GDExtensionClassInstancePtr = *mut c_void;
pub type GDExtensionClassLibraryPtr = *mut c_void;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Builtin lifecycle and method signatures

pub type GDExtensionVariantFromTypeConstructorFunc =
    Option<unsafe extern "C" fn(GDExtensionUninitializedVariantPtr, GDExtensionTypePtr)>;

pub type GDExtensionTypeFromVariantConstructorFunc =
    Option<unsafe extern "C" fn(GDExtensionUninitializedTypePtr, GDExtensionVariantPtr)>;

pub type GDExtensionPtrConstructor = Option<
    unsafe extern "C" fn(p_base: GDExtensionUninitializedTypePtr, p_args: *const GDExtensionConstTypePtr),
>;

pub type GDExtensionPtrDestructor = Option<unsafe extern "C" fn(p_base: GDExtensionTypePtr)>;

pub type GDExtensionPtrBuiltInMethod = Option<
    unsafe extern "C" fn(
        p_base: GDExtensionTypePtr,
        p_args: *const GDExtensionConstTypePtr,
        r_return: GDExtensionTypePtr,
        p_argument_count: c_int,
    ),
>;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Extension classes

pub type GDExtensionClassCreateInstance =
    Option<unsafe extern "C" fn(p_class_userdata: *mut c_void) -> GDExtensionObjectPtr>;

pub type GDExtensionClassFreeInstance = Option<
    unsafe extern "C" fn(p_class_userdata: *mut c_void, p_instance: GDExtensionClassInstancePtr),
>;

pub type GDExtensionClassGetVirtualCallData = Option<
    unsafe extern "C" fn(p_class_userdata: *mut c_void, p_name: *const c_char) -> *mut c_void,
>;

pub type GDExtensionClassCallVirtualWithData = Option<
    unsafe extern "C" fn(
        p_instance: GDExtensionClassInstancePtr,
        p_name: *const c_char,
        p_virtual_call_userdata: *mut c_void,
        p_args: *const GDExtensionConstTypePtr,
        r_ret: GDExtensionTypePtr,
    ),
>;

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionClassCreationInfo {
    pub is_virtual: GDExtensionBool,
    pub is_abstract: GDExtensionBool,
    pub create_instance_func: GDExtensionClassCreateInstance,
    pub free_instance_func: GDExtensionClassFreeInstance,
    pub get_virtual_call_data_func: GDExtensionClassGetVirtualCallData,
    pub call_virtual_with_data_func: GDExtensionClassCallVirtualWithData,
    pub class_userdata: *mut c_void,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Library initialization

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct GDExtensionInitialization {
    pub minimum_initialization_level: GDExtensionInitializationLevel,
    pub userdata: *mut c_void,
    pub initialize:
        Option<unsafe extern "C" fn(userdata: *mut c_void, p_level: GDExtensionInitializationLevel)>,
    pub deinitialize:
        Option<unsafe extern "C" fn(userdata: *mut c_void, p_level: GDExtensionInitializationLevel)>,
}

pub type GDExtensionInitializationFunction = Option<
    unsafe extern "C" fn(
        p_interface: *const GDExtensionInterface,
        p_library: GDExtensionClassLibraryPtr,
        r_initialization: *mut GDExtensionInitialization,
    ) -> GDExtensionBool,
>;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Function table

/// Function pointers supplied by the engine when the library is loaded.
///
/// Every entry is optional at the type level. Missing entries are reported when first fetched through [`interface_fn!`][crate::interface_fn].
#[repr(C)]
#[derive(Copy, Clone)]
pub struct GDExtensionInterface {
    pub version_major: u32,
    pub version_minor: u32,
    pub version_patch: u32,
    pub version_string: *const c_char,

    // Logging.
    pub print_error: Option<
        unsafe extern "C" fn(
            p_description: *const c_char,
            p_function: *const c_char,
            p_file: *const c_char,
            p_line: i32,
            p_editor_notify: GDExtensionBool,
        ),
    >,
    pub print_warning: Option<
        unsafe extern "C" fn(
            p_description: *const c_char,
            p_function: *const c_char,
            p_file: *const c_char,
            p_line: i32,
            p_editor_notify: GDExtensionBool,
        ),
    >,

    // Variant.
    pub variant_new_copy: Option<
        unsafe extern "C" fn(r_dest: GDExtensionUninitializedVariantPtr, p_src: GDExtensionConstVariantPtr),
    >,
    pub variant_new_nil: Option<unsafe extern "C" fn(r_dest: GDExtensionUninitializedVariantPtr)>,
    pub variant_destroy: Option<unsafe extern "C" fn(p_self: GDExtensionVariantPtr)>,
    pub variant_get_type:
        Option<unsafe extern "C" fn(p_self: GDExtensionConstVariantPtr) -> GDExtensionVariantType>,
    pub variant_stringify: Option<
        unsafe extern "C" fn(p_self: GDExtensionConstVariantPtr, r_ret: GDExtensionUninitializedStringPtr),
    >,
    pub get_variant_from_type_constructor: Option<
        unsafe extern "C" fn(p_type: GDExtensionVariantType) -> GDExtensionVariantFromTypeConstructorFunc,
    >,
    pub get_variant_to_type_constructor: Option<
        unsafe extern "C" fn(p_type: GDExtensionVariantType) -> GDExtensionTypeFromVariantConstructorFunc,
    >,
    pub variant_get_ptr_constructor: Option<
        unsafe extern "C" fn(
            p_type: GDExtensionVariantType,
            p_constructor: i32,
        ) -> GDExtensionPtrConstructor,
    >,
    pub variant_get_ptr_destructor:
        Option<unsafe extern "C" fn(p_type: GDExtensionVariantType) -> GDExtensionPtrDestructor>,
    pub variant_get_ptr_builtin_method: Option<
        unsafe extern "C" fn(
            p_type: GDExtensionVariantType,
            p_method: *const c_char,
            p_hash: GDExtensionInt,
        ) -> GDExtensionPtrBuiltInMethod,
    >,

    // Strings.
    pub string_new_with_utf8_chars_and_len: Option<
        unsafe extern "C" fn(
            r_dest: GDExtensionUninitializedStringPtr,
            p_contents: *const c_char,
            p_size: GDExtensionInt,
        ),
    >,
    pub string_to_utf8_chars: Option<
        unsafe extern "C" fn(
            p_self: GDExtensionConstStringPtr,
            r_text: *mut c_char,
            p_max_write_length: GDExtensionInt,
        ) -> GDExtensionInt,
    >,

    // Container element access. Returned pointers are borrowed from the container.
    pub array_operator_index: Option<
        unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionVariantPtr,
    >,
    pub array_operator_index_const: Option<
        unsafe extern "C" fn(
            p_self: GDExtensionConstTypePtr,
            p_index: GDExtensionInt,
        ) -> GDExtensionVariantPtr,
    >,
    pub dictionary_operator_index: Option<
        unsafe extern "C" fn(
            p_self: GDExtensionTypePtr,
            p_key: GDExtensionConstVariantPtr,
        ) -> GDExtensionVariantPtr,
    >,
    pub dictionary_operator_index_const: Option<
        unsafe extern "C" fn(
            p_self: GDExtensionConstTypePtr,
            p_key: GDExtensionConstVariantPtr,
        ) -> GDExtensionVariantPtr,
    >,
    pub packed_byte_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut u8>,
    pub packed_byte_array_operator_index_const: Option<
        unsafe extern "C" fn(p_self: GDExtensionConstTypePtr, p_index: GDExtensionInt) -> *const u8,
    >,
    pub packed_int32_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut i32>,
    pub packed_int32_array_operator_index_const: Option<
        unsafe extern "C" fn(p_self: GDExtensionConstTypePtr, p_index: GDExtensionInt) -> *const i32,
    >,
    pub packed_int64_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut i64>,
    pub packed_int64_array_operator_index_const: Option<
        unsafe extern "C" fn(p_self: GDExtensionConstTypePtr, p_index: GDExtensionInt) -> *const i64,
    >,
    pub packed_float32_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut f32>,
    pub packed_float32_array_operator_index_const: Option<
        unsafe extern "C" fn(p_self: GDExtensionConstTypePtr, p_index: GDExtensionInt) -> *const f32,
    >,
    pub packed_float64_array_operator_index:
        Option<unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> *mut f64>,
    pub packed_float64_array_operator_index_const: Option<
        unsafe extern "C" fn(p_self: GDExtensionConstTypePtr, p_index: GDExtensionInt) -> *const f64,
    >,
    pub packed_string_array_operator_index: Option<
        unsafe extern "C" fn(p_self: GDExtensionTypePtr, p_index: GDExtensionInt) -> GDExtensionStringPtr,
    >,
    pub packed_string_array_operator_index_const: Option<
        unsafe extern "C" fn(
            p_self: GDExtensionConstTypePtr,
            p_index: GDExtensionInt,
        ) -> GDExtensionStringPtr,
    >,

    // Objects.
    pub object_method_bind_ptrcall: Option<
        unsafe extern "C" fn(
            p_method_bind: GDExtensionMethodBindPtr,
            p_instance: GDExtensionObjectPtr,
            p_args: *const GDExtensionConstTypePtr,
            r_ret: GDExtensionTypePtr,
        ),
    >,
    pub object_destroy: Option<unsafe extern "C" fn(p_o: GDExtensionObjectPtr)>,
    pub object_get_instance_id:
        Option<unsafe extern "C" fn(p_object: GDExtensionConstObjectPtr) -> GDObjectInstanceID>,
    pub object_get_instance_from_id:
        Option<unsafe extern "C" fn(p_instance_id: GDObjectInstanceID) -> GDExtensionObjectPtr>,
    pub object_get_class_name: Option<
        unsafe extern "C" fn(
            p_object: GDExtensionConstObjectPtr,
            p_library: GDExtensionClassLibraryPtr,
            r_class_name: GDExtensionUninitializedStringNamePtr,
        ) -> GDExtensionBool,
    >,
    pub object_cast_to: Option<
        unsafe extern "C" fn(
            p_object: GDExtensionConstObjectPtr,
            p_class_tag: *mut c_void,
        ) -> GDExtensionObjectPtr,
    >,
    pub object_set_instance: Option<
        unsafe extern "C" fn(
            p_o: GDExtensionObjectPtr,
            p_classname: *const c_char,
            p_instance: GDExtensionClassInstancePtr,
        ),
    >,

    // Class DB.
    pub classdb_construct_object:
        Option<unsafe extern "C" fn(p_classname: *const c_char) -> GDExtensionObjectPtr>,
    pub classdb_get_method_bind: Option<
        unsafe extern "C" fn(
            p_classname: *const c_char,
            p_methodname: *const c_char,
            p_hash: GDExtensionInt,
        ) -> GDExtensionMethodBindPtr,
    >,
    pub classdb_get_class_tag: Option<unsafe extern "C" fn(p_classname: *const c_char) -> *mut c_void>,
    pub classdb_register_extension_class: Option<
        unsafe extern "C" fn(
            p_library: GDExtensionClassLibraryPtr,
            p_class_name: *const c_char,
            p_parent_class_name: *const c_char,
            p_extension_funcs: *const GDExtensionClassCreationInfo,
        ),
    >,
    pub classdb_unregister_extension_class: Option<
        unsafe extern "C" fn(p_library: GDExtensionClassLibraryPtr, p_class_name: *const c_char),
    >,
}

impl std::fmt::Debug for GDExtensionInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GDExtensionInterface")
            .field("version_major", &self.version_major)
            .field("version_minor", &self.version_minor)
            .field("version_patch", &self.version_patch)
            .finish_non_exhaustive()
    }
}

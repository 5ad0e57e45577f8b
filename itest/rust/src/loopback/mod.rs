/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! In-process engine that implements the extension interface, so the bridge can be exercised without the real engine.
//!
//! It covers the classes and builtin methods that the bundled bindings declare: object lifetime with reference counts, a
//! small scene tree, metadata, native strings and containers, and extension classes with virtual dispatch. Everything the
//! extension prints through the interface is recorded, see [`take_log()`].

mod builtins;
mod classdb;
mod objects;
mod state;
mod variant;

use std::ffi::{c_char, c_void};

use gdbridge::sys;

pub use classdb::{call_virtual, is_class_registered};
pub use state::{live_native_count, live_object_count, take_errors, take_log, LogEntry, LogLevel};
pub use variant::variant_with_raw_type;

use state::record_log;

/// Stands in for the library pointer that the engine passes to the entry point.
static LIBRARY_TOKEN: u8 = 0;

/// Function table of the loopback engine.
pub fn interface() -> sys::GDExtensionInterface {
    use builtins as b;

    sys::GDExtensionInterface {
        version_major: 4,
        version_minor: 3,
        version_patch: 0,
        version_string: c"Loopback Engine v4.3.0".as_ptr(),

        print_error: Some(print_error),
        print_warning: Some(print_warning),

        variant_new_copy: Some(variant::variant_new_copy),
        variant_new_nil: Some(variant::variant_new_nil),
        variant_destroy: Some(variant::variant_destroy),
        variant_get_type: Some(variant::variant_get_type),
        variant_stringify: Some(variant::variant_stringify),
        get_variant_from_type_constructor: Some(variant::get_variant_from_type_constructor),
        get_variant_to_type_constructor: Some(variant::get_variant_to_type_constructor),
        variant_get_ptr_constructor: Some(variant::variant_get_ptr_constructor),
        variant_get_ptr_destructor: Some(variant::variant_get_ptr_destructor),
        variant_get_ptr_builtin_method: Some(b::variant_get_ptr_builtin_method),

        string_new_with_utf8_chars_and_len: Some(b::string_new_with_utf8_chars_and_len),
        string_to_utf8_chars: Some(b::string_to_utf8_chars),

        array_operator_index: Some(b::array_operator_index),
        array_operator_index_const: Some(b::array_operator_index_const),
        dictionary_operator_index: Some(b::dictionary_operator_index),
        dictionary_operator_index_const: Some(b::dictionary_operator_index_const),
        packed_byte_array_operator_index: Some(b::packed_byte_array_operator_index),
        packed_byte_array_operator_index_const: Some(b::packed_byte_array_operator_index_const),
        packed_int32_array_operator_index: Some(b::packed_int32_array_operator_index),
        packed_int32_array_operator_index_const: Some(b::packed_int32_array_operator_index_const),
        packed_int64_array_operator_index: Some(b::packed_int64_array_operator_index),
        packed_int64_array_operator_index_const: Some(b::packed_int64_array_operator_index_const),
        packed_float32_array_operator_index: Some(b::packed_float32_array_operator_index),
        packed_float32_array_operator_index_const: Some(b::packed_float32_array_operator_index_const),
        packed_float64_array_operator_index: Some(b::packed_float64_array_operator_index),
        packed_float64_array_operator_index_const: Some(b::packed_float64_array_operator_index_const),
        packed_string_array_operator_index: Some(b::packed_string_array_operator_index),
        packed_string_array_operator_index_const: Some(b::packed_string_array_operator_index_const),

        object_method_bind_ptrcall: Some(objects::object_method_bind_ptrcall),
        object_destroy: Some(objects::object_destroy),
        object_get_instance_id: Some(objects::object_get_instance_id),
        object_get_instance_from_id: Some(objects::object_get_instance_from_id),
        object_get_class_name: Some(classdb::object_get_class_name),
        object_cast_to: Some(classdb::object_cast_to),
        object_set_instance: Some(objects::object_set_instance),

        classdb_construct_object: Some(classdb::classdb_construct_object),
        classdb_get_method_bind: Some(classdb::classdb_get_method_bind),
        classdb_get_class_tag: Some(classdb::classdb_get_class_tag),
        classdb_register_extension_class: Some(classdb::classdb_register_extension_class),
        classdb_unregister_extension_class: Some(classdb::classdb_unregister_extension_class),
    }
}

unsafe extern "C" fn print_error(
    description: *const c_char,
    function: *const c_char,
    file: *const c_char,
    line: i32,
    _editor_notify: sys::GDExtensionBool,
) {
    record_log(log_entry(LogLevel::Error, description, function, file, line));
}

unsafe extern "C" fn print_warning(
    description: *const c_char,
    function: *const c_char,
    file: *const c_char,
    line: i32,
    _editor_notify: sys::GDExtensionBool,
) {
    record_log(log_entry(LogLevel::Warning, description, function, file, line));
}

unsafe fn log_entry(
    level: LogLevel,
    description: *const c_char,
    function: *const c_char,
    file: *const c_char,
    line: i32,
) -> LogEntry {
    let text = |ptr: *const c_char| {
        if ptr.is_null() {
            String::new()
        } else {
            sys::str_from_c(ptr).into_owned()
        }
    };

    LogEntry {
        level,
        message: text(description),
        function: text(function),
        file: text(file),
        line,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Loading

/// A library whose entry point accepted the loopback interface.
pub struct LoadedLibrary {
    init: sys::GDExtensionInitialization,
}

impl LoadedLibrary {
    /// Level at which the library registers its classes.
    pub fn min_level(&self) -> sys::GDExtensionInitializationLevel {
        self.init.minimum_initialization_level
    }

    /// Initializes the library from its minimum level up to the editor level.
    pub fn initialize_levels(&self) {
        let Some(initialize) = self.init.initialize else {
            return;
        };

        for level in self.min_level()..=sys::GDEXTENSION_INITIALIZATION_EDITOR {
            // SAFETY: the entry point provided the callback together with its userdata.
            unsafe { initialize(self.init.userdata, level) };
        }
    }

    /// Deinitializes the library from the editor level down to its minimum level.
    pub fn deinitialize_levels(&self) {
        let Some(deinitialize) = self.init.deinitialize else {
            return;
        };

        for level in (self.min_level()..=sys::GDEXTENSION_INITIALIZATION_EDITOR).rev() {
            // SAFETY: see `initialize_levels()`.
            unsafe { deinitialize(self.init.userdata, level) };
        }
    }
}

// SAFETY: the userdata is whatever the library passes back to its own callbacks; the loopback engine never dereferences it.
unsafe impl Send for LoadedLibrary {}
unsafe impl Sync for LoadedLibrary {}

/// Runs an extension entry point against the loopback interface.
///
/// Returns `None` if the entry point rejected the interface, e.g. because methods could not be resolved. The reason is in the
/// log.
///
/// # Safety
/// `entry` must be an extension entry point, typically generated by `gdextension_entry!`. A process loads at most one library.
pub unsafe fn load_library(
    entry: unsafe extern "C" fn(
        *const sys::GDExtensionInterface,
        sys::GDExtensionClassLibraryPtr,
        *mut sys::GDExtensionInitialization,
    ) -> sys::GDExtensionBool,
) -> Option<LoadedLibrary> {
    let interface = interface();
    let library = sys::force_mut_ptr(&LIBRARY_TOKEN as *const u8).cast::<c_void>();

    let mut init = sys::GDExtensionInitialization {
        minimum_initialization_level: sys::GDEXTENSION_INITIALIZATION_CORE,
        userdata: std::ptr::null_mut(),
        initialize: None,
        deinitialize: None,
    };

    let accepted = entry(&interface, library, &mut init);
    sys::bool_from_sys(accepted).then_some(LoadedLibrary { init })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_is_complete() {
        let interface = interface();
        assert!(interface.print_error.is_some());
        assert!(interface.classdb_unregister_extension_class.is_some());

        // SAFETY: static string.
        let version = unsafe { sys::str_from_c(interface.version_string) };
        assert_eq!(version, "Loopback Engine v4.3.0");
    }

    #[test]
    fn variant_converters_cover_all_types() {
        for &ty in sys::VariantType::ALL {
            // SAFETY: only queries function pointers.
            unsafe {
                assert!(variant::get_variant_from_type_constructor(ty.sys()).is_some(), "{ty:?}");
                assert!(variant::get_variant_to_type_constructor(ty.sys()).is_some(), "{ty:?}");
            }
        }
    }

    #[test]
    fn engine_class_hierarchy() {
        assert_eq!(classdb::engine_parent("Resource"), Some("RefCounted"));
        assert_eq!(classdb::engine_parent("Object"), None);
        assert!(classdb::is_engine_class("Node2D"));
        assert!(!classdb::is_engine_class("Sprite2D"));
    }
}

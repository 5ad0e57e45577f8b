/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Class hierarchy, extension class registration and virtual dispatch into the extension.

use std::ffi::{c_char, c_void};

use gdbridge::sys::{self, VariantType};

use super::builtins::{new_string, write_handle};
use super::objects::{create_object, engine_error, find_method};
use super::state::{engine, ExtensionClass};

/// Engine classes with their parent.
static ENGINE_CLASSES: &[(&str, Option<&str>)] = &[
    ("Object", None),
    ("RefCounted", Some("Object")),
    ("Resource", Some("RefCounted")),
    ("Node", Some("Object")),
    ("Node2D", Some("Node")),
];

pub(super) fn engine_parent(class: &str) -> Option<&'static str> {
    ENGINE_CLASSES
        .iter()
        .find(|(name, _)| *name == class)
        .and_then(|&(_, parent)| parent)
}

pub(super) fn is_engine_class(class: &str) -> bool {
    ENGINE_CLASSES.iter().any(|(name, _)| *name == class)
}

fn engine_class_name(class: &str) -> Option<&'static str> {
    ENGINE_CLASSES.iter().map(|&(name, _)| name).find(|&name| name == class)
}

fn leak_str(s: &str) -> &'static str {
    Box::leak(s.to_string().into_boxed_str())
}

/// Creates an object of an engine or extension class. Returns null for unknown classes or failed constructors.
pub(super) fn construct(class: &str) -> sys::GDExtensionObjectPtr {
    let extension = engine().extension_classes.get(class).copied();

    if let Some(extension) = extension {
        return match extension.create_instance {
            // SAFETY: the callback was registered for this class, and runs without engine locks held.
            Some(create_instance) => unsafe { create_instance(extension.userdata as *mut c_void) },
            None => std::ptr::null_mut(),
        };
    }

    match engine_class_name(class) {
        Some(engine_class) => create_object(engine_class),
        None => {
            engine_error("ClassDB::instantiate", format!("class `{class}` does not exist"));
            std::ptr::null_mut()
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions

pub(super) unsafe extern "C" fn classdb_construct_object(class_name: *const c_char) -> sys::GDExtensionObjectPtr {
    let class = sys::str_from_c(class_name);
    construct(&class)
}

/// Null if the class has no such method, or the hash does not match.
pub(super) unsafe extern "C" fn classdb_get_method_bind(
    class_name: *const c_char,
    method_name: *const c_char,
    hash: sys::GDExtensionInt,
) -> sys::GDExtensionMethodBindPtr {
    let class = sys::str_from_c(class_name);
    let method = sys::str_from_c(method_name);

    match find_method(&class, &method, hash) {
        Some(entry) => (entry as *const super::objects::ClassMethod).cast(),
        None => std::ptr::null(),
    }
}

/// The tag is the address of the leaked class name. Unknown classes give null.
pub(super) unsafe extern "C" fn classdb_get_class_tag(class_name: *const c_char) -> *mut c_void {
    let class = sys::str_from_c(class_name);

    let mut engine = engine();
    if !engine.class_exists(&class) {
        return std::ptr::null_mut();
    }

    if let Some(&tag) = engine.class_tags.get(class.as_ref()) {
        return tag as *mut c_void;
    }

    let name = leak_str(&class);
    let tag = Box::into_raw(Box::new(name)) as usize;
    engine.class_tags.insert(name, tag);
    tag as *mut c_void
}

pub(super) unsafe extern "C" fn object_cast_to(
    obj: sys::GDExtensionConstObjectPtr,
    class_tag: *mut c_void,
) -> sys::GDExtensionObjectPtr {
    if class_tag.is_null() {
        return std::ptr::null_mut();
    }

    let target: &str = *class_tag.cast::<&'static str>();

    let engine = engine();
    match engine.find_ptr(obj) {
        Some(state) if engine.inherits(state.class_name(), target) => state.obj_ptr(),
        _ => std::ptr::null_mut(),
    }
}

pub(super) unsafe extern "C" fn object_get_class_name(
    obj: sys::GDExtensionConstObjectPtr,
    _library: sys::GDExtensionClassLibraryPtr,
    r_class_name: sys::GDExtensionUninitializedStringNamePtr,
) -> sys::GDExtensionBool {
    let class = engine().find_ptr(obj).map(|state| state.class_name().to_string());

    match class {
        Some(class) => {
            write_handle(r_class_name, VariantType::StringName, new_string(class));
            sys::SYS_TRUE
        }
        None => sys::SYS_FALSE,
    }
}

pub(super) unsafe extern "C" fn classdb_register_extension_class(
    _library: sys::GDExtensionClassLibraryPtr,
    class_name: *const c_char,
    parent_class_name: *const c_char,
    info: *const sys::GDExtensionClassCreationInfo,
) {
    let class = sys::str_from_c(class_name);
    let parent = sys::str_from_c(parent_class_name);
    let info = &*info;

    let mut engine = engine();
    if engine.class_exists(&class) {
        drop(engine);
        engine_error("ClassDB::register_extension_class", format!("class `{class}` is already registered"));
        return;
    }
    if !engine.class_exists(&parent) {
        drop(engine);
        engine_error("ClassDB::register_extension_class", format!("parent class `{parent}` of `{class}` does not exist"));
        return;
    }

    let extension = ExtensionClass {
        parent: leak_str(&parent),
        create_instance: info.create_instance_func,
        free_instance: info.free_instance_func,
        get_virtual_call_data: info.get_virtual_call_data_func,
        call_virtual_with_data: info.call_virtual_with_data_func,
        userdata: info.class_userdata as usize,
    };
    engine.extension_classes.insert(leak_str(&class), extension);
}

pub(super) unsafe extern "C" fn classdb_unregister_extension_class(
    _library: sys::GDExtensionClassLibraryPtr,
    class_name: *const c_char,
) {
    let class = sys::str_from_c(class_name);

    let mut engine = engine();
    if engine.extension_classes.remove(class.as_ref()).is_none() {
        drop(engine);
        engine_error("ClassDB::unregister_extension_class", format!("class `{class}` is not registered"));
        return;
    }

    // Cached call data points into the class userdata, which the extension frees now.
    engine.virtual_cache.retain(|(cached_class, _), _| cached_class.as_str() != class.as_ref());
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Virtual dispatch

/// Whether an extension class is registered under `class`.
pub fn is_class_registered(class: &str) -> bool {
    engine().extension_classes.contains_key(class)
}

/// Calls the override of virtual method `method` on `obj`.
///
/// Returns `false` without calling anything if `obj` is not an extension instance, or its class does not override `method`.
/// Call data is requested once per class and method, and cached.
///
/// # Safety
/// `args` must point to values of the types that the virtual method declares, and `ret` to a slot of its return type (or null
/// for methods without return value).
pub unsafe fn call_virtual(
    obj: sys::GDExtensionObjectPtr,
    method: &str,
    args: &[sys::GDExtensionConstTypePtr],
    ret: sys::GDExtensionTypePtr,
) -> bool {
    let found = {
        let engine = engine();
        engine.find_ptr(obj).and_then(|state| {
            let (class, instance) = state.extension.clone()?;
            let extension = engine.extension_classes.get(class.as_str()).copied()?;
            let cached = engine.virtual_cache.get(&(class.clone(), method.to_string())).copied();
            Some((class, instance, extension, cached))
        })
    };

    let Some((class, instance, extension, cached)) = found else {
        return false;
    };

    let method_c = sys::c_string(method);

    let call_data = match cached {
        Some(call_data) => call_data,
        None => {
            let call_data = match extension.get_virtual_call_data {
                Some(get_data) => get_data(extension.userdata as *mut c_void, method_c.as_ptr()) as usize,
                None => 0,
            };
            engine().virtual_cache.insert((class, method.to_string()), call_data);
            call_data
        }
    };

    let Some(call_with_data) = extension.call_virtual_with_data else {
        return false;
    };
    if call_data == 0 {
        return false;
    }

    // Methods without return value still get a valid slot.
    let mut unused_ret = [0_u64; 3];
    let ret = if ret.is_null() {
        unused_ret.as_mut_ptr().cast()
    } else {
        ret
    };

    call_with_data(
        instance as *mut c_void,
        method_c.as_ptr(),
        call_data as *mut c_void,
        args.as_ptr(),
        ret,
    );
    true
}

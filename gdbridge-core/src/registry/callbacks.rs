/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Callbacks that are passed as function pointers to the engine upon class registration.
//!
//! Re-exported to `crate::private`.
#![allow(clippy::missing_safety_doc)]

use std::ffi::{c_char, c_void};
use std::panic::AssertUnwindSafe;

use sys::{interface_fn, out};

use crate::global::godot_error;
use crate::meta::CallContext;
use crate::obj::{Base, GodotClass, UserClass};
use crate::private::handle_panic;
use crate::registry::{ClassData, InstanceStorage, VirtualEntry};
use crate::sys;

/// Engine constructor of a user class: creates the native base object, then the Rust instance.
///
/// If the `init()` constructor panics, the base object is destroyed again and null is returned.
pub unsafe extern "C" fn create_instance<T: UserClass>(_class_userdata: *mut c_void) -> sys::GDExtensionObjectPtr {
    create_custom::<T>().unwrap_or(std::ptr::null_mut())
}

fn create_custom<T: UserClass>() -> Result<sys::GDExtensionObjectPtr, String> {
    let base_class_name = sys::c_string(T::Base::CLASS_NAME);

    // SAFETY: valid class name; the base of a registered class exists.
    let base_ptr = unsafe { interface_fn!(classdb_construct_object)(base_class_name.as_ptr()) };
    if base_ptr.is_null() {
        godot_error!("failed to construct base `{}` of class `{}`", T::Base::CLASS_NAME, T::CLASS_NAME);
        return Err(format!("no base object for {}", T::CLASS_NAME));
    }

    // SAFETY: `base_ptr` was just created; the user instance is stored inside it and cannot outlive it.
    let base = unsafe { Base::<T::Base>::from_sys(base_ptr) };
    let instance_id = base.instance_id();

    // User constructor init() can panic, which crashes the engine if unhandled.
    let context = || format!("panic during {}::init() constructor", T::CLASS_NAME);
    let user_instance = match handle_panic(context, AssertUnwindSafe(|| T::init(base))) {
        Ok(user_instance) => user_instance,
        Err(payload) => {
            // Creation of extension object failed; we must now also destroy the base object to avoid leak.
            // SAFETY: `base_ptr` was just created above and not handed out.
            unsafe { interface_fn!(object_destroy)(base_ptr) };
            return Err(payload);
        }
    };

    let storage = Box::into_raw(Box::new(InstanceStorage::construct(user_instance, instance_id)));
    InstanceStorage::<T>::register(storage);

    let class_name = sys::c_string(T::CLASS_NAME);

    // SAFETY: the engine takes the instance pointer and hands it back in `free_instance` and virtual calls.
    unsafe { interface_fn!(object_set_instance)(base_ptr, class_name.as_ptr(), storage.cast()) };

    out!("create instance:  {} ({instance_id})", T::CLASS_NAME);
    Ok(base_ptr)
}

/// Engine destructor of a user class: drops the Rust instance. The engine destroys the base object itself.
pub unsafe extern "C" fn free_instance<T: UserClass>(
    _class_userdata: *mut c_void,
    instance: sys::GDExtensionClassInstancePtr,
) {
    if instance.is_null() {
        return;
    }

    let storage = Box::from_raw(instance.cast::<InstanceStorage<T>>());
    let instance_id = storage.instance_id();
    out!("free instance:    {} ({instance_id})", T::CLASS_NAME);

    InstanceStorage::<T>::unregister(instance_id);

    // Dropping user fields may run user code (`Drop` impls, `Gd` releases).
    let context = || format!("panic while dropping {} (instance {instance_id})", T::CLASS_NAME);
    let _ = handle_panic(context, AssertUnwindSafe(move || drop(storage)));
}

/// Returns the override entry for the virtual method `name`, or null if `T` does not override it.
///
/// The engine calls this once per (class, method) and caches the result; null makes it fall back to the base implementation.
pub unsafe extern "C" fn get_virtual_call_data<T: UserClass>(
    class_userdata: *mut c_void,
    name: *const c_char,
) -> *mut c_void {
    if class_userdata.is_null() {
        return std::ptr::null_mut();
    }

    let class_data = &*class_userdata.cast::<ClassData<T>>();
    let method_name = sys::str_from_c(name);

    match class_data.find_virtual(&method_name) {
        Some(entry) => sys::force_mut_ptr(entry as *const VirtualEntry<T>).cast(),
        None => std::ptr::null_mut(),
    }
}

/// Calls an override of a virtual method.
///
/// Decodes the arguments, binds the Rust instance mutably, runs the override and encodes its return value into `ret`.
/// On failure (panic, argument conversion, instance already bound), an error is printed and `ret` keeps the value the engine
/// initialized it with.
pub unsafe extern "C" fn call_virtual_with_data<T: UserClass>(
    instance: sys::GDExtensionClassInstancePtr,
    _name: *const c_char,
    virtual_call_userdata: *mut c_void,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
) {
    if instance.is_null() || virtual_call_userdata.is_null() {
        godot_error!("virtual call on {} without instance or call data", T::CLASS_NAME);
        return;
    }

    let storage = &*instance.cast::<InstanceStorage<T>>();
    let entry = &*virtual_call_userdata.cast::<VirtualEntry<T>>();
    let call_ctx = CallContext::func(T::CLASS_NAME, entry.method_name());

    let outcome = handle_panic(
        || &call_ctx,
        AssertUnwindSafe(|| {
            let mut guard = storage.get_mut();
            entry.call(&mut guard, args, ret, &call_ctx)
        }),
    );

    match outcome {
        Ok(Ok(())) => {}

        // Call error signalled by conversion of arguments.
        Ok(Err(err)) => godot_error!("{err}"),

        // Panic was already reported by handle_panic().
        Err(_panic_msg) => {}
    }
}

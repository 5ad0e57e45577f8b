/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Object lifetime, reference counts and the class methods that the engine exposes through method binds.

use std::ffi::{c_char, c_void};

use gdbridge::builtin::Vector2;
use gdbridge::sys::{self, VariantType};

use super::builtins::{assign_handle, new_string, string_ref};
use super::classdb::{call_virtual, construct};
use super::state::{
    engine, header_id, record_log, LogEntry, LogLevel, ObjectHeader, ObjectState, RefCount, REF_COUNTED_BIT,
};
use super::variant::{copy_cell, destroy_cell, VariantCell};

/// `NOTIFICATION_PREDELETE`, sent to extension instances right before they are freed.
const NOTIFICATION_PREDELETE: i64 = 1;

pub(super) fn engine_error(function: &str, message: impl Into<String>) {
    record_log(LogEntry {
        level: LogLevel::Error,
        message: message.into(),
        function: function.to_string(),
        file: file!().to_string(),
        line: 0,
    });
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Lifetime

/// Allocates an object of an engine class. Ref-counted objects start with one pending reference.
pub(super) fn create_object(engine_class: &'static str) -> sys::GDExtensionObjectPtr {
    let mut engine = engine();
    let ref_counted = engine.inherits(engine_class, "RefCounted");
    let id = engine.next_instance_id(ref_counted);

    let header: &'static mut ObjectHeader = Box::leak(Box::new(ObjectHeader { id }));
    let ptr = header as *mut ObjectHeader as usize;

    let name = if engine.inherits(engine_class, "Node") {
        engine_class.to_string()
    } else {
        String::new()
    };

    engine.objects.insert(
        id,
        ObjectState {
            ptr,
            engine_class,
            extension: None,
            refcount: ref_counted.then_some(RefCount {
                count: 1,
                init_pending: true,
            }),
            parent: None,
            children: Vec::new(),
            meta: Vec::new(),
            name,
            position: Vector2::ZERO,
            rotation: 0.0,
            ready: false,
        },
    );

    ptr as sys::GDExtensionObjectPtr
}

/// Destroys an object and, recursively, its children.
///
/// Extension instances receive `NOTIFICATION_PREDELETE` first, then are freed through their class. No lock is held while
/// extension code runs.
pub(super) fn destroy_object(id: u64) {
    let (ptr, has_extension, parent) = {
        let engine = engine();
        match engine.objects.get(&id) {
            Some(state) => (state.obj_ptr(), state.extension.is_some(), state.parent),
            None => {
                engine_error("object_destroy", format!("object {id:#x} is not alive"));
                return;
            }
        }
    };

    if has_extension {
        let what = NOTIFICATION_PREDELETE;
        let args = [(&what as *const i64).cast::<c_void>()];
        // SAFETY: `ptr` is live; `_notification` takes one int.
        unsafe { call_virtual(ptr, "_notification", &args, std::ptr::null_mut()) };
    }

    let children = {
        let mut engine = engine();
        if let Some(parent) = parent.and_then(|parent| engine.objects.get_mut(&parent)) {
            parent.children.retain(|&(child, _)| child != id);
        }

        match engine.objects.get_mut(&id) {
            Some(state) => std::mem::take(&mut state.children),
            None => return,
        }
    };

    for (child, _) in children {
        if let Some(state) = engine().objects.get_mut(&child) {
            state.parent = None;
        }
        destroy_object(child);
    }

    let extension = {
        let engine = engine();
        engine
            .objects
            .get(&id)
            .and_then(|state| state.extension.clone())
            .and_then(|(class, instance)| {
                let class = engine.extension_classes.get(class.as_str()).copied()?;
                Some((class, instance))
            })
    };

    if let Some((class, instance)) = extension {
        if let Some(free_instance) = class.free_instance {
            // SAFETY: the instance was handed over in `object_set_instance` and is freed exactly once, here.
            unsafe { free_instance(class.userdata as *mut c_void, instance as *mut c_void) };
        }
    }

    let removed = engine().objects.remove(&id);
    if let Some(state) = removed {
        for (_, cell) in state.meta {
            // SAFETY: meta values are owned by the object.
            unsafe { destroy_cell(cell) };
        }
    }
}

/// Adds a reference to a ref-counted object, if it is alive.
pub(super) fn add_reference(id: u64) {
    if id & REF_COUNTED_BIT == 0 {
        return;
    }

    if let Some(refcount) = engine().objects.get_mut(&id).and_then(|state| state.refcount.as_mut()) {
        refcount.count += 1;
    }
}

/// Drops a reference held by the engine, destroying the object with the last one.
pub(super) fn drop_reference(id: u64) {
    if id & REF_COUNTED_BIT == 0 {
        return;
    }

    let last = match engine().objects.get_mut(&id).and_then(|state| state.refcount.as_mut()) {
        Some(refcount) => {
            refcount.count -= 1;
            refcount.count <= 0
        }
        None => false,
    };

    if last {
        destroy_object(id);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions

pub(super) unsafe extern "C" fn object_destroy(obj: sys::GDExtensionObjectPtr) {
    match header_id(obj) {
        Some(id) => destroy_object(id),
        None => engine_error("object_destroy", "null object"),
    }
}

pub(super) unsafe extern "C" fn object_get_instance_id(obj: sys::GDExtensionConstObjectPtr) -> sys::GDObjectInstanceID {
    header_id(obj).unwrap_or(0)
}

pub(super) unsafe extern "C" fn object_get_instance_from_id(id: sys::GDObjectInstanceID) -> sys::GDExtensionObjectPtr {
    engine()
        .objects
        .get(&id)
        .map_or(std::ptr::null_mut(), ObjectState::obj_ptr)
}

pub(super) unsafe extern "C" fn object_set_instance(
    obj: sys::GDExtensionObjectPtr,
    class_name: *const c_char,
    instance: sys::GDExtensionClassInstancePtr,
) {
    let class_name = sys::str_from_c(class_name).into_owned();

    let mut engine = engine();
    let Some(state) = engine.find_ptr_mut(obj) else {
        engine_error("object_set_instance", format!("no live object for instance of `{class_name}`"));
        return;
    };

    if state.name == state.engine_class {
        state.name = class_name.clone();
    }
    state.extension = Some((class_name, instance as usize));
}

pub(super) unsafe extern "C" fn object_method_bind_ptrcall(
    method_bind: sys::GDExtensionMethodBindPtr,
    obj: sys::GDExtensionObjectPtr,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
) {
    let method = &*method_bind.cast::<ClassMethod>();

    let alive = engine().find_ptr(obj).is_some();
    let Some(id) = header_id(obj).filter(|_| alive) else {
        engine_error(
            "object_method_bind_ptrcall",
            format!("{}::{} called on a dead object", method.class, method.name),
        );
        return;
    };

    (method.call)(Call { obj, id, args, ret });
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Class methods

/// Receiver, arguments and return slot of one method call.
struct Call {
    obj: sys::GDExtensionObjectPtr,
    id: u64,
    args: *const sys::GDExtensionConstTypePtr,
    ret: sys::GDExtensionTypePtr,
}

impl Call {
    unsafe fn arg<T: Copy>(&self, index: usize) -> T {
        *(*self.args.add(index)).cast::<T>()
    }

    unsafe fn arg_string(&self, index: usize) -> String {
        string_ref(self.arg::<usize>(index)).clone()
    }

    unsafe fn arg_cell(&self, index: usize) -> &VariantCell {
        &*(*self.args.add(index)).cast::<VariantCell>()
    }

    unsafe fn ret<T>(&self, value: T) {
        std::ptr::write(self.ret.cast::<T>(), value);
    }

    /// Assigns a variant, destroying the one the slot held.
    unsafe fn ret_cell(&self, value: VariantCell) {
        let old = std::ptr::replace(self.ret.cast::<VariantCell>(), value);
        destroy_cell(old);
    }

    unsafe fn ret_bool(&self, value: bool) {
        self.ret(sys::bool_to_sys(value));
    }

    unsafe fn ret_string(&self, ty: VariantType, text: String) {
        assign_handle(self.ret, ty, new_string(text));
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ObjectState) -> R) -> Option<R> {
        engine().objects.get_mut(&self.id).map(f)
    }
}

pub(super) struct ClassMethod {
    pub class: &'static str,
    pub name: &'static str,
    pub hash: i64,
    call: unsafe fn(Call),
}

macro_rules! methods {
    ($( $class:literal :: $name:ident ($hash:literal) => $call:expr; )*) => {
        pub(super) static CLASS_METHODS: &[ClassMethod] = &[
            $( ClassMethod { class: $class, name: stringify!($name), hash: $hash, call: $call }, )*
        ];
    };
}

methods! {
    "Object"::get_class(201670096) => object_get_class;
    "Object"::is_class(3927539163) => object_is_class;
    "Object"::set_meta(3776071444) => object_set_meta;
    "Object"::get_meta(3990617847) => object_get_meta;
    "Object"::has_meta(2619796661) => object_has_meta;
    "Object"::loopback_check(1001) => object_loopback_check;
    "RefCounted"::init_ref(2240911060) => ref_counted_init_ref;
    "RefCounted"::reference(2240911060) => ref_counted_reference;
    "RefCounted"::unreference(2240911060) => ref_counted_unreference;
    "RefCounted"::get_reference_count(3905245786) => ref_counted_get_reference_count;
    "Resource"::set_name(83702148) => resource_set_name;
    "Resource"::get_name(201670096) => resource_get_name;
    "Resource"::duplicate(482882304) => resource_duplicate;
    "Node"::get_name(2002593661) => node_get_name;
    "Node"::add_child(3863233950) => node_add_child;
    "Node"::remove_child(1078189570) => node_remove_child;
    "Node"::get_child_count(894402480) => node_get_child_count;
    "Node"::get_child(541253412) => node_get_child;
    "Node"::get_parent(3160264692) => node_get_parent;
    "Node2D"::set_position(743155724) => node2d_set_position;
    "Node2D"::get_position(3341600327) => node2d_get_position;
    "Node2D"::set_rotation(373806689) => node2d_set_rotation;
    "Node2D"::get_rotation(1740695150) => node2d_get_rotation;
    "Node2D"::rotate(373806689) => node2d_rotate;
}

unsafe fn object_get_class(call: Call) {
    let class = call.with_state(|state| state.class_name().to_string()).unwrap_or_default();
    call.ret_string(VariantType::String, class);
}

unsafe fn object_is_class(call: Call) {
    let base = call.arg_string(0);

    let engine = engine();
    let is = engine
        .objects
        .get(&call.id)
        .is_some_and(|state| engine.inherits(state.class_name(), &base));
    drop(engine);

    call.ret_bool(is);
}

/// Setting `null` removes the entry.
unsafe fn object_set_meta(call: Call) {
    let name = call.arg_string(0);
    let value = call.arg_cell(1);
    let new = if value.ty() == VariantType::Nil {
        None
    } else {
        Some(copy_cell(value))
    };

    let old = call
        .with_state(|state| {
            let index = state.meta.iter().position(|(key, _)| *key == name);
            match (index, new) {
                (Some(index), Some(new)) => Some(std::mem::replace(&mut state.meta[index].1, new)),
                (Some(index), None) => Some(state.meta.remove(index).1),
                (None, Some(new)) => {
                    state.meta.push((name, new));
                    None
                }
                (None, None) => None,
            }
        })
        .flatten();

    if let Some(old) = old {
        destroy_cell(old);
    }
}

unsafe fn object_get_meta(call: Call) {
    let name = call.arg_string(0);
    let found = call
        .with_state(|state| state.meta.iter().find(|(key, _)| *key == name).map(|(_, cell)| *cell))
        .flatten();

    // Copied outside the lock: copying an object value takes it.
    let value = match found {
        Some(cell) => copy_cell(&cell),
        None => copy_cell(call.arg_cell(1)),
    };
    call.ret_cell(value);
}

unsafe fn object_has_meta(call: Call) {
    let name = call.arg_string(0);
    let found = call.with_state(|state| state.meta.iter().any(|(key, _)| *key == name));
    call.ret_bool(found.unwrap_or(false));
}

/// Test hook: accepts exactly `(42, "hello")`.
unsafe fn object_loopback_check(call: Call) {
    let value = call.arg::<i64>(0);
    let text = call.arg_string(1);
    call.ret_bool(value == 42 && text == "hello");
}

unsafe fn ref_counted_init_ref(call: Call) {
    let first = call
        .with_state(|state| match state.refcount.as_mut() {
            Some(refcount) if refcount.init_pending => {
                refcount.init_pending = false;
                true
            }
            Some(refcount) => {
                refcount.count += 1;
                false
            }
            None => false,
        })
        .unwrap_or(false);
    call.ret_bool(first);
}

unsafe fn ref_counted_reference(call: Call) {
    let ok = call
        .with_state(|state| match state.refcount.as_mut() {
            Some(refcount) => {
                refcount.count += 1;
                true
            }
            None => false,
        })
        .unwrap_or(false);
    call.ret_bool(ok);
}

/// Returns whether the last reference was dropped. The caller destroys the object then.
unsafe fn ref_counted_unreference(call: Call) {
    let last = call
        .with_state(|state| match state.refcount.as_mut() {
            Some(refcount) => {
                refcount.count -= 1;
                refcount.count <= 0
            }
            None => false,
        })
        .unwrap_or(false);
    call.ret_bool(last);
}

unsafe fn ref_counted_get_reference_count(call: Call) {
    let count = call
        .with_state(|state| state.refcount.as_ref().map_or(0, |refcount| refcount.count))
        .unwrap_or(0);
    call.ret(count);
}

unsafe fn resource_set_name(call: Call) {
    let name = call.arg_string(0);
    call.with_state(|state| state.name = name);
}

unsafe fn resource_get_name(call: Call) {
    let name = call.with_state(|state| state.name.clone()).unwrap_or_default();
    call.ret_string(VariantType::String, name);
}

/// Creates a fresh object of the same class, with the same name. Metadata and instance fields are not copied.
unsafe fn resource_duplicate(call: Call) {
    let Some((class, name)) = call.with_state(|state| (state.class_name().to_string(), state.name.clone())) else {
        call.ret(0_usize);
        return;
    };

    let copy = construct(&class);
    if let Some(state) = engine().find_ptr_mut(copy) {
        state.name = name;
    }
    call.ret(copy as usize);
}

unsafe fn node_get_name(call: Call) {
    let name = call.with_state(|state| state.name.clone()).unwrap_or_default();
    call.ret_string(VariantType::StringName, name);
}

unsafe fn node_add_child(call: Call) {
    let child_ptr = call.arg::<usize>(0) as sys::GDExtensionObjectPtr;
    let internal = call.arg::<i64>(2);

    let mut engine = engine();
    let parent_name = engine.objects.get(&call.id).map(|state| state.name.clone()).unwrap_or_default();

    let child = match engine.find_ptr(child_ptr) {
        None => Err("add_child: child is null or freed".to_string()),
        Some(child) if child.ptr == call.obj as usize => Err(format!("add_child: can't add `{parent_name}` as a child of itself")),
        Some(child) if child.parent.is_some() => Err(format!(
            "Can't add child '{}' to '{parent_name}', already has a parent.",
            child.name
        )),
        Some(child) if !engine.inherits(child.engine_class, "Node") => Err("add_child: child is not a Node".to_string()),
        Some(child) => Ok((header_id(child_ptr).unwrap_or(0), child.extension.is_some(), child.ready)),
    };

    let (child_id, has_extension, ready) = match child {
        Ok(child) => child,
        Err(message) => {
            drop(engine);
            engine_error("Node::add_child", message);
            return;
        }
    };

    if let Some(parent) = engine.objects.get_mut(&call.id) {
        let position = match internal {
            1 => parent.children.iter().take_while(|&&(_, mode)| mode == 1).count(),
            2 => parent.children.len(),
            _ => parent.children.iter().take_while(|&&(_, mode)| mode != 2).count(),
        };
        parent.children.insert(position, (child_id, internal));
    }
    if let Some(child) = engine.objects.get_mut(&child_id) {
        child.parent = Some(call.id);
        child.ready = true;
    }
    drop(engine);

    if has_extension {
        call_virtual(child_ptr, "_enter_tree", &[], std::ptr::null_mut());
        if !ready {
            call_virtual(child_ptr, "_ready", &[], std::ptr::null_mut());
        }
    }
}

unsafe fn node_remove_child(call: Call) {
    let child_ptr = call.arg::<usize>(0) as sys::GDExtensionObjectPtr;

    let mut engine = engine();
    let child = engine
        .find_ptr(child_ptr)
        .filter(|child| child.parent == Some(call.id))
        .map(|child| (header_id(child_ptr).unwrap_or(0), child.extension.is_some()));

    let Some((child_id, has_extension)) = child else {
        drop(engine);
        engine_error("Node::remove_child", "remove_child: node is not a child of this node");
        return;
    };

    drop(engine);
    if has_extension {
        call_virtual(child_ptr, "_exit_tree", &[], std::ptr::null_mut());
    }

    let mut engine = super::state::engine();
    if let Some(parent) = engine.objects.get_mut(&call.id) {
        parent.children.retain(|&(id, _)| id != child_id);
    }
    if let Some(child) = engine.objects.get_mut(&child_id) {
        child.parent = None;
    }
}

fn visible_children(state: &ObjectState, include_internal: bool) -> Vec<u64> {
    state
        .children
        .iter()
        .filter(|&&(_, mode)| include_internal || mode == 0)
        .map(|&(id, _)| id)
        .collect()
}

unsafe fn node_get_child_count(call: Call) {
    let include_internal = call.arg::<u8>(0) != 0;
    let count = call
        .with_state(|state| visible_children(state, include_internal).len())
        .unwrap_or(0);
    call.ret(sys::usize_to_int(count));
}

/// Negative indices count from the end. Out of range gives null.
unsafe fn node_get_child(call: Call) {
    let index = call.arg::<i64>(0);
    let include_internal = call.arg::<u8>(1) != 0;

    let engine = engine();
    let children = engine
        .objects
        .get(&call.id)
        .map(|state| visible_children(state, include_internal))
        .unwrap_or_default();

    let len = sys::usize_to_int(children.len());
    let index = if index < 0 { index + len } else { index };
    let child = usize::try_from(index)
        .ok()
        .and_then(|index| children.get(index))
        .and_then(|id| engine.objects.get(id))
        .map_or(0, |state| state.ptr);
    drop(engine);

    call.ret(child);
}

unsafe fn node_get_parent(call: Call) {
    let engine = engine();
    let parent = engine
        .objects
        .get(&call.id)
        .and_then(|state| state.parent)
        .and_then(|parent| engine.objects.get(&parent))
        .map_or(0, |state| state.ptr);
    drop(engine);

    call.ret(parent);
}

unsafe fn node2d_set_position(call: Call) {
    let position = call.arg::<Vector2>(0);
    call.with_state(|state| state.position = position);
}

unsafe fn node2d_get_position(call: Call) {
    let position = call.with_state(|state| state.position).unwrap_or(Vector2::ZERO);
    call.ret(position);
}

unsafe fn node2d_set_rotation(call: Call) {
    let radians = call.arg::<f64>(0);
    call.with_state(|state| state.rotation = radians);
}

unsafe fn node2d_get_rotation(call: Call) {
    let rotation = call.with_state(|state| state.rotation).unwrap_or(0.0);
    call.ret(rotation);
}

unsafe fn node2d_rotate(call: Call) {
    let radians = call.arg::<f64>(0);
    call.with_state(|state| state.rotation += radians);
}

/// Finds the bind of `class::method` with the given hash. Methods of base classes are found on derived classes.
pub(super) fn find_method(class: &str, method: &str, hash: i64) -> Option<&'static ClassMethod> {
    let engine = engine();
    CLASS_METHODS
        .iter()
        .find(|entry| entry.name == method && entry.hash == hash && engine.inherits(class, entry.class))
}

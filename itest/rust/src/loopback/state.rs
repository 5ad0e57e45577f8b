/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine-side bookkeeping: objects, extension classes, log and allocation counters.
//!
//! The state lives behind one lock. The lock is never held while calling back into the extension (create/free instance,
//! virtual calls) or while destroying values that may hold the last reference to an object.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicIsize, Ordering};

use gdbridge::builtin::Vector2;
use gdbridge::sys::{self, Global, GlobalGuard};

use super::variant::VariantCell;

pub(super) static ENGINE: Global<EngineState> = Global::default();
static LOG: Global<Vec<LogEntry>> = Global::default();

/// Native values (strings, containers, boxed payloads) currently allocated by the engine.
static NATIVE_LIVE: AtomicIsize = AtomicIsize::new(0);

/// Bit set in the instance IDs of ref-counted objects.
pub(super) const REF_COUNTED_BIT: u64 = 1 << 63;

pub(super) fn engine() -> GlobalGuard<'static, EngineState> {
    ENGINE.lock()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Objects

/// Memory behind an object pointer. Never freed, so a stale pointer still yields its instance ID.
#[repr(C)]
pub(super) struct ObjectHeader {
    pub id: u64,
}

pub(super) struct RefCount {
    pub count: i64,

    /// Set for fresh objects; the first `init_ref` adopts the initial reference instead of adding one.
    pub init_pending: bool,
}

pub(super) struct ObjectState {
    pub ptr: usize,

    /// Most derived engine class.
    pub engine_class: &'static str,

    /// Extension class and its instance pointer, once `object_set_instance` ran.
    pub extension: Option<(String, usize)>,

    pub refcount: Option<RefCount>,
    pub parent: Option<u64>,

    /// Child IDs with their internal mode (0 regular, 1 front, 2 back).
    pub children: Vec<(u64, i64)>,

    pub meta: Vec<(String, VariantCell)>,
    pub name: String,
    pub position: Vector2,
    pub rotation: f64,

    /// Set when `_ready` was dispatched; it runs once per object.
    pub ready: bool,
}

impl ObjectState {
    /// Name reported by `get_class`: the extension class if there is one.
    pub fn class_name(&self) -> &str {
        match &self.extension {
            Some((class, _)) => class,
            None => self.engine_class,
        }
    }

    pub fn obj_ptr(&self) -> *mut c_void {
        self.ptr as *mut c_void
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Extension classes

/// Copy of the creation info of a registered extension class.
#[derive(Copy, Clone)]
pub(super) struct ExtensionClass {
    pub parent: &'static str,
    pub create_instance: sys::GDExtensionClassCreateInstance,
    pub free_instance: sys::GDExtensionClassFreeInstance,
    pub get_virtual_call_data: sys::GDExtensionClassGetVirtualCallData,
    pub call_virtual_with_data: sys::GDExtensionClassCallVirtualWithData,
    pub userdata: usize,
}

#[derive(Default)]
pub(super) struct EngineState {
    pub objects: HashMap<u64, ObjectState>,
    pub extension_classes: HashMap<&'static str, ExtensionClass>,

    /// Class tags handed out by `classdb_get_class_tag`, by class name.
    pub class_tags: HashMap<&'static str, usize>,

    /// Results of `get_virtual_call_data`, by class and method. The engine asks once per pair.
    pub virtual_cache: HashMap<(String, String), usize>,

    next_id: u64,
}

impl EngineState {
    pub fn next_instance_id(&mut self, ref_counted: bool) -> u64 {
        self.next_id += 1;
        if ref_counted {
            self.next_id | REF_COUNTED_BIT
        } else {
            self.next_id
        }
    }

    pub fn find_ptr(&self, obj: *const c_void) -> Option<&ObjectState> {
        // SAFETY: object pointers are headers that are never freed.
        let id = unsafe { header_id(obj) }?;
        self.objects.get(&id).filter(|state| state.ptr == obj as usize)
    }

    pub fn find_ptr_mut(&mut self, obj: *const c_void) -> Option<&mut ObjectState> {
        let id = unsafe { header_id(obj) }?;
        self.objects.get_mut(&id).filter(|state| state.ptr == obj as usize)
    }

    /// Parent of `class` in the class hierarchy, for engine and extension classes.
    pub fn parent_class(&self, class: &str) -> Option<&'static str> {
        if let Some(extension) = self.extension_classes.get(class) {
            return Some(extension.parent);
        }

        super::classdb::engine_parent(class)
    }

    pub fn class_exists(&self, class: &str) -> bool {
        self.extension_classes.contains_key(class) || super::classdb::is_engine_class(class)
    }

    pub fn inherits(&self, class: &str, base: &str) -> bool {
        let mut current = Some(class);
        while let Some(name) = current {
            if name == base {
                return true;
            }
            current = self.parent_class(name);
        }
        false
    }
}

/// Reads the instance ID of an object pointer handed out by the engine.
///
/// # Safety
/// `obj` must be null or an object pointer created by this engine.
pub(super) unsafe fn header_id(obj: *const c_void) -> Option<u64> {
    if obj.is_null() {
        None
    } else {
        Some((*obj.cast::<ObjectHeader>()).id)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Log

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LogLevel {
    Error,
    Warning,
}

/// A message that the extension printed through `print_error` or `print_warning`.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub function: String,
    pub file: String,
    pub line: i32,
}

pub(super) fn record_log(entry: LogEntry) {
    let tag = match entry.level {
        LogLevel::Error => "ERROR",
        LogLevel::Warning => "WARNING",
    };
    eprintln!("{tag}: {}\n   at: {} ({}:{})", entry.message, entry.function, entry.file, entry.line);

    LOG.lock().push(entry);
}

/// Removes and returns everything logged so far.
pub fn take_log() -> Vec<LogEntry> {
    std::mem::take(&mut *LOG.lock())
}

/// Removes everything logged so far, and returns the messages of errors.
pub fn take_errors() -> Vec<String> {
    take_log()
        .into_iter()
        .filter(|entry| entry.level == LogLevel::Error)
        .map(|entry| entry.message)
        .collect()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Counters

pub(super) fn native_allocated() {
    NATIVE_LIVE.fetch_add(1, Ordering::AcqRel);
}

pub(super) fn native_freed() {
    let previous = NATIVE_LIVE.fetch_sub(1, Ordering::AcqRel);
    assert!(previous > 0, "native value freed twice");
}

/// Number of native values (strings, containers, boxed variant payloads) that are allocated and not yet destroyed.
pub fn live_native_count() -> usize {
    usize::try_from(NATIVE_LIVE.load(Ordering::Acquire)).unwrap_or(0)
}

/// Number of objects that exist and are not yet destroyed.
pub fn live_object_count() -> usize {
    engine().objects.len()
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Builtin types with native storage: strings, arrays, dictionaries and packed arrays.
//!
//! Handles are pointers to heap data, stored in the first 8 bytes of the value. Arrays and dictionaries are shared and
//! reference-counted; strings and packed arrays are copied eagerly.

use std::ffi::{c_char, c_int, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};

use gdbridge::sys::{self, VariantType};

use super::state::{native_allocated, native_freed};
use super::variant::{cells_equal, copy_cell, deep_copy_cell, destroy_cell, VariantCell};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Handles

pub(super) struct ArrayData {
    refs: AtomicUsize,
    pub items: Vec<VariantCell>,
}

pub(super) struct DictData {
    refs: AtomicUsize,

    // Boxed, so pointers handed out by the index operator survive insertions.
    pub entries: Vec<Box<(VariantCell, VariantCell)>>,
}

#[derive(Clone, PartialEq, Debug)]
pub(super) enum PackedData {
    Byte(Vec<u8>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),

    /// String handles, owned by the array.
    String(Vec<usize>),
}

pub(super) unsafe fn read_handle(ptr: *const c_void) -> usize {
    *ptr.cast::<usize>()
}

/// Writes a handle into uninitialized storage. Packed arrays have 16 bytes; the second half stays zero.
pub(super) unsafe fn write_handle(ptr: *mut c_void, ty: VariantType, handle: usize) {
    if ty.ptrcall_size() == 16 {
        *ptr.cast::<[usize; 2]>() = [handle, 0];
    } else {
        *ptr.cast::<usize>() = handle;
    }
}

// Strings and string names share the representation.

pub(super) fn new_string(text: String) -> usize {
    native_allocated();
    Box::into_raw(Box::new(text)) as usize
}

pub(super) unsafe fn string_ref<'a>(handle: usize) -> &'a String {
    &*(handle as *const String)
}

pub(super) unsafe fn free_string(handle: usize) {
    native_freed();
    drop(Box::from_raw(handle as *mut String));
}

pub(super) fn new_array(items: Vec<VariantCell>) -> usize {
    native_allocated();
    let data = ArrayData {
        refs: AtomicUsize::new(1),
        items,
    };
    Box::into_raw(Box::new(data)) as usize
}

pub(super) unsafe fn array_ref<'a>(handle: usize) -> &'a mut ArrayData {
    &mut *(handle as *mut ArrayData)
}

pub(super) unsafe fn array_add_ref(handle: usize) -> usize {
    array_ref(handle).refs.fetch_add(1, Ordering::AcqRel);
    handle
}

/// Drops one reference. The last one destroys all elements.
pub(super) unsafe fn array_release(handle: usize) {
    if array_ref(handle).refs.fetch_sub(1, Ordering::AcqRel) == 1 {
        native_freed();
        let data = Box::from_raw(handle as *mut ArrayData);
        for item in data.items {
            destroy_cell(item);
        }
    }
}

pub(super) fn new_dictionary(entries: Vec<Box<(VariantCell, VariantCell)>>) -> usize {
    native_allocated();
    let data = DictData {
        refs: AtomicUsize::new(1),
        entries,
    };
    Box::into_raw(Box::new(data)) as usize
}

pub(super) unsafe fn dictionary_ref<'a>(handle: usize) -> &'a mut DictData {
    &mut *(handle as *mut DictData)
}

pub(super) unsafe fn dictionary_add_ref(handle: usize) -> usize {
    dictionary_ref(handle).refs.fetch_add(1, Ordering::AcqRel);
    handle
}

pub(super) unsafe fn dictionary_release(handle: usize) {
    if dictionary_ref(handle).refs.fetch_sub(1, Ordering::AcqRel) == 1 {
        native_freed();
        let data = Box::from_raw(handle as *mut DictData);
        for entry in data.entries {
            let (key, value) = *entry;
            destroy_cell(key);
            destroy_cell(value);
        }
    }
}

impl DictData {
    pub unsafe fn find(&self, key: &VariantCell) -> Option<usize> {
        self.entries.iter().position(|entry| cells_equal(&entry.0, key))
    }
}

pub(super) fn new_packed(data: PackedData) -> usize {
    native_allocated();
    Box::into_raw(Box::new(data)) as usize
}

pub(super) unsafe fn packed_ref<'a>(handle: usize) -> &'a mut PackedData {
    &mut *(handle as *mut PackedData)
}

pub(super) unsafe fn copy_packed(handle: usize) -> usize {
    let copy = match packed_ref(handle) {
        PackedData::String(handles) => {
            PackedData::String(handles.iter().map(|&string| new_string(string_ref(string).clone())).collect())
        }
        other => other.clone(),
    };
    new_packed(copy)
}

pub(super) unsafe fn free_packed(handle: usize) {
    native_freed();
    let data = Box::from_raw(handle as *mut PackedData);
    if let PackedData::String(handles) = *data {
        for string in handles {
            free_string(string);
        }
    }
}

fn empty_packed(ty: VariantType) -> PackedData {
    match ty {
        VariantType::PackedByteArray => PackedData::Byte(Vec::new()),
        VariantType::PackedInt32Array => PackedData::Int32(Vec::new()),
        VariantType::PackedInt64Array => PackedData::Int64(Vec::new()),
        VariantType::PackedFloat32Array => PackedData::Float32(Vec::new()),
        VariantType::PackedFloat64Array => PackedData::Float64(Vec::new()),
        _ => PackedData::String(Vec::new()),
    }
}

impl PackedData {
    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    /// Element strings in engine notation, for stringification.
    pub unsafe fn element_strings(&self) -> Vec<String> {
        match self {
            Self::Byte(v) => v.iter().map(u8::to_string).collect(),
            Self::Int32(v) => v.iter().map(i32::to_string).collect(),
            Self::Int64(v) => v.iter().map(i64::to_string).collect(),
            Self::Float32(v) => v.iter().map(|&f| super::variant::format_float(f64::from(f))).collect(),
            Self::Float64(v) => v.iter().map(|&f| super::variant::format_float(f)).collect(),
            Self::String(v) => v.iter().map(|&handle| format!("{:?}", string_ref(handle))).collect(),
        }
    }

    unsafe fn content_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| string_ref(x) == string_ref(y))
            }
            _ => self == other,
        }
    }

    fn element_ptr(&mut self, index: i64) -> *mut c_void {
        let Ok(index) = usize::try_from(index) else {
            return std::ptr::null_mut();
        };

        fn at<T>(v: &mut [T], index: usize) -> *mut c_void {
            v.get_mut(index).map_or(std::ptr::null_mut(), |e| (e as *mut T).cast())
        }

        match self {
            Self::Byte(v) => at(v, index),
            Self::Int32(v) => at(v, index),
            Self::Int64(v) => at(v, index),
            Self::Float32(v) => at(v, index),
            Self::Float64(v) => at(v, index),
            Self::String(v) => at(v, index),
        }
    }
}

pub(super) unsafe fn packed_equal(a: usize, b: usize) -> bool {
    packed_ref(a).content_eq(packed_ref(b))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Lifecycle

pub(super) unsafe extern "C" fn construct_default<const T: u32>(
    dst: sys::GDExtensionUninitializedTypePtr,
    _args: *const sys::GDExtensionConstTypePtr,
) {
    let Some(ty) = VariantType::from_sys(T) else { return };

    let handle = match ty {
        VariantType::String | VariantType::StringName => new_string(String::new()),
        VariantType::Array => new_array(Vec::new()),
        VariantType::Dictionary => new_dictionary(Vec::new()),
        packed => new_packed(empty_packed(packed)),
    };
    write_handle(dst, ty, handle);
}

pub(super) unsafe extern "C" fn construct_copy<const T: u32>(
    dst: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let Some(ty) = VariantType::from_sys(T) else { return };
    let source = read_handle(*args);

    let handle = copy_handle(ty, source);
    write_handle(dst, ty, handle);
}

pub(super) unsafe extern "C" fn destroy<const T: u32>(ptr: sys::GDExtensionTypePtr) {
    let Some(ty) = VariantType::from_sys(T) else { return };
    release_handle(ty, read_handle(ptr));
}

/// Copy constructor on handles: shares containers, copies everything else.
pub(super) unsafe fn copy_handle(ty: VariantType, handle: usize) -> usize {
    match ty {
        VariantType::String | VariantType::StringName => new_string(string_ref(handle).clone()),
        VariantType::Array => array_add_ref(handle),
        VariantType::Dictionary => dictionary_add_ref(handle),
        _ => copy_packed(handle),
    }
}

pub(super) unsafe fn release_handle(ty: VariantType, handle: usize) {
    match ty {
        VariantType::String | VariantType::StringName => free_string(handle),
        VariantType::Array => array_release(handle),
        VariantType::Dictionary => dictionary_release(handle),
        _ => free_packed(handle),
    }
}

/// Assigns to initialized storage, releasing the value it held.
pub(super) unsafe fn assign_handle(ptr: *mut c_void, ty: VariantType, handle: usize) {
    release_handle(ty, read_handle(ptr));
    write_handle(ptr, ty, handle);
}

pub(super) unsafe extern "C" fn string_from_string_name(
    dst: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let source = read_handle(*args);
    write_handle(dst, VariantType::String, new_string(string_ref(source).clone()));
}

pub(super) unsafe extern "C" fn string_name_from_string(
    dst: sys::GDExtensionUninitializedTypePtr,
    args: *const sys::GDExtensionConstTypePtr,
) {
    let source = read_handle(*args);
    write_handle(dst, VariantType::StringName, new_string(string_ref(source).clone()));
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Strings

pub(super) unsafe extern "C" fn string_new_with_utf8_chars_and_len(
    dst: sys::GDExtensionUninitializedStringPtr,
    contents: *const c_char,
    size: sys::GDExtensionInt,
) {
    let len = usize::try_from(size).unwrap_or(0);
    let text = if contents.is_null() || len == 0 {
        String::new()
    } else {
        let bytes = std::slice::from_raw_parts(contents.cast::<u8>(), len);
        String::from_utf8_lossy(bytes).into_owned()
    };

    write_handle(dst, VariantType::String, new_string(text));
}

/// Copies at most `max_len` bytes of UTF-8 into `buffer`, and returns the full length. A null buffer only queries the length.
pub(super) unsafe extern "C" fn string_to_utf8_chars(
    string: sys::GDExtensionConstStringPtr,
    buffer: *mut c_char,
    max_len: sys::GDExtensionInt,
) -> sys::GDExtensionInt {
    let text = string_ref(read_handle(string));
    let bytes = text.as_bytes();

    if !buffer.is_null() {
        let count = bytes.len().min(usize::try_from(max_len).unwrap_or(0));
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer.cast::<u8>(), count);
    }

    sys::usize_to_int(bytes.len())
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Element access

pub(super) unsafe extern "C" fn array_operator_index(
    array: sys::GDExtensionTypePtr,
    index: sys::GDExtensionInt,
) -> sys::GDExtensionVariantPtr {
    let data = array_ref(read_handle(array));

    match usize::try_from(index).ok().and_then(|index| data.items.get_mut(index)) {
        Some(cell) => (cell as *mut VariantCell).cast(),
        None => std::ptr::null_mut(),
    }
}

pub(super) unsafe extern "C" fn array_operator_index_const(
    array: sys::GDExtensionConstTypePtr,
    index: sys::GDExtensionInt,
) -> sys::GDExtensionVariantPtr {
    array_operator_index(sys::force_mut_ptr(array), index)
}

/// Returns the value slot for `key`, inserting `null` if the key is missing.
pub(super) unsafe extern "C" fn dictionary_operator_index(
    dictionary: sys::GDExtensionTypePtr,
    key: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionVariantPtr {
    let data = dictionary_ref(read_handle(dictionary));
    let key = &*key.cast::<VariantCell>();

    let index = match data.find(key) {
        Some(index) => index,
        None => {
            data.entries.push(Box::new((copy_cell(key), VariantCell::NIL)));
            data.entries.len() - 1
        }
    };

    (&mut data.entries[index].1 as *mut VariantCell).cast()
}

/// Returns the value slot for `key`, or null if the key is missing.
pub(super) unsafe extern "C" fn dictionary_operator_index_const(
    dictionary: sys::GDExtensionConstTypePtr,
    key: sys::GDExtensionConstVariantPtr,
) -> sys::GDExtensionVariantPtr {
    let data = dictionary_ref(read_handle(dictionary));
    let key = &*key.cast::<VariantCell>();

    match data.find(key) {
        Some(index) => (&mut data.entries[index].1 as *mut VariantCell).cast(),
        None => std::ptr::null_mut(),
    }
}

macro_rules! packed_operator_index {
    ($($index:ident, $index_const:ident => $Elem:ty;)*) => {
        $(
            pub(super) unsafe extern "C" fn $index(
                array: sys::GDExtensionTypePtr,
                index: sys::GDExtensionInt,
            ) -> *mut $Elem {
                packed_ref(read_handle(array)).element_ptr(index).cast()
            }

            pub(super) unsafe extern "C" fn $index_const(
                array: sys::GDExtensionConstTypePtr,
                index: sys::GDExtensionInt,
            ) -> *const $Elem {
                packed_ref(read_handle(array)).element_ptr(index).cast::<$Elem>().cast_const()
            }
        )*
    };
}

packed_operator_index! {
    packed_byte_array_operator_index, packed_byte_array_operator_index_const => u8;
    packed_int32_array_operator_index, packed_int32_array_operator_index_const => i32;
    packed_int64_array_operator_index, packed_int64_array_operator_index_const => i64;
    packed_float32_array_operator_index, packed_float32_array_operator_index_const => f32;
    packed_float64_array_operator_index, packed_float64_array_operator_index_const => f64;
}

pub(super) unsafe extern "C" fn packed_string_array_operator_index(
    array: sys::GDExtensionTypePtr,
    index: sys::GDExtensionInt,
) -> sys::GDExtensionStringPtr {
    packed_ref(read_handle(array)).element_ptr(index)
}

pub(super) unsafe extern "C" fn packed_string_array_operator_index_const(
    array: sys::GDExtensionConstTypePtr,
    index: sys::GDExtensionInt,
) -> sys::GDExtensionStringPtr {
    packed_ref(read_handle(array)).element_ptr(index)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Builtin methods

struct BuiltinMethod {
    ty: VariantType,
    name: &'static str,
    hash: i64,
    call: sys::BuiltinMethodBind,
}

const PACKED_TYPES: [VariantType; 6] = [
    VariantType::PackedByteArray,
    VariantType::PackedInt32Array,
    VariantType::PackedInt64Array,
    VariantType::PackedFloat32Array,
    VariantType::PackedFloat64Array,
    VariantType::PackedStringArray,
];

static BUILTIN_METHODS: &[BuiltinMethod] = &[
    BuiltinMethod { ty: VariantType::String, name: "length", hash: 3173160232, call: string_length },
    BuiltinMethod { ty: VariantType::Array, name: "size", hash: 3173160232, call: array_size },
    BuiltinMethod { ty: VariantType::Array, name: "push_back", hash: 3316032543, call: array_push_back },
    BuiltinMethod { ty: VariantType::Array, name: "clear", hash: 3218959716, call: array_clear },
    BuiltinMethod { ty: VariantType::Array, name: "duplicate", hash: 636440122, call: array_duplicate },
    BuiltinMethod { ty: VariantType::Dictionary, name: "size", hash: 3173160232, call: dictionary_size },
    BuiltinMethod { ty: VariantType::Dictionary, name: "has", hash: 3680194679, call: dictionary_has },
    BuiltinMethod { ty: VariantType::Dictionary, name: "erase", hash: 1776646889, call: dictionary_erase },
    BuiltinMethod { ty: VariantType::Dictionary, name: "keys", hash: 4144163970, call: dictionary_keys },
    BuiltinMethod { ty: VariantType::Dictionary, name: "values", hash: 4144163970, call: dictionary_values },
    BuiltinMethod { ty: VariantType::Dictionary, name: "clear", hash: 3218959716, call: dictionary_clear },
    BuiltinMethod { ty: VariantType::Dictionary, name: "duplicate", hash: 830099069, call: dictionary_duplicate },
];

/// Packed array methods, shared by all packed types.
static PACKED_METHODS: &[(&str, i64, sys::BuiltinMethodBind)] = &[
    ("size", 3173160232, packed_size),
    ("resize", 848867239, packed_resize),
    ("push_back", 694024632, packed_push_back),
];

pub(super) unsafe extern "C" fn variant_get_ptr_builtin_method(
    ty: sys::GDExtensionVariantType,
    method: *const c_char,
    hash: sys::GDExtensionInt,
) -> sys::GDExtensionPtrBuiltInMethod {
    let ty = VariantType::from_sys(ty)?;
    let method = sys::str_from_c(method);

    if PACKED_TYPES.contains(&ty) {
        return PACKED_METHODS
            .iter()
            .find(|(name, packed_hash, _)| *name == method && *packed_hash == hash)
            .map(|&(_, _, call)| call);
    }

    BUILTIN_METHODS
        .iter()
        .find(|entry| entry.ty == ty && entry.name == method && entry.hash == hash)
        .map(|entry| entry.call)
}

unsafe fn arg<T: Copy>(args: *const sys::GDExtensionConstTypePtr, index: usize) -> T {
    *(*args.add(index)).cast::<T>()
}

unsafe fn arg_cell<'a>(args: *const sys::GDExtensionConstTypePtr, index: usize) -> &'a VariantCell {
    &*(*args.add(index)).cast::<VariantCell>()
}

unsafe fn ret<T>(ret: sys::GDExtensionTypePtr, value: T) {
    std::ptr::write(ret.cast::<T>(), value);
}

unsafe extern "C" fn string_length(base: sys::GDExtensionTypePtr, _args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    let chars = string_ref(read_handle(base)).chars().count();
    ret(r, sys::usize_to_int(chars));
}

unsafe extern "C" fn array_size(base: sys::GDExtensionTypePtr, _args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    ret(r, sys::usize_to_int(array_ref(read_handle(base)).items.len()));
}

unsafe extern "C" fn array_push_back(base: sys::GDExtensionTypePtr, args: *const sys::GDExtensionConstTypePtr, _r: sys::GDExtensionTypePtr, _argc: c_int) {
    let value = copy_cell(arg_cell(args, 0));
    array_ref(read_handle(base)).items.push(value);
}

unsafe extern "C" fn array_clear(base: sys::GDExtensionTypePtr, _args: *const sys::GDExtensionConstTypePtr, _r: sys::GDExtensionTypePtr, _argc: c_int) {
    let items = std::mem::take(&mut array_ref(read_handle(base)).items);
    for item in items {
        destroy_cell(item);
    }
}

unsafe extern "C" fn array_duplicate(base: sys::GDExtensionTypePtr, args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    let deep = arg::<u8>(args, 0) != 0;
    let items = duplicate_array_items(read_handle(base), deep);
    assign_handle(r, VariantType::Array, new_array(items));
}

pub(super) unsafe fn duplicate_array_items(handle: usize, deep: bool) -> Vec<VariantCell> {
    // Snapshot first: copying can run engine code that touches other containers.
    let source: Vec<VariantCell> = array_ref(handle).items.clone();
    source
        .iter()
        .map(|cell| if deep { deep_copy_cell(cell) } else { copy_cell(cell) })
        .collect()
}

pub(super) unsafe fn duplicate_dictionary_entries(handle: usize, deep: bool) -> Vec<Box<(VariantCell, VariantCell)>> {
    let source: Vec<(VariantCell, VariantCell)> = dictionary_ref(handle).entries.iter().map(|entry| **entry).collect();
    source
        .iter()
        .map(|(key, value)| {
            let value = if deep { deep_copy_cell(value) } else { copy_cell(value) };
            Box::new((copy_cell(key), value))
        })
        .collect()
}

unsafe extern "C" fn dictionary_size(base: sys::GDExtensionTypePtr, _args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    ret(r, sys::usize_to_int(dictionary_ref(read_handle(base)).entries.len()));
}

unsafe extern "C" fn dictionary_has(base: sys::GDExtensionTypePtr, args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    let found = dictionary_ref(read_handle(base)).find(arg_cell(args, 0)).is_some();
    ret(r, sys::bool_to_sys(found));
}

unsafe extern "C" fn dictionary_erase(base: sys::GDExtensionTypePtr, args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    let data = dictionary_ref(read_handle(base));
    let removed = data.find(arg_cell(args, 0)).map(|index| data.entries.remove(index));

    ret(r, sys::bool_to_sys(removed.is_some()));
    if let Some(entry) = removed {
        let (key, value) = *entry;
        destroy_cell(key);
        destroy_cell(value);
    }
}

unsafe extern "C" fn dictionary_keys(base: sys::GDExtensionTypePtr, _args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    let keys: Vec<VariantCell> = dictionary_ref(read_handle(base)).entries.iter().map(|entry| entry.0).collect();
    let copies = keys.iter().map(|key| copy_cell(key)).collect();
    assign_handle(r, VariantType::Array, new_array(copies));
}

unsafe extern "C" fn dictionary_values(base: sys::GDExtensionTypePtr, _args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    let values: Vec<VariantCell> = dictionary_ref(read_handle(base)).entries.iter().map(|entry| entry.1).collect();
    let copies = values.iter().map(|value| copy_cell(value)).collect();
    assign_handle(r, VariantType::Array, new_array(copies));
}

unsafe extern "C" fn dictionary_clear(base: sys::GDExtensionTypePtr, _args: *const sys::GDExtensionConstTypePtr, _r: sys::GDExtensionTypePtr, _argc: c_int) {
    let entries = std::mem::take(&mut dictionary_ref(read_handle(base)).entries);
    for entry in entries {
        let (key, value) = *entry;
        destroy_cell(key);
        destroy_cell(value);
    }
}

unsafe extern "C" fn dictionary_duplicate(base: sys::GDExtensionTypePtr, args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    let deep = arg::<u8>(args, 0) != 0;
    let entries = duplicate_dictionary_entries(read_handle(base), deep);
    assign_handle(r, VariantType::Dictionary, new_dictionary(entries));
}

unsafe extern "C" fn packed_size(base: sys::GDExtensionTypePtr, _args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    ret(r, sys::usize_to_int(packed_ref(read_handle(base)).len()));
}

/// Returns 0 on success, like the engine's `Error::OK`; 31 (`ERR_INVALID_PARAMETER`) for negative sizes.
unsafe extern "C" fn packed_resize(base: sys::GDExtensionTypePtr, args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    let Ok(size) = usize::try_from(arg::<i64>(args, 0)) else {
        ret(r, 31_i64);
        return;
    };

    match packed_ref(read_handle(base)) {
        PackedData::Byte(v) => v.resize(size, 0),
        PackedData::Int32(v) => v.resize(size, 0),
        PackedData::Int64(v) => v.resize(size, 0),
        PackedData::Float32(v) => v.resize(size, 0.0),
        PackedData::Float64(v) => v.resize(size, 0.0),
        PackedData::String(v) => {
            if size < v.len() {
                for handle in v.drain(size..) {
                    free_string(handle);
                }
            } else {
                v.resize_with(size, || new_string(String::new()));
            }
        }
    }
    ret(r, 0_i64);
}

/// Integer and float elements arrive as 64-bit slots and are narrowed to the element type.
unsafe extern "C" fn packed_push_back(base: sys::GDExtensionTypePtr, args: *const sys::GDExtensionConstTypePtr, r: sys::GDExtensionTypePtr, _argc: c_int) {
    match packed_ref(read_handle(base)) {
        PackedData::Byte(v) => v.push(arg::<i64>(args, 0) as u8),
        PackedData::Int32(v) => v.push(arg::<i64>(args, 0) as i32),
        PackedData::Int64(v) => v.push(arg::<i64>(args, 0)),
        PackedData::Float32(v) => v.push(arg::<f64>(args, 0) as f32),
        PackedData::Float64(v) => v.push(arg::<f64>(args, 0)),
        PackedData::String(v) => {
            let source = arg::<usize>(args, 0);
            v.push(new_string(string_ref(source).clone()));
        }
    }
    ret(r, sys::SYS_TRUE);
}

/// Whether two handles of `ty` have equal contents.
pub(super) unsafe fn handles_equal(ty: VariantType, a: usize, b: usize) -> bool {
    if a == b {
        return true;
    }

    match ty {
        VariantType::String | VariantType::StringName => string_ref(a) == string_ref(b),
        VariantType::Array => {
            let (a, b) = (&array_ref(a).items, &array_ref(b).items);
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| cells_equal(x, y))
        }
        VariantType::Dictionary => {
            let (a, b) = (&dictionary_ref(a).entries, &dictionary_ref(b).entries);
            a.len() == b.len()
                && a.iter().zip(b).all(|(x, y)| cells_equal(&x.0, &y.0) && cells_equal(&x.1, &y.1))
        }
        _ => packed_equal(a, b),
    }
}

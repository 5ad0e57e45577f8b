/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Variant storage and the per-type converters.

use std::ffi::c_void;

use gdbridge::builtin::{Color, Variant, Vector2, Vector2i, Vector3, Vector3i};
use gdbridge::sys::{self, GodotFfi, VariantType};

use super::builtins::{self as b, construct_copy, construct_default, destroy};
use super::objects;
use super::state::{engine, header_id, native_allocated, native_freed, REF_COUNTED_BIT};

/// Engine-side layout of a variant: a type tag and 16 bytes of payload.
///
/// | tag                         | payload                                  |
/// |-----------------------------|------------------------------------------|
/// | bool, int, float            | inline in `data[0]`                      |
/// | string, string name         | string handle                            |
/// | vectors, color              | pointer to boxed bytes                   |
/// | object                      | object pointer, instance ID              |
/// | array, dictionary, packed   | container handle                         |
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub(super) struct VariantCell {
    pub tag: u32,
    _pad: u32,
    pub data: [u64; 2],
}

sys::static_assert_eq_size!(VariantCell, sys::types::OpaqueVariant);

/// A variant with type tag `tag` and empty payload, as an engine with more variant types than the bridge would store.
pub fn variant_with_raw_type(tag: u32) -> Variant {
    let mut cell = VariantCell {
        tag,
        _pad: 0,
        data: [0, 0],
    };

    // SAFETY: the cell is fully initialized and has the engine's variant layout; the variant takes it over.
    unsafe { Variant::from_sys(std::ptr::addr_of_mut!(cell).cast()) }
}

impl VariantCell {
    pub const NIL: Self = Self::new(VariantType::Nil, [0, 0]);

    pub const fn new(ty: VariantType, data: [u64; 2]) -> Self {
        Self {
            tag: ty as u32,
            _pad: 0,
            data,
        }
    }

    pub fn ty(&self) -> VariantType {
        VariantType::from_sys(self.tag).unwrap_or(VariantType::Nil)
    }

    fn handle(&self) -> usize {
        self.data[0] as usize
    }

    fn with_handle(ty: VariantType, handle: usize) -> Self {
        Self::new(ty, [handle as u64, 0])
    }

    fn object(ptr: usize) -> Self {
        // SAFETY: object pointers are never freed.
        let id = unsafe { header_id(ptr as *const c_void) }.unwrap_or(0);
        Self::new(VariantType::Object, [ptr as u64, id])
    }

    fn object_id(&self) -> u64 {
        self.data[1]
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Plain values: vectors and colors

fn new_plain(bytes: Vec<u8>) -> usize {
    native_allocated();
    Box::into_raw(Box::new(bytes)) as usize
}

unsafe fn plain_ref<'a>(handle: usize) -> &'a Vec<u8> {
    &*(handle as *const Vec<u8>)
}

unsafe fn free_plain(handle: usize) {
    native_freed();
    drop(Box::from_raw(handle as *mut Vec<u8>));
}

unsafe fn read_plain<T: Copy>(handle: usize) -> T {
    std::ptr::read_unaligned(plain_ref(handle).as_ptr().cast::<T>())
}

fn is_plain(ty: VariantType) -> bool {
    matches!(
        ty,
        VariantType::Vector2 | VariantType::Vector2i | VariantType::Vector3 | VariantType::Vector3i | VariantType::Color
    )
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Cell operations

/// Copies a variant. Containers are shared, objects gain a reference if they are ref-counted.
pub(super) unsafe fn copy_cell(cell: &VariantCell) -> VariantCell {
    let ty = cell.ty();
    match ty {
        VariantType::Nil | VariantType::Bool | VariantType::Int | VariantType::Float => *cell,
        VariantType::Object => {
            objects::add_reference(cell.object_id());
            *cell
        }
        ty if is_plain(ty) => VariantCell::with_handle(ty, new_plain(plain_ref(cell.handle()).clone())),
        ty => VariantCell::with_handle(ty, b::copy_handle(ty, cell.handle())),
    }
}

/// Destroys a variant. May destroy an object whose last reference it held.
pub(super) unsafe fn destroy_cell(cell: VariantCell) {
    let ty = cell.ty();
    match ty {
        VariantType::Nil | VariantType::Bool | VariantType::Int | VariantType::Float => {}
        VariantType::Object => objects::drop_reference(cell.object_id()),
        ty if is_plain(ty) => free_plain(cell.handle()),
        ty => b::release_handle(ty, cell.handle()),
    }
}

/// Like [`copy_cell`], but containers are copied recursively instead of shared.
pub(super) unsafe fn deep_copy_cell(cell: &VariantCell) -> VariantCell {
    match cell.ty() {
        VariantType::Array => {
            let items = b::duplicate_array_items(cell.handle(), true);
            VariantCell::with_handle(VariantType::Array, b::new_array(items))
        }
        VariantType::Dictionary => {
            let entries = b::duplicate_dictionary_entries(cell.handle(), true);
            VariantCell::with_handle(VariantType::Dictionary, b::new_dictionary(entries))
        }
        _ => copy_cell(cell),
    }
}

/// Content equality. Objects compare by instance ID, int and float never compare equal.
pub(super) unsafe fn cells_equal(lhs: &VariantCell, rhs: &VariantCell) -> bool {
    if lhs.tag != rhs.tag {
        return false;
    }

    match lhs.ty() {
        VariantType::Nil => true,
        VariantType::Bool | VariantType::Int => lhs.data[0] == rhs.data[0],
        VariantType::Float => f64::from_bits(lhs.data[0]) == f64::from_bits(rhs.data[0]),
        VariantType::Object => lhs.object_id() == rhs.object_id(),
        ty if is_plain(ty) => plain_ref(lhs.handle()) == plain_ref(rhs.handle()),
        ty => b::handles_equal(ty, lhs.handle(), rhs.handle()),
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Stringification

/// Formats floats like the engine: whole numbers keep a trailing `.0`.
pub(super) fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

pub(super) unsafe fn stringify_cell(cell: &VariantCell) -> String {
    stringify_in(cell, &mut Vec::new())
}

/// `open` holds the containers currently being printed; a container inside itself prints as `[...]` or `{...}`.
unsafe fn stringify_in(cell: &VariantCell, open: &mut Vec<usize>) -> String {
    match cell.ty() {
        VariantType::Nil => "<null>".to_string(),
        VariantType::Bool => (cell.data[0] != 0).to_string(),
        VariantType::Int => (cell.data[0] as i64).to_string(),
        VariantType::Float => format_float(f64::from_bits(cell.data[0])),
        VariantType::String | VariantType::StringName => b::string_ref(cell.handle()).clone(),
        VariantType::Vector2 => read_plain::<Vector2>(cell.handle()).to_string(),
        VariantType::Vector2i => read_plain::<Vector2i>(cell.handle()).to_string(),
        VariantType::Vector3 => read_plain::<Vector3>(cell.handle()).to_string(),
        VariantType::Vector3i => read_plain::<Vector3i>(cell.handle()).to_string(),
        VariantType::Color => read_plain::<Color>(cell.handle()).to_string(),
        VariantType::Object => stringify_object(cell),
        VariantType::Array => {
            if open.contains(&cell.handle()) {
                return "[...]".to_string();
            }

            let items = b::array_ref(cell.handle()).items.clone();
            open.push(cell.handle());
            let parts = items.iter().map(|item| stringify_nested(item, open)).collect::<Vec<_>>();
            open.pop();
            format!("[{}]", parts.join(", "))
        }
        VariantType::Dictionary => {
            if open.contains(&cell.handle()) {
                return "{...}".to_string();
            }

            let entries: Vec<(VariantCell, VariantCell)> =
                b::dictionary_ref(cell.handle()).entries.iter().map(|entry| **entry).collect();
            if entries.is_empty() {
                return "{}".to_string();
            }

            open.push(cell.handle());
            let parts = entries
                .iter()
                .map(|(key, value)| format!("{}: {}", stringify_nested(key, open), stringify_nested(value, open)))
                .collect::<Vec<_>>();
            open.pop();
            format!("{{ {} }}", parts.join(", "))
        }
        _ => {
            let parts = b::packed_ref(cell.handle()).element_strings();
            format!("[{}]", parts.join(", "))
        }
    }
}

/// Strings inside containers are quoted.
unsafe fn stringify_nested(cell: &VariantCell, open: &mut Vec<usize>) -> String {
    match cell.ty() {
        VariantType::String => format!("{:?}", b::string_ref(cell.handle())),
        VariantType::StringName => format!("&{:?}", b::string_ref(cell.handle())),
        _ => stringify_in(cell, open),
    }
}

fn stringify_object(cell: &VariantCell) -> String {
    if cell.data[0] == 0 {
        return "<Object#null>".to_string();
    }

    let engine = engine();
    match engine.objects.get(&cell.object_id()) {
        Some(state) => format!("<{}#{}>", state.class_name(), cell.object_id() & !REF_COUNTED_BIT),
        None => "<Freed Object>".to_string(),
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions

pub(super) unsafe extern "C" fn variant_new_copy(
    dst: sys::GDExtensionUninitializedVariantPtr,
    src: sys::GDExtensionConstVariantPtr,
) {
    let copy = copy_cell(&*src.cast::<VariantCell>());
    std::ptr::write(dst.cast::<VariantCell>(), copy);
}

pub(super) unsafe extern "C" fn variant_new_nil(dst: sys::GDExtensionUninitializedVariantPtr) {
    std::ptr::write(dst.cast::<VariantCell>(), VariantCell::NIL);
}

pub(super) unsafe extern "C" fn variant_destroy(variant: sys::GDExtensionVariantPtr) {
    let cell = std::ptr::replace(variant.cast::<VariantCell>(), VariantCell::NIL);
    destroy_cell(cell);
}

pub(super) unsafe extern "C" fn variant_get_type(variant: sys::GDExtensionConstVariantPtr) -> sys::GDExtensionVariantType {
    (*variant.cast::<VariantCell>()).tag
}

pub(super) unsafe extern "C" fn variant_stringify(
    variant: sys::GDExtensionConstVariantPtr,
    dst: sys::GDExtensionUninitializedStringPtr,
) {
    let text = stringify_cell(&*variant.cast::<VariantCell>());
    b::write_handle(dst, VariantType::String, b::new_string(text));
}

/// Builds a variant from a value of type `T`. The value stays owned by the caller.
unsafe extern "C" fn from_type<const T: u32>(dst: sys::GDExtensionUninitializedVariantPtr, src: sys::GDExtensionTypePtr) {
    let Some(ty) = VariantType::from_sys(T) else { return };

    let cell = match ty {
        VariantType::Nil => VariantCell::NIL,
        VariantType::Bool => VariantCell::new(ty, [u64::from(*src.cast::<u8>() != 0), 0]),
        VariantType::Int | VariantType::Float => VariantCell::new(ty, [*src.cast::<u64>(), 0]),
        VariantType::Object => {
            let ptr = *src.cast::<usize>();
            let cell = VariantCell::object(ptr);
            if ptr != 0 {
                objects::add_reference(cell.object_id());
            }
            cell
        }
        ty if is_plain(ty) => {
            let bytes = std::slice::from_raw_parts(src.cast::<u8>(), ty.ptrcall_size()).to_vec();
            VariantCell::with_handle(ty, new_plain(bytes))
        }
        ty => VariantCell::with_handle(ty, b::copy_handle(ty, b::read_handle(src))),
    };

    std::ptr::write(dst.cast::<VariantCell>(), cell);
}

/// Writes a fresh value of type `T` from a variant of that type. Objects are written as plain pointers, without a reference.
unsafe extern "C" fn to_type<const T: u32>(dst: sys::GDExtensionUninitializedTypePtr, src: sys::GDExtensionVariantPtr) {
    let Some(ty) = VariantType::from_sys(T) else { return };
    let cell = &*src.cast::<VariantCell>();

    match ty {
        VariantType::Nil => {}
        VariantType::Bool => *dst.cast::<u8>() = u8::from(cell.data[0] != 0),
        VariantType::Int | VariantType::Float => *dst.cast::<u64>() = cell.data[0],
        VariantType::Object => *dst.cast::<usize>() = cell.handle(),
        ty if is_plain(ty) => {
            let bytes = plain_ref(cell.handle());
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst.cast::<u8>(), bytes.len());
        }
        ty => b::write_handle(dst, ty, b::copy_handle(ty, cell.handle())),
    }
}

/// Maps a runtime type number to the instantiation of a function generic over the type number.
macro_rules! select_by_type {
    ($ty:expr, $func:ident as $Fn:ty) => {
        select_by_type!(@arms $ty, $func as $Fn;
            Nil Bool Int Float String Vector2 Vector2i Vector3 Vector3i Color StringName Object Dictionary Array
            PackedByteArray PackedInt32Array PackedInt64Array PackedFloat32Array PackedFloat64Array PackedStringArray)
    };
    (@arms $ty:expr, $func:ident as $Fn:ty; $($Variant:ident)*) => {
        match VariantType::from_sys($ty) {
            $( Some(VariantType::$Variant) => Some($func::<{ VariantType::$Variant as u32 }> as $Fn), )*
            None => None,
        }
    };
}

pub(super) unsafe extern "C" fn get_variant_from_type_constructor(
    ty: sys::GDExtensionVariantType,
) -> sys::GDExtensionVariantFromTypeConstructorFunc {
    select_by_type!(ty, from_type as sys::VariantFromType)
}

pub(super) unsafe extern "C" fn get_variant_to_type_constructor(
    ty: sys::GDExtensionVariantType,
) -> sys::GDExtensionTypeFromVariantConstructorFunc {
    select_by_type!(ty, to_type as sys::TypeFromVariant)
}

/// Constructors: 0 default, 1 copy, 2 conversion between `String` and `StringName`.
pub(super) unsafe extern "C" fn variant_get_ptr_constructor(
    ty: sys::GDExtensionVariantType,
    index: i32,
) -> sys::GDExtensionPtrConstructor {
    let variant_type = VariantType::from_sys(ty)?;
    if !variant_type.has_native_storage() {
        return None;
    }

    match (index, variant_type) {
        (0, _) => select_by_type!(ty, construct_default as sys::PtrConstructor),
        (1, _) => select_by_type!(ty, construct_copy as sys::PtrConstructor),
        (2, VariantType::String) => Some(b::string_from_string_name as sys::PtrConstructor),
        (2, VariantType::StringName) => Some(b::string_name_from_string as sys::PtrConstructor),
        _ => None,
    }
}

pub(super) unsafe extern "C" fn variant_get_ptr_destructor(ty: sys::GDExtensionVariantType) -> sys::GDExtensionPtrDestructor {
    let variant_type = VariantType::from_sys(ty)?;
    if !variant_type.has_native_storage() {
        return None;
    }

    select_by_type!(ty, destroy as sys::PtrDestructor)
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::Variant;
use crate::meta::error::{ConvertError, FromGodotError};
use crate::meta::{builtin_ptrcall, FromGodot, ToGodot};
use crate::sys;
use sys::{interface_fn, GodotFfi, ParamMeta, ReturnMeta, VariantType};

impl_builtin_stub!(
    /// Engine's `Array` type, holding [`Variant`] elements.
    ///
    /// # Reference semantics
    ///
    /// Arrays are reference-counted on the engine side. Cloning an `Array` does **not** copy its elements: both values refer to
    /// the same storage, and mutations through one are visible through the other. Use [`duplicate_shallow()`](Self::duplicate_shallow)
    /// or [`duplicate_deep()`](Self::duplicate_deep) for an independent copy.
    ///
    /// Conversions from and to Rust `Vec<T>` always copy, see [`from_slice()`](Self::from_slice) and [`try_to_vec()`](Self::try_to_vec).
    ///
    /// # Thread safety
    ///
    /// Like all engine types, `Array` is not `Send` or `Sync`.
    Array => Array, OpaqueArray
);

impl_builtin_traits! {
    for Array => Array {
        Default;
        Clone;
        Drop;
    }
}

impl Array {
    /// Constructs an empty `Array`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new array with copies of all elements of `values`.
    pub fn from_slice<T: ToGodot>(values: &[T]) -> Self {
        let mut array = Self::new();
        for value in values {
            array.push(value.to_variant());
        }
        array
    }

    /// Returns the number of elements in the array. Equivalent of `size()` in the engine.
    pub fn len(&self) -> usize {
        // SAFETY: `self` is a live array.
        let len: i64 = unsafe { builtin_ptrcall(VariantType::Array, "size", self.sys(), ()) };
        sys::int_to_usize(len)
    }

    /// Returns `true` if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the element at `index`, or `None` if the index is out of bounds.
    pub fn get(&self, index: usize) -> Option<Variant> {
        if index >= self.len() {
            return None;
        }

        // SAFETY: index is in bounds; the element is copied before `self` can be mutated.
        let element = unsafe { Variant::borrow_var_sys(self.ptr(index)) };
        Some(element.clone())
    }

    /// ⚠️ Returns a copy of the element at `index`.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn at(&self, index: usize) -> Variant {
        let len = self.len();
        self.get(index)
            .unwrap_or_else(|| panic!("Array index {index} out of bounds: length is {len}"))
    }

    /// ⚠️ Sets the value at the specified index.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: Variant) {
        let len = self.len();
        assert!(index < len, "Array index {index} out of bounds: length is {len}");

        // SAFETY: index is in bounds; assigning destroys the previous element.
        let element = unsafe { Variant::borrow_var_sys_mut(self.ptr_mut(index)) };
        *element = value;
    }

    /// Appends an element to the end of the array.
    pub fn push(&mut self, value: Variant) {
        // SAFETY: `self` is a live array.
        unsafe { builtin_ptrcall::<_, ()>(VariantType::Array, "push_back", self.sys_mut(), (value,)) }
    }

    /// Removes all elements from the array.
    pub fn clear(&mut self) {
        // SAFETY: `self` is a live array.
        unsafe { builtin_ptrcall::<_, ()>(VariantType::Array, "clear", self.sys_mut(), ()) }
    }

    /// Returns a shallow copy of the array. All array elements are copied, but any reference types (such as `Array`, `Dictionary`
    /// and `Object`) will still refer to the same value.
    ///
    /// To create a deep copy, use [`duplicate_deep()`](Self::duplicate_deep) instead.
    /// To create a new reference to the same array data, use [`clone()`](Clone::clone).
    pub fn duplicate_shallow(&self) -> Self {
        // `deep` defaults to false.
        // SAFETY: `self` is a live array.
        unsafe { builtin_ptrcall(VariantType::Array, "duplicate", self.sys(), ()) }
    }

    /// Returns a deep copy of the array. All nested arrays and dictionaries are duplicated and will not be shared with the original
    /// array. Note that any `Object`-derived elements will still be shallow copied.
    pub fn duplicate_deep(&self) -> Self {
        // SAFETY: `self` is a live array.
        unsafe { builtin_ptrcall(VariantType::Array, "duplicate", self.sys(), (true,)) }
    }

    /// Returns an iterator over the elements of the array, each one copied.
    ///
    /// The array is shared; if it is modified during the iteration, the iterator sees the modification.
    pub fn iter_shared(&self) -> Iter<'_> {
        Iter {
            array: self,
            next_idx: 0,
        }
    }

    /// Converts all elements to `T`, copying them into a new `Vec`.
    pub fn try_to_vec<T: FromGodot>(&self) -> Result<Vec<T>, ConvertError> {
        self.iter_shared()
            .enumerate()
            .map(|(index, element)| {
                T::try_from_variant(&element).map_err(|_| FromGodotError::BadElement { index }.into_error(element))
            })
            .collect()
    }

    fn ptr(&self, index: usize) -> sys::GDExtensionConstVariantPtr {
        // SAFETY: callers check the bounds.
        unsafe { interface_fn!(array_operator_index_const)(self.sys_const(), sys::usize_to_int(index)) }
    }

    fn ptr_mut(&mut self, index: usize) -> sys::GDExtensionVariantPtr {
        // SAFETY: callers check the bounds.
        unsafe { interface_fn!(array_operator_index)(self.sys_mut(), sys::usize_to_int(index)) }
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter_shared().zip(other.iter_shared()).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter_shared()).finish()
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (count, element) in self.iter_shared().enumerate() {
            if count != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{element}")?;
        }
        write!(f, "]")
    }
}

impl_builtin_convert!(Array => "Array");

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// An iterator over copies of the elements of an [`Array`].
pub struct Iter<'a> {
    array: &'a Array,
    next_idx: usize,
}

impl Iterator for Iter<'_> {
    type Item = Variant;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.array.get(self.next_idx)?;
        self.next_idx += 1;
        Some(element)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

pub(crate) static ARRAY_METHODS: &[sys::MethodSpec] = &[
    sys::MethodSpec::builtin(VariantType::Array, "size", 3173160232, &[], ReturnMeta::value(VariantType::Int)),
    sys::MethodSpec::builtin(
        VariantType::Array,
        "push_back",
        3316032543,
        &[ParamMeta::new("value", sys::SlotType::Variant)],
        ReturnMeta::VOID,
    ),
    sys::MethodSpec::builtin(VariantType::Array, "clear", 3218959716, &[], ReturnMeta::VOID),
    sys::MethodSpec::builtin(
        VariantType::Array,
        "duplicate",
        636440122,
        &[ParamMeta::value("deep", VariantType::Bool).with_default(sys::DefaultArg::Bool(false))],
        ReturnMeta::value(VariantType::Array),
    ),
];

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::builtin::{Array, Variant};
use crate::meta::error::{ConvertError, FromGodotError};
use crate::meta::{builtin_ptrcall, FromGodot, ToGodot};
use crate::sys;
use sys::{interface_fn, GodotFfi, ParamMeta, ReturnMeta, SlotType, VariantType};

impl_builtin_stub!(
    /// Engine's `Dictionary` type: an ordered map from [`Variant`] keys to `Variant` values.
    ///
    /// # Reference semantics
    ///
    /// Like [`Array`], a `Dictionary` is shared on clone. Mutations through one handle are visible through all others.
    /// Use [`duplicate_shallow()`](Self::duplicate_shallow) or [`duplicate_deep()`](Self::duplicate_deep) to obtain an
    /// independent copy.
    ///
    /// Iteration order is insertion order.
    Dictionary => Dictionary, OpaqueDictionary
);

impl_builtin_traits! {
    for Dictionary => Dictionary {
        Default;
        Clone;
        Drop;
    }
}

impl Dictionary {
    /// Constructs an empty `Dictionary`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dictionary from key-value pairs, converting both sides.
    ///
    /// If a key occurs several times, the last value wins.
    pub fn from_pairs<'a, K, V>(pairs: impl IntoIterator<Item = (&'a K, &'a V)>) -> Self
    where
        K: ToGodot + 'a,
        V: ToGodot + 'a,
    {
        let mut dictionary = Self::new();
        for (key, value) in pairs {
            dictionary.set(key.to_variant(), value.to_variant());
        }
        dictionary
    }

    /// Returns the number of entries in the dictionary.
    ///
    /// This is equivalent to `size` in the engine.
    pub fn len(&self) -> usize {
        // SAFETY: `self` is a live dictionary.
        let len: i64 = unsafe { builtin_ptrcall(VariantType::Dictionary, "size", self.sys(), ()) };
        sys::int_to_usize(len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the value for `key`, or `None` if there is no such entry.
    ///
    /// A key that maps to `null` returns `Some(Variant::nil())`.
    pub fn get<K: ToGodot>(&self, key: K) -> Option<Variant> {
        self.get_variant(&key.to_variant())
    }

    fn get_variant(&self, key: &Variant) -> Option<Variant> {
        // SAFETY: the const index operator does not insert; it returns null for missing keys.
        let value_ptr =
            unsafe { interface_fn!(dictionary_operator_index_const)(self.sys_const(), key.var_sys_const()) };

        if value_ptr.is_null() {
            return None;
        }

        // SAFETY: non-null pointer to an element of `self`, copied before `self` can change.
        let value = unsafe { Variant::borrow_var_sys(value_ptr) };
        Some(value.clone())
    }

    /// Returns `true` if the dictionary contains the given key.
    ///
    /// This is equivalent to `has` in the engine.
    pub fn contains_key<K: ToGodot>(&self, key: K) -> bool {
        let key = key.to_variant();

        // SAFETY: `self` is a live dictionary.
        unsafe { builtin_ptrcall(VariantType::Dictionary, "has", self.sys(), (key,)) }
    }

    /// Inserts `value` under `key`, replacing any previous value.
    pub fn set<K: ToGodot, V: ToGodot>(&mut self, key: K, value: V) {
        let key = key.to_variant();
        let value = value.to_variant();

        // SAFETY: the mutable index operator inserts a `null` entry if the key is missing, and returns a pointer to it.
        unsafe {
            let value_ptr = interface_fn!(dictionary_operator_index)(self.sys_mut(), key.var_sys_const());
            *Variant::borrow_var_sys_mut(value_ptr) = value;
        }
    }

    /// Removes the entry for `key` and returns its previous value, if any.
    ///
    /// This is equivalent to `erase` in the engine.
    pub fn remove<K: ToGodot>(&mut self, key: K) -> Option<Variant> {
        let key = key.to_variant();
        let previous = self.get_variant(&key)?;

        // SAFETY: `self` is a live dictionary.
        let erased: bool =
            unsafe { builtin_ptrcall(VariantType::Dictionary, "erase", self.sys_mut(), (key,)) };
        debug_assert!(erased, "entry vanished between lookup and erase");

        Some(previous)
    }

    /// Returns all keys, in insertion order.
    ///
    /// The array is a new copy; modifying it does not affect the dictionary.
    pub fn keys_array(&self) -> Array {
        // SAFETY: `self` is a live dictionary.
        unsafe { builtin_ptrcall(VariantType::Dictionary, "keys", self.sys(), ()) }
    }

    /// Returns all values, in insertion order of their keys.
    pub fn values_array(&self) -> Array {
        // SAFETY: `self` is a live dictionary.
        unsafe { builtin_ptrcall(VariantType::Dictionary, "values", self.sys(), ()) }
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        // SAFETY: `self` is a live dictionary.
        unsafe { builtin_ptrcall::<_, ()>(VariantType::Dictionary, "clear", self.sys_mut(), ()) }
    }

    /// Returns a shallow copy: keys and values are copied, but nested arrays and dictionaries are shared with `self`.
    pub fn duplicate_shallow(&self) -> Self {
        // SAFETY: `self` is a live dictionary.
        unsafe { builtin_ptrcall(VariantType::Dictionary, "duplicate", self.sys(), (false,)) }
    }

    /// Returns a deep copy: nested arrays and dictionaries are duplicated recursively. Objects are still shared.
    pub fn duplicate_deep(&self) -> Self {
        // SAFETY: `self` is a live dictionary.
        unsafe { builtin_ptrcall(VariantType::Dictionary, "duplicate", self.sys(), (true,)) }
    }

    /// Returns an iterator over copies of all key-value pairs, in insertion order.
    ///
    /// The set of keys is captured when the iterator is created. Entries removed meanwhile are skipped.
    pub fn iter_shared(&self) -> Iter<'_> {
        Iter {
            dictionary: self,
            keys: self.keys_array(),
            next_idx: 0,
        }
    }

    /// Converts all entries, copying them into a new `HashMap`.
    pub fn try_to_hash_map<K, V>(&self) -> Result<HashMap<K, V>, ConvertError>
    where
        K: FromGodot + Eq + Hash,
        V: FromGodot,
    {
        self.iter_shared()
            .enumerate()
            .map(|(index, (key, value))| -> Result<(K, V), ConvertError> {
                let bad_element = |_: ConvertError| FromGodotError::BadElement { index }.into_error((&key, &value));
                Ok((
                    K::try_from_variant(&key).map_err(bad_element)?,
                    V::try_from_variant(&value).map_err(bad_element)?,
                ))
            })
            .collect()
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter_shared()
                .all(|(key, value)| other.get(key).is_some_and(|other_value| other_value == value))
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter_shared()).finish()
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for (count, (key, value)) in self.iter_shared().enumerate() {
            if count != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, " }}")
    }
}

impl_builtin_convert!(Dictionary => "Dictionary");

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// An iterator over copies of the entries of a [`Dictionary`].
pub struct Iter<'a> {
    dictionary: &'a Dictionary,
    keys: Array,
    next_idx: usize,
}

impl Iterator for Iter<'_> {
    type Item = (Variant, Variant);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let key = self.keys.get(self.next_idx)?;
            self.next_idx += 1;

            if let Some(value) = self.dictionary.get_variant(&key) {
                return Some((key, value));
            }
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

const KEY: ParamMeta = ParamMeta::new("key", SlotType::Variant);

pub(crate) static DICTIONARY_METHODS: &[sys::MethodSpec] = &[
    sys::MethodSpec::builtin(VariantType::Dictionary, "size", 3173160232, &[], ReturnMeta::value(VariantType::Int)),
    sys::MethodSpec::builtin(VariantType::Dictionary, "has", 3680194679, &[KEY], ReturnMeta::value(VariantType::Bool)),
    sys::MethodSpec::builtin(
        VariantType::Dictionary,
        "erase",
        1776646889,
        &[KEY],
        ReturnMeta::value(VariantType::Bool),
    ),
    sys::MethodSpec::builtin(VariantType::Dictionary, "keys", 4144163970, &[], ReturnMeta::value(VariantType::Array)),
    sys::MethodSpec::builtin(
        VariantType::Dictionary,
        "values",
        4144163970,
        &[],
        ReturnMeta::value(VariantType::Array),
    ),
    sys::MethodSpec::builtin(VariantType::Dictionary, "clear", 3218959716, &[], ReturnMeta::VOID),
    sys::MethodSpec::builtin(
        VariantType::Dictionary,
        "duplicate",
        830099069,
        &[ParamMeta::value("deep", VariantType::Bool).with_default(sys::DefaultArg::Bool(false))],
        ReturnMeta::value(VariantType::Dictionary),
    ),
];

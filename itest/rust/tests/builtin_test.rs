/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::builtin::VariantValue;
use gdbridge::prelude::*;
use itest::framework::{ensure_loaded, expect_no_errors, expect_panic, serial};
use itest::loopback;
use proptest::prelude::*;

proptest! {
    #[test]
    fn int_roundtrip(value in any::<i64>()) {
        let _guard = serial();
        ensure_loaded();

        let variant = Variant::from(value);
        prop_assert_eq!(variant.get_type(), VariantType::Int);
        prop_assert_eq!(variant.to::<i64>(), value);
    }

    #[test]
    fn float_roundtrip(value in -1.0e12_f64..1.0e12) {
        let _guard = serial();
        ensure_loaded();

        let variant = Variant::from(value);
        prop_assert_eq!(variant.get_type(), VariantType::Float);
        prop_assert_eq!(variant.to::<f64>(), value);
    }

    #[test]
    fn string_roundtrip(value in "\\PC*") {
        let _guard = serial();
        ensure_loaded();

        let variant = Variant::from(value.as_str());
        prop_assert_eq!(variant.get_type(), VariantType::String);
        prop_assert_eq!(variant.to::<String>(), value);
    }

    #[test]
    fn vector2i_roundtrip(x in any::<i32>(), y in any::<i32>()) {
        let _guard = serial();
        ensure_loaded();

        let vector = Vector2i::new(x, y);
        prop_assert_eq!(Variant::from(vector).to::<Vector2i>(), vector);
    }
}

#[test]
fn variant_nil() {
    let _guard = serial();
    ensure_loaded();

    let nil = Variant::nil();
    assert!(nil.is_nil());
    assert_eq!(nil.get_type(), VariantType::Nil);
    assert_eq!(nil, Variant::default());
    assert_eq!(nil.stringify(), "<null>");

    // Nil is not an integer; conversion must fail instead of producing 0.
    assert!(nil.try_to::<i64>().is_err());
}

#[test]
fn variant_conversion_errors() {
    let _guard = serial();
    ensure_loaded();

    let variant = Variant::from("not a number");
    let err = variant.try_to::<i64>().expect_err("string converted to int");
    assert!(err.to_string().contains("String"), "{err}");

    // Out of range for i32.
    let big = Variant::from(i64::from(i32::MAX) + 1);
    assert!(big.try_to::<i32>().is_err());
    assert_eq!(Variant::from(7_i64).to::<i32>(), 7);
}

#[test]
fn variant_stringify() {
    let _guard = serial();
    ensure_loaded();

    assert_eq!(Variant::from(true).stringify(), "true");
    assert_eq!(Variant::from(-17_i64).stringify(), "-17");
    assert_eq!(Variant::from(2.0_f64).stringify(), "2.0");
    assert_eq!(Variant::from(Array::from_slice(&[1_i64, 2, 3])).stringify(), "[1, 2, 3]");
    assert_eq!(Variant::from(Dictionary::new()).stringify(), "{}");
}

#[test]
fn variant_value_roundtrip() {
    let _guard = serial();
    ensure_loaded();

    let value = VariantValue::Dictionary(vec![
        (VariantValue::String("name".to_string()), VariantValue::String("recorder".to_string())),
        (
            VariantValue::Int(3),
            VariantValue::Array(vec![VariantValue::Bool(true), VariantValue::Nil, VariantValue::Float(0.25)]),
        ),
        (
            VariantValue::StringName("packed".to_string()),
            VariantValue::PackedInt32Array(vec![1, -2, 3]),
        ),
    ]);

    let variant = value.to_variant();
    assert_eq!(variant.get_type(), VariantType::Dictionary);

    let back = variant.to_value().expect("to_value()");
    assert_eq!(back, value);
}

#[test]
fn variant_value_is_a_copy() {
    let _guard = serial();
    ensure_loaded();

    let mut array = Array::from_slice(&[1_i64, 2]);
    let value = Variant::from(array.clone()).to_value().expect("to_value()");

    array.push(Variant::from(3_i64));
    assert_eq!(value, VariantValue::Array(vec![VariantValue::Int(1), VariantValue::Int(2)]));
}

#[test]
fn variant_value_null_object_is_not_nil() {
    let _guard = serial();
    ensure_loaded();

    let null_object = VariantValue::Object(None).to_variant();
    assert_eq!(null_object.get_type(), VariantType::Object);
    assert!(!null_object.is_nil());
    assert_eq!(null_object.to_value().expect("to_value()"), VariantValue::Object(None));
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Array

#[test]
fn array_clone_aliases() {
    let _guard = serial();
    ensure_loaded();

    let mut array = Array::from_slice(&["a", "b"]);
    let alias = array.clone();

    array.push(Variant::from("c"));
    assert_eq!(alias.len(), 3);
    assert_eq!(alias.at(2).to::<String>(), "c");
}

#[test]
fn array_duplicate_shallow_shares_nested() {
    let _guard = serial();
    ensure_loaded();

    let mut inner = Array::from_slice(&[1_i64]);
    let outer = Array::from_slice(&[Variant::from(inner.clone())]);

    let shallow = outer.duplicate_shallow();
    let deep = outer.duplicate_deep();
    inner.push(Variant::from(2_i64));

    assert_eq!(shallow.at(0).to::<Array>().len(), 2);
    assert_eq!(deep.at(0).to::<Array>().len(), 1);
}

#[test]
fn array_access() {
    let _guard = serial();
    ensure_loaded();

    let mut array = Array::new();
    assert!(array.is_empty());
    assert_eq!(array.get(0), None);

    array.push(Variant::from(10_i64));
    array.push(Variant::from("x"));
    array.set(0, Variant::from(11_i64));

    assert_eq!(array.len(), 2);
    assert_eq!(array.get(0), Some(Variant::from(11_i64)));
    assert_eq!(array.iter_shared().count(), 2);
    assert!(array.try_to_vec::<i64>().is_err());

    expect_panic("index out of bounds", || {
        array.at(5);
    });

    array.clear();
    assert!(array.is_empty());
}

#[test]
fn array_to_vec() {
    let _guard = serial();
    ensure_loaded();

    let values = vec![4_i64, 8, 15, 16, 23, 42];
    let array = Array::from_slice(&values);

    assert_eq!(array.try_to_vec::<i64>().expect("ints"), values);
    assert_eq!(Variant::from(values.clone()).to::<Vec<i64>>(), values);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Dictionary

#[test]
fn dictionary_ops() {
    let _guard = serial();
    ensure_loaded();

    let mut dict = Dictionary::from_pairs([(&"one", &1_i64), (&"two", &2_i64)]);
    assert_eq!(dict.len(), 2);
    assert!(dict.contains_key("one"));
    assert!(!dict.contains_key("three"));
    assert_eq!(dict.get("two"), Some(Variant::from(2_i64)));
    assert_eq!(dict.get("three"), None);

    dict.set("one", 100_i64);
    dict.set("three", Variant::nil());
    assert_eq!(dict.len(), 3);
    assert_eq!(dict.get("one"), Some(Variant::from(100_i64)));

    // Present, but null.
    assert_eq!(dict.get("three"), Some(Variant::nil()));

    assert_eq!(dict.remove("two"), Some(Variant::from(2_i64)));
    assert_eq!(dict.remove("two"), None);

    let keys = dict.keys_array().try_to_vec::<String>().expect("string keys");
    assert_eq!(keys, ["one", "three"]);

    dict.clear();
    assert!(dict.is_empty());
}

#[test]
fn dictionary_duplicate() {
    let _guard = serial();
    ensure_loaded();

    let mut nested = Array::from_slice(&[1_i64]);
    let mut dict = Dictionary::new();
    dict.set("nested", nested.clone());

    let alias = dict.clone();
    let shallow = dict.duplicate_shallow();
    let deep = dict.duplicate_deep();

    dict.set("added", true);
    nested.push(Variant::from(2_i64));

    assert!(alias.contains_key("added"));
    assert!(!shallow.contains_key("added"));

    let nested_len = |dict: &Dictionary| dict.get("nested").expect("nested").to::<Array>().len();
    assert_eq!(nested_len(&shallow), 2);
    assert_eq!(nested_len(&deep), 1);
}

#[test]
fn dictionary_to_hash_map() {
    let _guard = serial();
    ensure_loaded();

    let dict = Dictionary::from_pairs([(&"a", &1_i64), (&"b", &2_i64)]);
    let map = dict.try_to_hash_map::<String, i64>().expect("hash map");
    assert_eq!(map.len(), 2);
    assert_eq!(map["b"], 2);

    assert!(dict.try_to_hash_map::<String, bool>().is_err());
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Packed arrays

#[test]
fn packed_array_value_semantics() {
    let _guard = serial();
    ensure_loaded();

    let mut ints = PackedInt32Array::from(&[1, 2, 3][..]);
    let copy = ints.clone();

    ints.push(4);
    ints.set(0, -1);

    assert_eq!(ints.to_vec(), [-1, 2, 3, 4]);
    assert_eq!(copy.to_vec(), [1, 2, 3]);
    assert_eq!(ints[1], 2);
    assert_eq!(ints.get(10), None);
}

#[test]
fn packed_array_resize() {
    let _guard = serial();
    ensure_loaded();

    let mut floats = PackedFloat64Array::new();
    floats.resize(3);
    assert_eq!(floats.to_vec(), [0.0, 0.0, 0.0]);

    floats[2] = 1.5;
    floats.resize(2);
    assert_eq!(floats.len(), 2);

    let mut bytes = PackedByteArray::from([0xde, 0xad]);
    bytes.push(0xbe);
    assert_eq!(Variant::from(bytes.clone()).to::<PackedByteArray>(), bytes);
}

#[test]
fn packed_string_array() {
    let _guard = serial();
    ensure_loaded();

    let mut strings = PackedStringArray::new();
    strings.push(GString::from("first"));
    strings.push(GString::from("second"));

    let value = Variant::from(strings.clone()).to_value().expect("to_value()");
    assert_eq!(
        value,
        VariantValue::PackedStringArray(vec!["first".to_string(), "second".to_string()])
    );

    expect_panic("packed index out of bounds", || {
        strings.set(2, GString::from("third"));
    });
}

#[test]
fn builtins_release_native_storage() {
    let _guard = serial();
    ensure_loaded();

    let before = loopback::live_native_count();
    {
        let mut dict = Dictionary::new();
        dict.set("list", Array::from_slice(&["x", "y"]));
        dict.set("name", StringName::from("node"));
        dict.set("bytes", PackedByteArray::from([1, 2, 3]));

        let _copy = dict.duplicate_deep();
        let _value = Variant::from(dict.clone()).to_value();
    }
    assert_eq!(loopback::live_native_count(), before);

    expect_no_errors();
}

#[cfg(feature = "serde")]
#[test]
fn variant_value_serializes_engine_data() {
    let _guard = serial();
    ensure_loaded();

    let mut dict = Dictionary::new();
    dict.set("speed", 2.5_f64);
    dict.set("tags", Array::from_slice(&["a", "b"]));

    let value = Variant::from(dict).to_value().expect("to_value()");
    let json = serde_json::to_string(&value).expect("serialize");
    let back: VariantValue = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, value);

    // Deserialized values can be sent back to the engine.
    let variant = back.to_variant();
    let dict = variant.to::<Dictionary>();
    assert_eq!(dict.get("speed"), Some(Variant::from(2.5_f64)));
}

#[test]
fn variant_self_containing_containers() {
    let _guard = serial();
    ensure_loaded();

    let mut array = Array::new();
    array.push(Variant::from(1_i64));
    array.push(array.clone().to_variant());
    let variant = array.to_variant();

    let err = variant.to_value().expect_err("array contains itself");
    assert!(err.to_string().contains("nested deeper than 100 levels"), "{err}");

    // Formatting and comparison must not recurse without end.
    let debug = format!("{variant:?}");
    assert!(debug.contains("nested deeper"), "{debug}");
    assert_ne!(variant, variant.clone());
    assert_eq!(variant.to_string(), "[1, [...]]");

    let mut dictionary = Dictionary::new();
    dictionary.set("self", dictionary.clone());
    let variant = dictionary.to_variant();
    assert!(variant.to_value().is_err());
    assert!(format!("{variant:?}").contains("nested deeper"));

    // Break the cycles, so the containers are freed.
    array.clear();
    dictionary.clear();

    // Nesting up to the limit still converts.
    let mut nested = VariantValue::Int(7);
    for _ in 0..VariantValue::MAX_NESTING {
        nested = VariantValue::Array(vec![nested]);
    }
    assert_eq!(nested.to_variant().to_value().expect("within limit"), nested);

    let too_deep = VariantValue::Array(vec![nested]);
    assert!(too_deep.to_variant().to_value().is_err());
    expect_no_errors();
}

#[test]
fn variant_of_unbridged_type() {
    let _guard = serial();
    ensure_loaded();

    let variant = loopback::variant_with_raw_type(200);
    assert!(!variant.is_nil());
    assert_eq!(variant.get_type(), VariantType::Nil);

    let err = variant.try_get_type().expect_err("type is not bridged");
    assert!(err.to_string().contains("variant type 200 is not supported"), "{err}");

    assert!(variant.to_value().is_err());
    assert!(variant.try_to::<i64>().is_err());
    let err = variant.try_to::<()>().expect_err("not nil");
    assert!(err.to_string().contains("not supported"), "{err}");

    let debug = format!("{variant:?}");
    assert!(debug.contains("type=200"), "{debug}");

    drop(variant);
    expect_no_errors();
}

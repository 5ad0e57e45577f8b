/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::meta::{try_class_ptrcall, Signature};
use gdbridge::prelude::*;
use gdbridge::sys::{self, ArgumentMetadata, GodotFfi, SlotType};
use itest::framework::{ensure_loaded, expect_no_errors, expect_panic, serial};
use itest::loopback;

fn loopback_check() -> &'static sys::MethodBinding {
    sys::method_table().resolve("Object", "loopback_check")
}

#[test]
fn method_table_is_frozen_at_load() {
    let _guard = serial();
    ensure_loaded();

    assert!(sys::tables_loaded());

    let table = sys::method_table();
    assert!(!table.is_empty());

    let binding = loopback_check();
    assert_eq!(binding.class_name(), "Object");
    assert_eq!(binding.method_name(), "loopback_check");
    assert_eq!(binding.spec().hash, 1001);
    assert_eq!(binding.layout().param_count(), 2);

    // Builtin methods are keyed by the type name.
    let size = table.resolve("Array", "size");
    assert!(matches!(size.spec().kind, sys::MethodKind::Builtin(VariantType::Array)));
}

#[test]
fn outbound_call_encodes_arguments() {
    let _guard = serial();
    ensure_loaded();

    let object = Node::new_alloc();
    let native_before = loopback::live_native_count();
    let handles_before = sys::handles().len();

    let call = |value: i64, text: &str| {
        // SAFETY: `object` is alive, and `loopback_check` is declared on `Object`.
        unsafe { Signature::<(i64, &str), bool>::out_class_ptrcall(loopback_check(), object.obj_sys(), (value, text)) }
    };

    assert!(call(42, "hello").expect("call succeeds"));
    assert!(!call(41, "hello").expect("call succeeds"));
    assert!(!call(42, "hellO").expect("call succeeds"));

    // The temporary string arguments were released, and arguments never occupy handles.
    assert_eq!(loopback::live_native_count(), native_before);
    assert_eq!(sys::handles().len(), handles_before);

    object.free();
    expect_no_errors();
}

#[test]
fn outbound_call_refuses_mismatched_arguments() {
    let _guard = serial();
    ensure_loaded();

    let object = Node::new_alloc();
    let ptr = object.obj_sys();

    // i32 carries different metadata than the declared 64-bit int.
    let err = unsafe { Signature::<(i32, &str), bool>::out_class_ptrcall(loopback_check(), ptr, (42, "hello")) }
        .expect_err("width mismatch");
    assert_eq!(err.method_name(), "loopback_check");
    assert!(err.to_string().contains("parameter `value`"), "{err}");

    let err = unsafe { Signature::<(i64, bool), bool>::out_class_ptrcall(loopback_check(), ptr, (42, true)) }
        .expect_err("type mismatch");
    assert!(err.to_string().contains("parameter `text`"), "{err}");

    let err = unsafe { Signature::<(i64,), bool>::out_class_ptrcall(loopback_check(), ptr, (42,)) }
        .expect_err("missing argument without default");
    assert!(err.to_string().contains("has no default"), "{err}");

    let err = unsafe {
        Signature::<(i64, &str, bool), bool>::out_class_ptrcall(loopback_check(), ptr, (42, "hello", true))
    }
    .expect_err("too many arguments");
    assert!(err.to_string().contains("declares 2 parameter(s)"), "{err}");

    // Return slot read as a different type.
    let err = unsafe { Signature::<(i64, &str), i64>::out_class_ptrcall(loopback_check(), ptr, (42, "hello")) }
        .expect_err("return type mismatch");
    assert!(err.to_string().contains("return type is declared as"), "{err}");

    object.free();
    expect_no_errors();
}

#[test]
fn outbound_call_to_unbound_method_fails_fast() {
    let _guard = serial();
    ensure_loaded();

    let object = Node::new_alloc();

    let result = unsafe { try_class_ptrcall::<(), bool>("Object", "is_queued_for_deletion", object.obj_sys(), ()) };
    let err = result.expect_err("method was never declared");
    assert_eq!(err.class_name(), "Object");
    assert!(err.to_string().contains("not in the method table"), "{err}");

    expect_panic("resolve() of undeclared method", || {
        sys::method_table().resolve("Node", "queue_free");
    });

    object.free();
}

#[test]
fn frame_fills_declared_defaults() {
    let _guard = serial();
    ensure_loaded();

    let node = Node::new_alloc();
    let binding = sys::method_table().resolve("Node", "get_child_count");
    assert_eq!(binding.spec().required_params(), 0);

    let mut frame = sys::CallFrame::new(binding);
    assert!(frame.is_empty());
    frame.fill_defaults().expect("include_internal has a default");
    assert_eq!(frame.len(), 1);

    // SAFETY: `node` is alive; the return slot holds an int afterwards.
    let count = unsafe {
        frame.ptrcall(node.obj_sys());
        frame.take_return::<i64>()
    };
    assert_eq!(count, 0);

    node.free();
}

#[test]
fn frame_encodes_explicit_arguments() {
    let _guard = serial();
    ensure_loaded();

    let node = Node::new_alloc();
    let binding = loopback_check();

    let value = 42_i64;
    let text = GString::from("hello");

    let mut frame = sys::CallFrame::new(binding);
    // SAFETY: both values outlive the call.
    let ok = unsafe {
        frame.push(&value, ArgumentMetadata::None).expect("int matches");
        frame
            .push_arg(SlotType::Value(VariantType::String), ArgumentMetadata::None, text.sys_const())
            .expect("string matches");

        frame.ptrcall(node.obj_sys());
        frame.take_return::<bool>()
    };
    assert!(ok);

    node.free();
}

#[test]
fn frame_encodes_variant_arguments() {
    let _guard = serial();
    ensure_loaded();

    let mut node = Node::new_alloc();
    let name = StringName::from("tag");
    let value = Variant::from(GString::from("blue"));

    let set_meta = sys::method_table().resolve("Object", "set_meta");
    let mut frame = sys::CallFrame::new(set_meta);
    // SAFETY: `name` and `value` outlive the call; `node` is alive.
    unsafe {
        frame.push(&name, ArgumentMetadata::None).expect("name matches");
        frame.push(&value, ArgumentMetadata::None).expect("variant matches");
        frame.ptrcall(node.obj_sys());
    }
    drop(frame);

    assert_eq!(node.get_meta("tag").to::<GString>(), GString::from("blue"));

    // A variant never fits a typed slot.
    let is_class = sys::method_table().resolve("Object", "is_class");
    let mut frame = sys::CallFrame::new(is_class);
    let err = unsafe { frame.push(&value, ArgumentMetadata::None) }.expect_err("variant into string slot");
    assert!(matches!(
        err,
        sys::FrameError::TypeMismatch {
            actual: (SlotType::Variant, _),
            ..
        }
    ));
    drop(frame);

    node.set_meta("tag", &Variant::nil());
    node.free();
    expect_no_errors();
}

#[test]
fn frame_constructs_and_releases_return_values() {
    let _guard = serial();
    ensure_loaded();

    let mut dict = Dictionary::new();
    dict.set("key", 1_i64);
    let mut node = Node::new_alloc();
    node.set_meta("tag", &Variant::from(GString::from("blue")));
    let native_before = loopback::live_native_count();

    // The engine assigns over the default constructed in the return slot, releasing it.
    for _ in 0..3 {
        assert_eq!(dict.keys_array().len(), 1);
        assert_eq!(dict.values_array().len(), 1);
        assert_eq!(dict.duplicate_shallow().len(), 1);
        assert_eq!(node.get_class(), GString::from("Node"));
        assert_eq!(node.get_meta("tag").to::<GString>(), GString::from("blue"));
    }
    assert_eq!(loopback::live_native_count(), native_before);

    // A result nobody takes is destroyed with the frame.
    let keys = sys::method_table().resolve("Dictionary", "keys");
    let mut frame = sys::CallFrame::new(keys);
    // SAFETY: `dict` is a live dictionary.
    unsafe { frame.ptrcall(dict.sys_mut()) };
    drop(frame);

    let get_meta = sys::method_table().resolve("Object", "get_meta");
    let name = StringName::from("tag");
    let mut frame = sys::CallFrame::new(get_meta);
    // SAFETY: `name` outlives the call; `node` is alive.
    unsafe {
        frame.push(&name, ArgumentMetadata::None).expect("name matches");
        frame.fill_defaults().expect("default is nil");
        frame.ptrcall(node.obj_sys());
    }
    drop(frame);

    assert_eq!(loopback::live_native_count(), native_before);

    node.set_meta("tag", &Variant::nil());
    node.free();
    drop(dict);
    expect_no_errors();
}

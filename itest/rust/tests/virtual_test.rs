/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_void;
use std::ptr;

use gdbridge::prelude::*;
use gdbridge::registry::{live_instance_count, virtual_state, VirtualState};
use gdbridge::sys::{self, GodotFfi};
use itest::framework::{ensure_loaded, expect_error_logged, expect_no_errors, serial};
use itest::{loopback, register_errors, Counter, PropertyBag, VirtualRecorder};

fn arg<T>(value: &T) -> sys::GDExtensionConstTypePtr {
    (value as *const T).cast::<c_void>()
}

/// Calls `_process(delta)` on the recorder, as the engine's main loop would.
fn process(recorder: &Gd<VirtualRecorder>, delta: f64) -> bool {
    // SAFETY: `_process` takes one float and returns nothing.
    unsafe { loopback::call_virtual(recorder.obj_sys(), "_process", &[arg(&delta)], ptr::null_mut()) }
}

#[test]
fn virtual_process_receives_argument() {
    let _guard = serial();
    ensure_loaded();

    let recorder = VirtualRecorder::new_alloc();
    assert!(process(&recorder, 0.5));
    assert!(process(&recorder, 0.25));

    assert_eq!(recorder.bind().deltas, [0.5, 0.25]);
    assert_eq!(virtual_state("VirtualRecorder", "_process"), VirtualState::Invoked);

    recorder.free();
    expect_no_errors();
}

#[test]
fn virtual_without_override_is_not_dispatched() {
    let _guard = serial();
    ensure_loaded();

    let recorder = VirtualRecorder::new_alloc();

    // Declared by the engine, but not overridden.
    let delta = 1.0_f64;
    let dispatched =
        unsafe { loopback::call_virtual(recorder.obj_sys(), "_physics_process", &[arg(&delta)], ptr::null_mut()) };
    assert!(!dispatched);
    assert_eq!(virtual_state("VirtualRecorder", "_physics_process"), VirtualState::Unregistered);

    // Engine classes have no overrides at all.
    let node = Node::new_alloc();
    let dispatched = unsafe { loopback::call_virtual(node.obj_sys(), "_process", &[arg(&delta)], ptr::null_mut()) };
    assert!(!dispatched);

    node.free();
    recorder.free();
}

#[test]
fn virtual_return_value() {
    let _guard = serial();
    ensure_loaded();

    let mut recorder = VirtualRecorder::new_alloc();
    recorder.bind_mut().warnings = vec!["no shape".to_string(), "no texture".to_string()];

    let mut warnings = PackedStringArray::new();
    let dispatched =
        unsafe { loopback::call_virtual(recorder.obj_sys(), "_get_configuration_warnings", &[], warnings.sys_mut()) };
    assert!(dispatched);
    assert_eq!(warnings.to_vec(), [GString::from("no shape"), GString::from("no texture")]);

    recorder.free();
    expect_no_errors();
}

#[test]
fn virtual_panic_is_reported_and_contained() {
    let _guard = serial();
    ensure_loaded();

    let mut recorder = VirtualRecorder::new_alloc();
    recorder.bind_mut().broken = true;

    let mut warnings = PackedStringArray::from([GString::from("untouched")]);
    let dispatched =
        unsafe { loopback::call_virtual(recorder.obj_sys(), "_get_configuration_warnings", &[], warnings.sys_mut()) };
    assert!(dispatched);

    // The return slot keeps what the engine put there.
    assert_eq!(warnings.to_vec(), [GString::from("untouched")]);

    let errors = loopback::take_errors();
    assert!(errors.iter().any(|e| e.contains("Rust function panicked")), "{errors:#?}");
    assert!(errors.iter().any(|e| e.contains("VirtualRecorder::_get_configuration_warnings")), "{errors:#?}");
    assert!(errors.iter().any(|e| e.contains("recorder is broken")), "{errors:#?}");

    // The instance is still usable afterwards.
    recorder.bind_mut().broken = false;
    assert!(process(&recorder, 1.0));

    recorder.free();
}

#[test]
fn virtual_call_while_bound_is_refused() {
    let _guard = serial();
    ensure_loaded();

    let recorder = VirtualRecorder::new_alloc();
    {
        let _bound = recorder.bind();
        assert!(process(&recorder, 2.0));
    }
    expect_error_logged("Rust function panicked");

    assert!(recorder.bind().deltas.is_empty());
    recorder.free();
}

#[test]
fn virtual_notification_and_predelete() {
    let _guard = serial();
    ensure_loaded();

    let recorder = VirtualRecorder::new_alloc();
    let id = recorder.instance_id();
    let instances = live_instance_count();

    let what = 42_i64;
    let dispatched = unsafe { loopback::call_virtual(recorder.obj_sys(), "_notification", &[arg(&what)], ptr::null_mut()) };
    assert!(dispatched);
    assert_eq!(recorder.bind().notifications, [42]);
    assert!(!VirtualRecorder::was_predeleted(id));

    recorder.free();
    assert!(VirtualRecorder::was_predeleted(id));
    assert_eq!(live_instance_count(), instances - 1);
    expect_no_errors();
}

#[test]
fn virtual_tree_callbacks() {
    let _guard = serial();
    ensure_loaded();

    let mut parent = Node::new_alloc();
    let recorder = VirtualRecorder::new_alloc();

    parent.add_child(&recorder);
    {
        let recorder = recorder.bind();
        assert_eq!(recorder.enter_tree_calls, 1);
        assert_eq!(recorder.ready_calls, 1);
        assert_eq!(recorder.base().to_gd().get_parent().expect("parent"), parent);
    }

    parent.remove_child(&recorder);
    parent.add_child(&recorder);
    {
        let recorder = recorder.bind();
        assert_eq!(recorder.exit_tree_calls, 1);
        assert_eq!(recorder.enter_tree_calls, 2);

        // `_ready` runs only the first time.
        assert_eq!(recorder.ready_calls, 1);
    }

    let id = recorder.instance_id();
    parent.free();
    assert!(!recorder.is_instance_valid());
    assert!(VirtualRecorder::was_predeleted(id));
    expect_no_errors();
}

#[test]
fn virtual_property_hooks() {
    let _guard = serial();
    ensure_loaded();

    let bag = PropertyBag::new_gd();
    let obj = bag.obj_sys();

    let set = |name: &str, value: Variant| -> bool {
        let name = StringName::from(name);
        let mut handled = false;
        // SAFETY: `_set` takes a StringName and a Variant, and returns bool.
        let dispatched = unsafe {
            loopback::call_virtual(obj, "_set", &[name.sys_const(), value.sys_const()], (&mut handled as *mut bool).cast())
        };
        assert!(dispatched);
        handled
    };

    assert!(set("custom_speed", Variant::from(3.5_f64)));
    assert!(!set("speed", Variant::from(1.0_f64)));
    assert_eq!(bag.bind().len(), 1);

    let name = StringName::from("custom_speed");
    let mut value = Variant::nil();
    let dispatched = unsafe { loopback::call_virtual(obj, "_get", &[name.sys_const()], value.sys_mut()) };
    assert!(dispatched);
    assert_eq!(value, Variant::from(3.5_f64));

    let mut text = GString::new();
    let dispatched = unsafe { loopback::call_virtual(obj, "_to_string", &[], text.sys_mut()) };
    assert!(dispatched);
    assert_eq!(text.to_string(), format!("PropertyBag(1 values, #{})", bag.instance_id()));

    assert_eq!(virtual_state("ItestPropertyBag", "_get"), VirtualState::Invoked);
    assert_eq!(virtual_state("ItestPropertyBag", "_setup_local_to_scene"), VirtualState::Unregistered);
    expect_no_errors();
}

#[test]
fn virtual_state_per_class() {
    let _guard = serial();
    ensure_loaded();

    // Other tests may already have invoked `_ready`.
    assert_ne!(virtual_state("VirtualRecorder", "_ready"), VirtualState::Unregistered);
    assert_eq!(virtual_state("Counter", "_ready"), VirtualState::Unregistered);
    assert_eq!(virtual_state("NotAClass", "_ready"), VirtualState::Unregistered);

    let counter = Counter::new_gd();
    assert_eq!(counter.bind().value, 0);
}

#[test]
fn invalid_overrides_are_rejected_at_registration() {
    let _guard = serial();
    ensure_loaded();

    let errors = register_errors();
    assert_eq!(errors.len(), 4, "{errors:#?}");

    match &errors[0] {
        RegisterError::SignatureMismatch {
            class,
            method,
            expected,
            actual,
        } => {
            assert_eq!((*class, *method), ("WrongSignature", "_process"));
            assert_ne!(expected, actual);
        }
        other => panic!("expected signature mismatch, got {other:?}"),
    }

    assert_eq!(
        errors[1],
        RegisterError::UnknownVirtual {
            class: "UnknownVirtual",
            method: "_physics_tick"
        }
    );
    assert_eq!(
        errors[2],
        RegisterError::DuplicateVirtual {
            class: "DuplicateVirtual",
            method: "_ready"
        }
    );
    assert_eq!(errors[3], RegisterError::AlreadyRegistered { class: "VirtualRecorder" });

    // Failed classes never reach the engine.
    for class in ["WrongSignature", "UnknownVirtual", "DuplicateVirtual"] {
        assert!(!loopback::is_class_registered(class), "{class}");
        assert_eq!(virtual_state(class, "_ready"), VirtualState::Unregistered);
    }
    assert!(loopback::is_class_registered("VirtualRecorder"));
}

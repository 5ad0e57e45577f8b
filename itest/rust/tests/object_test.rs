/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdbridge::builtin::VariantValue;
use gdbridge::prelude::*;
use gdbridge::registry::live_instance_count;
use gdbridge::sys::{self, HandleError, Ownership};
use itest::framework::{ensure_loaded, expect_error_logged, expect_no_errors, expect_panic, serial};
use itest::{loopback, Counter, PropertyBag, VirtualRecorder};

#[test]
fn object_new_and_free() {
    let _guard = serial();
    ensure_loaded();

    let objects_before = loopback::live_object_count();
    let handles_before = sys::handles().len();

    let node = Node::new_alloc();
    assert!(node.is_instance_valid());
    assert_eq!(node.ownership(), Ownership::Owned);
    assert!(!node.instance_id().is_ref_counted());
    assert_eq!(loopback::live_object_count(), objects_before + 1);
    assert_eq!(sys::handles().len(), handles_before + 1);

    node.free();
    assert_eq!(loopback::live_object_count(), objects_before);
    assert_eq!(sys::handles().len(), handles_before);

    expect_no_errors();
}

#[test]
fn object_dropped_when_owned() {
    let _guard = serial();
    ensure_loaded();

    let before = loopback::live_object_count();
    {
        let _node = Node2D::new_alloc();
        assert_eq!(loopback::live_object_count(), before + 1);
    }
    assert_eq!(loopback::live_object_count(), before);
}

#[test]
fn object_view_after_free() {
    let _guard = serial();
    ensure_loaded();

    let node = Node::new_alloc();
    let id = node.instance_id();
    let view = node.clone();
    assert_eq!(view.ownership(), Ownership::Borrowed);
    assert_eq!(view, node);

    let handle = node.handle();
    node.free();

    // The freed handle is gone from the table; the view stays, but reports the dead object.
    assert!(matches!(sys::handles().get(handle), Err(HandleError::Stale(_))));
    assert!(!view.is_instance_valid());
    assert_eq!(view.instance_id(), id);

    expect_panic("method call on freed object", || {
        view.get_name();
    });
    expect_panic("free() on freed object", || {
        view.clone().free();
    });

    assert!(Gd::<Node>::try_from_instance_id(id).is_err());
}

#[test]
fn object_from_instance_id() {
    let _guard = serial();
    ensure_loaded();

    let node = Node2D::new_alloc();
    let id = node.instance_id();

    let found = Gd::<Node2D>::from_instance_id(id);
    assert_eq!(found, node);
    assert_eq!(found.ownership(), Ownership::Borrowed);

    // Wrong class.
    assert!(Gd::<Resource>::try_from_instance_id(id).is_err());

    drop(found);
    assert!(node.is_instance_valid());
    node.free();

    assert!(InstanceId::try_from_i64(0).is_none());
}

#[test]
fn object_class_and_meta() {
    let _guard = serial();
    ensure_loaded();

    let mut node = Node2D::new_alloc();
    assert_eq!(node.get_class(), "Node2D");
    assert!(node.is_class("Node"));
    assert!(node.is_class("Object"));
    assert!(!node.is_class("Resource"));

    assert!(!node.has_meta("score"));
    assert_eq!(node.get_meta_ex("score", &Variant::from(-1_i64)), Variant::from(-1_i64));

    node.set_meta("score", &Variant::from(99_i64));
    node.set_meta("tags", &Variant::from(Array::from_slice(&["a", "b"])));
    assert!(node.has_meta("score"));
    assert_eq!(node.get_meta("score").to::<i64>(), 99);
    assert_eq!(node.get_meta("tags").to::<Vec<String>>(), ["a", "b"]);

    // Nil removes the entry.
    node.set_meta("score", &Variant::nil());
    assert!(!node.has_meta("score"));
    assert!(node.get_meta("score").is_nil());

    node.free();
    expect_no_errors();
}

#[test]
fn object_in_variant() {
    let _guard = serial();
    ensure_loaded();

    let node = Node::new_alloc();
    let variant = node.to_variant();
    assert_eq!(variant.get_type(), VariantType::Object);
    assert_eq!(variant.to_value().expect("to_value()"), VariantValue::Object(Some(node.instance_id())));

    let back = variant.to::<Gd<Node>>();
    assert_eq!(back, node);
    assert!(variant.try_to::<Gd<Node2D>>().is_err());

    drop(back);
    node.free();
    assert_eq!(variant.stringify(), "<Freed Object>");
    assert!(variant.try_to::<Gd<Node>>().is_err());
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Casting

#[test]
fn object_upcast_downcast() {
    let _guard = serial();
    ensure_loaded();

    let node2d = Node2D::new_alloc();
    let id = node2d.instance_id();

    let node: Gd<Node> = node2d.upcast();
    assert_eq!(node.instance_id(), id);
    assert_eq!(node.ownership(), Ownership::Owned);

    let object: Gd<Object> = node.upcast();
    let node = object.cast::<Node>();
    let node2d = node.try_cast::<Node2D>().expect("Node2D -> Node -> Node2D");
    assert_eq!(node2d.instance_id(), id);
    node2d.free();

    let plain = Node::new_alloc();
    let plain = plain.try_cast::<Node2D>().expect_err("plain Node is not a Node2D");
    assert!(plain.is_instance_valid());

    expect_panic("cast to unrelated class", || {
        let _ = plain.clone().upcast::<Object>().cast::<RefCounted>();
    });
    plain.free();
}

#[test]
fn object_cast_to_user_class() {
    let _guard = serial();
    ensure_loaded();

    let recorder = VirtualRecorder::new_alloc();
    let node: Gd<Node> = recorder.upcast();
    assert_eq!(node.get_class(), "VirtualRecorder");
    assert!(node.is_class("VirtualRecorder"));

    let recorder = node.cast::<VirtualRecorder>();
    assert!(recorder.bind().deltas.is_empty());
    recorder.free();
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Reference counting

#[test]
fn refcounted_counts() {
    let _guard = serial();
    ensure_loaded();

    let before = loopback::live_object_count();

    let object = RefCounted::new_gd();
    assert_eq!(object.ownership(), Ownership::RefCounted);
    assert!(object.instance_id().is_ref_counted());
    assert_eq!(object.get_reference_count(), 1);

    let second = object.clone();
    assert_eq!(object.get_reference_count(), 2);
    assert_eq!(second.ownership(), Ownership::RefCounted);

    let variant = object.to_variant();
    assert_eq!(object.get_reference_count(), 3);
    drop(variant);

    drop(second);
    assert_eq!(object.get_reference_count(), 1);
    assert_eq!(loopback::live_object_count(), before + 1);

    drop(object);
    assert_eq!(loopback::live_object_count(), before);
}

#[test]
fn refcounted_free_panics() {
    let _guard = serial();
    ensure_loaded();

    let object = RefCounted::new_gd();
    expect_panic("free() on ref-counted object", || {
        object.clone().free();
    });
    assert_eq!(object.get_reference_count(), 1);
}

#[test]
fn refcounted_user_instance_dropped_with_last_reference() {
    let _guard = serial();
    ensure_loaded();

    let dropped = Counter::dropped();
    let instances = live_instance_count();

    let mut counter = Counter::new_gd();
    counter.bind_mut().value = 5;
    assert_eq!(live_instance_count(), instances + 1);

    let from_base = counter.bind().to_gd();
    assert_eq!(from_base, counter);
    assert_eq!(counter.get_reference_count(), 2);
    assert_eq!(from_base.bind().value, 5);

    drop(counter);
    assert_eq!(Counter::dropped(), dropped);

    drop(from_base);
    assert_eq!(Counter::dropped(), dropped + 1);
    assert_eq!(live_instance_count(), instances);
}

#[test]
fn bind_conflicts_panic() {
    let _guard = serial();
    ensure_loaded();

    let mut counter = Counter::new_gd();
    let alias = counter.clone();

    let read = alias.bind();
    expect_panic("bind_mut() while bound", || {
        let _write = counter.bind_mut();
    });
    drop(read);

    counter.bind_mut().value += 1;
    assert_eq!(alias.bind().value, 1);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Resources

#[test]
fn resource_name_and_duplicate() {
    let _guard = serial();
    ensure_loaded();

    let mut resource = Resource::new_gd();
    assert_eq!(resource.get_name(), "");

    resource.set_name("original");
    let copy = resource.duplicate();
    assert_ne!(copy, resource);
    assert_eq!(copy.get_name(), "original");
    assert_eq!(copy.get_reference_count(), 1);
    assert_eq!(copy.get_class(), "Resource");

    let copy = resource.duplicate_ex(true);
    assert_eq!(copy.get_name(), "original");
}

#[test]
fn resource_duplicate_user_class() {
    let _guard = serial();
    ensure_loaded();

    let mut bag = PropertyBag::new_gd();
    bag.set_name("bag");

    let copy = bag.duplicate();
    assert_eq!(copy.get_class(), "ItestPropertyBag");

    let copy = copy.cast::<PropertyBag>();
    assert_eq!(copy.get_name(), "bag");
    assert!(copy.bind().is_empty());
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scene tree ownership

#[test]
fn node_add_child_transfers_ownership() {
    let _guard = serial();
    ensure_loaded();

    let before = loopback::live_object_count();

    let mut parent = Node::new_alloc();
    let child = Node2D::new_alloc();
    parent.add_child(&child);

    assert_eq!(child.ownership(), Ownership::Borrowed);
    assert_eq!(parent.get_child_count(), 1);
    assert_eq!(child.get_parent().expect("parent"), parent);
    assert_eq!(parent.get_child(0).expect("child 0").instance_id(), child.instance_id());
    assert!(parent.get_child(1).is_none());

    // The parent takes the child with it.
    parent.free();
    assert!(!child.is_instance_valid());
    drop(child);

    assert_eq!(loopback::live_object_count(), before);
    expect_no_errors();
}

#[test]
fn node_remove_child_returns_ownership() {
    let _guard = serial();
    ensure_loaded();

    let before = loopback::live_object_count();

    let mut parent = Node::new_alloc();
    let child = Node::new_alloc();
    parent.add_child(&child);
    parent.remove_child(&child);

    assert_eq!(child.ownership(), Ownership::Owned);
    assert_eq!(parent.get_child_count(), 0);
    assert!(child.get_parent().is_none());

    parent.free();
    assert!(child.is_instance_valid());

    drop(child);
    assert_eq!(loopback::live_object_count(), before);
}

#[test]
fn node_internal_children() {
    let _guard = serial();
    ensure_loaded();

    let mut parent = Node::new_alloc();
    let regular = Node::new_alloc();
    let front = Node2D::new_alloc();
    let back = Node::new_alloc();

    parent.add_child(&regular);
    parent.add_child_ex(&back, false, InternalMode::Back);
    parent.add_child_ex(&front, false, InternalMode::Front);

    assert_eq!(parent.get_child_count(), 1);
    assert_eq!(parent.get_child_count_ex(true), 3);

    assert_eq!(parent.get_child(0).expect("regular child").instance_id(), regular.instance_id());
    assert_eq!(parent.get_child_ex(0, true).expect("front").instance_id(), front.instance_id());
    assert_eq!(parent.get_child_ex(2, true).expect("back").instance_id(), back.instance_id());

    parent.free();
    expect_no_errors();
}

#[test]
fn node_add_child_twice_is_an_engine_error() {
    let _guard = serial();
    ensure_loaded();

    let mut first = Node::new_alloc();
    let mut second = Node::new_alloc();
    let child = Node::new_alloc();

    first.add_child(&child);
    second.add_child(&child);
    expect_error_logged("already has a parent");

    assert_eq!(second.get_child_count(), 0);
    assert_eq!(child.get_parent().expect("parent"), first);

    first.free();
    second.free();
}

#[test]
fn node_refused_add_child_keeps_ownership() {
    let _guard = serial();
    ensure_loaded();

    let before = loopback::live_object_count();

    let node = Node::new_alloc();
    let mut view = node.clone();
    view.add_child(&node);
    expect_error_logged("as a child of itself");

    assert_eq!(node.ownership(), Ownership::Owned);
    assert!(node.get_parent().is_none());

    drop(view);
    drop(node);
    assert_eq!(loopback::live_object_count(), before);
}

#[test]
fn node_refused_remove_child_keeps_ownership() {
    let _guard = serial();
    ensure_loaded();

    let before = loopback::live_object_count();

    let mut first = Node::new_alloc();
    let mut second = Node::new_alloc();
    let child = Node::new_alloc();

    first.add_child(&child);
    second.remove_child(&child);
    expect_error_logged("not a child of this node");

    assert_eq!(child.ownership(), Ownership::Borrowed);

    // Dropping the handle leaves the child with its parent.
    drop(child);
    assert_eq!(first.get_child_count(), 1);

    first.free();
    second.free();
    assert_eq!(loopback::live_object_count(), before);
    expect_no_errors();
}

#[test]
fn node_name_and_2d_properties() {
    let _guard = serial();
    ensure_loaded();

    let mut node = Node2D::new_alloc();
    assert_eq!(node.get_name(), "Node2D");

    node.set_position(Vector2::new(3.0, -4.5));
    assert_eq!(node.get_position(), Vector2::new(3.0, -4.5));

    node.set_rotation(0.5);
    node.rotate(0.25);
    assert!((node.get_rotation() - 0.75).abs() < 1e-6);

    node.free();
}

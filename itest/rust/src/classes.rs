/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! User classes declared by the test library.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use gdbridge::prelude::*;
use gdbridge::sys::Global;

/// Instance IDs of recorders that received the pre-delete notification.
static PREDELETED: Global<Vec<i64>> = Global::default();

static COUNTERS_DROPPED: AtomicUsize = AtomicUsize::new(0);

/// Node that records every virtual call it receives.
pub struct VirtualRecorder {
    base: Base<Node>,
    pub deltas: Vec<f64>,
    pub ready_calls: u32,
    pub enter_tree_calls: u32,
    pub exit_tree_calls: u32,
    pub notifications: Vec<i32>,
    pub warnings: Vec<String>,

    /// Makes `_get_configuration_warnings` panic.
    pub broken: bool,
}

declare_class!(VirtualRecorder: Node);

impl VirtualRecorder {
    pub fn base(&self) -> &Base<Node> {
        &self.base
    }

    /// Whether the recorder with this ID was notified before it was freed.
    pub fn was_predeleted(id: InstanceId) -> bool {
        PREDELETED.lock().contains(&id.to_i64())
    }
}

impl UserClass for VirtualRecorder {
    fn init(base: Base<Node>) -> Self {
        Self {
            base,
            deltas: Vec::new(),
            ready_calls: 0,
            enter_tree_calls: 0,
            exit_tree_calls: 0,
            notifications: Vec::new(),
            warnings: Vec::new(),
            broken: false,
        }
    }

    fn register(builder: &mut ClassBuilder<Self>) {
        builder
            .virtual_method("_process", |this: &mut Self, (delta,): (f64,)| {
                this.deltas.push(delta);
            })
            .virtual_method("_ready", |this: &mut Self, (): ()| {
                this.ready_calls += 1;
            })
            .virtual_method("_enter_tree", |this: &mut Self, (): ()| {
                this.enter_tree_calls += 1;
            })
            .virtual_method("_exit_tree", |this: &mut Self, (): ()| {
                this.exit_tree_calls += 1;
            })
            .virtual_method("_notification", |this: &mut Self, (what,): (i32,)| {
                this.notifications.push(what);
                if what == 1 {
                    PREDELETED.lock().push(this.base.instance_id().to_i64());
                }
            })
            .virtual_method("_get_configuration_warnings", |this: &mut Self, (): ()| {
                assert!(!this.broken, "recorder is broken");

                let mut warnings = PackedStringArray::new();
                for warning in &this.warnings {
                    warnings.push(GString::from(warning.as_str()));
                }
                warnings
            });
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Resource with dynamic properties: names starting with `custom_` are stored, all others are left to the engine.
pub struct PropertyBag {
    base: Base<Resource>,
    values: HashMap<String, Variant>,
}

declare_class!(PropertyBag: Resource, name = "ItestPropertyBag");

impl PropertyBag {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl UserClass for PropertyBag {
    fn init(base: Base<Resource>) -> Self {
        Self {
            base,
            values: HashMap::new(),
        }
    }

    fn register(builder: &mut ClassBuilder<Self>) {
        builder
            .virtual_method("_set", |this: &mut Self, (property, value): (StringName, Variant)| {
                let property = property.to_string();
                if !property.starts_with("custom_") {
                    return false;
                }

                this.values.insert(property, value);
                true
            })
            .virtual_method("_get", |this: &mut Self, (property,): (StringName,)| {
                this.values.get(&property.to_string()).cloned().unwrap_or_default()
            })
            .virtual_method("_to_string", |this: &mut Self, (): ()| {
                format!("PropertyBag({} values, #{})", this.values.len(), this.base.instance_id())
            });
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Ref-counted class without overrides; counts how many instances were dropped.
pub struct Counter {
    base: Base<RefCounted>,
    pub value: i64,
}

declare_class!(Counter: RefCounted);

impl Counter {
    pub fn dropped() -> usize {
        COUNTERS_DROPPED.load(Ordering::Acquire)
    }

    pub fn to_gd(&self) -> Gd<Counter> {
        self.base.to_gd().cast::<Counter>()
    }
}

impl UserClass for Counter {
    fn init(base: Base<RefCounted>) -> Self {
        Self { base, value: 0 }
    }
}

impl Drop for Counter {
    fn drop(&mut self) {
        COUNTERS_DROPPED.fetch_add(1, Ordering::AcqRel);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Classes whose registration fails

/// Overrides `_process(delta: float)` with a 32-bit float parameter.
pub struct WrongSignature {
    _base: Base<Node>,
}

declare_class!(WrongSignature: Node);

impl UserClass for WrongSignature {
    fn init(base: Base<Node>) -> Self {
        Self { _base: base }
    }

    fn register(builder: &mut ClassBuilder<Self>) {
        builder.virtual_method("_process", |_this: &mut Self, (_delta,): (f32,)| {});
    }
}

/// Overrides a method that no base class declares.
pub struct UnknownVirtual {
    _base: Base<Node>,
}

declare_class!(UnknownVirtual: Node);

impl UserClass for UnknownVirtual {
    fn init(base: Base<Node>) -> Self {
        Self { _base: base }
    }

    fn register(builder: &mut ClassBuilder<Self>) {
        builder.virtual_method("_physics_tick", |_this: &mut Self, (): ()| {});
    }
}

/// Overrides `_ready` twice.
pub struct DuplicateVirtual {
    _base: Base<Node>,
}

declare_class!(DuplicateVirtual: Node);

impl UserClass for DuplicateVirtual {
    fn init(base: Base<Node>) -> Self {
        Self { _base: base }
    }

    fn register(builder: &mut ClassBuilder<Self>) {
        builder
            .virtual_method("_ready", |_this: &mut Self, (): ()| {})
            .virtual_method("_ready", |_this: &mut Self, (): ()| {});
    }
}

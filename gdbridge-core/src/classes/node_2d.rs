/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use sys::{MethodSpec, ParamMeta, ReturnMeta, VariantType};

use crate::builtin::{real, Vector2};
use crate::classes::{Node, Object, REAL_METADATA};
use crate::meta::class_ptrcall;
use crate::obj::bounds::MemManual;
use crate::obj::{Gd, Inherits};
use crate::sys;

engine_class!(
    /// 2D game object, with a position and rotation relative to its parent.
    Node2D: Node,
    memory = MemManual,
    inherits = [Node, Object],
    virtuals = &[],
);

pub trait Node2DApi {
    fn set_position(&mut self, position: Vector2);
    fn get_position(&self) -> Vector2;

    /// Rotation in radians.
    fn set_rotation(&mut self, radians: real);
    fn get_rotation(&self) -> real;

    /// Adds `radians` to the current rotation.
    fn rotate(&mut self, radians: real);
}

impl<T: Inherits<Node2D>> Node2DApi for Gd<T> {
    fn set_position(&mut self, position: Vector2) {
        // SAFETY: `obj_sys()` checks that the object is alive; `T` inherits the method's class.
        unsafe { class_ptrcall("Node2D", "set_position", self.obj_sys(), (position,)) }
    }

    fn get_position(&self) -> Vector2 {
        unsafe { class_ptrcall("Node2D", "get_position", self.obj_sys(), ()) }
    }

    fn set_rotation(&mut self, radians: real) {
        unsafe { class_ptrcall("Node2D", "set_rotation", self.obj_sys(), (radians,)) }
    }

    fn get_rotation(&self) -> real {
        unsafe { class_ptrcall("Node2D", "get_rotation", self.obj_sys(), ()) }
    }

    fn rotate(&mut self, radians: real) {
        unsafe { class_ptrcall("Node2D", "rotate", self.obj_sys(), (radians,)) }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

pub(crate) static NODE_2D_METHODS: &[MethodSpec] = &[
    MethodSpec::class(
        "Node2D",
        "set_position",
        743155724,
        &[ParamMeta::value("position", VariantType::Vector2)],
        ReturnMeta::VOID,
    ),
    MethodSpec::class("Node2D", "get_position", 3341600327, &[], ReturnMeta::value(VariantType::Vector2)),
    MethodSpec::class(
        "Node2D",
        "set_rotation",
        373806689,
        &[ParamMeta::value("radians", VariantType::Float).with_metadata(REAL_METADATA)],
        ReturnMeta::VOID,
    ),
    MethodSpec::class(
        "Node2D",
        "get_rotation",
        1740695150,
        &[],
        ReturnMeta::value(VariantType::Float).with_metadata(REAL_METADATA),
    ),
    MethodSpec::class(
        "Node2D",
        "rotate",
        373806689,
        &[ParamMeta::value("radians", VariantType::Float).with_metadata(REAL_METADATA)],
        ReturnMeta::VOID,
    ),
];

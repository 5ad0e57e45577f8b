/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use sys::{ArgumentMetadata, DefaultArg, MethodSpec, Ownership, ParamMeta, ReturnMeta, SlotType, VariantType};

use crate::builtin::StringName;
use crate::classes::Object;
use crate::meta::error::{ConvertError, FromGodotError};
use crate::meta::{class_ptrcall, FromGodot, GodotConvert, ToGodot};
use crate::obj::bounds::MemManual;
use crate::obj::{Gd, Inherits, InstanceId};
use crate::registry::VirtualMethodSpec;
use crate::sys;

engine_class!(
    /// Element of the scene tree.
    ///
    /// Nodes are manually managed. A node without parent belongs to the `Gd` that created it; once added as a child, it belongs
    /// to its parent, which destroys it together with itself.
    Node: Object,
    memory = MemManual,
    inherits = [Object],
    virtuals = NODE_VIRTUALS,
);

/// Where [`NodeApi::add_child_ex()`] places a child among the parent's children.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum InternalMode {
    /// Regular child.
    #[default]
    Disabled,

    /// Internal child, before all regular children.
    Front,

    /// Internal child, after all regular children.
    Back,
}

impl GodotConvert for InternalMode {
    type Via = i64;
}

impl ToGodot for InternalMode {
    fn to_godot(&self) -> Self::Via {
        match self {
            Self::Disabled => 0,
            Self::Front => 1,
            Self::Back => 2,
        }
    }
}

impl FromGodot for InternalMode {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        match via {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Front),
            2 => Ok(Self::Back),
            other => Err(FromGodotError::InvalidEnum.into_error(other)),
        }
    }
}

pub trait NodeApi {
    fn get_name(&self) -> StringName;

    /// Adds `node` as the last regular child.
    ///
    /// The parent takes ownership: `node`'s handle becomes a borrowed view, and the child is destroyed with its parent.
    /// If the engine refuses the child (e.g. `node` is `self` or already has a parent), the handle keeps its ownership.
    ///
    /// # Panics
    /// If `node` is destroyed.
    fn add_child<C: Inherits<Node>>(&mut self, node: &Gd<C>);

    /// Like [`add_child()`](Self::add_child), with all parameters.
    fn add_child_ex<C: Inherits<Node>>(&mut self, node: &Gd<C>, force_readable_name: bool, internal: InternalMode);

    /// Removes the child `node`. Ownership returns to the `node` handle, which now destroys the node when dropped.
    ///
    /// If `node` is not a child of `self`, the engine reports an error and the handle stays a borrowed view.
    fn remove_child<C: Inherits<Node>>(&mut self, node: &Gd<C>);

    /// Number of regular children.
    fn get_child_count(&self) -> usize;

    fn get_child_count_ex(&self, include_internal: bool) -> usize;

    /// Regular child at `index`, or `None` if out of range. The child stays owned by `self`.
    fn get_child(&self, index: usize) -> Option<Gd<Node>>;

    fn get_child_ex(&self, index: usize, include_internal: bool) -> Option<Gd<Node>>;

    /// Parent node, or `None` for a root.
    fn get_parent(&self) -> Option<Gd<Node>>;
}

impl<T: Inherits<Node>> NodeApi for Gd<T> {
    fn get_name(&self) -> StringName {
        // SAFETY: `obj_sys()` checks that the object is alive; `T` inherits the method's class.
        unsafe { class_ptrcall("Node", "get_name", self.obj_sys(), ()) }
    }

    fn add_child<C: Inherits<Node>>(&mut self, node: &Gd<C>) {
        let child = node.clone().upcast::<Node>();
        unsafe { class_ptrcall::<_, ()>("Node", "add_child", self.obj_sys(), (child,)) };

        if parent_id(node) == Some(self.instance_id()) {
            node.transfer_to_engine();
        }
    }

    fn add_child_ex<C: Inherits<Node>>(&mut self, node: &Gd<C>, force_readable_name: bool, internal: InternalMode) {
        let child = node.clone().upcast::<Node>();
        let args = (child, force_readable_name, internal);
        unsafe { class_ptrcall::<_, ()>("Node", "add_child", self.obj_sys(), args) };

        if parent_id(node) == Some(self.instance_id()) {
            node.transfer_to_engine();
        }
    }

    fn remove_child<C: Inherits<Node>>(&mut self, node: &Gd<C>) {
        let was_child = parent_id(node) == Some(self.instance_id());

        let child = node.clone().upcast::<Node>();
        unsafe { class_ptrcall::<_, ()>("Node", "remove_child", self.obj_sys(), (child,)) };

        if was_child && parent_id(node).is_none() {
            node.reclaim_from_engine();
        }
    }

    fn get_child_count(&self) -> usize {
        let count: i32 = unsafe { class_ptrcall("Node", "get_child_count", self.obj_sys(), ()) };
        sys::int_to_usize(count.into())
    }

    fn get_child_count_ex(&self, include_internal: bool) -> usize {
        let count: i32 = unsafe { class_ptrcall("Node", "get_child_count", self.obj_sys(), (include_internal,)) };
        sys::int_to_usize(count.into())
    }

    fn get_child(&self, index: usize) -> Option<Gd<Node>> {
        let index = i32::try_from(index).ok()?;
        unsafe { class_ptrcall("Node", "get_child", self.obj_sys(), (index,)) }
    }

    fn get_child_ex(&self, index: usize, include_internal: bool) -> Option<Gd<Node>> {
        let index = i32::try_from(index).ok()?;
        unsafe { class_ptrcall("Node", "get_child", self.obj_sys(), (index, include_internal)) }
    }

    fn get_parent(&self) -> Option<Gd<Node>> {
        unsafe { class_ptrcall("Node", "get_parent", self.obj_sys(), ()) }
    }
}

/// The engine refuses invalid tree operations with an error and leaves the tree unchanged, so ownership follows the parent the
/// engine reports afterwards.
fn parent_id<C: Inherits<Node>>(node: &Gd<C>) -> Option<InstanceId> {
    node.get_parent().map(|parent| parent.instance_id())
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

const OBJECT: SlotType = SlotType::Value(VariantType::Object);

pub(crate) static NODE_METHODS: &[MethodSpec] = &[
    MethodSpec::class("Node", "get_name", 2002593661, &[], ReturnMeta::value(VariantType::StringName)),
    MethodSpec::class(
        "Node",
        "add_child",
        3863233950,
        &[
            ParamMeta::new("node", OBJECT),
            ParamMeta::value("force_readable_name", VariantType::Bool).with_default(DefaultArg::Bool(false)),
            ParamMeta::value("internal", VariantType::Int).with_default(DefaultArg::Int(0)),
        ],
        ReturnMeta::VOID,
    ),
    MethodSpec::class("Node", "remove_child", 1078189570, &[ParamMeta::new("node", OBJECT)], ReturnMeta::VOID),
    MethodSpec::class(
        "Node",
        "get_child_count",
        894402480,
        &[ParamMeta::value("include_internal", VariantType::Bool).with_default(DefaultArg::Bool(false))],
        ReturnMeta::value(VariantType::Int).with_metadata(ArgumentMetadata::IntIsInt32),
    ),
    MethodSpec::class(
        "Node",
        "get_child",
        541253412,
        &[
            ParamMeta::value("idx", VariantType::Int).with_metadata(ArgumentMetadata::IntIsInt32),
            ParamMeta::value("include_internal", VariantType::Bool).with_default(DefaultArg::Bool(false)),
        ],
        ReturnMeta::owned(OBJECT).with_ownership(Ownership::Borrowed),
    ),
    MethodSpec::class(
        "Node",
        "get_parent",
        3160264692,
        &[],
        ReturnMeta::owned(OBJECT).with_ownership(Ownership::Borrowed),
    ),
];

const NODE_VIRTUALS: &[VirtualMethodSpec] = &[
    VirtualMethodSpec::new("_ready", &[], ReturnMeta::VOID),
    VirtualMethodSpec::new("_process", &[ParamMeta::value("delta", VariantType::Float)], ReturnMeta::VOID),
    VirtualMethodSpec::new("_enter_tree", &[], ReturnMeta::VOID),
    VirtualMethodSpec::new("_exit_tree", &[], ReturnMeta::VOID),
    VirtualMethodSpec::new(
        "_get_configuration_warnings",
        &[],
        ReturnMeta::value(VariantType::PackedStringArray),
    ),
];

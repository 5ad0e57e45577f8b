/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Declares the marker type of an engine class, with its place in the hierarchy.
///
/// `inherits` lists all strict ancestors; the reflexive `Inherits<Self>` comes from a blanket impl.
macro_rules! engine_class {
    (
        $( #[$attr:meta] )*
        $Class:ident : $Base:ty,
        memory = $Memory:ty,
        inherits = [ $( $Ancestor:ty ),* ],
        virtuals = $virtuals:expr $(,)?
    ) => {
        $( #[$attr] )*
        ///
        /// Instances are only accessible through [`Gd`](crate::obj::Gd).
        pub struct $Class {
            _cannot_construct: (),
        }

        impl $crate::obj::GodotClass for $Class {
            type Base = $Base;
            type Memory = $Memory;

            const CLASS_NAME: &'static str = stringify!($Class);
            const VIRTUAL_METHODS: &'static [$crate::registry::VirtualMethodSpec] = $virtuals;
        }

        impl $crate::obj::EngineClass for $Class {}

        $(
            // SAFETY: the engine class hierarchy is fixed.
            unsafe impl $crate::obj::Inherits<$Ancestor> for $Class {}
        )*
    };
}

/// Implements `Inherits` of an engine class and all of its ancestors for a user class. Used by `declare_class!`.
#[macro_export]
#[doc(hidden)]
macro_rules! __inherits_engine_class {
    ($Derived:ty, Object) => {
        // SAFETY: `declare_class!` registers the class with this base.
        unsafe impl $crate::obj::Inherits<$crate::classes::Object> for $Derived {}
    };
    ($Derived:ty, RefCounted) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::RefCounted> for $Derived {}
        $crate::__inherits_engine_class!($Derived, Object);
    };
    ($Derived:ty, Resource) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::Resource> for $Derived {}
        $crate::__inherits_engine_class!($Derived, RefCounted);
    };
    ($Derived:ty, Node) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::Node> for $Derived {}
        $crate::__inherits_engine_class!($Derived, Object);
    };
    ($Derived:ty, Node2D) => {
        unsafe impl $crate::obj::Inherits<$crate::classes::Node2D> for $Derived {}
        $crate::__inherits_engine_class!($Derived, Node);
    };
}

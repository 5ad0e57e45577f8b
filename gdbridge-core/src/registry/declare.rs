/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Declares a Rust struct as a class that can be registered with the engine.
///
/// Implements [`GodotClass`](crate::obj::GodotClass) and the [`Inherits`](crate::obj::Inherits) chain up to `Object`. The base
/// must be an engine class. The class name defaults to the struct's name:
///
/// ```no_run
/// use gdbridge_core::classes::{Node, RefCounted};
/// use gdbridge_core::obj::Base;
///
/// struct Player {
///     base: Base<Node>,
/// }
/// gdbridge_core::declare_class!(Player: Node);
///
/// struct Inventory {
///     base: Base<RefCounted>,
/// }
/// gdbridge_core::declare_class!(Inventory: RefCounted, name = "PlayerInventory");
/// ```
///
/// The struct additionally needs an impl of [`UserClass`](crate::obj::UserClass), and is registered through
/// [`ClassRegistrar::register()`](crate::registry::ClassRegistrar::register).
#[macro_export]
macro_rules! declare_class {
    ($Class:ident : $Base:ident) => {
        $crate::declare_class!($Class: $Base, name = stringify!($Class));
    };
    ($Class:ident : $Base:ident, name = $name:expr) => {
        impl $crate::obj::GodotClass for $Class {
            type Base = $crate::classes::$Base;
            type Memory = <$crate::classes::$Base as $crate::obj::GodotClass>::Memory;

            const CLASS_NAME: &'static str = $name;
        }

        $crate::__inherits_engine_class!($Class, $Base);
    };
}

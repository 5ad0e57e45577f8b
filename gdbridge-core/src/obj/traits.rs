/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::obj::bounds::{MemManual, MemRefCounted, Memory};
use crate::obj::{Base, Gd};
use crate::registry::{ClassBuilder, VirtualMethodSpec};

/// Makes `T` eligible to be managed by the engine and stored in [`Gd<T>`][crate::obj::Gd] pointers.
///
/// Engine classes implement this through `engine_class!`, user classes through [`declare_class!`](crate::declare_class).
#[diagnostic::on_unimplemented(
    message = "only classes registered with the engine are allowed in this context",
    note = "you can use `declare_class!` to register your own structs"
)]
pub trait GodotClass: Sized + 'static {
    /// The immediate superclass of `T`. This is always an engine class, or [`NoBase`] for `Object`.
    type Base: GodotClass;

    /// Memory strategy, see [`bounds`](crate::obj::bounds).
    type Memory: Memory;

    /// Name under which the class is known in the engine's class database.
    const CLASS_NAME: &'static str;

    /// Virtual methods introduced by this class (not inherited ones).
    ///
    /// Only engine classes declare virtual methods; user classes override them.
    const VIRTUAL_METHODS: &'static [VirtualMethodSpec] = &[];

    /// Returns whether `Self` inherits from `Base`.
    ///
    /// This is reflexive, i.e `Self` inherits from itself.
    ///
    /// See also [`Inherits`] for a trait bound.
    fn inherits<Base: GodotClass>() -> bool {
        if Self::CLASS_NAME == Base::CLASS_NAME {
            true
        } else if Self::Base::CLASS_NAME == NoBase::CLASS_NAME {
            false
        } else {
            Self::Base::inherits::<Base>()
        }
    }

    /// Looks up a virtual method declared by this class or one of its ancestors.
    #[doc(hidden)]
    fn find_virtual(name: &str) -> Option<&'static VirtualMethodSpec> {
        Self::VIRTUAL_METHODS
            .iter()
            .find(|spec| spec.name == name)
            .or_else(|| Self::Base::find_virtual(name))
    }
}

/// Type representing the absence of a base class, at the root of the hierarchy.
///
/// `NoBase` is used as the base class for exactly one class: [`Object`][crate::classes::Object].
///
/// This is an enum without any variants, as we should never construct an instance of this class.
pub enum NoBase {}

impl GodotClass for NoBase {
    type Base = NoBase;
    type Memory = MemManual;

    const CLASS_NAME: &'static str = "";

    fn inherits<Base: GodotClass>() -> bool {
        false
    }

    fn find_virtual(_name: &str) -> Option<&'static VirtualMethodSpec> {
        None
    }
}

/// Non-strict inheritance relationship in the engine's class hierarchy.
///
/// `Derived: Inherits<Base>` means that either `Derived` is a subclass of `Base`, or the class `Base` itself (hence "non-strict").
///
/// Inheritance is transitive across indirect base classes: `Node2D` implements `Inherits<Node>` and `Inherits<Object>`.
/// The trait is also reflexive: `T` always implements `Inherits<T>`.
///
/// The capability traits of engine classes ([`NodeApi`](crate::classes::NodeApi), ...) are implemented for `Gd<T>` with
/// `T: Inherits<Node>`, so a `Gd<Node2D>` offers all `Node` methods without an upcast.
///
/// # Safety
///
/// This trait must only be implemented for subclasses of `Base`.
///
/// Importantly, this means it is always safe to upcast a value of type `Gd<Self>` to `Gd<Base>`.
pub unsafe trait Inherits<Base: GodotClass>: GodotClass {}

// SAFETY: Every class is a subclass of itself.
unsafe impl<T: GodotClass> Inherits<T> for T {}

/// Marker for classes provided by the engine, as opposed to user classes.
pub trait EngineClass: GodotClass {}

/// Implemented for all user-defined classes.
///
/// The engine creates the native part of the object (an instance of `Self::Base`); `init` then creates the Rust part, which
/// lives in the engine object for as long as the object does.
pub trait UserClass: GodotClass {
    /// Creates the Rust instance. `base` refers to the native object under construction.
    fn init(base: Base<Self::Base>) -> Self;

    /// Declares overrides of engine virtual methods. Runs once, while the class is registered.
    fn register(builder: &mut ClassBuilder<Self>) {
        let _ = builder;
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Construction

/// Extension trait for all manually managed classes.
pub trait NewAlloc: GodotClass {
    /// Instantiates a new object, owned by the returned `Gd`.
    ///
    /// The object is destroyed when the `Gd` is dropped, unless ownership is handed to the engine first (for example through
    /// [`NodeApi::add_child()`](crate::classes::NodeApi::add_child)). Clones are borrowed views that never destroy it.
    #[must_use]
    fn new_alloc() -> Gd<Self>;
}

impl<T: GodotClass<Memory = MemManual>> NewAlloc for T {
    fn new_alloc() -> Gd<Self> {
        Gd::construct()
    }
}

/// Extension trait for all reference-counted classes.
pub trait NewGd: GodotClass {
    /// Instantiates a new object, holding the first reference.
    fn new_gd() -> Gd<Self>;
}

impl<T: GodotClass<Memory = MemRefCounted>> NewGd for T {
    fn new_gd() -> Gd<Self> {
        Gd::construct()
    }
}

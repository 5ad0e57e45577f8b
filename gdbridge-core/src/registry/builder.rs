/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::meta::{CallContext, InParamTuple, Signature, ToGodot};
use crate::obj::{GodotClass, UserClass};
use crate::registry::{RegisterError, VirtualEntry};
use crate::sys;

/// Collects the virtual method overrides of a user class, while it is registered.
///
/// Passed to [`UserClass::register()`]. Each override is checked against the virtual method that an engine base class declares;
/// the first failed check aborts the registration of the class.
///
/// ```no_run
/// use gdbridge_core::classes::Node;
/// use gdbridge_core::obj::{Base, UserClass};
/// use gdbridge_core::registry::ClassBuilder;
///
/// struct Player {
///     base: Base<Node>,
///     ticks: u64,
/// }
///
/// gdbridge_core::declare_class!(Player: Node);
///
/// impl UserClass for Player {
///     fn init(base: Base<Node>) -> Self {
///         Self { base, ticks: 0 }
///     }
///
///     fn register(builder: &mut ClassBuilder<Self>) {
///         builder.virtual_method("_process", |this: &mut Self, (_delta,): (f64,)| {
///             this.ticks += 1;
///         });
///     }
/// }
/// ```
pub struct ClassBuilder<T: GodotClass> {
    virtuals: HashMap<&'static str, Box<VirtualEntry<T>>>,
    error: Option<RegisterError>,
    _c: PhantomData<T>,
}

impl<T: UserClass> ClassBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            virtuals: HashMap::new(),
            error: None,
            _c: PhantomData,
        }
    }

    /// Overrides the virtual method `name`, declared by an engine class that `T` inherits.
    ///
    /// Parameters arrive as a tuple, in declaration order. Their types must match the declaration exactly, including the
    /// width of numbers: an `int` declared as 32-bit needs `i32`, a plain `int` needs `i64`.
    pub fn virtual_method<P, R, F>(&mut self, name: &'static str, method: F) -> &mut Self
    where
        P: InParamTuple + 'static,
        R: ToGodot + 'static,
        F: Fn(&mut T, P) -> R + 'static,
    {
        if self.error.is_some() {
            return self;
        }

        if let Err(err) = self.try_add_virtual(name, method) {
            self.error = Some(err);
        }
        self
    }

    fn try_add_virtual<P, R, F>(&mut self, name: &'static str, method: F) -> Result<(), RegisterError>
    where
        P: InParamTuple + 'static,
        R: ToGodot + 'static,
        F: Fn(&mut T, P) -> R + 'static,
    {
        let Some(spec) = T::Base::find_virtual(name) else {
            return Err(RegisterError::UnknownVirtual {
                class: T::CLASS_NAME,
                method: name,
            });
        };

        let declared = spec.frame_signature();
        let actual = Signature::<P, R>::frame_signature();
        if declared != actual {
            return Err(RegisterError::SignatureMismatch {
                class: T::CLASS_NAME,
                method: name,
                expected: spec.to_string(),
                actual: format_signature(name, &actual),
            });
        }

        if self.virtuals.contains_key(name) {
            return Err(RegisterError::DuplicateVirtual {
                class: T::CLASS_NAME,
                method: name,
            });
        }

        let invoke = Box::new(
            move |instance: &mut T,
                  args: *const sys::GDExtensionConstTypePtr,
                  ret: sys::GDExtensionTypePtr,
                  call_ctx: &CallContext| {
                // SAFETY: the signature was checked against the engine's declaration above; the engine passes arguments and
                // return slot according to that declaration.
                unsafe { Signature::<P, R>::in_ptrcall(call_ctx, args, ret, |params| method(instance, params)) }
            },
        );

        self.virtuals.insert(name, Box::new(VirtualEntry::new(name, invoke)));
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<ClassData<T>, RegisterError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(ClassData {
                virtuals: self.virtuals,
            }),
        }
    }
}

/// Per-class data handed to the engine as class userdata.
///
/// Entries are boxed, so the pointers given out by `get_virtual_call_data` stay valid for as long as the class is registered.
pub(crate) struct ClassData<T> {
    virtuals: HashMap<&'static str, Box<VirtualEntry<T>>>,
}

impl<T> ClassData<T> {
    pub(crate) fn find_virtual(&self, name: &str) -> Option<&VirtualEntry<T>> {
        self.virtuals.get(name).map(|entry| &**entry)
    }

    pub(crate) fn virtuals(&self) -> impl Iterator<Item = &VirtualEntry<T>> {
        self.virtuals.values().map(|entry| &**entry)
    }
}

fn format_signature(
    name: &str,
    (params, ret): &(Vec<(sys::SlotType, sys::ArgumentMetadata)>, (sys::SlotType, sys::ArgumentMetadata)),
) -> String {
    let format_one = |(ty, metadata): &(sys::SlotType, sys::ArgumentMetadata)| match metadata.rust_type() {
        Some(rust_type) => format!("{ty} ({rust_type})"),
        None => ty.to_string(),
    };

    let params = sys::join_with(params.iter(), ", ", |param| format_one(param));
    if ret.0.is_void() {
        format!("{name}({params})")
    } else {
        format!("{name}({params}) -> {}", format_one(ret))
    }
}

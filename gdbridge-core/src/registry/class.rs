/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sys::{interface_fn, out, Global};

use crate::obj::{GodotClass, UserClass};
use crate::registry::{callbacks, ClassBuilder, ClassData, VirtualState};
use crate::sys;

/// Registered user classes, by name. Only used for bookkeeping; the engine calls back through the class userdata.
static CLASSES: Global<HashMap<&'static str, ClassRecord>> = Global::default();

struct ClassRecord {
    virtuals: HashMap<&'static str, Arc<AtomicBool>>,
}

/// Returns whether the user class `class` overrides the virtual method `method`, and whether the engine called it yet.
///
/// Classes that are not registered report [`VirtualState::Unregistered`] for every method.
pub fn virtual_state(class: &str, method: &str) -> VirtualState {
    let classes = CLASSES.lock();
    let invoked = classes.get(class).and_then(|record| record.virtuals.get(method));

    match invoked {
        None => VirtualState::Unregistered,
        Some(flag) if flag.load(Ordering::Acquire) => VirtualState::Invoked,
        Some(_) => VirtualState::Registered,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Failure to register a user class. The class is not registered with the engine.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RegisterError {
    /// No engine base class declares a virtual method of this name.
    UnknownVirtual { class: &'static str, method: &'static str },

    /// The override's parameter or return types differ from the declaration.
    SignatureMismatch {
        class: &'static str,
        method: &'static str,
        expected: String,
        actual: String,
    },

    DuplicateVirtual { class: &'static str, method: &'static str },

    AlreadyRegistered { class: &'static str },
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVirtual { class, method } => {
                write!(f, "{class}: no base class declares a virtual method `{method}`")
            }
            Self::SignatureMismatch {
                class,
                method,
                expected,
                actual,
            } => write!(
                f,
                "{class}: override of `{method}` has the wrong signature\n  expected: {expected}\n  actual:   {actual}"
            ),
            Self::DuplicateVirtual { class, method } => write!(f, "{class}: `{method}` is overridden twice"),
            Self::AlreadyRegistered { class } => write!(f, "class `{class}` is already registered"),
        }
    }
}

impl std::error::Error for RegisterError {}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Registers user classes with the engine, and unregisters them when the library is unloaded.
///
/// Obtained in [`ExtensionLibrary::register_classes()`](crate::init::ExtensionLibrary::register_classes).
pub struct ClassRegistrar {
    registered: Vec<RegisteredClass>,
}

struct RegisteredClass {
    name: &'static str,

    // Address of the boxed `ClassData<T>` given to the engine as class userdata.
    userdata: usize,
    drop_userdata: unsafe fn(usize),
}

impl ClassRegistrar {
    pub(crate) const fn new() -> Self {
        Self { registered: Vec::new() }
    }

    /// Registers `T` with the engine's class database, as a subclass of `T::Base`.
    ///
    /// Runs [`UserClass::register()`] to collect the overrides of virtual methods, and validates each of them against the
    /// engine class that declares the virtual method.
    pub fn register<T: UserClass>(&mut self) -> Result<(), RegisterError> {
        let class = T::CLASS_NAME;
        if CLASSES.lock().contains_key(class) {
            return Err(RegisterError::AlreadyRegistered { class });
        }

        let mut builder = ClassBuilder::<T>::new();
        T::register(&mut builder);
        let class_data = builder.finish()?;

        let virtuals = class_data
            .virtuals()
            .map(|entry| (entry.method_name(), entry.invoked_flag()))
            .collect();

        let userdata = Box::into_raw(Box::new(class_data));
        let info = sys::GDExtensionClassCreationInfo {
            is_virtual: false as sys::GDExtensionBool,
            is_abstract: false as sys::GDExtensionBool,
            create_instance_func: Some(callbacks::create_instance::<T>),
            free_instance_func: Some(callbacks::free_instance::<T>),
            get_virtual_call_data_func: Some(callbacks::get_virtual_call_data::<T>),
            call_virtual_with_data_func: Some(callbacks::call_virtual_with_data::<T>),
            class_userdata: userdata.cast(),
        };

        let class_name = sys::c_string(class);
        let parent_name = sys::c_string(T::Base::CLASS_NAME);
        out!("Register class:   {class} : {}", T::Base::CLASS_NAME);

        // SAFETY: strings and creation info are valid for the call; the engine copies them. The userdata stays valid until the
        // class is unregistered.
        unsafe {
            interface_fn!(classdb_register_extension_class)(
                sys::get_library(),
                class_name.as_ptr(),
                parent_name.as_ptr(),
                &info,
            )
        };

        CLASSES.lock().insert(class, ClassRecord { virtuals });
        self.registered.push(RegisteredClass {
            name: class,
            userdata: userdata as usize,
            drop_userdata: drop_class_data::<T>,
        });

        Ok(())
    }

    /// Names of the classes registered through this registrar, in registration order.
    pub fn registered_classes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registered.iter().map(|class| class.name)
    }

    /// Unregisters all classes, in reverse registration order (subclasses before their bases).
    pub(crate) fn unregister_all(&mut self) {
        for class in self.registered.drain(..).rev() {
            out!("Unregister class: {}", class.name);

            let class_name = sys::c_string(class.name);

            // SAFETY: the class was registered by this library, and no instances are left at this point.
            unsafe {
                interface_fn!(classdb_unregister_extension_class)(sys::get_library(), class_name.as_ptr());
                (class.drop_userdata)(class.userdata);
            }

            CLASSES.lock().remove(class.name);
        }
    }
}

unsafe fn drop_class_data<T>(userdata: usize) {
    drop(Box::from_raw(userdata as *mut ClassData<T>));
}

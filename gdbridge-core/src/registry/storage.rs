/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use sys::{out, Global};

use crate::obj::{GodotClass, InstanceId};
use crate::sys;

/// Rust instances alive in the engine, by instance ID: `(class name, address of the InstanceStorage)`.
///
/// Lets a `Gd<T>` find the Rust part of its object without asking the engine for the instance pointer.
static INSTANCES: Global<HashMap<u64, (&'static str, usize)>> = Global::default();

/// Rust part of an object whose class was declared in Rust.
///
/// The storage lives in a heap allocation owned by the engine object: it is created in the `create_instance` callback and
/// freed in `free_instance`, when the engine destroys the object.
pub(crate) struct InstanceStorage<T: GodotClass> {
    user_instance: RwLock<T>,
    instance_id: InstanceId,
}

impl<T: GodotClass> InstanceStorage<T> {
    pub(crate) fn construct(user_instance: T, instance_id: InstanceId) -> Self {
        out!("    Storage::construct             <{}>", T::CLASS_NAME);

        Self {
            user_instance: RwLock::new(user_instance),
            instance_id,
        }
    }

    pub(crate) fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Shared borrow of the user instance.
    ///
    /// # Panics
    /// If the instance is currently bound mutably. Bindings never block: the engine runs callbacks on the calling thread, so a
    /// blocking lock would deadlock on re-entrant calls.
    pub(crate) fn get(&self) -> RwLockReadGuard<'_, T> {
        match self.user_instance.try_read() {
            Ok(guard) => guard,
            // A panic in an earlier override was reported at the boundary; the instance itself is still usable.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => panic!(
                "Gd<{}>::bind() failed, already bound mutably (instance {}).\n  \
                 Make sure a virtual method override does not bind its own object.",
                T::CLASS_NAME,
                self.instance_id
            ),
        }
    }

    /// Exclusive borrow of the user instance.
    ///
    /// # Panics
    /// If the instance is currently bound, shared or exclusively.
    pub(crate) fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        match self.user_instance.try_write() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => panic!(
                "Gd<{}>::bind_mut() failed, already bound (instance {}).\n  \
                 Make sure a virtual method override does not bind its own object.",
                T::CLASS_NAME,
                self.instance_id
            ),
        }
    }

    /// Makes the storage findable through [`find()`](Self::find).
    pub(crate) fn register(storage: *const Self) {
        // SAFETY: called right after the storage was allocated.
        let id = unsafe { (*storage).instance_id.to_u64() };
        INSTANCES.lock().insert(id, (T::CLASS_NAME, storage as usize));
    }

    pub(crate) fn unregister(instance_id: InstanceId) {
        INSTANCES.lock().remove(&instance_id.to_u64());
    }

    /// Looks up the storage of a live Rust instance of class `T`.
    ///
    /// Returns `None` if the object is not a Rust instance, or one of a different class.
    ///
    /// # Safety
    /// The returned reference must not outlive the object, which owns the storage.
    pub(crate) unsafe fn find<'a>(instance_id: InstanceId) -> Option<&'a Self> {
        let found = INSTANCES.lock().get(&instance_id.to_u64()).copied();

        match found {
            Some((class_name, addr)) if class_name == T::CLASS_NAME => Some(&*(addr as *const Self)),
            _ => None,
        }
    }
}

/// Number of objects with a Rust instance that are currently alive, across all classes.
pub fn live_instance_count() -> usize {
    INSTANCES.lock().len()
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};

/// Lazily initialized, mutex-guarded global.
///
/// Used for the process-wide state that is mutated after startup, such as the handle table and the class registry.
/// State that is frozen at startup lives in the binding storage instead and is read without locking.
///
/// The initialization function is passed to the `const` constructor and runs on first [`lock()`](Self::lock).
pub struct Global<T> {
    value: Mutex<InitState<T>>,
}

impl<T> Global<T> {
    pub const fn new(init_fn: fn() -> T) -> Self {
        Self {
            value: Mutex::new(InitState::Pending(init_fn)),
        }
    }

    /// Uses `T::default()` as initialization function.
    ///
    /// Inherent rather than `Default` trait, because the latter cannot be used in `static` items.
    pub const fn default() -> Self
    where
        T: Default,
    {
        Self::new(T::default)
    }

    /// Blocks until the mutex is available, initializing the value on first access.
    ///
    /// # Panics
    /// If the initialization function panicked, now or during an earlier call.
    pub fn lock(&self) -> GlobalGuard<'_, T> {
        // A panic while a guard is held must not make the handle table unusable for the rest of the process;
        // the table's own operations leave it consistent at every point where they can panic.
        let mut guard = self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let pending = match *guard {
            InitState::Pending(init_fn) => Some(init_fn),
            _ => None,
        };

        if let Some(init_fn) = pending {
            *guard = InitState::Failed;

            let init_fn = std::panic::AssertUnwindSafe(init_fn);
            match std::panic::catch_unwind(init_fn) {
                Ok(value) => *guard = InitState::Initialized(value),
                Err(e) => {
                    eprintln!("panic during Global<T> initialization");
                    drop(guard);
                    std::panic::resume_unwind(e);
                }
            }
        }

        if matches!(*guard, InitState::Failed) {
            drop(guard);
            panic!("previous Global<T> initialization failed due to panic");
        }

        GlobalGuard { guard }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Guards

/// Gives access to a `Global<T>`'s inner value for as long as it is held.
pub struct GlobalGuard<'a, T> {
    guard: MutexGuard<'a, InitState<T>>,
}

impl<T> Deref for GlobalGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match &*self.guard {
            InitState::Initialized(value) => value,
            _ => unreachable!("guards only exist for initialized globals"),
        }
    }
}

impl<T> DerefMut for GlobalGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut *self.guard {
            InitState::Initialized(value) => value,
            _ => unreachable!("guards only exist for initialized globals"),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Internals

enum InitState<T> {
    Initialized(T),
    Pending(fn() -> T),
    Failed,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    static CLASSES: Global<HashMap<&'static str, &'static str>> = Global::default();
    static LEVELS: Global<Vec<u32>> = Global::new(|| vec![0, 1]);
    static BROKEN: Global<u32> = Global::new(|| panic!("init failed"));

    #[test]
    fn global_map_keeps_writes() {
        {
            let mut classes = CLASSES.lock();
            classes.insert("Node", "Object");
            classes.insert("RefCounted", "Object");
        }

        {
            let mut classes = CLASSES.lock();
            classes.insert("Resource", "RefCounted");
        }

        let classes = CLASSES.lock();
        assert_eq!(classes.len(), 3);
        assert_eq!(classes.get("Resource"), Some(&"RefCounted"));
    }

    #[test]
    fn global_runs_init_fn_once() {
        LEVELS.lock().push(2);

        let levels = LEVELS.lock();
        assert_eq!(*levels, &[0, 1, 2]);
    }

    #[test]
    fn global_failed_init_stays_failed() {
        let first = std::panic::catch_unwind(|| *BROKEN.lock());
        assert!(first.is_err());

        let second = std::panic::catch_unwind(|| *BROKEN.lock());
        assert!(second.is_err());
    }
}

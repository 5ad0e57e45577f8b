/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Shared helpers of the integration tests.

use std::panic;
use std::sync::{Mutex, MutexGuard, OnceLock};

use gdbridge::init::InitLevel;
use gdbridge::sys::Global;

use crate::loopback::{self, LoadedLibrary};

static SERIAL: Mutex<()> = Mutex::new(());
static LIBRARY: OnceLock<LoadedLibrary> = OnceLock::new();
static LEVELS: Global<Vec<(InitLevel, bool)>> = Global::default();

/// Serializes tests within one test binary.
///
/// The engine state is process-wide, and panic handling swaps the global panic hook, so tests must not interleave.
pub fn serial() -> MutexGuard<'static, ()> {
    // A failed test poisons the mutex; the others still run.
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Loads the itest library into the loopback engine and initializes all levels, once per process.
///
/// # Panics
/// If the engine rejects the library.
pub fn ensure_loaded() -> &'static LoadedLibrary {
    LIBRARY.get_or_init(|| {
        // SAFETY: `itest_init` is the entry point generated for this library; it is the only library in this process.
        let library = unsafe { loopback::load_library(crate::itest_init) };
        let library = library.unwrap_or_else(|| {
            panic!("loopback engine rejected the itest library: {:?}", loopback::take_errors())
        });

        library.initialize_levels();
        library
    })
}

pub(crate) fn record_level(level: InitLevel, initialized: bool) {
    LEVELS.lock().push((level, initialized));
}

/// Levels that the library was notified about, in order: `(level, true)` on init and `(level, false)` on deinit.
pub fn level_events() -> Vec<(InitLevel, bool)> {
    LEVELS.lock().clone()
}

/// Runs `callback` with the panic hook silenced.
pub fn suppress_panic_log<R>(callback: impl FnOnce() -> R) -> R {
    let prev_hook = panic::take_hook();
    panic::set_hook(Box::new(|_panic_info| { /* suppress panic hook; do nothing */ }));

    let res = callback();
    panic::set_hook(prev_hook);
    res
}

pub fn expect_panic(context: &str, code: impl FnOnce()) {
    // Generally, types should be unwind safe, and this helps ergonomics in testing (especially around &mut in expect_panic closures).
    let code = panic::AssertUnwindSafe(code);
    let panic = suppress_panic_log(move || panic::catch_unwind(code));

    assert!(
        panic.is_err(),
        "code should have panicked but did not: {context}",
    );
}

/// Asserts that the engine log contains an error with `fragment`, and clears the log.
#[track_caller]
pub fn expect_error_logged(fragment: &str) {
    let errors = loopback::take_errors();
    assert!(
        errors.iter().any(|error| error.contains(fragment)),
        "expected an error containing {fragment:?}, got: {errors:#?}"
    );
}

/// Asserts that no errors were logged since the last check.
#[track_caller]
pub fn expect_no_errors() {
    let errors = loopback::take_errors();
    assert!(errors.is_empty(), "unexpected errors: {errors:#?}");
}

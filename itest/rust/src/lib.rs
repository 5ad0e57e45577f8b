/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Integration tests of the bridge, run against the loopback engine.
//!
//! The library itself is an extension like any other: it declares user classes and an entry point. The tests in `tests/` load
//! it into the [`loopback`] engine and drive it from the engine side.

use gdbridge::prelude::*;
use gdbridge::sys::{self, MethodSpec, ParamMeta, ReturnMeta, VariantType};

pub mod framework;
pub mod loopback;

mod classes;

pub use classes::*;

/// Engine methods that only the loopback engine provides, for calls that exercise the frame encoder directly.
pub static LOOPBACK_METHODS: &[MethodSpec] = &[MethodSpec::class(
    "Object",
    "loopback_check",
    1001,
    &[
        ParamMeta::value("value", VariantType::Int),
        ParamMeta::value("text", VariantType::String),
    ],
    ReturnMeta::value(VariantType::Bool),
)];

pub struct IntegrationTests;

unsafe impl ExtensionLibrary for IntegrationTests {
    fn min_level() -> InitLevel {
        InitLevel::Scene
    }

    fn extra_method_specs() -> Vec<&'static [MethodSpec]> {
        vec![LOOPBACK_METHODS]
    }

    fn register_classes(registrar: &mut ClassRegistrar) -> Result<(), RegisterError> {
        registrar.register::<VirtualRecorder>()?;
        registrar.register::<PropertyBag>()?;
        registrar.register::<Counter>()?;

        // Registrations that must fail. Their errors are kept for inspection instead of aborting the others.
        record_register_result(registrar.register::<WrongSignature>());
        record_register_result(registrar.register::<UnknownVirtual>());
        record_register_result(registrar.register::<DuplicateVirtual>());
        record_register_result(registrar.register::<VirtualRecorder>());
        Ok(())
    }

    fn on_level_init(level: InitLevel) {
        framework::record_level(level, true);
    }

    fn on_level_deinit(level: InitLevel) {
        framework::record_level(level, false);
    }
}

gdextension_entry!(IntegrationTests, itest_init);

static REGISTER_ERRORS: sys::Global<Vec<RegisterError>> = sys::Global::default();

fn record_register_result(result: Result<(), RegisterError>) {
    if let Err(err) = result {
        REGISTER_ERRORS.lock().push(err);
    }
}

/// Errors of the registrations that `register_classes` expects to fail, in registration order.
pub fn register_errors() -> Vec<RegisterError> {
    REGISTER_ERRORS.lock().clone()
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

// Separate test binary: the library loaded here must not share a process with the itest library.

use gdbridge::prelude::*;
use gdbridge::sys::{self, MethodSpec, ParamMeta, ReturnMeta, VariantType};
use itest::loopback;

/// Methods the loopback engine does not provide, or provides with a different hash.
static STALE_METHODS: &[MethodSpec] = &[
    MethodSpec::class("Node", "get_tree", 2958820, &[], ReturnMeta::value(VariantType::Object)),
    MethodSpec::class(
        "Object",
        "loopback_check",
        1002,
        &[
            ParamMeta::value("value", VariantType::Int),
            ParamMeta::value("text", VariantType::String),
        ],
        ReturnMeta::value(VariantType::Bool),
    ),
];

struct StaleBindings;

unsafe impl ExtensionLibrary for StaleBindings {
    fn extra_method_specs() -> Vec<&'static [MethodSpec]> {
        vec![STALE_METHODS]
    }

    fn register_classes(_registrar: &mut ClassRegistrar) -> Result<(), RegisterError> {
        panic!("classes must not be registered when loading fails");
    }
}

gdextension_entry!(StaleBindings, stale_bindings_init);

#[test]
fn unresolved_methods_abort_loading() {
    // SAFETY: the only library loaded by this test binary.
    let library = unsafe { loopback::load_library(stale_bindings_init) };
    assert!(library.is_none(), "library with unresolvable methods was accepted");

    let errors = loopback::take_errors();
    let error = errors
        .iter()
        .find(|e| e.contains("failed to resolve"))
        .unwrap_or_else(|| panic!("no resolve error logged: {errors:#?}"));

    assert!(error.contains("failed to resolve 2 method(s)"), "{error}");
    assert!(error.contains("Node::get_tree (hash 2958820)"), "{error}");
    assert!(error.contains("Object::loopback_check (hash 1002)"), "{error}");

    // The interface stays bound; the method table is never published.
    assert!(sys::is_initialized());
    assert!(!sys::tables_loaded());
}

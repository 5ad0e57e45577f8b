/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

// Unloads the library, so it runs as its own test binary.

use gdbridge::init::InitLevel;
use gdbridge::registry::{virtual_state, VirtualState};
use gdbridge::sys;
use itest::framework::{ensure_loaded, expect_no_errors, level_events, serial};
use itest::loopback;

#[test]
fn load_initialize_and_unload() {
    let _guard = serial();
    let library = ensure_loaded();

    assert_eq!(library.min_level(), sys::GDEXTENSION_INITIALIZATION_SCENE);
    assert!(sys::tables_loaded());
    assert_eq!(
        level_events(),
        [(InitLevel::Scene, true), (InitLevel::Editor, true)]
    );

    for class in ["VirtualRecorder", "ItestPropertyBag", "Counter"] {
        assert!(loopback::is_class_registered(class), "{class}");
    }

    // Overrides are known, but nothing has called them yet.
    assert_eq!(virtual_state("VirtualRecorder", "_ready"), VirtualState::Registered);
    assert_eq!(virtual_state("ItestPropertyBag", "_to_string"), VirtualState::Registered);

    library.deinitialize_levels();

    assert_eq!(
        level_events(),
        [
            (InitLevel::Scene, true),
            (InitLevel::Editor, true),
            (InitLevel::Editor, false),
            (InitLevel::Scene, false),
        ]
    );

    for class in ["VirtualRecorder", "ItestPropertyBag", "Counter"] {
        assert!(!loopback::is_class_registered(class), "{class}");
    }
    assert_eq!(virtual_state("VirtualRecorder", "_ready"), VirtualState::Unregistered);

    // Engine methods stay bound until the process exits.
    assert!(sys::tables_loaded());
    expect_no_errors();
}

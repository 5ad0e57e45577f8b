/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::panic::AssertUnwindSafe;

use sys::{out, Global, MethodSpec};

use crate::global::godot_error;
use crate::private::handle_panic;
use crate::registry::{ClassRegistrar, RegisterError};
use crate::sys;

/// Classes registered at the library's minimum level; unregistered when that level is unloaded.
static REGISTRAR: Global<ClassRegistrar> = Global::new(ClassRegistrar::new);

#[doc(hidden)]
pub unsafe fn __load_library<E: ExtensionLibrary>(
    interface: *const sys::GDExtensionInterface,
    library: sys::GDExtensionClassLibraryPtr,
    init: *mut sys::GDExtensionInitialization,
) -> sys::GDExtensionBool {
    let init_code = || -> Result<(), sys::InitError> {
        // SAFETY: the engine passes a valid interface and library pointer to the entry point.
        unsafe { sys::initialize(interface, library)? };

        let mut spec_lists: Vec<&'static [MethodSpec]> = Vec::new();
        spec_lists.extend(crate::builtin::method_lists());
        spec_lists.extend(crate::classes::method_lists());
        spec_lists.extend(E::extra_method_specs());

        // All methods are resolved here, before any class is registered or any call is made. A mismatch between bindings
        // and engine aborts loading.
        // SAFETY: interface was bound above.
        unsafe { sys::load_tables(&spec_lists)? };

        let godot_init_params = sys::GDExtensionInitialization {
            minimum_initialization_level: E::min_level().to_sys(),
            userdata: std::ptr::null_mut(),
            initialize: Some(ffi_initialize_layer::<E>),
            deinitialize: Some(ffi_deinitialize_layer::<E>),
        };

        // SAFETY: the engine passes a writable output struct.
        unsafe { *init = godot_init_params };
        Ok(())
    };

    let ctx = || "error when loading extension library";
    match handle_panic(ctx, AssertUnwindSafe(init_code)) {
        Ok(Ok(())) => sys::SYS_TRUE,
        Ok(Err(err)) => {
            godot_error!("failed to load extension library: {err}");
            sys::SYS_FALSE
        }
        Err(_panic_msg) => sys::SYS_FALSE,
    }
}

unsafe extern "C" fn ffi_initialize_layer<E: ExtensionLibrary>(
    _userdata: *mut std::ffi::c_void,
    init_level: sys::GDExtensionInitializationLevel,
) {
    let Some(level) = InitLevel::from_sys(init_level) else {
        godot_error!("unknown initialization level {init_level}");
        return;
    };
    let ctx = || format!("failed to initialize extension level `{level:?}`");

    // Swallow panics; they were reported.
    let _ = handle_panic(ctx, || {
        out!("Init level {level:?}");

        if level == E::min_level() {
            register_classes::<E>();
        }
        E::on_level_init(level);
    });
}

unsafe extern "C" fn ffi_deinitialize_layer<E: ExtensionLibrary>(
    _userdata: *mut std::ffi::c_void,
    init_level: sys::GDExtensionInitializationLevel,
) {
    let Some(level) = InitLevel::from_sys(init_level) else {
        godot_error!("unknown initialization level {init_level}");
        return;
    };
    let ctx = || format!("failed to deinitialize extension level `{level:?}`");

    let _ = handle_panic(ctx, || {
        out!("Deinit level {level:?}");

        E::on_level_deinit(level);
        if level == E::min_level() {
            // Take the registrar out, so the global is not locked while the engine runs.
            let mut registrar = std::mem::replace(&mut *REGISTRAR.lock(), ClassRegistrar::new());
            registrar.unregister_all();
        }
    });
}

fn register_classes<E: ExtensionLibrary>() {
    let mut registrar = ClassRegistrar::new();
    let result = E::register_classes(&mut registrar);

    // Classes registered before a failure stay registered, so they are unregistered on deinit as well.
    if let Err(err) = result {
        godot_error!("class registration failed: {err}");
    }

    let mut global = REGISTRAR.lock();
    let previous = std::mem::replace(&mut *global, registrar);
    debug_assert_eq!(previous.registered_classes().count(), 0, "classes registered twice");
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Defines the entry point of an extension library.
///
/// Every library has exactly one implementation of this trait, which is passed to [`gdextension_entry!`](crate::gdextension_entry).
///
/// ```no_run
/// use gdbridge_core::init::ExtensionLibrary;
/// use gdbridge_core::registry::{ClassRegistrar, RegisterError};
///
/// struct MyExtension;
///
/// unsafe impl ExtensionLibrary for MyExtension {
///     fn register_classes(registrar: &mut ClassRegistrar) -> Result<(), RegisterError> {
///         // registrar.register::<Player>()?;
///         Ok(())
///     }
/// }
///
/// gdbridge_core::gdextension_entry!(MyExtension, my_extension_init);
/// ```
///
/// # Safety
/// The library cannot enforce any safety guarantees outside Rust code: the engine and other extensions must uphold the
/// contracts of the extension interface.
pub unsafe trait ExtensionLibrary {
    /// Determines the initialization level at which user classes are registered (`Scene` by default).
    fn min_level() -> InitLevel {
        InitLevel::Scene
    }

    /// Method specs in addition to the bundled engine classes, resolved together with them when the library is loaded.
    ///
    /// Use this for engine methods that the wrappers do not cover; call them through
    /// [`Signature::out_class_ptrcall()`](crate::meta::Signature::out_class_ptrcall).
    fn extra_method_specs() -> Vec<&'static [MethodSpec]> {
        Vec::new()
    }

    /// Registers all user classes. Runs once, at [`min_level()`](Self::min_level).
    ///
    /// Classes must be registered after their base classes.
    fn register_classes(registrar: &mut ClassRegistrar) -> Result<(), RegisterError> {
        let _ = registrar;
        Ok(())
    }

    /// Custom logic when a certain init-level is loaded.
    ///
    /// This will only be invoked for levels >= [`Self::min_level()`], in ascending order. Use `if` or `match` to hook to specific levels.
    #[allow(unused_variables)]
    fn on_level_init(level: InitLevel) {
        // Nothing by default.
    }

    /// Custom logic when a certain init-level is unloaded.
    ///
    /// This will only be invoked for levels >= [`Self::min_level()`], in descending order.
    #[allow(unused_variables)]
    fn on_level_deinit(level: InitLevel) {
        // Nothing by default.
    }
}

/// Generates the `extern "C"` entry point through which the engine loads the library.
///
/// The function name is the `entry_symbol` of the library's `.gdextension` file.
#[macro_export]
macro_rules! gdextension_entry {
    ($Library:ty, $entry:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $entry(
            interface: *const $crate::sys::GDExtensionInterface,
            library: $crate::sys::GDExtensionClassLibraryPtr,
            init: *mut $crate::sys::GDExtensionInitialization,
        ) -> $crate::sys::GDExtensionBool {
            $crate::init::__load_library::<$Library>(interface, library, init)
        }
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Stage of the engine's initialization process.
///
/// Initialization and deinitialization are split into multiple stages, like a stack. At each level, a different amount of
/// engine functionality is available. Deinitialization happens in reverse order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum InitLevel {
    Core,
    Servers,
    Scene,
    Editor,
}

impl InitLevel {
    pub fn from_sys(level: sys::GDExtensionInitializationLevel) -> Option<Self> {
        match level {
            sys::GDEXTENSION_INITIALIZATION_CORE => Some(Self::Core),
            sys::GDEXTENSION_INITIALIZATION_SERVERS => Some(Self::Servers),
            sys::GDEXTENSION_INITIALIZATION_SCENE => Some(Self::Scene),
            sys::GDEXTENSION_INITIALIZATION_EDITOR => Some(Self::Editor),
            _ => None,
        }
    }

    pub fn to_sys(self) -> sys::GDExtensionInitializationLevel {
        match self {
            Self::Core => sys::GDEXTENSION_INITIALIZATION_CORE,
            Self::Servers => sys::GDEXTENSION_INITIALIZATION_SERVERS,
            Self::Scene => sys::GDEXTENSION_INITIALIZATION_SCENE,
            Self::Editor => sys::GDEXTENSION_INITIALIZATION_EDITOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_level_sys_roundtrip() {
        for level in [InitLevel::Core, InitLevel::Servers, InitLevel::Scene, InitLevel::Editor] {
            assert_eq!(InitLevel::from_sys(level.to_sys()), Some(level));
        }

        assert_eq!(InitLevel::from_sys(17), None);
        assert!(InitLevel::Core < InitLevel::Scene);
    }
}

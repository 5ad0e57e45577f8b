/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Process-wide storage of the engine interface and the tables frozen at startup.
//!
//! Both are written exactly once, during library initialization, and read without locking afterwards.

use std::fmt;
use std::sync::OnceLock;

use crate as sys;
use crate::{BuiltinLifecycleTable, MethodLoaders, MethodSpec, MethodTable, MissingMethod};

struct GodotBinding {
    interface: sys::GDExtensionInterface,
    library: sys::GDExtensionClassLibraryPtr,
}

// SAFETY: the interface is a table of function pointers plus a pointer to a static version string, and the library pointer is an
// opaque token. Neither is mutated after initialization. Sharing the pointers is sound; whether a given engine function may be
// called from a given thread is the concern of the call site, which needs `unsafe` anyway.
unsafe impl Send for GodotBinding {}
unsafe impl Sync for GodotBinding {}

struct BridgeTables {
    lifecycle: BuiltinLifecycleTable,
    methods: MethodTable,
}

static BINDING: OnceLock<GodotBinding> = OnceLock::new();
static TABLES: OnceLock<BridgeTables> = OnceLock::new();

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Failure during library initialization. Aborts loading of the library.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum InitError {
    /// [`initialize()`] or [`load_tables()`] ran twice in the same process.
    AlreadyInitialized,

    /// Tables were requested before [`initialize()`].
    NotInitialized,

    MissingInterfaceFunction(&'static str),

    /// Builtin constructors, destructors or variant conversions the engine did not provide.
    MissingLifecycle(Vec<String>),

    /// Methods declared by the bindings that the engine does not know.
    MissingMethods(Vec<MissingMethod>),

    /// The same `(class, method)` pair was declared twice with different signatures.
    ConflictingMethod { class: &'static str, method: &'static str },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => f.write_str("bridge is already initialized in this process"),
            Self::NotInitialized => f.write_str("engine interface has not been bound"),
            Self::MissingInterfaceFunction(name) => {
                write!(f, "engine interface does not provide `{name}`")
            }
            Self::MissingLifecycle(entries) => {
                write!(f, "engine does not provide builtin lifecycle functions: {}", entries.join(", "))
            }
            Self::MissingMethods(methods) => {
                writeln!(
                    f,
                    "failed to resolve {} method(s); bindings and engine versions do not match:",
                    methods.len()
                )?;
                for method in methods {
                    writeln!(f, "  {method}")?;
                }
                Ok(())
            }
            Self::ConflictingMethod { class, method } => {
                write!(f, "method {class}::{method} is declared twice with different signatures")
            }
        }
    }
}

impl std::error::Error for InitError {}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Binds the engine interface for this process.
///
/// # Safety
///
/// - `interface` must point to a valid [`GDExtensionInterface`](sys::GDExtensionInterface) whose function pointers stay valid
///   for the lifetime of the process.
/// - `library` must be the pointer given by the engine at initialization.
pub unsafe fn initialize(
    interface: *const sys::GDExtensionInterface,
    library: sys::GDExtensionClassLibraryPtr,
) -> Result<(), InitError> {
    let interface = *interface;

    let version = sys::str_from_c(interface.version_string);
    sys::out!("Initialize engine interface: {version}");

    BINDING
        .set(GodotBinding { interface, library })
        .map_err(|_| InitError::AlreadyInitialized)
}

/// Resolves all spec lists and the builtin lifecycle, then freezes them.
///
/// Runs once, after [`initialize()`]. On error, nothing is stored.
///
/// # Safety
/// The bound interface's function pointers must be valid.
pub unsafe fn load_tables(spec_lists: &[&'static [MethodSpec]]) -> Result<(), InitError> {
    let binding = BINDING.get().ok_or(InitError::NotInitialized)?;
    if TABLES.get().is_some() {
        return Err(InitError::AlreadyInitialized);
    }

    let lifecycle = BuiltinLifecycleTable::load(&binding.interface)?;
    let loaders = MethodLoaders::from_interface(&binding.interface)?;
    let methods = MethodTable::load(loaders, spec_lists)?;

    sys::out!("Loaded {} method binds", methods.len());
    TABLES
        .set(BridgeTables { lifecycle, methods })
        .map_err(|_| InitError::AlreadyInitialized)
}

/// Whether the engine interface is bound, i.e. engine calls are possible.
pub fn is_initialized() -> bool {
    BINDING.get().is_some()
}

/// Whether [`load_tables()`] completed.
pub fn tables_loaded() -> bool {
    TABLES.get().is_some()
}

/// # Panics
/// If the interface is not bound, e.g. in unit tests that run without an engine.
#[inline]
pub fn get_interface() -> &'static sys::GDExtensionInterface {
    &binding().interface
}

pub fn get_library() -> sys::GDExtensionClassLibraryPtr {
    binding().library
}

/// The frozen method table.
///
/// # Panics
/// If called before [`load_tables()`] completed.
#[inline]
pub fn method_table() -> &'static MethodTable {
    &tables().methods
}

#[inline]
pub fn builtin_lifecycle() -> &'static BuiltinLifecycleTable {
    &tables().lifecycle
}

fn binding() -> &'static GodotBinding {
    BINDING
        .get()
        .unwrap_or_else(|| panic!("engine not available; make sure you are not calling it from unit/doc tests"))
}

fn tables() -> &'static BridgeTables {
    TABLES
        .get()
        .unwrap_or_else(|| panic!("bridge tables not loaded; engine calls are only possible after library initialization"))
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Resolved method binds and the ABI metadata needed to call them.
//!
//! Wrapper code declares each engine method it calls as a static [`MethodSpec`]. At startup, all spec lists are resolved against
//! the engine in one pass ([`MethodTable::load()`]); afterwards the table is frozen and only read.

use std::collections::HashMap;
use std::ffi::c_char;
use std::fmt;

use crate as sys;
use crate::{ArgumentMetadata, FrameLayout, InitError, Ownership, VariantType};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Static metadata

/// Type of one call frame slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SlotType {
    /// A `Variant`, holding any type.
    Variant,

    /// A statically typed value. `Value(Nil)` is the empty slot of a method without return value.
    Value(VariantType),
}

impl SlotType {
    pub const VOID: Self = Self::Value(VariantType::Nil);

    /// Width in bytes inside a call frame.
    pub const fn size(self) -> usize {
        match self {
            SlotType::Variant => std::mem::size_of::<sys::types::OpaqueVariant>(),
            SlotType::Value(ty) => ty.ptrcall_size(),
        }
    }

    pub fn is_void(self) -> bool {
        self == Self::VOID
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotType::Variant => f.write_str("Variant"),
            SlotType::Value(VariantType::Nil) => f.write_str("void"),
            SlotType::Value(ty) => write!(f, "{ty}"),
        }
    }
}

/// Value the frame supplies for a trailing parameter that the caller omitted.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum DefaultArg {
    Bool(bool),
    Int(i64),
    Float(f64),

    /// `null` for a `Variant` parameter.
    Nil,

    /// Null pointer for an object parameter.
    NullObject,

    /// Default-constructed value of the parameter's type: empty string or container, zero vector.
    Empty,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ParamMeta {
    pub name: &'static str,
    pub ty: SlotType,
    pub metadata: ArgumentMetadata,
    pub default: Option<DefaultArg>,
}

impl ParamMeta {
    pub const fn new(name: &'static str, ty: SlotType) -> Self {
        Self {
            name,
            ty,
            metadata: ArgumentMetadata::None,
            default: None,
        }
    }

    pub const fn value(name: &'static str, ty: VariantType) -> Self {
        Self::new(name, SlotType::Value(ty))
    }

    pub const fn with_metadata(self, metadata: ArgumentMetadata) -> Self {
        Self { metadata, ..self }
    }

    pub const fn with_default(self, default: DefaultArg) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }
}

/// Return slot of a method, including who owns a returned handle.
///
/// The ownership is a property of the individual method, not of the return type: a getter returning a child node
/// hands out a borrowed object, while `duplicate()` returns a new one.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ReturnMeta {
    pub ty: SlotType,
    pub metadata: ArgumentMetadata,
    pub ownership: Ownership,
}

impl ReturnMeta {
    pub const VOID: Self = Self::owned(SlotType::VOID);

    pub const fn owned(ty: SlotType) -> Self {
        Self {
            ty,
            metadata: ArgumentMetadata::None,
            ownership: Ownership::Owned,
        }
    }

    pub const fn value(ty: VariantType) -> Self {
        Self::owned(SlotType::Value(ty))
    }

    pub const fn with_metadata(self, metadata: ArgumentMetadata) -> Self {
        Self { metadata, ..self }
    }

    pub const fn with_ownership(self, ownership: Ownership) -> Self {
        Self { ownership, ..self }
    }
}

/// Where a method lives.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MethodKind {
    /// Method of an engine class, called on an object through `object_method_bind_ptrcall`.
    Class,

    /// Method of a builtin type such as `Array`, called through a builtin method pointer.
    Builtin(VariantType),
}

/// Declaration of one engine method, as found in the engine's class database.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MethodSpec {
    pub class: &'static str,
    pub method: &'static str,
    pub hash: i64,
    pub kind: MethodKind,
    pub params: &'static [ParamMeta],
    pub ret: ReturnMeta,
}

impl MethodSpec {
    pub const fn class(
        class: &'static str,
        method: &'static str,
        hash: i64,
        params: &'static [ParamMeta],
        ret: ReturnMeta,
    ) -> Self {
        Self {
            class,
            method,
            hash,
            kind: MethodKind::Class,
            params,
            ret,
        }
    }

    pub const fn builtin(
        builtin: VariantType,
        method: &'static str,
        hash: i64,
        params: &'static [ParamMeta],
        ret: ReturnMeta,
    ) -> Self {
        Self {
            class: builtin.name(),
            method,
            hash,
            kind: MethodKind::Builtin(builtin),
            params,
            ret,
        }
    }

    /// Number of leading parameters without default.
    pub fn required_params(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |last| last + 1)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Resolved binds

pub type GetClassMethodBind = unsafe extern "C" fn(
    p_classname: *const c_char,
    p_methodname: *const c_char,
    p_hash: sys::GDExtensionInt,
) -> sys::GDExtensionMethodBindPtr;

pub type GetBuiltinMethod = unsafe extern "C" fn(
    p_type: sys::GDExtensionVariantType,
    p_method: *const c_char,
    p_hash: sys::GDExtensionInt,
) -> sys::GDExtensionPtrBuiltInMethod;

// GDExtensionPtrBuiltInMethod
pub type BuiltinMethodBind = unsafe extern "C" fn(
    p_base: sys::GDExtensionTypePtr,
    p_args: *const sys::GDExtensionConstTypePtr,
    r_return: sys::GDExtensionTypePtr,
    p_argument_count: std::ffi::c_int,
);

/// Opaque method bind of an engine class method.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ClassMethodBind(sys::GDExtensionMethodBindPtr);

// SAFETY: a method bind is an immutable engine-side descriptor which the engine allows calling from any thread.
// Sending the pointer is fine; thread safety of the called method is the caller's concern, as with any engine call.
unsafe impl Send for ClassMethodBind {}
unsafe impl Sync for ClassMethodBind {}

impl ClassMethodBind {
    pub fn from_ptr(bind: sys::GDExtensionMethodBindPtr) -> Self {
        Self(bind)
    }

    pub fn as_ptr(self) -> sys::GDExtensionMethodBindPtr {
        self.0
    }
}

#[derive(Copy, Clone, Debug)]
pub enum BindTarget {
    Class(ClassMethodBind),
    Builtin(BuiltinMethodBind),
}

/// A resolved engine method: function pointer, declaration and frame layout.
#[derive(Debug)]
pub struct MethodBinding {
    spec: &'static MethodSpec,
    target: BindTarget,
    layout: FrameLayout,
}

impl MethodBinding {
    pub fn new(spec: &'static MethodSpec, target: BindTarget) -> Self {
        Self {
            spec,
            target,
            layout: FrameLayout::new(spec.params, &spec.ret),
        }
    }

    pub fn spec(&self) -> &'static MethodSpec {
        self.spec
    }

    pub fn target(&self) -> BindTarget {
        self.target
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn class_name(&self) -> &'static str {
        self.spec.class
    }

    pub fn method_name(&self) -> &'static str {
        self.spec.method
    }
}

/// A method that the engine could not resolve at startup.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MissingMethod {
    pub class: &'static str,
    pub method: &'static str,
    pub hash: i64,
}

impl fmt::Display for MissingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} (hash {})", self.class, self.method, self.hash)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ResolveError {
    pub class: String,
    pub method: String,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "method {}::{} is not in the method table; it must be declared in a method list loaded at startup",
            self.class, self.method
        )
    }
}

impl std::error::Error for ResolveError {}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Table

/// Engine functions used to resolve binds.
#[derive(Copy, Clone)]
pub struct MethodLoaders {
    pub class_method: GetClassMethodBind,
    pub builtin_method: GetBuiltinMethod,
}

impl MethodLoaders {
    pub fn from_interface(interface: &sys::GDExtensionInterface) -> Result<Self, InitError> {
        let class_method = interface
            .classdb_get_method_bind
            .ok_or(InitError::MissingInterfaceFunction("classdb_get_method_bind"))?;

        let builtin_method = interface
            .variant_get_ptr_builtin_method
            .ok_or(InitError::MissingInterfaceFunction("variant_get_ptr_builtin_method"))?;

        Ok(Self {
            class_method,
            builtin_method,
        })
    }
}

/// Immutable map from `(class, method)` to [`MethodBinding`].
#[derive(Debug, Default)]
pub struct MethodTable {
    // Keyed by class, then method; lookups only need borrowed names.
    bindings: HashMap<&'static str, HashMap<&'static str, MethodBinding>>,
    len: usize,
}

impl MethodTable {
    /// Resolves every spec of every list in one pass.
    ///
    /// All unresolvable methods are collected and reported together, so a version mismatch shows its full extent at once.
    pub fn load(loaders: MethodLoaders, spec_lists: &[&'static [MethodSpec]]) -> Result<Self, InitError> {
        let mut bindings: HashMap<&'static str, HashMap<&'static str, MethodBinding>> = HashMap::new();
        let mut len = 0;
        let mut missing = Vec::new();

        // Every declaration seen so far, resolved or not.
        let mut declared: HashMap<(&'static str, &'static str), &'static MethodSpec> = HashMap::new();

        for spec in spec_lists.iter().copied().flat_map(|list| list.iter()) {
            if let Some(&existing) = declared.get(&(spec.class, spec.method)) {
                if existing != spec {
                    return Err(InitError::ConflictingMethod {
                        class: spec.class,
                        method: spec.method,
                    });
                }
                // Same declaration listed twice (e.g. shared between two lists).
                continue;
            }
            declared.insert((spec.class, spec.method), spec);

            match resolve_target(loaders, spec) {
                Some(target) => {
                    sys::out!("resolved {}::{}", spec.class, spec.method);
                    bindings
                        .entry(spec.class)
                        .or_default()
                        .insert(spec.method, MethodBinding::new(spec, target));
                    len += 1;
                }
                None => missing.push(MissingMethod {
                    class: spec.class,
                    method: spec.method,
                    hash: spec.hash,
                }),
            }
        }

        if !missing.is_empty() {
            return Err(InitError::MissingMethods(missing));
        }

        Ok(Self { bindings, len })
    }

    /// Looks up a method that wrapper code declared.
    ///
    /// # Panics
    /// If the method was not declared in any list passed to [`load()`](Self::load). This is a bug in the wrapper code,
    /// never a runtime condition.
    pub fn resolve(&self, class: &str, method: &str) -> &MethodBinding {
        self.try_resolve(class, method)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_resolve(&self, class: &str, method: &str) -> Result<&MethodBinding, ResolveError> {
        self.bindings
            .get(class)
            .and_then(|methods| methods.get(method))
            .ok_or_else(|| ResolveError {
                class: class.to_string(),
                method: method.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn resolve_target(loaders: MethodLoaders, spec: &MethodSpec) -> Option<BindTarget> {
    let method_name = sys::c_string(spec.method);

    match spec.kind {
        MethodKind::Class => {
            let class_name = sys::c_string(spec.class);

            // SAFETY: function pointer provided by the engine; both strings outlive the call.
            let bind = unsafe { (loaders.class_method)(class_name.as_ptr(), method_name.as_ptr(), spec.hash) };

            (!bind.is_null()).then_some(BindTarget::Class(ClassMethodBind(bind)))
        }
        MethodKind::Builtin(builtin) => {
            // SAFETY: as above.
            let method = unsafe { (loaders.builtin_method)(builtin.sys(), method_name.as_ptr(), spec.hash) };

            method.map(BindTarget::Builtin)
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    static NODE_METHODS: &[MethodSpec] = &[
        MethodSpec::class(
            "Node",
            "get_child_count",
            894402480,
            &[ParamMeta::value("include_internal", VariantType::Bool).with_default(DefaultArg::Bool(false))],
            ReturnMeta::value(VariantType::Int).with_metadata(ArgumentMetadata::IntIsInt32),
        ),
        MethodSpec::class(
            "Node",
            "set_name",
            3304788590,
            &[ParamMeta::value("name", VariantType::String)],
            ReturnMeta::VOID,
        ),
    ];

    static ARRAY_METHODS: &[MethodSpec] = &[MethodSpec::builtin(
        VariantType::Array,
        "size",
        3173160232,
        &[],
        ReturnMeta::value(VariantType::Int),
    )];

    static UNKNOWN_METHODS: &[MethodSpec] = &[
        MethodSpec::class("Node", "teleport", 1, &[], ReturnMeta::VOID),
        MethodSpec::class("Spaceship", "launch", 2, &[], ReturnMeta::VOID),
    ];

    static CONFLICTING_METHODS: &[MethodSpec] =
        &[MethodSpec::class("Node", "set_name", 42, &[], ReturnMeta::VOID)];

    static CONFLICTING_UNKNOWN_METHODS: &[MethodSpec] =
        &[MethodSpec::class("Node", "teleport", 7, &[], ReturnMeta::VOID)];

    const KNOWN: &[(&str, &str)] = &[("Node", "get_child_count"), ("Node", "set_name")];

    unsafe extern "C" fn fake_class_method(
        class: *const c_char,
        method: *const c_char,
        _hash: sys::GDExtensionInt,
    ) -> sys::GDExtensionMethodBindPtr {
        let class = CStr::from_ptr(class).to_str().unwrap();
        let method = CStr::from_ptr(method).to_str().unwrap();

        match KNOWN.iter().position(|&(c, m)| c == class && m == method) {
            Some(index) => (index + 1) as sys::GDExtensionMethodBindPtr,
            None => std::ptr::null(),
        }
    }

    unsafe extern "C" fn fake_array_size(
        _base: sys::GDExtensionTypePtr,
        _args: *const sys::GDExtensionConstTypePtr,
        _ret: sys::GDExtensionTypePtr,
        _argc: std::ffi::c_int,
    ) {
    }

    unsafe extern "C" fn fake_builtin_method(
        ty: sys::GDExtensionVariantType,
        method: *const c_char,
        _hash: sys::GDExtensionInt,
    ) -> sys::GDExtensionPtrBuiltInMethod {
        let method = CStr::from_ptr(method).to_str().unwrap();
        if ty == VariantType::Array.sys() && method == "size" {
            Some(fake_array_size)
        } else {
            None
        }
    }

    fn loaders() -> MethodLoaders {
        MethodLoaders {
            class_method: fake_class_method,
            builtin_method: fake_builtin_method,
        }
    }

    #[test]
    fn load_and_resolve() {
        let table = MethodTable::load(loaders(), &[NODE_METHODS, ARRAY_METHODS]).expect("all methods known");
        assert_eq!(table.len(), 3);

        let binding = table.resolve("Node", "get_child_count");
        assert_eq!(binding.method_name(), "get_child_count");
        assert!(matches!(binding.target(), BindTarget::Class(bind) if bind.as_ptr() as usize == 1));

        let size = table.resolve("Array", "size");
        assert!(matches!(size.target(), BindTarget::Builtin(_)));
    }

    #[test]
    fn duplicate_lists_are_merged() {
        let table = MethodTable::load(loaders(), &[NODE_METHODS, NODE_METHODS]).expect("same declarations");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn conflicting_declarations_are_rejected() {
        let err = MethodTable::load(loaders(), &[NODE_METHODS, CONFLICTING_METHODS]).unwrap_err();
        assert_eq!(
            err,
            InitError::ConflictingMethod {
                class: "Node",
                method: "set_name"
            }
        );
    }

    #[test]
    fn missing_methods_are_all_reported() {
        let err = MethodTable::load(loaders(), &[NODE_METHODS, UNKNOWN_METHODS]).unwrap_err();

        let InitError::MissingMethods(missing) = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].to_string(), "Node::teleport (hash 1)");
        assert_eq!(missing[1].to_string(), "Spaceship::launch (hash 2)");

        let message = err.to_string();
        assert!(message.contains("Node::teleport"), "{message}");
        assert!(message.contains("Spaceship::launch"), "{message}");
    }

    #[test]
    fn missing_methods_are_reported_once() {
        let err = MethodTable::load(loaders(), &[UNKNOWN_METHODS, NODE_METHODS, UNKNOWN_METHODS]).unwrap_err();

        let InitError::MissingMethods(missing) = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn conflicting_declarations_of_missing_methods_are_rejected() {
        let err = MethodTable::load(loaders(), &[UNKNOWN_METHODS, CONFLICTING_UNKNOWN_METHODS]).unwrap_err();
        assert_eq!(
            err,
            InitError::ConflictingMethod {
                class: "Node",
                method: "teleport"
            }
        );
    }

    #[test]
    fn unknown_method_fails_fast() {
        let table = MethodTable::load(loaders(), &[NODE_METHODS]).expect("all methods known");

        let err = table.try_resolve("Node", "get_parent").unwrap_err();
        assert_eq!(err.class, "Node");
        assert_eq!(err.method, "get_parent");

        let panic = std::panic::catch_unwind(|| {
            table.resolve("Node", "get_parent");
        })
        .expect_err("resolve must panic");

        let message = panic.downcast_ref::<String>().expect("formatted panic message");
        assert!(message.contains("Node::get_parent"), "{message}");
    }

    #[test]
    fn required_params_excludes_trailing_defaults() {
        assert_eq!(NODE_METHODS[0].required_params(), 0);
        assert_eq!(NODE_METHODS[1].required_params(), 1);
    }
}

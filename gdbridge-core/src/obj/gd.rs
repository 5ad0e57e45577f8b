/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;

use sys::{interface_fn, Handle, HandleEntry, Ownership, ReleaseAction};

use crate::builtin::Variant;
use crate::global::godot_error;
use crate::meta::error::{ConvertError, FromFfiError};
use crate::meta::{class_ptrcall, FromGodot, GodotConvert, GodotType, ToGodot};
use crate::obj::guards::{GdMut, GdRef};
use crate::obj::{GodotClass, Inherits, InstanceId, RawObject, UserClass};
use crate::registry::InstanceStorage;
use crate::sys;

/// Smart pointer to objects owned by the engine.
///
/// A `Gd<T>` does not hold the object pointer directly. It occupies one slot in the process-wide handle table, which records
/// the pointer, the instance ID and the [`Ownership`] under which this `Gd` was obtained. Every access checks that the object
/// behind the slot is still alive, so a `Gd` whose object was destroyed elsewhere (e.g. a child freed with its parent) reports
/// that instead of touching freed memory.
///
/// # Memory management
///
/// What clone and drop do depends on the ownership of the slot, not on the static type `T`:
///
/// | Ownership    | Obtained from                                        | `clone()`                        | `drop()`                |
/// |--------------|------------------------------------------------------|----------------------------------|-------------------------|
/// | `Owned`      | [`new_alloc()`](crate::obj::NewAlloc), owned returns | borrowed view                    | destroys the object     |
/// | `Borrowed`   | getters, virtual call arguments, clones of the above | borrowed view                    | nothing                 |
/// | `RefCounted` | any object inheriting `RefCounted`                   | takes a new reference            | drops one reference     |
///
/// Handing an owned object to the engine (for example [`add_child()`](crate::classes::NodeApi::add_child)) turns its slot into
/// a borrowed one, so the engine's owner destroys it, not the `Gd`.
///
/// # Thread safety
/// Like all engine types, `Gd` is neither `Send` nor `Sync`.
pub struct Gd<T: GodotClass> {
    handle: Handle,
    _marker: PhantomData<*const T>,
}

impl<T: GodotClass> Gd<T> {
    /// Creates a new object of class `T` through the engine's class database.
    ///
    /// Ref-counted objects start with one reference, which this `Gd` adopts. Others are owned by the returned `Gd`.
    pub(crate) fn construct() -> Self {
        let class_name = sys::c_string(T::CLASS_NAME);

        // SAFETY: the class name is a valid C string; the engine returns null for unknown classes.
        let obj_ptr = unsafe { interface_fn!(classdb_construct_object)(class_name.as_ptr()) };
        assert!(
            !obj_ptr.is_null(),
            "failed to instantiate class `{}`; is it registered?",
            T::CLASS_NAME
        );

        // SAFETY: freshly constructed object; nobody else holds it.
        unsafe { Self::from_obj_sys_returned(obj_ptr, Ownership::Owned) }
    }

    /// Wraps an object received from an engine return slot.
    ///
    /// Ref-counted objects always get a reference through `init_ref`, which adopts the initial reference of a fresh object.
    /// Other objects get the declared ownership.
    ///
    /// # Safety
    /// `obj_ptr` must be a live, non-null object of class `T` or a subclass.
    pub(crate) unsafe fn from_obj_sys_returned(obj_ptr: sys::GDExtensionObjectPtr, declared: Ownership) -> Self {
        let instance_id = obj_instance_id(obj_ptr);

        let ownership = if instance_id.is_ref_counted() {
            // The method returns whether this was the first reference; irrelevant here.
            let _first: bool = class_ptrcall("RefCounted", "init_ref", obj_ptr, ());
            Ownership::RefCounted
        } else {
            declared
        };

        Self::from_entry(HandleEntry::new(obj_ptr, instance_id.to_u64(), ownership))
    }

    /// Wraps an object that someone else keeps alive: an argument of a virtual call, a variant payload, a base object.
    ///
    /// Ref-counted objects get a reference of their own; all others become borrowed views.
    ///
    /// # Safety
    /// `obj_ptr` must be a live, non-null object of class `T` or a subclass.
    pub(crate) unsafe fn from_obj_sys_borrowed(obj_ptr: sys::GDExtensionObjectPtr) -> Self {
        let instance_id = obj_instance_id(obj_ptr);

        let ownership = if instance_id.is_ref_counted() {
            let _first: bool = class_ptrcall("RefCounted", "reference", obj_ptr, ());
            Ownership::RefCounted
        } else {
            Ownership::Borrowed
        };

        Self::from_entry(HandleEntry::new(obj_ptr, instance_id.to_u64(), ownership))
    }

    fn from_entry(entry: HandleEntry) -> Self {
        let handle = sys::handles().acquire(entry);
        sys::out!("Gd acquire {handle}: {entry:?}");

        Self {
            handle,
            _marker: PhantomData,
        }
    }

    /// ⚠️ Looks up an object by its instance ID.
    ///
    /// # Panics
    /// If no live object with this ID exists, or it is not of class `T`.
    pub fn from_instance_id(instance_id: InstanceId) -> Self {
        Self::try_from_instance_id(instance_id).unwrap_or_else(|err| {
            panic!(
                "Instance ID {} does not belong to a valid object of class `{}`: {err}",
                instance_id,
                T::CLASS_NAME
            )
        })
    }

    /// Looks up an object by its instance ID.
    ///
    /// The result is a borrowed view, or a new reference for ref-counted objects.
    pub fn try_from_instance_id(instance_id: InstanceId) -> Result<Self, ConvertError> {
        let raw = RawObject::from_instance_id(instance_id);
        if raw.obj_ptr().is_null() {
            return Err(FromFfiError::DeadObject.into_error(instance_id));
        }

        Self::try_from_ffi(raw)
    }

    /// Returns the instance ID of this object.
    ///
    /// The ID is remembered in the handle, so this works even if the object is dead.
    pub fn instance_id(&self) -> InstanceId {
        let entry = self.entry();
        InstanceId::try_from_u64(entry.instance_id).unwrap_or_else(|| panic!("handle {} has instance ID 0", self.handle))
    }

    /// Checks if this smart pointer points to a live object.
    ///
    /// Borrowed views and owned objects can be destroyed by the engine or another `Gd`; this method tells if that happened.
    pub fn is_instance_valid(&self) -> bool {
        let entry = sys::handles().get(self.handle);
        entry.is_ok_and(|entry| is_alive(&entry))
    }

    /// Ownership of this handle.
    pub fn ownership(&self) -> Ownership {
        self.entry().ownership
    }

    /// **Upcast:** convert into a smart pointer to a base class. Always succeeds.
    pub fn upcast<Base>(self) -> Gd<Base>
    where
        Base: GodotClass,
        T: Inherits<Base>,
    {
        self.retype()
    }

    /// **Downcast:** try to convert into a smart pointer to a derived class.
    ///
    /// If the object's dynamic type is not `Derived` or one of its subclasses, `Err(self)` is returned, meaning you can reuse the
    /// original object for further casts.
    pub fn try_cast<Derived>(self) -> Result<Gd<Derived>, Self>
    where
        Derived: GodotClass + Inherits<T>,
    {
        if !self.is_instance_valid() {
            return Err(self);
        }

        // SAFETY: object is alive.
        let cast = unsafe { cast_obj_ptr::<Derived>(self.obj_sys()) };
        if cast.is_null() {
            Err(self)
        } else {
            Ok(self.retype())
        }
    }

    /// ⚠️ **Downcast:** convert into a smart pointer to a derived class. Panics on error.
    ///
    /// # Panics
    /// If the object is not of class `Derived` or a subclass.
    pub fn cast<Derived>(self) -> Gd<Derived>
    where
        Derived: GodotClass + Inherits<T>,
    {
        self.try_cast().unwrap_or_else(|obj| {
            panic!(
                "downcast from {from} to {to} failed; instance {obj:?}",
                from = T::CLASS_NAME,
                to = Derived::CLASS_NAME,
            )
        })
    }

    /// ⚠️ Destroys the manually-managed engine object.
    ///
    /// Other `Gd` views of the same object become invalid; accessing them panics, and
    /// [`is_instance_valid()`](Self::is_instance_valid) returns `false`.
    ///
    /// # Panics
    /// - When the object is ref-counted. Drop all references instead.
    /// - When the object was already destroyed.
    pub fn free(self) {
        let entry = self.entry();
        assert!(
            entry.ownership != Ownership::RefCounted,
            "Called free() on Gd<{}> (instance {}) which is ref-counted",
            T::CLASS_NAME,
            entry.instance_id,
        );
        assert!(
            is_alive(&entry),
            "Called free() on already destroyed object (instance {})",
            entry.instance_id
        );

        let this = ManuallyDrop::new(self);
        this.release_slot();

        // SAFETY: object is alive and not ref-counted; all other handles check liveness before use.
        unsafe { interface_fn!(object_destroy)(entry.object_ptr()) };
    }

    /// Hands the object to the engine: the handle no longer owns it, the engine's owner destroys it.
    pub(crate) fn transfer_to_engine(&self) {
        let result = sys::handles().retag(self.handle, Ownership::Borrowed);
        if let Err(err) = result {
            panic!("cannot transfer {}: {err}", T::CLASS_NAME);
        }
    }

    /// Takes ownership back after the engine released the object (e.g. a node removed from its parent).
    pub(crate) fn reclaim_from_engine(&self) {
        let entry = self.entry();
        if entry.ownership == Ownership::Borrowed {
            let _previous = sys::handles().retag(self.handle, Ownership::Owned);
        }
    }

    /// Returns the raw object pointer, checking that the object is alive.
    ///
    /// # Panics
    /// If the object was destroyed.
    #[doc(hidden)]
    pub fn obj_sys(&self) -> sys::GDExtensionObjectPtr {
        let entry = self.entry();
        assert!(
            is_alive(&entry),
            "{} (instance {}) was already destroyed; the handle outlived its object",
            T::CLASS_NAME,
            entry.instance_id
        );

        entry.object_ptr()
    }

    #[doc(hidden)]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    fn raw_object(&self) -> RawObject {
        RawObject::from_obj_ptr(self.obj_sys())
    }

    fn entry(&self) -> HandleEntry {
        sys::handles()
            .get(self.handle)
            .unwrap_or_else(|err| panic!("Gd<{}>: {err}", T::CLASS_NAME))
    }

    fn retype<U: GodotClass>(self) -> Gd<U> {
        // Same slot, different static type.
        let this = ManuallyDrop::new(self);
        Gd {
            handle: this.handle,
            _marker: PhantomData,
        }
    }

    /// Empties the slot without any native action.
    fn release_slot(&self) {
        let released = sys::handles().release(self.handle);
        if let Err(err) = released {
            debug_assert!(false, "Gd<{}>: {err}", T::CLASS_NAME);
            godot_error!("Gd<{}>: {err}", T::CLASS_NAME);
        }
    }
}

/// _The methods in this impl block are only available for user-declared `T`, that is, structs with `declare_class!` but not
/// engine classes like `Node2D`._
impl<T: UserClass> Gd<T> {
    /// Hands out a guard for a shared borrow, through which the user instance can be read.
    ///
    /// # Panics
    /// If there is already a mutable borrow (e.g. an override of a virtual method on this object is running with `&mut self`),
    /// or the object is not a Rust instance.
    pub fn bind(&self) -> GdRef<'_, T> {
        GdRef::from_guard(self.storage().get())
    }

    /// Hands out a guard for an exclusive borrow, through which the user instance can be read and written.
    ///
    /// # Panics
    /// If there is any other borrow of the same instance.
    pub fn bind_mut(&mut self) -> GdMut<'_, T> {
        GdMut::from_guard(self.storage().get_mut())
    }

    fn storage(&self) -> &InstanceStorage<T> {
        let instance_id = self.instance_id();
        assert!(self.is_instance_valid(), "cannot bind destroyed {} (instance {instance_id})", T::CLASS_NAME);

        // SAFETY: the object is alive, so its storage is too; it is only freed together with the object, which `self` keeps
        // alive (ref-counted) or whose owner is responsible for not freeing it during the borrow.
        unsafe { InstanceStorage::<T>::find(instance_id) }
            .unwrap_or_else(|| panic!("object {instance_id} is not a Rust instance of {}", T::CLASS_NAME))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Trait impls

impl<T: GodotClass> Clone for Gd<T> {
    fn clone(&self) -> Self {
        let entry = self.entry();

        let ownership = match entry.ownership {
            Ownership::RefCounted => {
                // SAFETY: a ref-counted handle holds a reference, so the object is alive.
                let _first: bool = unsafe { class_ptrcall("RefCounted", "reference", entry.object_ptr(), ()) };
                Ownership::RefCounted
            }
            Ownership::Owned | Ownership::Borrowed => Ownership::Borrowed,
        };

        Self::from_entry(HandleEntry::new(entry.object_ptr(), entry.instance_id, ownership))
    }
}

impl<T: GodotClass> Drop for Gd<T> {
    fn drop(&mut self) {
        let released = sys::handles().release(self.handle);

        let released = match released {
            Ok(released) => released,
            Err(err) => {
                debug_assert!(false, "Gd<{}> drop: {err}", T::CLASS_NAME);
                godot_error!("Gd<{}> drop: {err}", T::CLASS_NAME);
                return;
            }
        };

        sys::out!("Gd release {}: {:?}", self.handle, released);
        let entry = released.entry;

        // The engine may have destroyed the object meanwhile; then there is nothing left to do.
        if released.action == ReleaseAction::Forget || !is_alive(&entry) {
            return;
        }

        // SAFETY: object is alive; this handle owned it or one of its references.
        unsafe {
            match released.action {
                ReleaseAction::Destroy => interface_fn!(object_destroy)(entry.object_ptr()),
                ReleaseAction::Unreference => {
                    let last: bool = class_ptrcall("RefCounted", "unreference", entry.object_ptr(), ());
                    if last {
                        interface_fn!(object_destroy)(entry.object_ptr());
                    }
                }
                ReleaseAction::Forget => {}
            }
        }
    }
}

impl<T: GodotClass> PartialEq for Gd<T> {
    /// Two `Gd`s are equal if they refer to the same object.
    fn eq(&self, other: &Self) -> bool {
        self.instance_id() == other.instance_id()
    }
}

impl<T: GodotClass> Eq for Gd<T> {}

impl<T: GodotClass> Debug for Gd<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match sys::handles().get(self.handle) {
            Ok(entry) => write!(
                f,
                "Gd {{ class: {}, id: {}, ownership: {:?} }}",
                T::CLASS_NAME,
                entry.instance_id as i64,
                entry.ownership
            ),
            Err(err) => write!(f, "Gd {{ class: {}, {err} }}", T::CLASS_NAME),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Conversions

impl<T: GodotClass> GodotConvert for Gd<T> {
    type Via = Gd<T>;
}

impl<T: GodotClass> ToGodot for Gd<T> {
    fn to_godot(&self) -> Self::Via {
        self.clone()
    }

    fn to_variant(&self) -> Variant {
        // The variant takes its own reference; this handle keeps its own.
        Variant::from_ffi_value(&self.raw_object())
    }
}

impl<T: GodotClass> FromGodot for Gd<T> {
    fn try_from_godot(via: Self::Via) -> Result<Self, ConvertError> {
        Ok(via)
    }
}

impl<T: GodotClass> GodotType for Gd<T> {
    type Ffi = RawObject;

    fn to_ffi(&self) -> Self::Ffi {
        self.raw_object()
    }

    /// Consumes the handle. Its ownership (a reference, or the object itself) moves into the receiver of the FFI value.
    fn into_ffi(self) -> Self::Ffi {
        let raw = self.raw_object();
        let this = ManuallyDrop::new(self);
        this.release_slot();
        raw
    }

    fn try_from_ffi(raw: Self::Ffi) -> Result<Self, ConvertError> {
        let obj_ptr = checked_obj_ptr::<T>(raw)?;

        // SAFETY: the engine handed out a live object, checked for class `T`.
        Ok(unsafe { Self::from_obj_sys_borrowed(obj_ptr) })
    }

    fn try_from_return(raw: Self::Ffi, ownership: Ownership) -> Result<Self, ConvertError> {
        let obj_ptr = checked_obj_ptr::<T>(raw)?;

        // SAFETY: see `try_from_ffi()`.
        Ok(unsafe { Self::from_obj_sys_returned(obj_ptr, ownership) })
    }

    fn godot_type_name() -> String {
        T::CLASS_NAME.to_string()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Helpers

fn is_alive(entry: &HandleEntry) -> bool {
    // SAFETY: the engine accepts any ID and returns null for dead objects. Comparing the pointer guards against reused memory.
    let current = unsafe { interface_fn!(object_get_instance_from_id)(entry.instance_id) };
    !current.is_null() && current == entry.object_ptr()
}

unsafe fn obj_instance_id(obj_ptr: sys::GDExtensionObjectPtr) -> InstanceId {
    let id = interface_fn!(object_get_instance_id)(obj_ptr);
    InstanceId::try_from_u64(id).unwrap_or_else(|| panic!("live object {obj_ptr:p} has instance ID 0"))
}

/// Returns the object pointer if `obj_ptr` is an instance of `T` (or a subclass), otherwise null.
unsafe fn cast_obj_ptr<T: GodotClass>(obj_ptr: sys::GDExtensionObjectPtr) -> sys::GDExtensionObjectPtr {
    let class_name = sys::c_string(T::CLASS_NAME);
    let class_tag = interface_fn!(classdb_get_class_tag)(class_name.as_ptr());
    if class_tag.is_null() {
        return std::ptr::null_mut();
    }

    interface_fn!(object_cast_to)(obj_ptr, class_tag)
}

fn checked_obj_ptr<T: GodotClass>(raw: RawObject) -> Result<sys::GDExtensionObjectPtr, ConvertError> {
    let obj_ptr = raw.obj_ptr();
    if obj_ptr.is_null() {
        return Err(FromFfiError::NullRawGd.into_error(raw));
    }

    // SAFETY: non-null object pointers from the engine refer to live objects.
    if unsafe { cast_obj_ptr::<T>(obj_ptr) }.is_null() {
        return Err(FromFfiError::WrongObjectType.into_error(raw));
    }

    Ok(obj_ptr)
}

// Compile-time check: the FFI representation is a single pointer, as in the engine's object slots.
const _: () = assert!(std::mem::size_of::<RawObject>() == std::mem::size_of::<sys::GDExtensionObjectPtr>());

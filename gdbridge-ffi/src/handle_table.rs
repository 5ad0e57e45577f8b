/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Process-wide table of object handles and their ownership.
//!
//! Every host-side object reference (a `Gd<T>` in the typed layer) occupies one slot. The slot records the native
//! object pointer, its instance ID and the [`Ownership`] under which it was acquired. Releasing a handle empties
//! the slot and bumps its generation, so the same [`Handle`] can never be released twice or read after release,
//! even once the slot has been reused for another object.

use std::fmt;

use crate as sys;
use crate::{Global, GlobalGuard};

static HANDLES: Global<HandleTable> = Global::default();

/// Locks the process-wide handle table.
///
/// Do not call into the engine while holding the guard: engine callbacks may need the table themselves.
pub fn handles() -> GlobalGuard<'static, HandleTable> {
    HANDLES.lock()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Key of a slot in the [`HandleTable`]. Meaningless without the table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Who is responsible for the native object behind a handle.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Ownership {
    /// Newly created for the caller, who must eventually release (destroy) it.
    Owned,

    /// Kept alive by someone else, typically a parent object. Releasing only forgets the handle.
    Borrowed,

    /// Shared through the engine's reference count. Releasing drops one reference; the object dies at zero.
    RefCounted,
}

impl Ownership {
    pub fn release_action(self) -> ReleaseAction {
        match self {
            Ownership::Owned => ReleaseAction::Destroy,
            Ownership::Borrowed => ReleaseAction::Forget,
            Ownership::RefCounted => ReleaseAction::Unreference,
        }
    }
}

/// Native-side work the caller must perform after a slot was released.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ReleaseAction {
    /// Destroy the object.
    Destroy,

    /// Decrement the reference count and destroy the object if it reached zero.
    Unreference,

    /// Nothing.
    Forget,
}

/// What a slot knows about its object.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct HandleEntry {
    // Stored as address, so the table is `Send`.
    object_addr: usize,
    pub instance_id: u64,
    pub ownership: Ownership,
}

impl HandleEntry {
    pub fn new(object_ptr: sys::GDExtensionObjectPtr, instance_id: u64, ownership: Ownership) -> Self {
        Self {
            object_addr: object_ptr as usize,
            instance_id,
            ownership,
        }
    }

    pub fn object_ptr(&self) -> sys::GDExtensionObjectPtr {
        self.object_addr as sys::GDExtensionObjectPtr
    }
}

/// Result of a successful [`HandleTable::release()`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Released {
    pub entry: HandleEntry,
    pub action: ReleaseAction,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum HandleError {
    /// The slot was released (and possibly reused) since the handle was acquired.
    Stale(Handle),

    /// The handle does not come from this table.
    Unknown(Handle),
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale(handle) => write!(f, "handle {handle} was already released"),
            Self::Unknown(handle) => write!(f, "handle {handle} does not belong to the handle table"),
        }
    }
}

impl std::error::Error for HandleError {}

// ----------------------------------------------------------------------------------------------------------------------------------------------

struct Slot {
    generation: u32,
    entry: Option<HandleEntry>,
}

/// Generational slot map from [`Handle`] to [`HandleEntry`].
#[derive(Default)]
pub struct HandleTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, entry: HandleEntry) -> Handle {
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.entry.is_none(), "free list points to occupied slot {index}");

            slot.entry = Some(entry);
            return Handle {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len())
            .unwrap_or_else(|_| panic!("handle table exceeds u32::MAX slots"));
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });

        Handle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: Handle) -> Result<HandleEntry, HandleError> {
        let slot = self.slot(handle)?;

        match slot.entry {
            Some(entry) if slot.generation == handle.generation => Ok(entry),
            _ => Err(HandleError::Stale(handle)),
        }
    }

    /// Empties the slot and tells the caller which native action completes the release.
    ///
    /// A second release of the same handle returns [`HandleError::Stale`] and has no effect.
    pub fn release(&mut self, handle: Handle) -> Result<Released, HandleError> {
        let index = handle.index;
        let slot = self.slot_mut(handle)?;

        if slot.generation != handle.generation {
            return Err(HandleError::Stale(handle));
        }

        let entry = slot.entry.take().ok_or(HandleError::Stale(handle))?;

        // A slot whose generation is exhausted is retired instead of being reused.
        let retired = slot.generation == u32::MAX;
        slot.generation = slot.generation.wrapping_add(1);
        if !retired {
            self.free.push(index);
        }

        self.live -= 1;

        sys::out!("release {handle} -> {:?}", entry.ownership.release_action());
        Ok(Released {
            entry,
            action: entry.ownership.release_action(),
        })
    }

    /// Changes the ownership of a live handle, returning the previous one.
    ///
    /// Used when the engine takes over an object (e.g. a node added to a parent).
    pub fn retag(&mut self, handle: Handle, ownership: Ownership) -> Result<Ownership, HandleError> {
        let slot = self.slot_mut(handle)?;

        match &mut slot.entry {
            Some(entry) if slot.generation == handle.generation => {
                Ok(std::mem::replace(&mut entry.ownership, ownership))
            }
            _ => Err(HandleError::Stale(handle)),
        }
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn slot(&self, handle: Handle) -> Result<&Slot, HandleError> {
        self.slots
            .get(handle.index as usize)
            .ok_or(HandleError::Unknown(handle))
    }

    fn slot_mut(&mut self, handle: Handle) -> Result<&mut Slot, HandleError> {
        self.slots
            .get_mut(handle.index as usize)
            .ok_or(HandleError::Unknown(handle))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(id: u64, ownership: Ownership) -> HandleEntry {
        HandleEntry::new((0x1000 + id as usize * 8) as sys::GDExtensionObjectPtr, id, ownership)
    }

    #[test]
    fn acquire_get_release() {
        let mut table = HandleTable::new();
        let handle = table.acquire(entry(1, Ownership::Owned));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(handle), Ok(entry(1, Ownership::Owned)));

        let released = table.release(handle).expect("first release");
        assert_eq!(released.action, ReleaseAction::Destroy);
        assert_eq!(released.entry.instance_id, 1);
        assert!(table.is_empty());
    }

    #[test]
    fn double_release_is_caught() {
        let mut table = HandleTable::new();
        let handle = table.acquire(entry(1, Ownership::Owned));

        assert!(table.release(handle).is_ok());
        assert_eq!(table.release(handle), Err(HandleError::Stale(handle)));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn released_handle_cannot_be_read() {
        let mut table = HandleTable::new();
        let handle = table.acquire(entry(7, Ownership::Owned));
        table.release(handle).expect("release");

        assert_eq!(table.get(handle), Err(HandleError::Stale(handle)));
    }

    #[test]
    fn reused_slot_does_not_revive_stale_handle() {
        let mut table = HandleTable::new();
        let old = table.acquire(entry(1, Ownership::Borrowed));
        table.release(old).expect("release");

        let new = table.acquire(entry(2, Ownership::RefCounted));
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());

        assert_eq!(table.get(old), Err(HandleError::Stale(old)));
        assert_eq!(table.release(old), Err(HandleError::Stale(old)));
        assert_eq!(table.get(new).map(|e| e.instance_id), Ok(2));
    }

    #[test]
    fn release_actions_follow_ownership() {
        let mut table = HandleTable::new();
        let owned = table.acquire(entry(1, Ownership::Owned));
        let borrowed = table.acquire(entry(2, Ownership::Borrowed));
        let shared = table.acquire(entry(3, Ownership::RefCounted));

        assert_eq!(table.release(borrowed).map(|r| r.action), Ok(ReleaseAction::Forget));
        assert_eq!(table.release(shared).map(|r| r.action), Ok(ReleaseAction::Unreference));
        assert_eq!(table.release(owned).map(|r| r.action), Ok(ReleaseAction::Destroy));
    }

    #[test]
    fn retag_transfers_ownership() {
        let mut table = HandleTable::new();
        let handle = table.acquire(entry(1, Ownership::Owned));

        assert_eq!(table.retag(handle, Ownership::Borrowed), Ok(Ownership::Owned));
        assert_eq!(table.release(handle).map(|r| r.action), Ok(ReleaseAction::Forget));
        assert_eq!(
            table.retag(handle, Ownership::Owned),
            Err(HandleError::Stale(handle))
        );
    }

    #[test]
    fn foreign_handle_is_unknown() {
        let mut other = HandleTable::new();
        other.acquire(entry(1, Ownership::Owned));
        let foreign = other.acquire(entry(2, Ownership::Owned));

        let table = HandleTable::new();
        assert_eq!(table.get(foreign), Err(HandleError::Unknown(foreign)));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Acquire(u8),
        Release(usize),
        Get(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..3).prop_map(Op::Acquire),
            any::<usize>().prop_map(Op::Release),
            any::<usize>().prop_map(Op::Get),
        ]
    }

    proptest! {
        #[test]
        fn table_matches_model(ops in proptest::collection::vec(op(), 1..200)) {
            let mut table = HandleTable::new();

            // Every handle ever issued, with whether it is still live.
            let mut issued: Vec<(Handle, HandleEntry, bool)> = Vec::new();

            for (step, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Acquire(kind) => {
                        let ownership = [Ownership::Owned, Ownership::Borrowed, Ownership::RefCounted][kind as usize];
                        let e = entry(step as u64, ownership);
                        let handle = table.acquire(e);

                        prop_assert!(issued.iter().all(|(h, _, live)| !(*live && *h == handle)));
                        issued.push((handle, e, true));
                    }
                    Op::Release(i) if !issued.is_empty() => {
                        let i = i % issued.len();
                        let (handle, e, live) = issued[i];

                        let result = table.release(handle);
                        if live {
                            prop_assert_eq!(result.map(|r| r.entry), Ok(e));
                            issued[i].2 = false;
                        } else {
                            prop_assert_eq!(result, Err(HandleError::Stale(handle)));
                        }
                    }
                    Op::Get(i) if !issued.is_empty() => {
                        let (handle, e, live) = issued[i % issued.len()];

                        if live {
                            prop_assert_eq!(table.get(handle), Ok(e));
                        } else {
                            prop_assert_eq!(table.get(handle), Err(HandleError::Stale(handle)));
                        }
                    }
                    _ => {}
                }

                let live = issued.iter().filter(|(_, _, live)| *live).count();
                prop_assert_eq!(table.len(), live);
            }
        }
    }
}

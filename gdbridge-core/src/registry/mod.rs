/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Registration of user classes and dispatch of overridden virtual methods.
//!
//! User classes are registered in one explicit pass during library initialization (see
//! [`ExtensionLibrary::register_classes()`](crate::init::ExtensionLibrary::register_classes)). For each class, the engine receives
//! a set of [callbacks] through which it creates and frees the Rust part of objects and calls overridden virtual methods.

mod builder;
mod class;
mod declare;
mod storage;
mod virtuals;

pub mod callbacks;

pub use builder::ClassBuilder;
pub use class::{virtual_state, ClassRegistrar, RegisterError};
pub use virtuals::{VirtualMethodSpec, VirtualState};

pub(crate) use builder::ClassData;
pub use storage::live_instance_count;
pub(crate) use storage::InstanceStorage;
pub(crate) use virtuals::VirtualEntry;

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod array;
mod dictionary;
mod packed_array;
mod packed_array_element;

// Re-export in engine-specific namespace.
pub use array::Array;
pub use dictionary::Dictionary;
pub use packed_array::*;
pub use packed_array_element::PackedArrayElement;

pub(crate) use array::ARRAY_METHODS;
pub(crate) use dictionary::DICTIONARY_METHODS;
pub(crate) use packed_array::PACKED_ARRAY_METHODS;

/// Specialized iterators for collection types.
pub mod iterators {
    pub use super::array::Iter as ArrayIter;
    pub use super::dictionary::Iter as DictionaryIter;
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use glam::IVec2;

use crate::builtin::{real, Vector2};

/// Vector used for 2D math using integer coordinates.
///
/// 2-element structure that can be used to represent positions in 2D space or any other pair of
/// numeric values.
///
/// It uses integer coordinates and is therefore preferable to [`Vector2`] when exact precision is
/// required. Note that the values are limited to 32 bits, and unlike [`Vector2`] this cannot be
/// configured with an engine build option.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Vector2i {
    /// The vector's X component.
    pub x: i32,

    /// The vector's Y component.
    pub y: i32,
}

impl Vector2i {
    /// Vector with all components set to `0`.
    pub const ZERO: Self = Self::splat(0);

    /// Vector with all components set to `1`.
    pub const ONE: Self = Self::splat(1);

    /// Constructs a new `Vector2i` from the given `x` and `y`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Constructs a new `Vector2i` with both components set to `v`.
    pub const fn splat(v: i32) -> Self {
        Self::new(v, v)
    }

    /// Constructs a new `Vector2i` from a [`Vector2`]. The floating point coordinates of the
    /// argument are truncated.
    pub const fn from_vector2(v: Vector2) -> Self {
        Self {
            x: v.x as i32,
            y: v.y as i32,
        }
    }

    fn from_glam(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }

    fn to_glam(self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    pub fn abs(self) -> Self {
        Self::from_glam(self.to_glam().abs())
    }

    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::from_glam(self.to_glam().clamp(min.to_glam(), max.to_glam()))
    }

    pub fn length(self) -> real {
        Vector2::from_vector2i(self).length()
    }

    pub fn length_squared(self) -> i32 {
        self.to_glam().length_squared()
    }
}

/// Formats the vector like the engine: `(x, y)`.
impl fmt::Display for Vector2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl_vector_operators!(Vector2i, i32, (x, y));
impl_vector_ffi!(Vector2i);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncating_conversion() {
        assert_eq!(Vector2i::from_vector2(Vector2::new(1.9, -1.9)), Vector2i::new(1, -1));
        assert_eq!(Vector2i::new(3, 4).length(), 5.0);
        assert_eq!(Vector2i::new(-3, 4).abs(), Vector2i::new(3, 4));
    }
}

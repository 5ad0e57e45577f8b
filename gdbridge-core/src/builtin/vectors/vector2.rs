/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::builtin::{real, RVec2, Vector2i};

/// Vector used for 2D math using floating point coordinates.
///
/// 2-element structure that can be used to represent positions in 2D space or any other pair of
/// numeric values.
///
/// It uses floating-point coordinates of 32-bit precision, unlike the engine's `float` type which
/// is always 64-bit. The engine can be compiled with the option `precision=double` to use 64-bit
/// vectors; use the `double-precision` feature in that case.
///
/// See [`Vector2i`] for its integer counterpart.
#[derive(Default, Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Vector2 {
    /// The vector's X component.
    pub x: real,

    /// The vector's Y component.
    pub y: real,
}

impl Vector2 {
    /// Vector with all components set to `0.0`.
    pub const ZERO: Self = Self::splat(0.0);

    /// Vector with all components set to `1.0`.
    pub const ONE: Self = Self::splat(1.0);

    /// Unit vector in -X direction (right in 2D coordinate system).
    pub const LEFT: Self = Self::new(-1.0, 0.0);

    /// Unit vector in +X direction (right in 2D coordinate system).
    pub const RIGHT: Self = Self::new(1.0, 0.0);

    /// Unit vector in -Y direction (up in 2D coordinate system).
    pub const UP: Self = Self::new(0.0, -1.0);

    /// Unit vector in +Y direction (down in 2D coordinate system).
    pub const DOWN: Self = Self::new(0.0, 1.0);

    /// Constructs a new `Vector2` from the given `x` and `y`.
    pub const fn new(x: real, y: real) -> Self {
        Self { x, y }
    }

    /// Constructs a new `Vector2` with both components set to `v`.
    pub const fn splat(v: real) -> Self {
        Self::new(v, v)
    }

    /// Constructs a new `Vector2` from a [`Vector2i`].
    pub const fn from_vector2i(v: Vector2i) -> Self {
        Self {
            x: v.x as real,
            y: v.y as real,
        }
    }

    fn from_glam(v: RVec2) -> Self {
        Self::new(v.x, v.y)
    }

    fn to_glam(self) -> RVec2 {
        RVec2::new(self.x, self.y)
    }

    pub fn abs(self) -> Self {
        Self::from_glam(self.to_glam().abs())
    }

    pub fn angle(self) -> real {
        self.y.atan2(self.x)
    }

    pub fn cross(self, with: Self) -> real {
        self.to_glam().perp_dot(with.to_glam())
    }

    pub fn distance_to(self, to: Self) -> real {
        (to - self).length()
    }

    pub fn dot(self, with: Self) -> real {
        self.to_glam().dot(with.to_glam())
    }

    pub fn length(self) -> real {
        self.to_glam().length()
    }

    pub fn length_squared(self) -> real {
        self.to_glam().length_squared()
    }

    pub fn lerp(self, to: Self, weight: real) -> Self {
        Self::from_glam(self.to_glam().lerp(to.to_glam(), weight))
    }

    /// Returns the vector scaled to unit length, or [`Vector2::ZERO`] if its length is zero.
    pub fn normalized(self) -> Self {
        Self::from_glam(self.to_glam().normalize_or_zero())
    }
}

/// Formats the vector like the engine: `(x, y)`.
impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl_vector_operators!(Vector2, real, (x, y));
impl_vector_ffi!(Vector2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(3.0, -4.0);

        assert_eq!(a + b, Vector2::new(4.0, -2.0));
        assert_eq!(a - b, Vector2::new(-2.0, 6.0));
        assert_eq!(a * 2.0, Vector2::new(2.0, 4.0));
        assert_eq!(-a, Vector2::new(-1.0, -2.0));
        assert_eq!(a.dot(b), -5.0);
        assert_eq!(b.length(), 5.0);
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Vector2::ZERO.normalized(), Vector2::ZERO);
        assert_eq!(Vector2::new(0.0, 3.0).normalized(), Vector2::DOWN);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let vector = Vector2::new(1.5, -2.0);
        let json = serde_json::to_string(&vector).unwrap();
        let back: Vector2 = serde_json::from_str(&json).unwrap();

        assert_eq!(back, vector);
    }
}

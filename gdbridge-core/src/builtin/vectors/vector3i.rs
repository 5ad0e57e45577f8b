/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use glam::IVec3;

use crate::builtin::{real, Vector3};

/// Vector used for 3D math using integer coordinates.
///
/// 3-element structure that can be used to represent positions in 3D space or any other triple of
/// numeric values.
///
/// It uses integer coordinates and is therefore preferable to [`Vector3`] when exact precision is
/// required. Note that the values are limited to 32 bits.
#[derive(Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Vector3i {
    /// The vector's X component.
    pub x: i32,

    /// The vector's Y component.
    pub y: i32,

    /// The vector's Z component.
    pub z: i32,
}

impl Vector3i {
    /// Vector with all components set to `0`.
    pub const ZERO: Self = Self::splat(0);

    /// Vector with all components set to `1`.
    pub const ONE: Self = Self::splat(1);

    /// Returns a `Vector3i` with the given components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns a new `Vector3i` with all components set to `v`.
    pub const fn splat(v: i32) -> Self {
        Self::new(v, v, v)
    }

    /// Constructs a new `Vector3i` from a [`Vector3`]. The floating point coordinates of the argument
    /// are truncated.
    pub const fn from_vector3(v: Vector3) -> Self {
        Self {
            x: v.x as i32,
            y: v.y as i32,
            z: v.z as i32,
        }
    }

    fn from_glam(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    fn to_glam(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    pub fn abs(self) -> Self {
        Self::from_glam(self.to_glam().abs())
    }

    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::from_glam(self.to_glam().clamp(min.to_glam(), max.to_glam()))
    }

    pub fn length(self) -> real {
        Vector3::from_vector3i(self).length()
    }

    pub fn length_squared(self) -> i32 {
        self.to_glam().length_squared()
    }
}

/// Formats the vector like the engine: `(x, y, z)`.
impl fmt::Display for Vector3i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl_vector_operators!(Vector3i, i32, (x, y, z));
impl_vector_ffi!(Vector3i);

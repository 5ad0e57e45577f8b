/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#[cfg(not(feature = "double-precision"))]
mod real_mod {
    /// Floating point type used for many structs and functions in the engine.
    ///
    /// This type is `f32` by default, and `f64` when the Cargo feature `double-precision` is enabled.
    ///
    /// This is not the `float` type in GDScript; that type is always 64-bits. Rather, many structs in the engine
    /// such as `Vector2` use `real` for their components.
    #[allow(non_camel_case_types)]
    pub type real = f32;

    pub type RVec2 = glam::Vec2;
    pub type RVec3 = glam::Vec3;
}

#[cfg(feature = "double-precision")]
mod real_mod {
    /// Floating point type used for many structs and functions in the engine.
    ///
    /// This type is `f32` by default, and `f64` when the Cargo feature `double-precision` is enabled.
    #[allow(non_camel_case_types)]
    pub type real = f64;

    pub type RVec2 = glam::DVec2;
    pub type RVec3 = glam::DVec3;
}

pub use real_mod::real;
pub(crate) use real_mod::{RVec2, RVec3};

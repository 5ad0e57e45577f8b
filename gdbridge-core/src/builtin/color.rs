/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use glam::Vec4;

use crate::sys;

/// Color built-in type, in floating-point RGBA format.
///
/// Channel values are _typically_ in the range of 0 to 1, but this is not a requirement, and
/// values outside this range are explicitly allowed for e.g. High Dynamic Range (HDR).
///
/// Unlike vectors, color channels are always `f32`, also with the `double-precision` feature.
#[repr(C)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// The color's red component.
    pub r: f32,

    /// The color's green component.
    pub g: f32,

    /// The color's blue component.
    pub b: f32,

    /// The color's alpha component. A value of 0 means that the color is fully transparent. A
    /// value of 1 means that the color is fully opaque.
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT_BLACK: Color = Color::from_rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::from_rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::from_rgb(1.0, 1.0, 1.0);

    /// Constructs a new `Color` with the given components.
    pub const fn from_rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs a new `Color` with the given color components, and the alpha channel set to 1.
    pub const fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self::from_rgba(r, g, b, 1.0)
    }

    /// Constructs a new `Color` with the given components as bytes. 0 is mapped to 0.0, 255 is
    /// mapped to 1.0.
    ///
    /// _Godot equivalent: the global `Color8` function_
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_rgba(from_u8(r), from_u8(g), from_u8(b), from_u8(a))
    }

    /// Returns the color with its alpha channel replaced.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Returns the light intensity of the color, as a value between 0.0 and 1.0 (inclusive).
    ///
    /// Uses the Rec. 709 luma coefficients; the color should be in linear color space.
    pub fn luminance(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    /// Linearly interpolates all four channels.
    pub fn lerp(self, to: Self, weight: f64) -> Self {
        Self::from_glam(self.to_glam().lerp(to.to_glam(), weight as f32))
    }

    /// Packs the color into 32 bits, 8 bits per channel in RGBA order.
    pub fn to_rgba32(self) -> u32 {
        [self.r, self.g, self.b, self.a]
            .into_iter()
            .fold(0, |acc, channel| (acc << 8) | u32::from(to_u8(channel)))
    }

    fn from_glam(v: Vec4) -> Self {
        Self::from_rgba(v.x, v.y, v.z, v.w)
    }

    fn to_glam(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

/// Formats the color like the engine: `(r, g, b, a)`.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

// SAFETY: `#[repr(C)]` with four `f32` channels, exactly the engine's layout.
unsafe impl sys::GodotFfi for Color {
    fn variant_type() -> sys::VariantType {
        sys::VariantType::Color
    }

    sys::ffi_methods! { type sys::GDExtensionTypePtr = *mut Self; .. }
}

impl_builtin_convert!(Color => "Color");

fn from_u8(byte: u8) -> f32 {
    f32::from(byte) / 255.0
}

fn to_u8(channel: f32) -> u8 {
    // `as` saturates, out-of-range HDR channels clamp to 0 and 255.
    (channel * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_conversions() {
        let color = Color::from_rgba8(255, 0, 51, 255);

        assert_eq!(color, Color::from_rgba(1.0, 0.0, 0.2, 1.0));
        assert_eq!(color.to_rgba32(), 0xff0033ff);
        assert_eq!(Color::from_rgb(2.0, -1.0, 0.0).to_rgba32(), 0xff0000ff);
    }

    #[test]
    fn lerp_halfway() {
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);

        assert_eq!(mid, Color::from_rgb(0.5, 0.5, 0.5));
        assert_eq!(Color::WHITE.with_alpha(0.0).a, 0.0);
    }
}

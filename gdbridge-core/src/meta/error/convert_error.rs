/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

use crate::sys::VariantType;

type Cause = Box<dyn Error + Send + Sync>;

/// Represents errors that can occur when converting values from the engine.
///
/// To create user-defined errors, you can use [`ConvertError::default()`] or [`ConvertError::new("message")`][Self::new].
#[derive(Debug)]
pub struct ConvertError {
    kind: ErrorKind,

    // Debug representation of the offending value. Kept as text, so the error stays `Send + Sync` and outlives the engine.
    value: Option<String>,
}

impl ConvertError {
    /// Construct with a user-defined message.
    ///
    /// If you don't need a custom message, consider using [`ConvertError::default()`] instead.
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Custom(Some(user_message.into().into())),
            ..Default::default()
        }
    }

    /// Create a new custom error for a conversion with the value that failed to convert.
    pub(crate) fn with_kind_value<V: fmt::Debug>(kind: ErrorKind, value: V) -> Self {
        Self {
            kind,
            value: Some(format!("{value:?}")),
        }
    }

    /// Create a new custom error wrapping an [`Error`].
    pub fn with_error<E>(error: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            kind: ErrorKind::Custom(Some(error.into())),
            ..Default::default()
        }
    }

    /// Returns the rust-error that caused this error, if one exists.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match &self.kind {
            ErrorKind::Custom(Some(cause)) => Some(&**cause),
            _ => None,
        }
    }

    /// Debug representation of the value that failed to convert, if one exists.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(value) = &self.value {
            write!(f, ": {value}")?;
        }

        Ok(())
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause().map(|v| v as &(dyn Error + 'static))
    }
}

impl Default for ConvertError {
    /// Create a custom error, without any description.
    ///
    /// If you need a custom message, consider using [`ConvertError::new("message")`][Self::new] instead.
    fn default() -> Self {
        Self {
            kind: ErrorKind::Custom(None),
            value: None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ErrorKind {
    FromGodot(FromGodotError),
    FromFfi(FromFfiError),
    FromVariant(FromVariantError),
    Custom(Option<Cause>),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromGodot(from_godot) => write!(f, "{from_godot}"),
            Self::FromVariant(from_variant) => write!(f, "{from_variant}"),
            Self::FromFfi(from_ffi) => write!(f, "{from_ffi}"),
            Self::Custom(Some(cause)) => write!(f, "{cause}"),
            Self::Custom(None) => write!(f, "custom error"),
        }
    }
}

/// Conversion failed during a [`FromGodot`](crate::meta::FromGodot) call.
#[derive(Eq, PartialEq, Debug)]
pub(crate) enum FromGodotError {
    /// A container element does not convert to the requested host type.
    BadElement { index: usize },
    InvalidEnum,
    ZeroInstanceId,
}

impl FromGodotError {
    pub fn into_error<V: fmt::Debug>(self, value: V) -> ConvertError {
        ConvertError::with_kind_value(ErrorKind::FromGodot(self), value)
    }
}

impl fmt::Display for FromGodotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadElement { index } => write!(f, "element at index {index} has the wrong type"),
            Self::InvalidEnum => write!(f, "invalid engine enum value"),
            Self::ZeroInstanceId => write!(f, "`InstanceId` cannot be 0"),
        }
    }
}

/// Conversion failed during a [`GodotType::try_from_ffi()`](crate::meta::GodotType::try_from_ffi()) call.
#[derive(Eq, PartialEq, Debug)]
#[non_exhaustive]
pub(crate) enum FromFfiError {
    NullRawGd,
    WrongObjectType,
    DeadObject,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
}

impl FromFfiError {
    pub fn into_error<V: fmt::Debug>(self, value: V) -> ConvertError {
        ConvertError::with_kind_value(ErrorKind::FromFfi(self), value)
    }
}

impl fmt::Display for FromFfiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self {
            Self::NullRawGd => return write!(f, "`Gd` cannot be null"),
            Self::WrongObjectType => return write!(f, "given object cannot be cast to target type"),
            Self::DeadObject => return write!(f, "object is no longer alive"),
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
        };

        write!(f, "`{target}` cannot store the given value")
    }
}

#[derive(Eq, PartialEq, Debug)]
pub(crate) enum FromVariantError {
    /// Variant type does not match expected type.
    BadType { expected: VariantType, actual: VariantType },

    /// The engine stored a type that this crate does not bridge.
    UnknownType(u32),

    WrongClass { expected: &'static str },

    /// Containers are nested too deeply, or contain themselves.
    TooDeep { max_depth: usize },
}

impl FromVariantError {
    pub fn into_error<V: fmt::Debug>(self, value: V) -> ConvertError {
        ConvertError::with_kind_value(ErrorKind::FromVariant(self), value)
    }
}

impl fmt::Display for FromVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadType { expected, actual } => {
                write!(f, "expected type {expected}, got {actual}")
            }
            Self::UnknownType(sys_type) => write!(f, "variant type {sys_type} is not supported"),
            Self::WrongClass { expected } => {
                write!(f, "expected class {expected}")
            }
            Self::TooDeep { max_depth } => {
                write!(f, "containers nested deeper than {max_depth} levels (or containing themselves)")
            }
        }
    }
}

fn __ensure_send_sync() {
    fn check<T: Send + Sync>() {}
    check::<ConvertError>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_value() {
        let err = FromFfiError::I32.into_error(1_i64 << 40);
        assert_eq!(err.to_string(), "`i32` cannot store the given value: 1099511627776");

        let err = FromVariantError::BadType {
            expected: VariantType::Int,
            actual: VariantType::String,
        }
        .into_error("\"hello\"");
        assert_eq!(err.to_string(), r#"expected type int, got String: "\"hello\"""#);
    }

    #[test]
    fn custom_errors_expose_cause() {
        let err = ConvertError::new("not a color name");
        assert_eq!(err.to_string(), "not a color name");
        assert!(err.cause().is_some());
        assert!(err.value_str().is_none());

        let err = ConvertError::default();
        assert!(err.cause().is_none());
        assert_eq!(err.to_string(), "custom error");
    }
}

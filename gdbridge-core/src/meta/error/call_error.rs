/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

use crate::meta::error::ConvertError;
use crate::meta::CallContext;
use crate::sys;

/// Error capable of representing failed ptrcalls, in both directions.
///
/// Allows to inspect the involved class and method via `class_name()` and `method_name()`. Implements the `std::error::Error` trait,
/// so it comes with `Display` and `Error::source()` APIs.
///
/// # Possible error causes
/// - **Failed argument encoding**: an argument's type or width differs from the declared parameter, or a parameter without default
///   was omitted.
/// - **Failed argument conversion**: an argument of a virtual call cannot be converted to the override's parameter type.
/// - **Failed return value conversion**: the return slot does not convert to the expected type.
/// - **User panic**: a Rust override caused a panic.
pub struct CallError {
    // Boxed, so that `Result<T, CallError>` stays small.
    b: Box<InnerCallError>,
}

#[derive(Debug)]
struct InnerCallError {
    class_name: String,
    function_name: String,
    reason: String,
    source: Option<SourceError>,
}

impl CallError {
    // Naming:
    // - check_* means possible failure -- Result<(), Self> is returned.
    // - failed_* means definitive failure -- Self is returned.

    /// Name of the class/builtin whose method failed.
    pub fn class_name(&self) -> &str {
        &self.b.class_name
    }

    /// Name of the function or method that failed.
    pub fn method_name(&self) -> &str {
        &self.b.function_name
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Constructors returning Result<(), Self>; possible failure

    /// Checks that the Rust return type matches the declared return slot.
    pub(crate) fn check_return_type(
        call_ctx: &CallContext,
        declared: (sys::SlotType, sys::ArgumentMetadata),
        actual: (sys::SlotType, sys::ArgumentMetadata),
    ) -> Result<(), Self> {
        if declared == actual {
            return Ok(());
        }

        let reason = format!(
            "return type is declared as {} ({:?}), but read as {} ({:?})",
            declared.0, declared.1, actual.0, actual.1
        );
        Err(Self::new(call_ctx, reason, None))
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Constructors returning Self; definitive failure

    pub(crate) fn failed_encoding(call_ctx: &CallContext, err: sys::FrameError) -> Self {
        Self::new(call_ctx, "arguments do not match the declared parameters", Some(SourceError::Frame(err)))
    }

    pub(crate) fn failed_param_conversion(call_ctx: &CallContext, param_index: usize, err: ConvertError) -> Self {
        Self::new(
            call_ctx,
            format!("parameter #{param_index} conversion"),
            Some(SourceError::Convert(err)),
        )
    }

    pub(crate) fn failed_return_conversion(call_ctx: &CallContext, err: ConvertError) -> Self {
        Self::new(call_ctx, "return value conversion", Some(SourceError::Convert(err)))
    }

    pub(crate) fn failed_resolve(call_ctx: &CallContext, err: sys::ResolveError) -> Self {
        Self::new(call_ctx, "method is not bound", Some(SourceError::Resolve(err)))
    }

    #[doc(hidden)]
    pub fn failed_by_user_panic(call_ctx: &CallContext, panic_message: String) -> Self {
        Self::new(call_ctx, format!("function panicked: {panic_message}"), None)
    }

    fn new(call_ctx: &CallContext, reason: impl Into<String>, source: Option<SourceError>) -> Self {
        let inner = InnerCallError {
            class_name: call_ctx.class_name.to_string(),
            function_name: call_ctx.function_name.to_string(),
            reason: reason.into(),
            source,
        };

        Self { b: Box::new(inner) }
    }

    /// Describes the error.
    ///
    /// This is the same as the `Display`/`ToString` repr, but allows to skip the source errors.
    pub fn message(&self, with_source: bool) -> String {
        let InnerCallError {
            class_name,
            function_name,
            reason,
            source,
        } = &*self.b;

        let source_str = match source {
            Some(source) if with_source => format!("\n  Source: {source}"),
            _ => String::new(),
        };

        format!("{class_name}::{function_name}(): {reason}{source_str}")
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message(true))
    }
}

impl fmt::Debug for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallError({})", self.message(true))
    }
}

impl Error for CallError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.b.source.as_ref() {
            Some(SourceError::Convert(err)) => Some(err),
            Some(SourceError::Frame(err)) => Some(err),
            Some(SourceError::Resolve(err)) => Some(err),
            None => None,
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Source errors

#[derive(Debug)]
enum SourceError {
    Convert(ConvertError),
    Frame(sys::FrameError),
    Resolve(sys::ResolveError),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Convert(err) => write!(f, "{err}"),
            SourceError::Frame(err) => write!(f, "{err}"),
            SourceError::Resolve(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CallContext<'static> {
        CallContext::func("BridgeCheck", "check")
    }

    #[test]
    fn encoding_error_names_call_and_source() {
        let err = CallError::failed_encoding(
            &ctx(),
            sys::FrameError::MissingArg {
                method: "check",
                param: "text",
            },
        );

        assert_eq!(err.class_name(), "BridgeCheck");
        assert_eq!(err.method_name(), "check");
        assert_eq!(
            err.to_string(),
            "BridgeCheck::check(): arguments do not match the declared parameters\n  \
             Source: parameter `text` of `check` was omitted but has no default"
        );
        assert_eq!(
            err.message(false),
            "BridgeCheck::check(): arguments do not match the declared parameters"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn return_type_check() {
        let int = (sys::SlotType::Value(sys::VariantType::Int), sys::ArgumentMetadata::None);
        let int32 = (sys::SlotType::Value(sys::VariantType::Int), sys::ArgumentMetadata::IntIsInt32);

        assert!(CallError::check_return_type(&ctx(), int, int).is_ok());

        let err = CallError::check_return_type(&ctx(), int32, int).unwrap_err();
        assert!(err.to_string().contains("declared as int (IntIsInt32)"), "{err}");
    }

    #[test]
    fn call_error_is_small() {
        assert_eq!(std::mem::size_of::<CallError>(), std::mem::size_of::<usize>());
    }
}

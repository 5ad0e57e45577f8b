/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Items used by the macros and trampolines. Not part of the public API.

use std::ffi::CString;
use std::sync::{Arc, Mutex};

pub use crate::registry::callbacks;
pub use sys::out;

use crate::global::godot_error;
use crate::sys;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Panic handling

#[derive(Debug)]
struct GodotPanicInfo {
    line: u32,
    file: String,
}

pub fn extract_panic_message(err: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = err.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("(panic of type ID {:?})", err.type_id())
    }
}

fn format_panic_message(msg: String) -> String {
    // If the message contains newlines, print all of the lines after a line break, and indent them.
    let lbegin = "\n  ";
    let indented = msg.replace('\n', lbegin);

    if indented.len() != msg.len() {
        format!("[panic]{lbegin}{indented}")
    } else {
        format!("[panic]  {msg}")
    }
}

pub fn flush_stdout() {
    use std::io::Write;

    // Nothing sensible to do if stdout is gone.
    let _ = std::io::stdout().flush();
}

/// Executes `code`. If a panic is thrown, it is caught and an error message is printed to the engine.
///
/// Returns `Err(message)` if a panic occurred, and `Ok(result)` with the result of `code` otherwise.
///
/// Every entry point through which the engine calls into Rust goes through this function: unwinding across the C boundary
/// would abort the process.
pub fn handle_panic<E, F, R, S>(error_context: E, code: F) -> Result<R, String>
where
    E: FnOnce() -> S,
    F: FnOnce() -> R + std::panic::UnwindSafe,
    S: std::fmt::Display,
{
    let info: Arc<Mutex<Option<GodotPanicInfo>>> = Arc::new(Mutex::new(None));

    // Back up previous hook, set new one.
    let prev_hook = std::panic::take_hook();
    {
        let info = info.clone();
        std::panic::set_hook(Box::new(move |panic_info| {
            if let Some(location) = panic_info.location() {
                let mut guard = info.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                *guard = Some(GodotPanicInfo {
                    file: location.file().to_string(),
                    line: location.line(),
                });
            } else {
                eprintln!("panic occurred, but can't get location information");
            }
        }));
    }

    // Run code that should panic, restore hook.
    let panic = std::panic::catch_unwind(code);
    std::panic::set_hook(prev_hook);

    match panic {
        Ok(result) => Ok(result),
        Err(err) => {
            // Flush, to make sure previous Rust output has been printed before the error.
            flush_stdout();

            let guard = info.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match guard.as_ref() {
                Some(info) => godot_error!(
                    "Rust function panicked at {}:{}.\n  Context: {}",
                    info.file,
                    info.line,
                    error_context()
                ),
                None => godot_error!("Rust function panicked.\n  Context: {}", error_context()),
            }

            let msg = extract_panic_message(err);
            let msg = format_panic_message(msg);
            godot_error!("{msg}");

            Err(msg)
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Logging helpers

/// Converts a log message to a C string. Interior NUL bytes would cut the message short, so they are replaced.
pub fn c_message(msg: &str) -> CString {
    CString::new(msg.replace('\0', "\\0")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(extract_panic_message(payload), "static message");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(extract_panic_message(payload), "owned");

        assert_eq!(format_panic_message("single".to_string()), "[panic]  single");
        assert_eq!(format_panic_message("a\nb".to_string()), "[panic]\n  a\n  b");
    }

    #[test]
    fn handle_panic_without_engine() {
        let ok = handle_panic(|| "no panic", || 7);
        assert_eq!(ok, Ok(7));

        let err = handle_panic(|| "test context", || -> i32 { panic!("boom") });
        assert_eq!(err, Err("[panic]  boom".to_string()));
    }

    #[test]
    fn messages_never_contain_nul() {
        assert_eq!(c_message("a\0b").as_bytes(), b"a\\0b");
    }
}

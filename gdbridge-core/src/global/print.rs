/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Printing and logging functionality.

// https://stackoverflow.com/a/40234666
#[macro_export]
#[doc(hidden)]
macro_rules! inner_function {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap_or(name)
    }};
}

#[macro_export]
#[doc(hidden)]
macro_rules! inner_godot_msg {
    ($godot_fn:ident; $fmt:literal $(, $args:expr)* $(,)?) => {{
        let msg = format!($fmt $(, $args)*);

        // Before the engine is bound (unit tests, early init failures), fall back to stderr.
        if $crate::sys::is_initialized() {
            let msg = $crate::private::c_message(&msg);
            let function = $crate::private::c_message($crate::inner_function!());
            let file = $crate::private::c_message(file!());

            // SAFETY: all strings are NUL-terminated and outlive the call.
            unsafe {
                $crate::sys::interface_fn!($godot_fn)(
                    msg.as_ptr(),
                    function.as_ptr(),
                    file.as_ptr(),
                    line!() as i32,
                    false as $crate::sys::GDExtensionBool, // whether to create a toast notification in editor
                );
            }
        } else {
            eprintln!("[{}] {}", stringify!($godot_fn), msg);
        }
    }};
}

/// Pushes a warning message to the engine's debugger and to the OS terminal.
#[macro_export]
macro_rules! godot_warn {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_godot_msg!(print_warning; $fmt $(, $args)*)
    };
}

/// Pushes an error message to the engine's debugger and to the OS terminal.
///
/// Failures at the boundary that cannot be returned to a caller (panics in overrides, failed conversions of virtual call
/// arguments, handles released twice) are reported through this macro.
#[macro_export]
macro_rules! godot_error {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::inner_godot_msg!(print_error; $fmt $(, $args)*)
    };
}

/// Prints to standard output.
///
/// The extension interface has no plain print entry, so messages go to the process' stdout, which the engine shares.
#[macro_export]
macro_rules! godot_print {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        println!($fmt $(, $args)*)
    };
}

//! Host value <-> native type conversion API
//!
//! Used by the dispatcher to decode operation arguments and by the syscalls
//! to encode native results.
//! Function naming convention:
//! - Functions starting with `sc_` are the public conversion API.
//! - Narrowing integer conversions are plain `as` casts unless the `secure`
//!   feature is enabled, in which case out-of-range values are rejected.
use std::ffi::{CStr, CString};
use std::sync::Arc;

use crate::interface::errnos::{SysError, SysResult};
use crate::interface::file::{Handle, HandleKind};
use crate::interface::types::Value;

fn type_error(expected: &'static str, found: &Value) -> SysError {
    SysError::Type {
        expected,
        found: found.type_name(),
    }
}

fn to_cstring(text: &str) -> SysResult<CString> {
    CString::new(text).map_err(|_| SysError::Type {
        expected: "string without NUL bytes",
        found: "string with NUL bytes",
    })
}

/// Owned NUL-terminated copy of a string value. Dropped by the caller's
/// scope on every exit path.
pub fn sc_convert_value_to_cstring(arg: &Value) -> SysResult<CString> {
    match arg {
        Value::Str(s) => to_cstring(s),
        other => Err(type_error("string", other)),
    }
}

/// Like `sc_convert_value_to_cstring` but also takes a symbol, whose text is
/// used as the name.
pub fn sc_convert_name_to_cstring(arg: &Value) -> SysResult<CString> {
    match arg {
        Value::Str(s) | Value::Sym(s) => to_cstring(s),
        other => Err(type_error("string or symbol", other)),
    }
}

pub fn sc_convert_value_to_i64(arg: &Value) -> SysResult<i64> {
    match arg {
        Value::Int(i) => Ok(*i),
        other => Err(type_error("integer", other)),
    }
}

macro_rules! narrowing_conversion {
    ($(#[$meta:meta])* $fname:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fname(arg: &Value) -> SysResult<$ty> {
            let wide = sc_convert_value_to_i64(arg)?;
            if cfg!(feature = "secure") {
                <$ty>::try_from(wide).map_err(|_| SysError::Type {
                    expected: stringify!($ty),
                    found: "out-of-range integer",
                })
            } else {
                Ok(wide as $ty)
            }
        }
    };
}

narrowing_conversion!(sc_convert_value_to_i32, i32);
narrowing_conversion!(
    /// Permission bits for mkdir/chmod/umask.
    sc_convert_value_to_mode,
    libc::mode_t
);
narrowing_conversion!(sc_convert_value_to_pid, libc::pid_t);
narrowing_conversion!(sc_convert_value_to_time, libc::time_t);

/// Host truthiness, used for flag arguments.
pub fn sc_convert_value_to_bool(arg: &Value) -> bool {
    arg.is_truthy()
}

/// Copy a native string into a host string. The source stays owned by
/// whoever allocated it.
pub fn sc_convert_cstr_to_value(s: &CStr) -> Value {
    Value::Str(s.to_string_lossy().into_owned())
}

/// Every element of a list of strings as an owned buffer, in order.
pub fn sc_convert_list_to_cstrings(arg: &Value) -> SysResult<Vec<CString>> {
    let items = match arg {
        Value::List(items) => items,
        other => return Err(type_error("list of strings", other)),
    };
    items.iter().map(sc_convert_value_to_cstring).collect()
}

pub fn sc_convert_value_to_handle(arg: &Value, kind: HandleKind) -> SysResult<Arc<Handle>> {
    match arg {
        Value::Handle(handle) if handle.kind() == kind => Ok(Arc::clone(handle)),
        Value::Handle(handle) => Err(SysError::Type {
            expected: kind.describe(),
            found: handle.kind().describe(),
        }),
        other => Err(type_error(kind.describe(), other)),
    }
}

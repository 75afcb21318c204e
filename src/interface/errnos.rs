//! Error status capture and error types
//!
//! Every fallible native call is followed by `ErrorStatus::capture()`, which
//! copies the ambient `errno` into the session's cell before anything else can
//! allocate and clobber it. Wrappers then report the outcome as a `SysResult`.
use std::ffi::CStr;
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicI32, Ordering};

use libc::c_char;
use thiserror::Error;

use crate::constants::{errno_name, ENV_LOCALE_NAME, ERRMSG_BUFSIZE};
use crate::interface::verbosity;

/// Raw errno value as reported by the host OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub i32);

impl Errno {
    pub const EPERM: Errno = Errno(libc::EPERM);
    pub const ENOENT: Errno = Errno(libc::ENOENT);
    pub const EBADF: Errno = Errno(libc::EBADF);
    pub const EEXIST: Errno = Errno(libc::EEXIST);
    pub const EINVAL: Errno = Errno(libc::EINVAL);
    pub const EDOM: Errno = Errno(libc::EDOM);
    pub const ERANGE: Errno = Errno(libc::ERANGE);
    pub const EOVERFLOW: Errno = Errno(libc::EOVERFLOW);

    pub fn code(self) -> i32 {
        self.0
    }

    /// Symbolic name such as `"ENOENT"`, `None` for codes the platform table
    /// does not know.
    pub fn name(self) -> Option<&'static str> {
        errno_name(self.0)
    }

    /// Human readable message in the `LC_MESSAGES` locale of the environment.
    pub fn message(self) -> String {
        // The locale only lives for this lookup
        let _locale = MessagesLocale::install();
        let mut buf = [0 as c_char; ERRMSG_BUFSIZE];
        unsafe { libc::strerror_r(self.0, buf.as_mut_ptr(), buf.len()) };
        let msg = unsafe { CStr::from_ptr(buf.as_ptr()) };
        if msg.to_bytes().is_empty() {
            format!("Unknown error {}", self.0)
        } else {
            msg.to_string_lossy().into_owned()
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "errno {}", self.0),
        }
    }
}

/// Thread locale built from the environment's `LC_MESSAGES`, restored and
/// freed on drop.
struct MessagesLocale {
    locale: libc::locale_t,
    previous: libc::locale_t,
}

impl MessagesLocale {
    fn install() -> Option<MessagesLocale> {
        let locale = unsafe {
            libc::newlocale(
                libc::LC_MESSAGES_MASK,
                ENV_LOCALE_NAME.as_ptr() as *const c_char,
                ptr::null_mut(),
            )
        };
        if locale.is_null() {
            return None;
        }
        let previous = unsafe { libc::uselocale(locale) };
        Some(MessagesLocale { locale, previous })
    }
}

impl Drop for MessagesLocale {
    fn drop(&mut self) {
        unsafe {
            libc::uselocale(self.previous);
            libc::freelocale(self.locale);
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn errno_location() -> *mut i32 {
    unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn errno_location() -> *mut i32 {
    unsafe { libc::__error() }
}

pub fn get_errno() -> i32 {
    unsafe { *errno_location() }
}

pub fn set_errno(value: i32) {
    unsafe { *errno_location() = value };
}

/// The most recently captured error code of a session.
#[derive(Debug, Default)]
pub struct ErrorStatus {
    code: AtomicI32,
}

impl ErrorStatus {
    pub fn new() -> ErrorStatus {
        ErrorStatus::default()
    }

    /// Copy the ambient errno into the cell.
    ///
    /// Must run right after the native call and before any allocation.
    #[inline]
    pub fn capture(&self) -> Errno {
        let code = get_errno();
        self.code.store(code, Ordering::Relaxed);
        Errno(code)
    }

    /// Store a code that did not come from a native call.
    pub fn record(&self, errno: Errno) {
        self.code.store(errno.0, Ordering::Relaxed);
    }

    pub fn code(&self) -> i32 {
        self.code.load(Ordering::Relaxed)
    }

    pub fn errno(&self) -> Errno {
        Errno(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SysError {
    /// The native call failed. The same code sits in the session's cell.
    #[error("os error: {0}")]
    Os(Errno),
    #[error("{name} takes {required} required and {optional} optional arguments, got {given}")]
    Arity {
        name: String,
        required: usize,
        optional: usize,
        given: usize,
    },
    #[error("expected {expected}, got {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("operation `{0}` is already registered differently")]
    Conflict(String),
    #[error("catalog encoding failed: {0}")]
    Encode(String),
}

pub type SysResult<T> = Result<T, SysError>;

/// Build the error for a failed syscall and log it.
pub fn syscall_error(e: Errno, syscall: &str, message: &str) -> SysError {
    if verbosity() > 0 {
        log::warn!("{}: {} [{}]", syscall, message, e);
    } else {
        log::debug!("{}: {} [{}]", syscall, message, e);
    }
    SysError::Os(e)
}

/// `syscall_error` with the OS message for `e` as the text.
pub fn handle_errno(e: Errno, syscall: &str) -> SysError {
    if verbosity() > 0 {
        log::warn!("{}: {} [{}]", syscall, e.message(), e);
    } else {
        log::debug!("{}: {} [{}]", syscall, e.message(), e);
    }
    SysError::Os(e)
}

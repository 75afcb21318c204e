//! System syscalls implementation
//!
//! Identity, environment, time, signals, process lifecycle, randomness and
//! error reporting.
use std::ffi::{CStr, CString};
use std::mem;
use std::ptr;

use libc::c_char;
use rand::RngCore;

use crate::constants::{CTIME_BUFSIZE, CTIME_FORMAT};
use crate::interface::{
    self, handle_errno, pair, sc_convert_cstr_to_value, Errno, SysResult, Value,
};
use crate::posix::session::Session;

impl Session {
    //------------------------------------ERROR STATUS------------------------------------

    pub fn errno_syscall(&self) -> Value {
        Value::Int(self.status.code() as i64)
    }

    /// Symbol for the captured code, `None` if the platform table has no
    /// name for it.
    pub fn errname_syscall(&self) -> Value {
        match self.status.errno().name() {
            Some(name) => Value::Sym(name.to_string()),
            None => Value::None,
        }
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/strerror.3.html
    ///
    /// Message text comes from a throwaway `LC_MESSAGES` locale built from the
    /// environment, so the session's own locale is never changed.
    pub fn strerror_syscall(&self, code: i32) -> Value {
        Value::Str(Errno(code).message())
    }

    //------------------------------------IDENTITY------------------------------------
    // These cannot fail and do not touch the status cell.

    pub fn getpid_syscall(&self) -> Value {
        Value::Int(unsafe { libc::getpid() } as i64)
    }

    pub fn getuid_syscall(&self) -> Value {
        Value::Int(unsafe { libc::getuid() } as i64)
    }

    pub fn geteuid_syscall(&self) -> Value {
        Value::Int(unsafe { libc::geteuid() } as i64)
    }

    pub fn getgid_syscall(&self) -> Value {
        Value::Int(unsafe { libc::getgid() } as i64)
    }

    pub fn getegid_syscall(&self) -> Value {
        Value::Int(unsafe { libc::getegid() } as i64)
    }

    //------------------------------------ENVIRONMENT------------------------------------

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/getenv.3.html
    ///
    /// A missing variable is `Value::None`, not an error. `getenv` does not
    /// set errno, yet the status is captured anyway, so after a miss the cell
    /// holds whatever errno was before.
    pub fn getenv_syscall(&self, name: &CStr) -> SysResult<Value> {
        let value = unsafe { libc::getenv(name.as_ptr()) };
        self.status.capture();
        if value.is_null() {
            return Ok(Value::None);
        }
        Ok(sc_convert_cstr_to_value(unsafe { CStr::from_ptr(value) }))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/setenv.3.html
    ///
    /// `setenv` itself succeeds when `overwrite` is off and the variable
    /// already exists, without changing it. That case is reported as
    /// `Bool(false)` with no OS error, so callers can tell the value was kept.
    pub fn setenv_syscall(&self, name: &CStr, value: &CStr, overwrite: bool) -> SysResult<Value> {
        let existed = unsafe { !libc::getenv(name.as_ptr()).is_null() };
        let ret = unsafe { libc::setenv(name.as_ptr(), value.as_ptr(), overwrite as libc::c_int) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "setenv"));
        }
        Ok(Value::Bool(overwrite || !existed))
    }

    //------------------------------------TIME------------------------------------

    pub fn time_syscall(&self) -> SysResult<Value> {
        let now = unsafe { libc::time(ptr::null_mut()) };
        let errno = self.status.capture();
        if now == -1 {
            return Err(handle_errno(errno, "time"));
        }
        Ok(Value::Int(now as i64))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man2/gettimeofday.2.html
    ///
    /// Returns `(seconds, microseconds)`.
    pub fn gettimeofday_syscall(&self) -> SysResult<Value> {
        let mut tv: libc::timeval = unsafe { mem::zeroed() };
        let ret = unsafe { libc::gettimeofday(&mut tv, ptr::null_mut()) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "gettimeofday"));
        }
        Ok(pair(
            Value::Int(tv.tv_sec as i64),
            Value::Int(tv.tv_usec as i64),
        ))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/ctime.3.html
    ///
    /// Produces the `ctime` layout, e.g. `"Thu Jan  1 00:00:00 1970\n"`, in
    /// local time. Years that do not fit the layout fail with `EOVERFLOW`.
    pub fn ctime_syscall(&self, seconds: libc::time_t) -> SysResult<Value> {
        let mut tm: libc::tm = unsafe { mem::zeroed() };
        let ok = unsafe { libc::localtime_r(&seconds, &mut tm) };
        let errno = self.status.capture();
        if ok.is_null() {
            return Err(handle_errno(errno, "localtime_r"));
        }

        let mut buf = [0 as c_char; CTIME_BUFSIZE];
        let len = unsafe {
            libc::strftime(
                buf.as_mut_ptr(),
                buf.len(),
                CTIME_FORMAT.as_ptr() as *const c_char,
                &tm,
            )
        };
        if len == 0 {
            return Err(self.fail(Errno::EOVERFLOW, "ctime", "date does not fit the ctime layout"));
        }
        Ok(sc_convert_cstr_to_value(unsafe { CStr::from_ptr(buf.as_ptr()) }))
    }

    //------------------------------------SIGNALS------------------------------------

    /// Reference to Linux: https://man7.org/linux/man-pages/man2/kill.2.html
    pub fn kill_syscall(&self, pid: libc::pid_t, sig: i32) -> SysResult<Value> {
        let ret = unsafe { libc::kill(pid, sig) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "kill"));
        }
        Ok(Value::Bool(true))
    }

    //------------------------------------PROCESS LIFECYCLE------------------------------------

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/exit.3.html
    ///
    /// stdout and the logger are flushed first. libc `exit` then flushes every
    /// stdio stream, including handles that were never closed.
    pub fn exit_syscall(&self, status: i32) -> ! {
        interface::flush_stdout();
        log::logger().flush();
        std::process::exit(status)
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man2/fork.2.html
    ///
    /// The parent gets the child's pid, the child gets 0.
    pub fn fork_syscall(&self) -> SysResult<Value> {
        let pid = unsafe { libc::fork() };
        let errno = self.status.capture();
        if pid < 0 {
            return Err(handle_errno(errno, "fork"));
        }
        Ok(Value::Int(pid as i64))
    }

    //------------------------------------WAITPID SYSCALL------------------------------------
    /*
     *   waitpid() returns the pid of the child whose state changed together with the raw
     *   status word, as a pair. With WNOHANG and no child ready the pid is 0.
     *   The status word is decoded by the status_* functions below.
     */
    pub fn waitpid_syscall(&self, pid: libc::pid_t, options: i32) -> SysResult<Value> {
        let mut status: libc::c_int = 0;
        let ret = unsafe { libc::waitpid(pid, &mut status, options) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "waitpid"));
        }
        Ok(pair(Value::Int(ret as i64), Value::Int(status as i64)))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/exec.3.html
    ///
    /// `args` becomes `argv` as given, so by convention it starts with the
    /// program name. Only returns on failure; the argument buffers are
    /// dropped by the caller after the status has been captured.
    pub fn execvp_syscall(&self, program: &CStr, args: &[CString]) -> SysResult<Value> {
        let mut argv: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
        argv.push(ptr::null());
        unsafe { libc::execvp(program.as_ptr(), argv.as_ptr()) };
        let errno = self.status.capture();
        Err(handle_errno(errno, "execvp"))
    }

    //------------------------------------RANDOM------------------------------------

    /// Uniform-ish integer in `[0, bound)` by modulo reduction. A bound that
    /// is not positive fails with `EDOM`.
    pub fn random_syscall(&self, bound: i64) -> SysResult<Value> {
        if bound <= 0 {
            return Err(self.fail(Errno::EDOM, "random", "bound must be positive"));
        }
        let raw = (self.rng.lock().next_u64() >> 1) as i64;
        Ok(Value::Int(raw % bound))
    }
}

// Wait status decoding. Each one checks the classification before pulling
// the field out, and answers `None` when it does not apply.

pub fn status_exit_code(status: i32) -> Value {
    if libc::WIFEXITED(status) {
        Value::Int(libc::WEXITSTATUS(status) as i64)
    } else {
        Value::None
    }
}

pub fn status_term_signal(status: i32) -> Value {
    if libc::WIFSIGNALED(status) {
        Value::Int(libc::WTERMSIG(status) as i64)
    } else {
        Value::None
    }
}

pub fn status_stop_signal(status: i32) -> Value {
    if libc::WIFSTOPPED(status) {
        Value::Int(libc::WSTOPSIG(status) as i64)
    } else {
        Value::None
    }
}

pub fn status_continued(status: i32) -> Value {
    Value::Bool(libc::WIFCONTINUED(status))
}

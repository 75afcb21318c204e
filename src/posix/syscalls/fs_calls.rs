//! File system syscall implementation
//!
//! Directory, path and stream handle operations. Every method follows the
//! same shape: one native call, `capture()` right after it, then the host
//! value is built. Path buffers are owned by the caller and dropped after the
//! capture.
use std::ffi::CStr;
use std::ptr::NonNull;
use std::sync::Arc;

use libc::c_char;

use crate::constants::{CWD_INITIAL_BUFSIZE, CWD_MAX_BUFSIZE};
use crate::interface::{
    handle_errno, sc_convert_cstr_to_value, set_errno, Errno, Handle, HandleKind, ResultList,
    SysResult, Value,
};
use crate::posix::session::Session;

/// Open directory stream, closed on drop.
struct DirStream(NonNull<libc::DIR>);

impl Drop for DirStream {
    fn drop(&mut self) {
        unsafe { libc::closedir(self.0.as_ptr()) };
    }
}

impl Session {
    /// Reference to Linux: https://man7.org/linux/man-pages/man2/chdir.2.html
    pub fn chdir_syscall(&self, path: &CStr) -> SysResult<Value> {
        let ret = unsafe { libc::chdir(path.as_ptr()) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "chdir"));
        }
        Ok(Value::Bool(true))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/getcwd.3.html
    ///
    /// The buffer starts at `CWD_INITIAL_BUFSIZE` and doubles whenever the
    /// kernel answers `ERANGE`, so deep working directories still resolve.
    pub fn getcwd_syscall(&self) -> SysResult<Value> {
        let mut size = CWD_INITIAL_BUFSIZE;
        loop {
            let mut buf = vec![0 as c_char; size];
            let ret = unsafe { libc::getcwd(buf.as_mut_ptr(), buf.len()) };
            let errno = self.status.capture();
            if !ret.is_null() {
                let cwd = unsafe { CStr::from_ptr(buf.as_ptr()) };
                return Ok(sc_convert_cstr_to_value(cwd));
            }
            if errno == Errno::ERANGE && size < CWD_MAX_BUFSIZE {
                size *= 2;
                continue;
            }
            return Err(handle_errno(errno, "getcwd"));
        }
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man2/mkdir.2.html
    ///
    /// `mode` is filtered by the process umask as usual.
    pub fn mkdir_syscall(&self, path: &CStr, mode: libc::mode_t) -> SysResult<Value> {
        let ret = unsafe { libc::mkdir(path.as_ptr(), mode) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "mkdir"));
        }
        Ok(Value::Bool(true))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man2/rmdir.2.html
    pub fn rmdir_syscall(&self, path: &CStr) -> SysResult<Value> {
        let ret = unsafe { libc::rmdir(path.as_ptr()) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "rmdir"));
        }
        Ok(Value::Bool(true))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man2/link.2.html
    pub fn link_syscall(&self, oldpath: &CStr, newpath: &CStr) -> SysResult<Value> {
        let ret = unsafe { libc::link(oldpath.as_ptr(), newpath.as_ptr()) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "link"));
        }
        Ok(Value::Bool(true))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man2/symlink.2.html
    ///
    /// `target` is stored verbatim, it does not have to exist.
    pub fn symlink_syscall(&self, target: &CStr, linkpath: &CStr) -> SysResult<Value> {
        let ret = unsafe { libc::symlink(target.as_ptr(), linkpath.as_ptr()) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "symlink"));
        }
        Ok(Value::Bool(true))
    }

    pub fn rename_syscall(&self, oldpath: &CStr, newpath: &CStr) -> SysResult<Value> {
        let ret = unsafe { libc::rename(oldpath.as_ptr(), newpath.as_ptr()) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "rename"));
        }
        Ok(Value::Bool(true))
    }

    pub fn unlink_syscall(&self, path: &CStr) -> SysResult<Value> {
        let ret = unsafe { libc::unlink(path.as_ptr()) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "unlink"));
        }
        Ok(Value::Bool(true))
    }

    pub fn chmod_syscall(&self, path: &CStr, mode: libc::mode_t) -> SysResult<Value> {
        let ret = unsafe { libc::chmod(path.as_ptr(), mode) };
        let errno = self.status.capture();
        if ret < 0 {
            return Err(handle_errno(errno, "chmod"));
        }
        Ok(Value::Bool(true))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man2/umask.2.html
    ///
    /// Always succeeds and returns the previous mask; the status cell is left
    /// alone.
    pub fn umask_syscall(&self, mask: libc::mode_t) -> Value {
        let previous = unsafe { libc::umask(mask) };
        Value::Int(previous as i64)
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/readdir.3.html
    ///
    /// Lists the entry names of `path` sorted by byte value, which is the
    /// order `alphasort` gives in the C locale. `.` and `..` are left out.
    /// Names are copied out of each `dirent` before the next `readdir` call
    /// reuses it, and the directory stream is closed on every path.
    pub fn readdir_syscall(&self, path: &CStr) -> SysResult<Value> {
        let dirp = unsafe { libc::opendir(path.as_ptr()) };
        let errno = self.status.capture();
        let dir = match NonNull::new(dirp) {
            Some(dirp) => DirStream(dirp),
            None => return Err(handle_errno(errno, "opendir")),
        };

        let mut names = Vec::new();
        loop {
            // readdir only touches errno on failure
            set_errno(0);
            let entry = unsafe { libc::readdir(dir.0.as_ptr()) };
            if entry.is_null() {
                let errno = self.status.capture();
                if errno.code() != 0 {
                    return Err(handle_errno(errno, "readdir"));
                }
                break;
            }
            let name = unsafe { CStr::from_ptr((*entry).d_name.as_ptr()) };
            if name.to_bytes() == b"." || name.to_bytes() == b".." {
                continue;
            }
            names.push(name.to_owned());
        }
        drop(dir);

        names.sort();
        let mut entries = ResultList::new();
        for name in &names {
            entries.push(sc_convert_cstr_to_value(name));
        }
        Ok(entries.finish())
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/fopen.3.html
    ///
    /// Read handles use mode `"r"`, write handles `"w"` (create or truncate).
    /// `origin` is the host value the handle was opened with.
    pub fn open_syscall(&self, kind: HandleKind, path: &CStr, origin: Value) -> SysResult<Value> {
        let handle = Handle::open(kind, path, origin, &self.status)?;
        Ok(Value::Handle(Arc::new(handle)))
    }

    /// Reference to Linux: https://man7.org/linux/man-pages/man3/fclose.3.html
    pub fn close_syscall(&self, handle: &Handle) -> SysResult<Value> {
        handle.close(&self.status)?;
        Ok(Value::Bool(true))
    }
}

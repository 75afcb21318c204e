// Native stream handles for the open-read / open-write operations
use std::ffi::CStr;
use std::fmt;
use std::ptr::NonNull;

use libc::{c_char, c_void};
use parking_lot::Mutex;

use crate::constants::{FOPEN_READ_MODE, FOPEN_WRITE_MODE, STREAM_CHUNK_SIZE};
use crate::interface::errnos::{handle_errno, syscall_error, Errno, ErrorStatus, SysError, SysResult};
use crate::interface::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Read,
    Write,
}

impl HandleKind {
    fn fopen_mode(self) -> &'static [u8] {
        match self {
            HandleKind::Read => FOPEN_READ_MODE,
            HandleKind::Write => FOPEN_WRITE_MODE,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            HandleKind::Read => "read handle",
            HandleKind::Write => "write handle",
        }
    }
}

#[derive(Debug)]
struct NativeStream(NonNull<libc::FILE>);

// A FILE* may move between threads, the slot mutex serializes access
unsafe impl Send for NativeStream {}

impl NativeStream {
    fn as_ptr(&self) -> *mut libc::FILE {
        self.0.as_ptr()
    }
}

/// A native stream paired with the value that opened it (usually the path).
///
/// The slot is emptied on close; later use reports `EBADF`.
pub struct Handle {
    kind: HandleKind,
    origin: Value,
    stream: Mutex<Option<NativeStream>>,
}

impl Handle {
    pub fn open(
        kind: HandleKind,
        path: &CStr,
        origin: Value,
        status: &ErrorStatus,
    ) -> SysResult<Handle> {
        let fp = unsafe { libc::fopen(path.as_ptr(), kind.fopen_mode().as_ptr() as *const c_char) };
        let errno = status.capture();
        match NonNull::new(fp) {
            Some(fp) => Ok(Handle {
                kind,
                origin,
                stream: Mutex::new(Some(NativeStream(fp))),
            }),
            None => Err(handle_errno(errno, "fopen")),
        }
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn origin(&self) -> &Value {
        &self.origin
    }

    pub fn is_open(&self) -> bool {
        self.stream.lock().is_some()
    }

    /// `fclose` the stream. Succeeds iff `fclose` returned zero; the handle
    /// is closed afterwards either way.
    pub fn close(&self, status: &ErrorStatus) -> SysResult<()> {
        let stream = self.stream.lock().take();
        let stream = match stream {
            Some(stream) => stream,
            None => return Err(closed_error(status, "fclose")),
        };
        let ret = unsafe { libc::fclose(stream.as_ptr()) };
        let errno = status.capture();
        if ret != 0 {
            return Err(handle_errno(errno, "fclose"));
        }
        Ok(())
    }

    /// Read everything left in a read handle.
    pub fn read_to_string(&self, status: &ErrorStatus) -> SysResult<String> {
        self.expect_kind(HandleKind::Read)?;
        let guard = self.stream.lock();
        let stream = match guard.as_ref() {
            Some(stream) => stream,
            None => return Err(closed_error(status, "fread")),
        };

        let mut contents = Vec::new();
        let mut chunk = [0u8; STREAM_CHUNK_SIZE];
        loop {
            let n = unsafe {
                libc::fread(chunk.as_mut_ptr() as *mut c_void, 1, chunk.len(), stream.as_ptr())
            };
            if n == 0 {
                if unsafe { libc::ferror(stream.as_ptr()) } != 0 {
                    let errno = status.capture();
                    return Err(handle_errno(errno, "fread"));
                }
                break;
            }
            contents.extend_from_slice(&chunk[..n]);
        }
        Ok(String::from_utf8_lossy(&contents).into_owned())
    }

    /// Buffered write; data reaches the file at the latest on close.
    pub fn write_str(&self, text: &str, status: &ErrorStatus) -> SysResult<()> {
        self.expect_kind(HandleKind::Write)?;
        let guard = self.stream.lock();
        let stream = match guard.as_ref() {
            Some(stream) => stream,
            None => return Err(closed_error(status, "fwrite")),
        };

        let bytes = text.as_bytes();
        let written =
            unsafe { libc::fwrite(bytes.as_ptr() as *const c_void, 1, bytes.len(), stream.as_ptr()) };
        if written < bytes.len() {
            let errno = status.capture();
            return Err(handle_errno(errno, "fwrite"));
        }
        Ok(())
    }

    fn expect_kind(&self, kind: HandleKind) -> SysResult<()> {
        if self.kind != kind {
            return Err(SysError::Type {
                expected: kind.describe(),
                found: self.kind.describe(),
            });
        }
        Ok(())
    }
}

fn closed_error(status: &ErrorStatus, syscall: &str) -> SysError {
    status.record(Errno::EBADF);
    syscall_error(Errno::EBADF, syscall, "handle is already closed")
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.get_mut().take() {
            log::warn!("closing unreachable {} for {:?}", self.kind.describe(), self.origin);
            unsafe { libc::fclose(stream.as_ptr()) };
        }
    }
}

//! Per-process state shared by every operation: the error status cell and
//! the pseudo-random generator.
use std::fmt;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::interface::{syscall_error, Errno, ErrorStatus, SysError};

/// Created once by the host (normally through `posix_start`) and handed to
/// every dispatched operation. The syscalls live in `syscalls/` as methods.
pub struct Session {
    pub(crate) status: ErrorStatus,
    pub(crate) rng: Mutex<StdRng>,
}

impl Session {
    /// PRNG seeded from OS entropy, so sessions started together still
    /// draw different streams.
    pub fn new() -> Session {
        Session::with_rng(StdRng::from_entropy())
    }

    /// Deterministic stream, for tests and reproducible hosts.
    pub fn with_seed(seed: u64) -> Session {
        Session::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Session {
        Session {
            status: ErrorStatus::new(),
            rng: Mutex::new(rng),
        }
    }

    pub fn status(&self) -> &ErrorStatus {
        &self.status
    }

    /// Failure that did not come out of a native call; it still lands in the
    /// status cell so `error-code` sees it.
    pub(crate) fn fail(&self, e: Errno, syscall: &str, message: &str) -> SysError {
        self.status.record(e);
        syscall_error(e, syscall, message)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("status", &self.status).finish()
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

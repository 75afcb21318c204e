// hostposix unit tests
//
// Tests touch process-wide state (cwd, environment, umask, the handler
// table), so every test takes the setup lock first.

mod dispatcher_tests; // Catalog, arity checks, registration and export

pub mod setup {
    use lazy_static::lazy_static;
    use parking_lot::{Mutex, MutexGuard};

    use crate::posix::dispatcher::register_posix_syscalls;

    lazy_static! {
        static ref TESTMUTEX: Mutex<()> = Mutex::new(());
    }

    /// Serialize the calling test and make sure the catalog is registered.
    pub fn lock_and_init() -> MutexGuard<'static, ()> {
        let guard = TESTMUTEX.lock();
        register_posix_syscalls().unwrap();
        guard
    }
}

pub fn cstr(s: &str) -> std::ffi::CString {
    std::ffi::CString::new(s).unwrap()
}

pub fn path_cstr(path: &std::path::Path) -> std::ffi::CString {
    cstr(path.to_str().unwrap())
}

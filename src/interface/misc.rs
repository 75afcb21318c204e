// Misc functions for interface
// Verbosity, stdout
use std::io::{self, Write};
use std::sync::OnceLock;

pub static VERBOSE: OnceLock<isize> = OnceLock::new();

// 0 until posix_start says otherwise
pub fn verbosity() -> isize {
    VERBOSE.get().copied().unwrap_or(0)
}

// Flush contents of stdout
pub fn flush_stdout() {
    let _ = io::stdout().flush();
}

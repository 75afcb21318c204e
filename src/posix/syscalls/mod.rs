//! Syscall methods on `Session`, split into file system and system calls.
pub mod fs_calls;
pub mod sys_calls;

pub use sys_calls::{status_continued, status_exit_code, status_stop_signal, status_term_signal};

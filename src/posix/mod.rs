//! The operation layer: session state, the syscall wrappers and the
//! dispatcher that exposes them to the host.
pub mod dispatcher;
pub mod session;
pub mod syscalls;

// hostposix - POSIX operations for dynamically-typed host runtimes
//
// A fixed catalog of process, file system, environment, time and signal
// operations. The host starts the layer with `posix_start`, then calls
// operations by name through `dispatch`, passing and receiving `Value`s.

pub mod constants;
pub mod interface;
pub mod posix;

#[cfg(test)]
mod tests;

pub use interface::{Errno, ErrorStatus, Handle, HandleKind, HostResult, ResultList, SysError, SysResult, Value};
pub use posix::dispatcher::{
    dispatch, export_catalog, info_entry, lookup, posix_start, register_handler,
    register_info_entry, CatalogEntry, OperationDescriptor, SyscallFunc, SYSCALL_TABLE,
};
pub use posix::session::Session;

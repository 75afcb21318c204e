//! Operation catalog and dispatcher
//!
//! `SYSCALL_TABLE` is the static catalog: external name, entry point and
//! argument counts for every operation. `posix_start` copies it into the
//! global `HANDLERTABLE` once; the host then calls `dispatch` by name and the
//! entry point decodes the host values, runs the syscall method on the
//! `Session` and hands back one result.
use std::borrow::Cow;
use std::fmt;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::constants::POSIX_INFO_MARKER;
use crate::interface::{
    self, sc_convert_list_to_cstrings, sc_convert_name_to_cstring, sc_convert_value_to_bool,
    sc_convert_value_to_cstring, sc_convert_value_to_handle, sc_convert_value_to_i32,
    sc_convert_value_to_i64, sc_convert_value_to_mode, sc_convert_value_to_pid,
    sc_convert_value_to_time, HandleKind, SysError, SysResult, Value,
};
use crate::posix::session::Session;
use crate::posix::syscalls::{
    status_continued, status_exit_code, status_stop_signal, status_term_signal,
};

/// Entry point signature shared by every operation. `args` always holds
/// exactly `required + optional` values; missing optional ones are
/// `Value::None`.
pub type SyscallFunc = fn(&Session, &[Value]) -> SysResult<Value>;

#[derive(Clone, Copy)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub func: SyscallFunc,
    pub required: usize,
    pub optional: usize,
}

impl OperationDescriptor {
    pub const fn new(
        name: &'static str,
        func: SyscallFunc,
        required: usize,
        optional: usize,
    ) -> OperationDescriptor {
        OperationDescriptor {
            name,
            func,
            required,
            optional,
        }
    }

    pub fn max_args(&self) -> usize {
        self.required + self.optional
    }

    pub fn check_arity(&self, given: usize) -> SysResult<()> {
        if given < self.required || given > self.max_args() {
            return Err(SysError::Arity {
                name: self.name.to_string(),
                required: self.required,
                optional: self.optional,
                given,
            });
        }
        Ok(())
    }

    fn same_as(&self, other: &OperationDescriptor) -> bool {
        self.func as usize == other.func as usize
            && self.required == other.required
            && self.optional == other.optional
    }
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .finish()
    }
}

/// One row of the catalog as exported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub required: usize,
    pub optional: usize,
}

pub const SYSCALL_TABLE: &[OperationDescriptor] = &[
    OperationDescriptor::new("sys.error-code", errno_entry, 0, 0),
    OperationDescriptor::new("sys.error-name", errname_entry, 0, 0),
    OperationDescriptor::new("sys.process-id", getpid_entry, 0, 0),
    OperationDescriptor::new("sys.user-id", getuid_entry, 0, 0),
    OperationDescriptor::new("sys.effective-user-id", geteuid_entry, 0, 0),
    OperationDescriptor::new("sys.group-id", getgid_entry, 0, 0),
    OperationDescriptor::new("sys.effective-group-id", getegid_entry, 0, 0),
    OperationDescriptor::new("sys.env-get", getenv_entry, 1, 0),
    // overwrite flag stays required for now
    OperationDescriptor::new("sys.env-set", setenv_entry, 3, 0),
    OperationDescriptor::new("sys.change-dir", chdir_entry, 1, 0),
    OperationDescriptor::new("sys.current-dir", getcwd_entry, 0, 0),
    OperationDescriptor::new("sys.time-now", time_entry, 0, 0),
    OperationDescriptor::new("sys.time-of-day", gettimeofday_entry, 0, 0),
    OperationDescriptor::new("sys.ctime-format", ctime_entry, 1, 0),
    OperationDescriptor::new("sys.make-dir", mkdir_entry, 2, 0),
    OperationDescriptor::new("sys.remove-dir", rmdir_entry, 1, 0),
    OperationDescriptor::new("sys.hard-link", link_entry, 2, 0),
    OperationDescriptor::new("sys.symlink", symlink_entry, 2, 0),
    OperationDescriptor::new("sys.rename", rename_entry, 2, 0),
    OperationDescriptor::new("sys.unlink", unlink_entry, 1, 0),
    OperationDescriptor::new("sys.chmod", chmod_entry, 2, 0),
    OperationDescriptor::new("sys.umask", umask_entry, 1, 0),
    OperationDescriptor::new("sys.list-dir", readdir_entry, 1, 0),
    OperationDescriptor::new("sys.signal-send", kill_entry, 2, 0),
    OperationDescriptor::new("sys.process-exit", exit_entry, 1, 0),
    OperationDescriptor::new("sys.fork", fork_entry, 0, 0),
    OperationDescriptor::new("sys.wait-for", waitpid_entry, 2, 0),
    OperationDescriptor::new("sys.status-exit-code", exitstatus_entry, 1, 0),
    OperationDescriptor::new("sys.status-term-signal", termsig_entry, 1, 0),
    OperationDescriptor::new("sys.status-stop-signal", stopsig_entry, 1, 0),
    OperationDescriptor::new("sys.status-continued", continued_entry, 1, 0),
    OperationDescriptor::new("sys.random-bounded", random_entry, 1, 0),
    OperationDescriptor::new("sys.open-read", open_read_entry, 1, 0),
    OperationDescriptor::new("sys.close-read", close_read_entry, 1, 0),
    OperationDescriptor::new("sys.open-write", open_write_entry, 1, 0),
    OperationDescriptor::new("sys.close-write", close_write_entry, 1, 0),
    OperationDescriptor::new("sys.exec-replace", execvp_entry, 2, 0),
    OperationDescriptor::new("sys.error-message", strerror_entry, 1, 0),
];

lazy_static! {
    /// Registered operations by external name. Filled at start, read-only
    /// afterwards unless the host registers its own entries.
    pub static ref HANDLERTABLE: DashMap<&'static str, OperationDescriptor> = DashMap::new();
    /// Feature markers a host can probe, e.g. `"posix"`.
    pub static ref INFO_TABLE: DashMap<String, i64> = DashMap::new();
}

/// Add one descriptor to the handler table.
///
/// Registering the exact same descriptor again is a no-op. A different entry
/// point or arity under a taken name is rejected with `SysError::Conflict`.
pub fn register_handler(desc: OperationDescriptor) -> SysResult<()> {
    match HANDLERTABLE.entry(desc.name) {
        Entry::Occupied(existing) => {
            if existing.get().same_as(&desc) {
                Ok(())
            } else {
                Err(SysError::Conflict(desc.name.to_string()))
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(desc);
            Ok(())
        }
    }
}

/// Register every entry of `SYSCALL_TABLE`.
pub fn register_posix_syscalls() -> SysResult<()> {
    for desc in SYSCALL_TABLE.iter() {
        register_handler(*desc)?;
    }
    Ok(())
}

pub fn register_info_entry(name: &str, value: i64) {
    INFO_TABLE.insert(name.to_string(), value);
}

pub fn info_entry(name: &str) -> Option<i64> {
    INFO_TABLE.get(name).map(|entry| *entry)
}

/// Bring the layer up. Called once by the host runtime at startup.
///
/// 1. Record `verbosity` (only the first call sets it).
/// 2. Register the whole catalog into `HANDLERTABLE`.
/// 3. Register the `"posix"` info marker.
/// 4. Return the session, with its PRNG seeded from OS entropy.
pub fn posix_start(verbosity: isize) -> SysResult<Session> {
    let _ = interface::VERBOSE.set(verbosity);
    register_posix_syscalls()?;
    register_info_entry(POSIX_INFO_MARKER, 0);
    log::debug!("posix layer up, {} operations registered", HANDLERTABLE.len());
    Ok(Session::new())
}

/// Copy of the descriptor registered under `name`.
pub fn lookup(name: &str) -> SysResult<OperationDescriptor> {
    HANDLERTABLE
        .get(name)
        .map(|desc| *desc)
        .ok_or_else(|| SysError::UnknownOperation(name.to_string()))
}

/// Look `name` up, check the argument count and run it.
///
/// Arity and unknown-name failures happen before any native call and leave
/// the status cell untouched.
pub fn dispatch(session: &Session, name: &str, args: &[Value]) -> SysResult<Value> {
    // the table guard is released here, before the call
    let desc = lookup(name)?;
    desc.check_arity(args.len())?;
    log::trace!("dispatch {} ({} args)", desc.name, args.len());

    let args: Cow<'_, [Value]> = if args.len() == desc.max_args() {
        Cow::Borrowed(args)
    } else {
        let mut padded = args.to_vec();
        padded.resize(desc.max_args(), Value::None);
        Cow::Owned(padded)
    };
    (desc.func)(session, &args)
}

/// Registered operations as CBOR, sorted by name, for hosts that discover the
/// surface at runtime.
pub fn export_catalog() -> SysResult<Vec<u8>> {
    let mut entries: Vec<CatalogEntry> = HANDLERTABLE
        .iter()
        .map(|desc| CatalogEntry {
            name: desc.name.to_string(),
            required: desc.required,
            optional: desc.optional,
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    serde_cbor::to_vec(&entries).map_err(|e| SysError::Encode(e.to_string()))
}

//------------------------------------ENTRY POINTS------------------------------------
// Decode the host values, call the session, nothing else.

fn errno_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    Ok(session.errno_syscall())
}

fn errname_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    Ok(session.errname_syscall())
}

fn getpid_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    Ok(session.getpid_syscall())
}

fn getuid_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    Ok(session.getuid_syscall())
}

fn geteuid_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    Ok(session.geteuid_syscall())
}

fn getgid_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    Ok(session.getgid_syscall())
}

fn getegid_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    Ok(session.getegid_syscall())
}

fn getenv_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let name = sc_convert_name_to_cstring(&args[0])?;
    session.getenv_syscall(&name)
}

fn setenv_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let name = sc_convert_name_to_cstring(&args[0])?;
    let value = sc_convert_value_to_cstring(&args[1])?;
    let overwrite = sc_convert_value_to_bool(&args[2]);
    session.setenv_syscall(&name, &value, overwrite)
}

fn chdir_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let path = sc_convert_value_to_cstring(&args[0])?;
    session.chdir_syscall(&path)
}

fn getcwd_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    session.getcwd_syscall()
}

fn time_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    session.time_syscall()
}

fn gettimeofday_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    session.gettimeofday_syscall()
}

fn ctime_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let seconds = sc_convert_value_to_time(&args[0])?;
    session.ctime_syscall(seconds)
}

fn mkdir_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let path = sc_convert_value_to_cstring(&args[0])?;
    let mode = sc_convert_value_to_mode(&args[1])?;
    session.mkdir_syscall(&path, mode)
}

fn rmdir_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let path = sc_convert_value_to_cstring(&args[0])?;
    session.rmdir_syscall(&path)
}

fn link_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let oldpath = sc_convert_value_to_cstring(&args[0])?;
    let newpath = sc_convert_value_to_cstring(&args[1])?;
    session.link_syscall(&oldpath, &newpath)
}

fn symlink_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let target = sc_convert_value_to_cstring(&args[0])?;
    let linkpath = sc_convert_value_to_cstring(&args[1])?;
    session.symlink_syscall(&target, &linkpath)
}

fn rename_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let oldpath = sc_convert_value_to_cstring(&args[0])?;
    let newpath = sc_convert_value_to_cstring(&args[1])?;
    session.rename_syscall(&oldpath, &newpath)
}

fn unlink_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let path = sc_convert_value_to_cstring(&args[0])?;
    session.unlink_syscall(&path)
}

fn chmod_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let path = sc_convert_value_to_cstring(&args[0])?;
    let mode = sc_convert_value_to_mode(&args[1])?;
    session.chmod_syscall(&path, mode)
}

fn umask_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let mask = sc_convert_value_to_mode(&args[0])?;
    Ok(session.umask_syscall(mask))
}

fn readdir_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let path = sc_convert_value_to_cstring(&args[0])?;
    session.readdir_syscall(&path)
}

fn kill_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let pid = sc_convert_value_to_pid(&args[0])?;
    let sig = sc_convert_value_to_i32(&args[1])?;
    session.kill_syscall(pid, sig)
}

fn exit_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let status = sc_convert_value_to_i32(&args[0])?;
    session.exit_syscall(status)
}

fn fork_entry(session: &Session, _args: &[Value]) -> SysResult<Value> {
    session.fork_syscall()
}

fn waitpid_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let pid = sc_convert_value_to_pid(&args[0])?;
    let options = sc_convert_value_to_i32(&args[1])?;
    session.waitpid_syscall(pid, options)
}

fn exitstatus_entry(_session: &Session, args: &[Value]) -> SysResult<Value> {
    Ok(status_exit_code(sc_convert_value_to_i32(&args[0])?))
}

fn termsig_entry(_session: &Session, args: &[Value]) -> SysResult<Value> {
    Ok(status_term_signal(sc_convert_value_to_i32(&args[0])?))
}

fn stopsig_entry(_session: &Session, args: &[Value]) -> SysResult<Value> {
    Ok(status_stop_signal(sc_convert_value_to_i32(&args[0])?))
}

fn continued_entry(_session: &Session, args: &[Value]) -> SysResult<Value> {
    Ok(status_continued(sc_convert_value_to_i32(&args[0])?))
}

fn random_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let bound = sc_convert_value_to_i64(&args[0])?;
    session.random_syscall(bound)
}

fn open_read_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let path = sc_convert_value_to_cstring(&args[0])?;
    session.open_syscall(HandleKind::Read, &path, args[0].clone())
}

fn close_read_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let handle = sc_convert_value_to_handle(&args[0], HandleKind::Read)?;
    session.close_syscall(&handle)
}

fn open_write_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let path = sc_convert_value_to_cstring(&args[0])?;
    session.open_syscall(HandleKind::Write, &path, args[0].clone())
}

fn close_write_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let handle = sc_convert_value_to_handle(&args[0], HandleKind::Write)?;
    session.close_syscall(&handle)
}

fn execvp_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let program = sc_convert_value_to_cstring(&args[0])?;
    let argv = sc_convert_list_to_cstrings(&args[1])?;
    // execvp with an argv of just NULL hands the new image no argv[0]
    if argv.is_empty() {
        return Err(SysError::Type {
            expected: "non-empty list of strings",
            found: "empty list",
        });
    }
    session.execvp_syscall(&program, &argv)
}

fn strerror_entry(session: &Session, args: &[Value]) -> SysResult<Value> {
    let code = sc_convert_value_to_i32(&args[0])?;
    Ok(session.strerror_syscall(code))
}

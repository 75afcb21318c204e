//! Errno name tables.
//!
//! Built per target platform at compile time. A code that merely aliases
//! another entry on a platform is left out of that platform's table, so the
//! first match is always the canonical name.

macro_rules! errno_table {
    ($(#[$meta:meta])* $table:ident, [$($errno:ident),* $(,)?]) => {
        $(#[$meta])*
        pub static $table: &[(i32, &str)] = &[$((libc::$errno, stringify!($errno)),)*];
    };
}

errno_table!(
    /// C99 + POSIX codes, present on every unix target.
    COMMON_ERRNOS,
    [
        E2BIG, EACCES, EADDRINUSE, EADDRNOTAVAIL, EAFNOSUPPORT, EAGAIN, EALREADY, EBADF,
        EBADMSG, EBUSY, ECANCELED, ECHILD, ECONNABORTED, ECONNREFUSED, ECONNRESET, EDEADLK,
        EDESTADDRREQ, EDOM, EDQUOT, EEXIST, EFAULT, EFBIG, EHOSTUNREACH, EIDRM,
        EILSEQ, EINPROGRESS, EINTR, EINVAL, EIO, EISCONN, EISDIR, ELOOP,
        EMFILE, EMLINK, EMSGSIZE, EMULTIHOP, ENAMETOOLONG, ENETDOWN, ENETRESET, ENETUNREACH,
        ENFILE, ENOBUFS, ENODATA, ENODEV, ENOENT, ENOEXEC, ENOLCK, ENOLINK,
        ENOMEM, ENOMSG, ENOPROTOOPT, ENOSPC, ENOSR, ENOSTR, ENOSYS, ENOTCONN,
        ENOTDIR, ENOTEMPTY, ENOTSOCK, ENOTSUP, ENOTTY, ENXIO, EOVERFLOW, EPERM,
        EPIPE, EPROTO, EPROTONOSUPPORT, EPROTOTYPE, ERANGE, EROFS, ESPIPE, ESRCH,
        ESTALE, ETIME, ETIMEDOUT, ETXTBSY, EXDEV,
    ]
);

// On GNU/Linux EOPNOTSUPP == ENOTSUP, EWOULDBLOCK == EAGAIN and
// EDEADLOCK == EDEADLK, so none of them get their own entry.
#[cfg(target_os = "linux")]
errno_table!(
    /// GNU/Linux specific codes.
    PLATFORM_ERRNOS,
    [
        EBADE, EBADFD, EBADR, EBADRQC, EBADSLT, ECHRNG, ECOMM, EHOSTDOWN,
        EISNAM, EKEYEXPIRED, EKEYREJECTED, EKEYREVOKED, EL2HLT, EL2NSYNC, EL3HLT, EL3RST,
        ELIBACC, ELIBBAD, ELIBEXEC, ELIBMAX, ELIBSCN, EMEDIUMTYPE, ENOKEY, ENOMEDIUM,
        ENONET, ENOPKG, ENOTBLK, ENOTUNIQ, EPFNOSUPPORT, EREMCHG, EREMOTE, EREMOTEIO,
        ERESTART, ESHUTDOWN, ESOCKTNOSUPPORT, ESTRPIPE, EUCLEAN, EUNATCH, EUSERS, EXFULL,
    ]
);

#[cfg(not(target_os = "linux"))]
errno_table!(
    /// Codes that are distinct values only off Linux.
    PLATFORM_ERRNOS,
    [EOPNOTSUPP, EWOULDBLOCK]
);

/// Symbolic name of `code`, or `None` when no table knows it.
pub fn errno_name(code: i32) -> Option<&'static str> {
    COMMON_ERRNOS
        .iter()
        .chain(PLATFORM_ERRNOS.iter())
        .find(|(value, _)| *value == code)
        .map(|(_, name)| *name)
}

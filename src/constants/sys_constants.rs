// ===== Catalog =====
pub const OPERATION_PREFIX: &str = "sys.";
// Info marker registered at start so a host can tell this layer is loaded
pub const POSIX_INFO_MARKER: &str = "posix";

// ===== Buffer Sizes =====
// ctime_r(3) wants at least 26 bytes
pub const CTIME_BUFSIZE: usize = 32;
// getcwd starts here and doubles on ERANGE up to the max
pub const CWD_INITIAL_BUFSIZE: usize = 1024;
pub const CWD_MAX_BUFSIZE: usize = 1 << 20;
pub const ERRMSG_BUFSIZE: usize = 256;
pub const STREAM_CHUNK_SIZE: usize = 4096;

// ===== Native Format Strings =====
// NUL terminated so they can be handed to libc as-is
pub const FOPEN_READ_MODE: &[u8] = b"r\0";
pub const FOPEN_WRITE_MODE: &[u8] = b"w\0";
// Same layout ctime(3) produces: "Thu Jan  1 00:00:00 1970\n"
pub const CTIME_FORMAT: &[u8] = b"%a %b %e %H:%M:%S %Y\n\0";
// Empty locale name means "take it from the environment"
pub const ENV_LOCALE_NAME: &[u8] = b"\0";

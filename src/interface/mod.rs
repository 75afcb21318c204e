// Glue between host values and the native world: error capture,
// conversions, stream handles
pub mod conv;
pub mod errnos;
pub mod file;
pub mod misc;
pub mod types;

pub use conv::*;
pub use errnos::*;
pub use file::*;
pub use misc::*;
pub use types::*;

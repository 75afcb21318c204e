pub mod err_constants;
pub mod sys_constants;

pub use err_constants::*;
pub use sys_constants::*;

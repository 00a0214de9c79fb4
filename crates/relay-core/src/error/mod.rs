//! Domain error types

mod core_error;

pub use core_error::{CoreError, CoreResult};

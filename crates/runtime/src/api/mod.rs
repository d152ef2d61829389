//! Public API surface exposed to runtime consumers.
//!
//! Re-exports the handle and error types so clients can depend on a single
//! module.

mod errors;
mod handle;

pub use errors::{Result, RuntimeError};
pub use handle::{RuntimeHandle, RuntimeSnapshot};

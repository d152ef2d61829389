//! Worker tasks that back the runtime orchestration.
//!
//! A single sync worker owns all client state; the async work it starts
//! (fetches, submissions, the wallet handshake) runs in short-lived tasks.

mod sync;

pub use sync::{Command, SyncWorker};

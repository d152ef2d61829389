//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, submissions, settings and the
//! ledger so clients can bubble them up with consistent context.

use thiserror::Error;
use tokio::sync::oneshot;

use client_blockchain_core::TransportError;

use crate::actions::ActionError;
use crate::settings::SettingsError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("sync worker command channel closed")]
    CommandChannelClosed,

    #[error("sync worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("sync worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a wallet provider before building")]
    MissingWallet,

    #[error("no ledger connection")]
    NotConnected,

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

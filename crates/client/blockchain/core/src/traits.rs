//! Ledger abstraction traits.
//!
//! This module defines a layered ledger abstraction:
//! - Layer 0: LogSource (pure infrastructure, log delivery)
//! - Layer 1: LedgerReader, LedgerWriter (contract surface)
//! - Layer 2: Ledger (composite trait), WalletProvider (handshake capability)

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::events::{EventFilter, RawLog};
use crate::types::{
    Address, Battle, ContractCall, GameToken, Player, TransactionId, TransactionReceipt,
    WalletStatus,
};

// ============================================================================
// Error Types
// ============================================================================

/// Transport layer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    /// The contract reverted. `reason` carries the provider's framed text,
    /// e.g. `execution reverted: Battle already exists.`
    #[error("Transaction reverted: {reason}")]
    Reverted { reason: String },

    #[error("Out of gas: limit {limit}, required {required}")]
    OutOfGas { limit: u64, required: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request rejected by wallet: {0}")]
    Rejected(String),

    #[error("No wallet provider available")]
    NoProvider,

    #[error("Subscription closed")]
    SubscriptionClosed,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TransportError {
    /// Framed revert reason, when the ledger rejected the call.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::Reverted { reason } => Some(reason),
            _ => None,
        }
    }
}

// ============================================================================
// Layer 0: Log delivery
// ============================================================================

/// Identifier of one installed log listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receiving end of a log listener.
///
/// Logs are delivered at least once and in per-filter delivery order.
#[derive(Debug)]
pub struct LogSubscription {
    id: SubscriptionId,
    filter: EventFilter,
    receiver: mpsc::UnboundedReceiver<RawLog>,
}

impl LogSubscription {
    pub fn new(
        id: SubscriptionId,
        filter: EventFilter,
        receiver: mpsc::UnboundedReceiver<RawLog>,
    ) -> Self {
        Self {
            id,
            filter,
            receiver,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Next delivered log, or `None` once the listener has been removed.
    pub async fn recv(&mut self) -> Option<RawLog> {
        self.receiver.recv().await
    }

    /// Already-delivered log, without waiting.
    pub fn try_recv(&mut self) -> Option<RawLog> {
        self.receiver.try_recv().ok()
    }
}

/// Log delivery from the ledger.
pub trait LogSource: Send + Sync {
    /// Install a listener for `filter`.
    fn subscribe_logs(&self, filter: &EventFilter) -> Result<LogSubscription, TransportError>;

    /// Remove every listener installed for `filter`. Returns how many were removed.
    fn remove_listeners(&self, filter: &EventFilter) -> usize;
}

// ============================================================================
// Layer 1: Contract surface
// ============================================================================

/// Read-only contract queries.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn is_player(&self, who: &Address) -> Result<bool, TransportError>;

    async fn is_player_token(&self, who: &Address) -> Result<bool, TransportError>;

    async fn get_player(&self, who: &Address) -> Result<Player, TransportError>;

    async fn get_player_token(&self, who: &Address) -> Result<GameToken, TransportError>;

    /// Every battle ever created, in contract enumeration order.
    async fn get_all_battles(&self) -> Result<Vec<Battle>, TransportError>;
}

/// State-changing submissions signed by the connected account.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Submit a call with a maximum gas budget.
    async fn submit(&self, call: ContractCall, gas_limit: u64)
    -> Result<TransactionId, TransportError>;

    /// Wait until a submitted transaction is mined.
    async fn wait_for_confirmation(
        &self,
        tx_id: &TransactionId,
    ) -> Result<TransactionReceipt, TransportError>;
}

// ============================================================================
// Layer 2: Composite traits
// ============================================================================

/// Connected contract handle.
pub trait Ledger: LedgerReader + LedgerWriter + LogSource + Send + Sync {
    /// Backend name (e.g. "local", "avalanche").
    fn name(&self) -> &str;

    /// Address of the battle contract.
    fn contract(&self) -> &Address;

    /// Account that signs submissions.
    fn signer(&self) -> &Address;
}

/// Wallet capability: environment probes and the connection handshake.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Inspect the wallet without prompting for a connection.
    async fn probe(&self) -> Result<WalletStatus, TransportError>;

    /// Perform the handshake and return a contract handle for the current account.
    async fn connect(&self) -> Result<Arc<dyn Ledger>, TransportError>;
}

//! Ledger abstraction layer for the card battle client.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: Ledger (composite trait), WalletProvider
//!          ├── LedgerReader
//!          ├── LedgerWriter
//!          └── LogSource
//!
//! Layer 1: Contract surface (reads, writes)
//!
//! Layer 0: Log delivery + static event schema
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::{ContractCall, EventFilter, EventKind, Ledger, decode_log};
//!
//! async fn watch(ledger: &dyn Ledger) -> Result<(), TransportError> {
//!     let filter = EventFilter::new(ledger.contract().clone(), EventKind::NewBattle);
//!     ledger.remove_listeners(&filter);
//!     let mut logs = ledger.subscribe_logs(&filter)?;
//!     while let Some(log) = logs.recv().await {
//!         println!("{:?}", decode_log(&log));
//!     }
//!     Ok(())
//! }
//! ```

pub mod events;
pub mod traits;
pub mod types;

pub use events::{
    BattleEnded, BattleMove, DecodeError, EventFilter, EventKind, GameEvent, NewBattle,
    NewGameToken, NewPlayer, RawLog, RoundEnded, decode_log, decode_log_as,
};

pub use traits::{
    Ledger, LedgerReader, LedgerWriter, LogSource, LogSubscription, SubscriptionId,
    TransportError, WalletProvider,
};

pub use types::{
    Address, Battle, BattleStatus, CallKind, ContractCall, GameToken, MoveChoice, Player,
    TransactionId, TransactionReceipt, WalletStatus,
};

//! In-process ledger for local development and tests.
//!
//! Implements the contract surface from `client-blockchain-core` without a
//! network: every [`LocalContract`] handle signs as one account and all
//! handles of a [`LocalLedger`] share state and log listeners, so two
//! participants can play against each other inside one process.
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_local::{LocalLedger, LocalWallet};
//!
//! let ledger = LocalLedger::new();
//! let wallet = LocalWallet::connected(ledger.clone(), Address::new("0xaa"));
//! let contract = wallet.connect().await?;
//! ```

pub mod contract;
pub mod ledger;
pub mod wallet;

pub use contract::{ContractState, MANA_PER_MOVE, Revert, STARTING_HEALTH, STARTING_MANA};
pub use ledger::{LOCAL_CONTRACT, LocalContract, LocalLedger, gas_cost};
pub use wallet::{LOCAL_BALANCE, LOCAL_CHAIN_ID, LocalWallet};

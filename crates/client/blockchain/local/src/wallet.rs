//! Scriptable wallet for the local ledger.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use client_blockchain_core::{Address, Ledger, TransportError, WalletProvider, WalletStatus};

use crate::ledger::LocalLedger;

/// Chain id the local wallet reports by default (Avalanche Fuji).
pub const LOCAL_CHAIN_ID: u64 = 43113;

/// Balance the local wallet reports by default: 1 native unit.
pub const LOCAL_BALANCE: u128 = 1_000_000_000_000_000_000;

/// Wallet whose environment (account, chain, balance) can be switched at will.
///
/// Switching mimics the `accountsChanged` / `chainChanged` notifications of a
/// browser wallet; the runtime is expected to be told separately.
pub struct LocalWallet {
    ledger: LocalLedger,
    status: Mutex<WalletStatus>,
}

impl LocalWallet {
    pub fn new(ledger: LocalLedger, status: WalletStatus) -> Self {
        Self {
            ledger,
            status: Mutex::new(status),
        }
    }

    /// Wallet with `account` authorized on the expected chain and a healthy balance.
    pub fn connected(ledger: LocalLedger, account: Address) -> Self {
        Self::new(
            ledger,
            WalletStatus {
                provider_available: true,
                account: Some(account),
                chain_id: Some(LOCAL_CHAIN_ID),
                balance: LOCAL_BALANCE,
            },
        )
    }

    /// Wallet with no injected provider at all.
    pub fn missing(ledger: LocalLedger) -> Self {
        Self::new(ledger, WalletStatus::default())
    }

    fn status(&self) -> MutexGuard<'_, WalletStatus> {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn switch_account(&self, account: Option<Address>) {
        self.status().account = account;
    }

    pub fn switch_chain(&self, chain_id: u64) {
        self.status().chain_id = Some(chain_id);
    }

    pub fn set_balance(&self, balance: u128) {
        self.status().balance = balance;
    }

    pub fn set_provider_available(&self, available: bool) {
        self.status().provider_available = available;
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn probe(&self) -> Result<WalletStatus, TransportError> {
        Ok(self.status().clone())
    }

    async fn connect(&self) -> Result<Arc<dyn Ledger>, TransportError> {
        let status = self.status().clone();
        if !status.provider_available {
            return Err(TransportError::NoProvider);
        }
        let account = status
            .account
            .ok_or_else(|| TransportError::Rejected("no account authorized".to_string()))?;

        tracing::debug!(target: "ledger::local", account = %account, "wallet connected");
        Ok(Arc::new(self.ledger.contract_for(account)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_binds_current_account() {
        let ledger = LocalLedger::new();
        let wallet = LocalWallet::connected(ledger, Address::new("0xaa"));

        let handle = wallet.connect().await.unwrap();
        assert_eq!(handle.signer(), &Address::new("0xAA"));

        wallet.switch_account(Some(Address::new("0xbb")));
        let handle = wallet.connect().await.unwrap();
        assert_eq!(handle.signer(), &Address::new("0xbb"));
    }

    #[tokio::test]
    async fn connect_without_provider_fails() {
        let wallet = LocalWallet::missing(LocalLedger::new());
        assert!(matches!(
            wallet.connect().await,
            Err(TransportError::NoProvider)
        ));
    }
}

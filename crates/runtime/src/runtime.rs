//! High-level runtime orchestrator.
//!
//! The runtime owns the sync worker, wires up command/event channels, and
//! exposes a builder-based API for clients to drive the battle client.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use client_blockchain_core::WalletProvider;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::config::RuntimeConfig;
use crate::events::EventBus;
use crate::settings::BattlegroundStore;
use crate::workers::{Command, SyncWorker};

/// Main runtime that keeps the client in sync with the ledger
///
/// Design: Runtime owns the worker and coordinates shutdown.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// Listeners are removed from the ledger and pending timers dropped.
    pub async fn shutdown(self) -> Result<()> {
        // The worker may already be gone; joining still reports how it ended.
        let _ = self.handle.shutdown().await;
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    wallet: Option<Arc<dyn WalletProvider>>,
    settings: Option<BattlegroundStore>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            wallet: None,
            settings: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the wallet capability (required)
    pub fn wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Override where the battleground choice is stored
    ///
    /// Defaults to `config.data_dir`, then the platform data directory.
    pub fn settings(mut self, settings: BattlegroundStore) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the runtime and start the sync worker
    pub async fn build(self) -> Result<Runtime> {
        let wallet = self.wallet.ok_or(RuntimeError::MissingWallet)?;

        let settings = match (self.settings, &self.config.data_dir) {
            (Some(settings), _) => settings,
            (None, Some(dir)) => BattlegroundStore::in_dir(dir),
            (None, None) => BattlegroundStore::default_location()?,
        };
        let battleground = settings.load_or_init()?;
        info!(path = %settings.path().display(), %battleground, "settings loaded");

        let (command_tx, command_rx) =
            mpsc::channel::<Command>(self.config.command_buffer_size.max(1));
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let worker = SyncWorker::new(
            self.config,
            wallet,
            settings,
            battleground,
            command_rx,
            event_bus,
        );

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}

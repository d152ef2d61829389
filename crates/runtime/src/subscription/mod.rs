//! Ledger log listeners.
//!
//! One listener per event kind. Installing a kind first removes whatever the
//! ledger already has for that filter, so reconnecting never doubles the
//! delivery of a log. Each listener runs as its own task, decodes logs with
//! the static event schema and forwards typed events to the sync worker.

mod reactions;

use std::collections::HashMap;
use std::sync::Arc;

use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use client_blockchain_core::{
    EventFilter, EventKind, GameEvent, Ledger, LogSubscription, TransportError, decode_log_as,
};

pub use reactions::{CueAnchor, Reaction, react};

struct Listener {
    ledger: Arc<dyn Ledger>,
    filter: EventFilter,
    task: JoinHandle<()>,
}

/// Owns the installed listeners, keyed by event kind.
pub struct SubscriptionManager {
    listeners: HashMap<EventKind, Listener>,
    events_tx: mpsc::UnboundedSender<GameEvent>,
}

impl SubscriptionManager {
    pub fn new(events_tx: mpsc::UnboundedSender<GameEvent>) -> Self {
        Self {
            listeners: HashMap::new(),
            events_tx,
        }
    }

    /// Install listeners for every event kind on `ledger`.
    pub fn install_all(&mut self, ledger: &Arc<dyn Ledger>) -> Result<(), TransportError> {
        for kind in EventKind::iter() {
            self.subscribe(ledger, kind)?;
        }
        debug!(ledger = ledger.name(), "event listeners installed");
        Ok(())
    }

    /// Install exactly one listener for `kind`, replacing any earlier one.
    pub fn subscribe(
        &mut self,
        ledger: &Arc<dyn Ledger>,
        kind: EventKind,
    ) -> Result<(), TransportError> {
        self.unsubscribe(kind);

        let filter = EventFilter::new(ledger.contract().clone(), kind);
        let removed = ledger.remove_listeners(&filter);
        if removed > 0 {
            debug!(%kind, removed, "removed stale ledger listeners");
        }

        let subscription = ledger.subscribe_logs(&filter)?;
        let task = tokio::spawn(forward_logs(subscription, self.events_tx.clone()));

        self.listeners.insert(
            kind,
            Listener {
                ledger: Arc::clone(ledger),
                filter,
                task,
            },
        );
        Ok(())
    }

    /// Remove the listener for `kind`. Does nothing if none is installed.
    pub fn unsubscribe(&mut self, kind: EventKind) {
        if let Some(listener) = self.listeners.remove(&kind) {
            listener.task.abort();
            listener.ledger.remove_listeners(&listener.filter);
        }
    }

    pub fn unsubscribe_all(&mut self) {
        let kinds: Vec<EventKind> = self.listeners.keys().copied().collect();
        for kind in kinds {
            self.unsubscribe(kind);
        }
    }

    pub fn installed_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

async fn forward_logs(
    mut subscription: LogSubscription,
    events_tx: mpsc::UnboundedSender<GameEvent>,
) {
    let kind = subscription.filter().kind;
    let id = subscription.id();
    while let Some(log) = subscription.recv().await {
        match decode_log_as(kind, &log) {
            Ok(event) => {
                if events_tx.send(event).is_err() {
                    break;
                }
            }
            Err(error) => {
                warn!(%kind, block = log.block_number, %error, "dropping undecodable log");
            }
        }
    }
    debug!(%kind, ?id, "listener closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{Address, NewPlayer, RawLog};
    use client_blockchain_local::LocalLedger;

    fn ledger_for(local: &LocalLedger) -> Arc<dyn Ledger> {
        Arc::new(local.contract_for(Address::new("0x01")))
    }

    #[tokio::test]
    async fn reinstalling_keeps_one_listener_per_kind() {
        let local = LocalLedger::new();
        let ledger = ledger_for(&local);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut manager = SubscriptionManager::new(tx);

        manager.install_all(&ledger).unwrap();
        manager.install_all(&ledger).unwrap();

        assert_eq!(manager.installed_count(), 6);
        for kind in EventKind::iter() {
            let filter = EventFilter::new(local.contract().clone(), kind);
            assert_eq!(local.listener_count(&filter), 1);
        }

        manager.unsubscribe_all();
        assert_eq!(manager.installed_count(), 0);
        let filter = EventFilter::new(local.contract().clone(), EventKind::NewPlayer);
        assert_eq!(local.listener_count(&filter), 0);
    }

    #[tokio::test]
    async fn malformed_log_does_not_stop_listener() {
        let local = LocalLedger::new();
        let ledger = ledger_for(&local);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = SubscriptionManager::new(tx);
        manager.subscribe(&ledger, EventKind::NewPlayer).unwrap();

        local.deliver(RawLog {
            contract: local.contract().clone(),
            topic: EventKind::NewPlayer.signature().to_string(),
            block_number: 1,
            log_index: 0,
            transaction_id: None,
            data: serde_json::json!({ "owner": 7 }),
        });

        let event = GameEvent::NewPlayer(NewPlayer {
            owner: Address::new("0x02"),
            name: "neo".into(),
        });
        local.emit(&event).unwrap();

        assert_eq!(rx.recv().await, Some(event));
    }
}

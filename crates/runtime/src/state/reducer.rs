use std::sync::Arc;

use client_blockchain_core::{Address, Battle};

use super::GameData;

/// Proof that a refresh was requested, carried by the fetch task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub version: u64,
    /// Identity at the time the refresh was triggered.
    pub identity: Option<Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The result replaced the current view.
    Applied { changed: bool },
    /// A newer result was already applied; this one was dropped.
    Superseded,
}

/// Owns [`GameData`] and orders asynchronous refreshes.
///
/// Every trigger issues a monotonically increasing version. A completed
/// fetch is applied only when its version is newer than the last applied
/// one, so a slow early fetch cannot overwrite a faster later one.
#[derive(Debug, Default)]
pub struct GameStateReducer {
    data: Arc<GameData>,
    update_counter: u64,
    issued: u64,
    applied: u64,
}

impl GameStateReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &Arc<GameData> {
        &self.data
    }

    /// Number of times the view was marked stale by a ledger event or request.
    pub fn update_counter(&self) -> u64 {
        self.update_counter
    }

    /// Record that the view is stale and issue a refresh.
    pub fn mark_stale(&mut self, identity: Option<Address>) -> RefreshTicket {
        self.update_counter += 1;
        self.begin(identity)
    }

    /// Issue a refresh without bumping the update counter.
    pub fn begin(&mut self, identity: Option<Address>) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket {
            version: self.issued,
            identity,
        }
    }

    pub fn complete(&mut self, ticket: &RefreshTicket, battles: &[Battle]) -> RefreshOutcome {
        if ticket.version <= self.applied {
            tracing::debug!(
                version = ticket.version,
                applied = self.applied,
                "dropping superseded refresh"
            );
            return RefreshOutcome::Superseded;
        }
        self.applied = ticket.version;

        let next = GameData::from_battles(battles, ticket.identity.as_ref());
        let changed = next != *self.data;
        if changed {
            self.data = Arc::new(next);
        }
        RefreshOutcome::Applied { changed }
    }

    /// Drop the current view, e.g. when the account switched.
    pub fn reset(&mut self) {
        if *self.data != GameData::default() {
            self.data = Arc::new(GameData::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new("0x00000000000000000000000000000000000000aa")
    }

    #[test]
    fn out_of_order_completion_keeps_newest() {
        let mut reducer = GameStateReducer::new();
        let early = reducer.mark_stale(Some(alice()));
        let late = reducer.mark_stale(Some(alice()));

        let newest = vec![Battle::placeholder(), Battle::pending("b", alice())];
        let stale = vec![Battle::placeholder(), Battle::pending("a", alice())];

        assert_eq!(
            reducer.complete(&late, &newest),
            RefreshOutcome::Applied { changed: true }
        );
        assert_eq!(reducer.complete(&early, &stale), RefreshOutcome::Superseded);
        assert_eq!(reducer.data().pending_battles[0].name, "b");
        assert_eq!(reducer.update_counter(), 2);
    }

    #[test]
    fn identical_result_is_not_a_change() {
        let mut reducer = GameStateReducer::new();
        let battles = vec![Battle::placeholder(), Battle::pending("a", alice())];

        let first = reducer.begin(None);
        reducer.complete(&first, &battles);
        let second = reducer.begin(None);
        assert_eq!(
            reducer.complete(&second, &battles),
            RefreshOutcome::Applied { changed: false }
        );
        assert_eq!(reducer.update_counter(), 0);
    }

    #[test]
    fn ticket_identity_drives_active_battle() {
        let mut reducer = GameStateReducer::new();
        let battles = vec![Battle::placeholder(), Battle::pending("a", alice())];

        let ticket = reducer.begin(Some(alice()));
        reducer.complete(&ticket, &battles);
        assert_eq!(reducer.data().active_battle_name(), Some("a"));
    }
}

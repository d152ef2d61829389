use serde::Serialize;

use client_blockchain_core::Address;

use crate::navigation::NavigationInputs;
use crate::onboarding::ConnectionStep;

/// Per-account client state that is not derived from the battle list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Account reported by the wallet.
    pub identity: Option<Address>,
    pub step: ConnectionStep,
    /// Whether a ledger handle for `identity` is connected.
    pub connected: bool,
    pub registered: bool,
    pub token_minted: bool,
    /// Set after creating a battle, cleared once it has an opponent.
    pub awaiting_opponent: bool,
    pub battleground: String,
}

impl Session {
    pub fn new(battleground: String) -> Self {
        Self {
            identity: None,
            step: ConnectionStep::NeedsProvider,
            connected: false,
            registered: false,
            token_minted: false,
            awaiting_opponent: false,
            battleground,
        }
    }

    /// Forget everything tied to the previous account.
    pub fn switch_identity(&mut self, identity: Option<Address>) {
        self.identity = identity;
        self.connected = false;
        self.registered = false;
        self.token_minted = false;
        self.awaiting_opponent = false;
    }

    pub fn navigation_inputs(&self, active_battle: Option<&str>) -> NavigationInputs {
        NavigationInputs {
            step: self.step,
            active_battle: active_battle.map(str::to_string),
            registered: self.registered,
            token_minted: self.token_minted,
        }
    }
}

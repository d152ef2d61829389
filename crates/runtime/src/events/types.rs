//! Event types for different topics.

use std::sync::Arc;

use serde::Serialize;

use crate::alerts::AlertState;
use crate::navigation::Route;
use crate::session::Session;
use crate::state::GameData;
use crate::subscription::CueAnchor;

/// The derived battle view was replaced.
#[derive(Debug, Clone, Serialize)]
pub struct GameDataEvent {
    pub data: Arc<GameData>,
    pub update_counter: u64,
}

/// Visual cue requested by a ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CueEvent {
    /// A participant took damage in the last round.
    Hit { anchor: CueAnchor },
}

/// The client moved to another screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEvent {
    pub route: Route,
}

/// Notification slot changed (shown or cleared).
pub type AlertEvent = AlertState;

/// Identity, onboarding or registration state changed.
pub type SessionEvent = Session;

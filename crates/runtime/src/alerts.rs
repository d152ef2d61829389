//! Transient notifications.
//!
//! At most one notification is visible. Showing a new one replaces the
//! previous message and restarts the clear timer, so an earlier deadline can
//! never clear a later message.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AlertKind {
    Info,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub visible: bool,
    pub kind: AlertKind,
    pub message: String,
}

impl AlertState {
    pub fn idle() -> Self {
        Self {
            visible: false,
            kind: AlertKind::Info,
            message: String::new(),
        }
    }
}

impl Default for AlertState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Owns the visible notification and its clear deadline.
#[derive(Debug)]
pub struct AlertScheduler {
    state: AlertState,
    duration: Duration,
    deadline: Option<Instant>,
}

impl AlertScheduler {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: AlertState::idle(),
            duration,
            deadline: None,
        }
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Replace the visible notification. Any pending clear is superseded.
    pub fn show(&mut self, kind: AlertKind, message: impl Into<String>, now: Instant) -> &AlertState {
        self.state = AlertState {
            visible: true,
            kind,
            message: message.into(),
        };
        self.deadline = Some(now + self.duration);
        &self.state
    }

    /// Clear the notification if its deadline has passed.
    ///
    /// Returns `true` when the state transitioned back to idle.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.state = AlertState::idle();
                true
            }
            _ => false,
        }
    }

    /// Drop the pending clear without touching the visible state.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

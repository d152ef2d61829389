//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! player actions, queries and streaming events from specific topics.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};

use client_blockchain_core::{MoveChoice, TransactionId};

use super::errors::{Result, RuntimeError};
use crate::actions::PlayerAction;
use crate::alerts::{AlertKind, AlertState};
use crate::events::{Event, EventBus, Topic};
use crate::navigation::Route;
use crate::session::Session;
use crate::state::{BattleView, GameData};
use crate::workers::Command;

/// Point-in-time copy of everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeSnapshot {
    pub game_data: Arc<GameData>,
    pub update_counter: u64,
    pub alert: AlertState,
    pub route: Route,
    pub session: Session,
}

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Submit a player action and wait until the ledger accepted or rejected it.
    ///
    /// Registration resolves after confirmation; the other actions resolve
    /// as soon as the submission is accepted. `Ok(None)` means nothing had
    /// to be submitted.
    pub async fn submit(&self, action: PlayerAction) -> Result<Option<TransactionId>> {
        self.request(|reply| Command::Submit { action, reply })
            .await?
    }

    pub async fn register_player(&self, name: impl Into<String>) -> Result<Option<TransactionId>> {
        self.submit(PlayerAction::Register { name: name.into() }).await
    }

    pub async fn create_battle(&self, name: impl Into<String>) -> Result<Option<TransactionId>> {
        self.submit(PlayerAction::CreateBattle { name: name.into() })
            .await
    }

    pub async fn join_battle(&self, name: impl Into<String>) -> Result<Option<TransactionId>> {
        self.submit(PlayerAction::JoinBattle { name: name.into() })
            .await
    }

    /// Forfeit the active battle.
    pub async fn quit_battle(&self) -> Result<Option<TransactionId>> {
        self.submit(PlayerAction::QuitBattle).await
    }

    pub async fn attack(&self) -> Result<Option<TransactionId>> {
        self.submit(PlayerAction::Move(MoveChoice::Attack)).await
    }

    pub async fn defend(&self) -> Result<Option<TransactionId>> {
        self.submit(PlayerAction::Move(MoveChoice::Defend)).await
    }

    /// Mark the battle view stale and re-fetch it.
    pub async fn refresh(&self) -> Result<()> {
        self.request(|reply| Command::Refresh { reply }).await
    }

    /// The wallet reported an account or network change.
    pub async fn environment_changed(&self) -> Result<()> {
        self.send(Command::EnvironmentChanged).await
    }

    /// Show a transient notification.
    pub async fn show_alert(&self, kind: AlertKind, message: impl Into<String>) -> Result<()> {
        self.send(Command::ShowAlert {
            kind,
            message: message.into(),
        })
        .await
    }

    /// Explicit navigation. Returns the route the client ends up on.
    pub async fn navigate(&self, route: Route) -> Result<Route> {
        self.request(|reply| Command::Navigate { route, reply })
            .await
    }

    /// Persist a battleground choice, then return to the previous screen.
    pub async fn choose_battleground(&self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        self.request(|reply| Command::ChooseBattleground { id, reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<RuntimeSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn game_data(&self) -> Result<Arc<GameData>> {
        Ok(self.snapshot().await?.game_data)
    }

    /// Vitals for the active battle, or `None` outside of one.
    pub async fn battle_view(&self) -> Result<Option<BattleView>> {
        self.request(|reply| Command::BattleView { reply })
            .await?
    }

    /// Stop the sync worker. Other handles observe `CommandChannelClosed`.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::GameData` - Battle list refreshes
    /// - `Topic::Alert` - Notifications shown and cleared
    /// - `Topic::Navigation` - Screen changes
    /// - `Topic::Cue` - Hit cues from finished rounds
    /// - `Topic::Session` - Identity, onboarding and registration changes
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut alerts = handle.subscribe(Topic::Alert);
    /// while let Ok(event) = alerts.recv().await {
    ///     // Render the notification
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

//! Sync worker that owns the client's view of the ledger.
//!
//! Every piece of mutable client state lives here: the derived
//! [`GameData`](crate::state::GameData), the notification slot, the current
//! route, the session flags and the ledger handle. The worker reacts to
//! commands from [`RuntimeHandle`](crate::RuntimeHandle), decoded ledger
//! events, completions of the async tasks it spawned and timer deadlines.
//! Nothing suspends while state is half-updated: slow work (fetches,
//! submissions, the wallet handshake) runs in spawned tasks and reports back
//! through the internal channel.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use client_blockchain_core::{
    Address, Battle, BattleStatus, GameEvent, Ledger, TransactionId, TransportError,
    WalletProvider, WalletStatus,
};

use crate::actions::{self, ActionError, ActionSubmitter, PlayerAction, SubmissionOutcome};
use crate::alerts::{AlertKind, AlertScheduler};
use crate::api::{Result, RuntimeError, RuntimeSnapshot};
use crate::config::RuntimeConfig;
use crate::events::{CueEvent, Event, EventBus, GameDataEvent, NavigationEvent};
use crate::navigation::{Navigator, Route};
use crate::onboarding::ConnectionStep;
use crate::session::Session;
use crate::settings::{BattlegroundStore, SettingsError, find_battleground};
use crate::state::{BattleView, GameStateReducer, RefreshOutcome, RefreshTicket};
use crate::subscription::{Reaction, SubscriptionManager, react};

/// Commands that can be sent to the sync worker
pub enum Command {
    Submit {
        action: PlayerAction,
        reply: oneshot::Sender<Result<Option<TransactionId>>>,
    },
    Refresh {
        reply: oneshot::Sender<()>,
    },
    EnvironmentChanged,
    ShowAlert {
        kind: AlertKind,
        message: String,
    },
    Navigate {
        route: Route,
        reply: oneshot::Sender<Route>,
    },
    ChooseBattleground {
        id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        reply: oneshot::Sender<RuntimeSnapshot>,
    },
    BattleView {
        reply: oneshot::Sender<Result<Option<BattleView>>>,
    },
    Shutdown,
}

/// Completions of tasks spawned by the worker.
enum Internal {
    Probed {
        epoch: u64,
        status: std::result::Result<WalletStatus, TransportError>,
    },
    Connected {
        epoch: u64,
        result: std::result::Result<Arc<dyn Ledger>, TransportError>,
    },
    RegistrationProbed {
        identity: Address,
        registered: bool,
        token_minted: bool,
    },
    RefreshCompleted {
        ticket: RefreshTicket,
        result: std::result::Result<Vec<Battle>, TransportError>,
    },
    SubmissionFinished {
        identity: Option<Address>,
        outcome: SubmissionOutcome,
        reply: oneshot::Sender<Result<Option<TransactionId>>>,
    },
}

enum DelayedNavigation {
    /// Leave a finished battle; the battle list is re-fetched on arrival.
    AfterBattle(Route),
    Back,
}

/// Background task that owns all client state.
pub struct SyncWorker {
    config: RuntimeConfig,
    wallet: Arc<dyn WalletProvider>,
    settings: BattlegroundStore,
    command_rx: mpsc::Receiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    ledger_events_rx: mpsc::UnboundedReceiver<GameEvent>,
    event_bus: EventBus,
    subscriptions: SubscriptionManager,
    reducer: GameStateReducer,
    alerts: AlertScheduler,
    navigator: Navigator,
    session: Session,
    ledger: Option<Arc<dyn Ledger>>,
    /// Bumped on every environment change; completions from older epochs are stale.
    epoch: u64,
    connecting: bool,
    /// Pending delayed navigations, ordered by deadline.
    delayed: Vec<(Instant, DelayedNavigation)>,
}

impl SyncWorker {
    pub fn new(
        config: RuntimeConfig,
        wallet: Arc<dyn WalletProvider>,
        settings: BattlegroundStore,
        battleground: String,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (ledger_events_tx, ledger_events_rx) = mpsc::unbounded_channel();
        let alerts = AlertScheduler::new(config.timing.alert_duration);

        Self {
            config,
            wallet,
            settings,
            command_rx,
            internal_tx,
            internal_rx,
            ledger_events_rx,
            event_bus,
            subscriptions: SubscriptionManager::new(ledger_events_tx),
            reducer: GameStateReducer::new(),
            alerts,
            navigator: Navigator::new(),
            session: Session::new(battleground),
            ledger: None,
            epoch: 0,
            connecting: false,
            delayed: Vec::new(),
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        self.probe();

        loop {
            let alert_deadline = self.alerts.deadline();
            let navigation_deadline = self.delayed.first().map(|(at, _)| *at);

            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(internal) = self.internal_rx.recv() => {
                    self.handle_internal(internal);
                }
                Some(event) = self.ledger_events_rx.recv() => {
                    self.handle_ledger_event(event);
                }
                _ = sleep_until_opt(alert_deadline), if alert_deadline.is_some() => {
                    if self.alerts.expire(Instant::now()) {
                        self.publish_alert();
                    }
                }
                _ = sleep_until_opt(navigation_deadline), if navigation_deadline.is_some() => {
                    self.fire_delayed_navigation(Instant::now());
                }
            }
        }

        self.subscriptions.unsubscribe_all();
        self.alerts.cancel();
        self.delayed.clear();
        info!("sync worker stopped");
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Submit { action, reply } => self.submit(action, reply),
            Command::Refresh { reply } => {
                self.request_refresh(true);
                let _ = reply.send(());
            }
            Command::EnvironmentChanged => {
                info!("wallet environment changed, reconnecting");
                self.disconnect();
                self.probe();
            }
            Command::ShowAlert { kind, message } => self.show_alert(kind, message),
            Command::Navigate { route, reply } => {
                if let Some(route) = self.navigator.navigate(route) {
                    self.publish_route(route);
                }
                let _ = reply.send(self.navigator.current().clone());
            }
            Command::ChooseBattleground { id, reply } => {
                let _ = reply.send(self.choose_battleground(&id));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::BattleView { reply } => self.load_battle_view(reply),
            Command::Shutdown => {}
        }
    }

    fn submit(
        &mut self,
        action: PlayerAction,
        reply: oneshot::Sender<Result<Option<TransactionId>>>,
    ) {
        let ledger = match &self.ledger {
            Some(ledger) if self.session.step.is_ready() => Arc::clone(ledger),
            _ => {
                let _ = reply.send(Err(ActionError::NotConnected.into()));
                return;
            }
        };

        let prepared = match actions::prepare(action, self.reducer.data().active_battle_name()) {
            Ok(prepared) => prepared,
            Err(error) => {
                debug!(%error, "action rejected before submission");
                let _ = reply.send(Err(error.into()));
                return;
            }
        };

        let submitter = ActionSubmitter::new(ledger, self.config.gas);
        let identity = self.session.identity.clone();
        let internal_tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let outcome = submitter.submit(prepared).await;
            let _ = internal_tx.send(Internal::SubmissionFinished {
                identity,
                outcome,
                reply,
            });
        });
    }

    fn choose_battleground(&mut self, id: &str) -> Result<()> {
        let ground = find_battleground(id)
            .ok_or_else(|| SettingsError::UnknownBattleground(id.to_string()))?;

        if let Err(error) = self.settings.save(ground.id) {
            warn!(%error, "failed to persist battleground");
            self.show_alert(AlertKind::Failure, "Could not save battleground");
            return Err(error.into());
        }

        self.session.battleground = ground.id.to_string();
        self.publish_session();
        self.show_alert(AlertKind::Info, format!("{} is battle ready!", ground.name));
        self.schedule(self.config.timing.battleground_back, DelayedNavigation::Back);
        Ok(())
    }

    fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            game_data: Arc::clone(self.reducer.data()),
            update_counter: self.reducer.update_counter(),
            alert: self.alerts.state().clone(),
            route: self.navigator.current().clone(),
            session: self.session.clone(),
        }
    }

    fn load_battle_view(&self, reply: oneshot::Sender<Result<Option<BattleView>>>) {
        let (Some(ledger), Some(identity)) = (self.ledger.clone(), self.session.identity.clone())
        else {
            let _ = reply.send(Err(RuntimeError::NotConnected));
            return;
        };
        let Some(battle) = self.reducer.data().active_battle.clone() else {
            let _ = reply.send(Ok(None));
            return;
        };

        tokio::spawn(async move {
            let view = BattleView::load(ledger.as_ref(), battle, &identity)
                .await
                .map(Some)
                .map_err(RuntimeError::from);
            let _ = reply.send(view);
        });
    }

    // ------------------------------------------------------------------
    // Task completions
    // ------------------------------------------------------------------

    fn handle_internal(&mut self, internal: Internal) {
        match internal {
            Internal::Probed { epoch, status } => {
                if epoch == self.epoch {
                    self.on_probed(status);
                }
            }
            Internal::Connected { epoch, result } => {
                if epoch != self.epoch {
                    debug!("dropping handshake from a previous environment");
                    return;
                }
                self.connecting = false;
                self.on_connected(result);
            }
            Internal::RegistrationProbed {
                identity,
                registered,
                token_minted,
            } => {
                if self.session.identity.as_ref() != Some(&identity) {
                    return;
                }
                self.session.registered |= registered;
                self.session.token_minted |= token_minted;
                self.publish_session();
                self.reevaluate_navigation();
            }
            Internal::RefreshCompleted { ticket, result } => self.on_refreshed(ticket, result),
            Internal::SubmissionFinished {
                identity,
                outcome,
                reply,
            } => {
                if let Some((kind, message)) = outcome.alert {
                    self.show_alert(kind, message);
                }
                if identity.is_some() && identity == self.session.identity {
                    let before = self.session.clone();
                    self.session.registered |= outcome.registered;
                    self.session.awaiting_opponent |= outcome.awaiting_opponent;
                    if self.session != before {
                        self.publish_session();
                        self.reevaluate_navigation();
                    }
                    // Creating a battle emits no event of its own.
                    if outcome.awaiting_opponent && outcome.result.is_ok() {
                        self.request_refresh(true);
                    }
                }
                let _ = reply.send(outcome.result.map_err(RuntimeError::from));
            }
        }
    }

    fn on_probed(&mut self, status: std::result::Result<WalletStatus, TransportError>) {
        let status = status.unwrap_or_else(|error| {
            warn!(%error, "wallet probe failed");
            WalletStatus::default()
        });

        let step = ConnectionStep::evaluate(&status, &self.config.network);
        let identity = status.account.clone().filter(|account| !account.is_zero());
        debug!(step = step.code(), chain = ?status.chain_id, "wallet probed");

        if identity != self.session.identity {
            info!(account = ?identity.as_ref().map(Address::short), "account changed");
            self.session.switch_identity(identity.clone());
            self.reducer.reset();
            self.publish_game_data();
        }
        self.session.step = step;
        self.publish_session();

        if identity.is_some() && self.ledger.is_none() && !self.connecting {
            self.connect();
        }
        self.sync_listeners();
        self.reevaluate_navigation();
    }

    fn on_connected(&mut self, result: std::result::Result<Arc<dyn Ledger>, TransportError>) {
        let ledger = match result {
            Ok(ledger) => ledger,
            Err(error) => {
                warn!(%error, "wallet handshake failed");
                return;
            }
        };

        if Some(ledger.signer()) != self.session.identity.as_ref() {
            warn!(signer = %ledger.signer().short(), "handshake returned a different account");
        }
        info!(ledger = ledger.name(), signer = %ledger.signer().short(), "ledger connected");

        self.ledger = Some(Arc::clone(&ledger));
        self.session.connected = true;
        self.publish_session();

        if let Some(identity) = self.session.identity.clone() {
            let internal_tx = self.internal_tx.clone();
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                let registered = ledger.is_player(&identity).await;
                let token_minted = ledger.is_player_token(&identity).await;
                match (registered, token_minted) {
                    (Ok(registered), Ok(token_minted)) => {
                        let _ = internal_tx.send(Internal::RegistrationProbed {
                            identity,
                            registered,
                            token_minted,
                        });
                    }
                    (Err(error), _) | (_, Err(error)) => {
                        warn!(%error, "registration probe failed");
                    }
                }
            });
        }

        self.request_refresh(false);
        self.sync_listeners();
    }

    fn on_refreshed(
        &mut self,
        ticket: RefreshTicket,
        result: std::result::Result<Vec<Battle>, TransportError>,
    ) {
        if ticket.identity != self.session.identity {
            debug!(version = ticket.version, "dropping refresh for a previous account");
            return;
        }
        let battles = match result {
            Ok(battles) => battles,
            Err(error) => {
                warn!(%error, version = ticket.version, "refresh failed, keeping previous view");
                return;
            }
        };

        match self.reducer.complete(&ticket, &battles) {
            RefreshOutcome::Superseded => return,
            RefreshOutcome::Applied { changed: false } => {}
            RefreshOutcome::Applied { changed: true } => self.publish_game_data(),
        }

        if self.session.awaiting_opponent {
            let matched = self
                .reducer
                .data()
                .active_battle
                .as_ref()
                .is_none_or(|battle| battle.status != BattleStatus::Pending);
            if matched {
                self.session.awaiting_opponent = false;
                self.publish_session();
            }
        }
        self.reevaluate_navigation();
    }

    // ------------------------------------------------------------------
    // Ledger events
    // ------------------------------------------------------------------

    fn handle_ledger_event(&mut self, event: GameEvent) {
        debug!(kind = %event.kind(), "ledger event");

        for reaction in react(&event, self.session.identity.as_ref()) {
            match reaction {
                Reaction::Notify(kind, message) => self.show_alert(kind, message),
                Reaction::MarkRegistered => {
                    self.session.registered = true;
                    self.publish_session();
                }
                Reaction::MarkTokenMinted => {
                    self.session.token_minted = true;
                    self.publish_session();
                }
                Reaction::Navigate(route) => {
                    if let Some(route) = self.navigator.navigate(route) {
                        self.publish_route(route);
                    }
                }
                Reaction::NavigateLater(route) => {
                    self.session.awaiting_opponent = false;
                    self.schedule(
                        self.config.timing.battle_end_redirect,
                        DelayedNavigation::AfterBattle(route),
                    );
                }
                Reaction::MarkStale => self.request_refresh(true),
                Reaction::Hit(anchor) => self.event_bus.publish(Event::Cue(CueEvent::Hit { anchor })),
            }
        }

        self.reevaluate_navigation();
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    fn probe(&mut self) {
        let wallet = Arc::clone(&self.wallet);
        let internal_tx = self.internal_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let status = wallet.probe().await;
            let _ = internal_tx.send(Internal::Probed { epoch, status });
        });
    }

    fn connect(&mut self) {
        self.connecting = true;
        let wallet = Arc::clone(&self.wallet);
        let internal_tx = self.internal_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = wallet.connect().await;
            let _ = internal_tx.send(Internal::Connected { epoch, result });
        });
    }

    fn disconnect(&mut self) {
        self.epoch += 1;
        self.connecting = false;
        self.subscriptions.unsubscribe_all();
        if self.ledger.take().is_some() {
            self.session.connected = false;
            self.publish_session();
        }
    }

    /// Listeners exist exactly while the wallet is ready and a ledger is connected.
    fn sync_listeners(&mut self) {
        let active = self.session.step.is_ready() && self.ledger.is_some();

        match (&self.ledger, active) {
            (Some(ledger), true) if self.subscriptions.installed_count() == 0 => {
                let ledger = Arc::clone(ledger);
                if let Err(error) = self.subscriptions.install_all(&ledger) {
                    warn!(%error, "failed to install event listeners");
                    self.subscriptions.unsubscribe_all();
                }
            }
            (_, false) if self.subscriptions.installed_count() > 0 => {
                debug!("wallet not ready, removing event listeners");
                self.subscriptions.unsubscribe_all();
            }
            _ => {}
        }
    }

    fn request_refresh(&mut self, stale: bool) {
        let identity = self.session.identity.clone();
        let ticket = if stale {
            self.reducer.mark_stale(identity)
        } else {
            self.reducer.begin(identity)
        };

        let Some(ledger) = self.ledger.clone() else {
            debug!(version = ticket.version, "no ledger connected, skipping refresh");
            return;
        };

        let internal_tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = ledger.get_all_battles().await;
            let _ = internal_tx.send(Internal::RefreshCompleted { ticket, result });
        });
    }

    // ------------------------------------------------------------------
    // Alerts and navigation
    // ------------------------------------------------------------------

    fn show_alert(&mut self, kind: AlertKind, message: impl Into<String>) {
        self.alerts.show(kind, message, Instant::now());
        self.publish_alert();
    }

    fn schedule(&mut self, delay: std::time::Duration, navigation: DelayedNavigation) {
        let at = Instant::now() + delay;
        let index = self.delayed.partition_point(|(existing, _)| *existing <= at);
        self.delayed.insert(index, (at, navigation));
    }

    fn fire_delayed_navigation(&mut self, now: Instant) {
        while self.delayed.first().is_some_and(|(at, _)| *at <= now) {
            let (_, navigation) = self.delayed.remove(0);
            let moved = match navigation {
                DelayedNavigation::AfterBattle(route) => {
                    self.request_refresh(true);
                    self.navigator.navigate(route)
                }
                DelayedNavigation::Back => self.navigator.back(),
            };
            if let Some(route) = moved {
                self.publish_route(route);
            }
        }
    }

    fn reevaluate_navigation(&mut self) {
        let inputs = self
            .session
            .navigation_inputs(self.reducer.data().active_battle_name());
        if let Some(route) = self.navigator.evaluate(&inputs) {
            self.publish_route(route);
        }
    }

    // ------------------------------------------------------------------
    // Publishing
    // ------------------------------------------------------------------

    fn publish_alert(&self) {
        self.event_bus
            .publish(Event::Alert(self.alerts.state().clone()));
    }

    fn publish_route(&self, route: Route) {
        debug!(path = %route.path(), "navigating");
        self.event_bus
            .publish(Event::Navigation(NavigationEvent { route }));
    }

    fn publish_session(&self) {
        self.event_bus.publish(Event::Session(self.session.clone()));
    }

    fn publish_game_data(&self) {
        self.event_bus.publish(Event::GameData(GameDataEvent {
            data: Arc::clone(self.reducer.data()),
            update_counter: self.reducer.update_counter(),
        }));
    }
}

fn sleep_until_opt(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

//! View-model derived from runtime snapshots and kept current by events.
//!
//! Frontends seed a [`ViewModel`] from [`RuntimeSnapshot`] once and then feed
//! every bus event through [`ViewModel::apply`]. The returned [`EventImpact`]
//! tells the caller whether anything visible changed.
use std::sync::Arc;

use client_blockchain_core::{Address, Battle, BattleStatus};
use runtime::{
    AlertKind, AlertState, CueAnchor, CueEvent, Event, GameData, Route, RuntimeSnapshot, Session,
};

use crate::config::MessageConfig;
use crate::message::{MessageEntry, MessageLevel, MessageLog};

#[derive(Clone, Copy, Debug, Default)]
pub struct EventImpact {
    pub requires_redraw: bool,
}

impl EventImpact {
    pub const fn none() -> Self {
        Self {
            requires_redraw: false,
        }
    }

    pub const fn redraw() -> Self {
        Self {
            requires_redraw: true,
        }
    }
}

/// One battle as listed in the lobby or header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleSummary {
    pub name: String,
    pub creator: Address,
    pub opponent: Option<Address>,
    pub status: BattleStatus,
}

impl BattleSummary {
    fn from_battle(battle: &Battle) -> Self {
        let [creator, second] = &battle.players;
        Self {
            name: battle.name.clone(),
            creator: creator.clone(),
            opponent: (!second.is_zero()).then(|| second.clone()),
            status: battle.status,
        }
    }
}

/// Presentation state shared by every frontend.
#[derive(Clone, Debug)]
pub struct ViewModel {
    pub route: Route,
    pub session: Session,
    pub update_counter: u64,
    /// Current notification, `None` once it expired.
    pub alert: Option<AlertState>,
    pub registered_players: usize,
    /// Battles the local identity could join.
    pub lobby: Vec<BattleSummary>,
    pub active: Option<BattleSummary>,
    messages: MessageLog,
    game_data: Arc<GameData>,
    show_hits: bool,
}

impl ViewModel {
    pub fn from_snapshot(snapshot: &RuntimeSnapshot, config: &MessageConfig) -> Self {
        let mut view_model = Self {
            route: snapshot.route.clone(),
            session: snapshot.session.clone(),
            update_counter: snapshot.update_counter,
            alert: snapshot.alert.visible.then(|| snapshot.alert.clone()),
            registered_players: 0,
            lobby: Vec::new(),
            active: None,
            messages: MessageLog::new(config.capacity),
            game_data: snapshot.game_data.clone(),
            show_hits: config.show_hits,
        };
        view_model.rebuild_battles();
        view_model
    }

    /// Replace everything but the message history, after missed events.
    pub fn resync(&mut self, snapshot: &RuntimeSnapshot) {
        self.route = snapshot.route.clone();
        self.session = snapshot.session.clone();
        self.update_counter = snapshot.update_counter;
        self.alert = snapshot.alert.visible.then(|| snapshot.alert.clone());
        self.game_data = snapshot.game_data.clone();
        self.rebuild_battles();
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn game_data(&self) -> &GameData {
        &self.game_data
    }

    /// Fold one runtime event into the view.
    pub fn apply(&mut self, event: &Event) -> EventImpact {
        match event {
            Event::GameData(update) => {
                if update.update_counter < self.update_counter {
                    return EventImpact::none();
                }
                self.update_counter = update.update_counter;
                self.game_data = update.data.clone();
                self.rebuild_battles();
                EventImpact::redraw()
            }
            Event::Alert(alert) => {
                if alert.visible {
                    self.messages.push(MessageEntry::new(
                        alert.message.clone(),
                        Some(self.update_counter),
                        MessageLevel::from(alert.kind),
                    ));
                    self.alert = Some(alert.clone());
                } else {
                    self.alert = None;
                }
                EventImpact::redraw()
            }
            Event::Navigation(navigation) => {
                if navigation.route == self.route {
                    return EventImpact::none();
                }
                self.route = navigation.route.clone();
                EventImpact::redraw()
            }
            Event::Cue(CueEvent::Hit { anchor }) => {
                if !self.show_hits {
                    return EventImpact::none();
                }
                let text = match anchor {
                    CueAnchor::LocalPlayer => "You were hit",
                    CueAnchor::Opponent => "Your opponent was hit",
                };
                self.messages.push(MessageEntry::new(
                    text,
                    Some(self.update_counter),
                    MessageLevel::from(AlertKind::Info),
                ));
                EventImpact::redraw()
            }
            Event::Session(session) => {
                let identity_changed = session.identity != self.session.identity;
                self.session = session.clone();
                if identity_changed {
                    self.rebuild_battles();
                }
                EventImpact::redraw()
            }
        }
    }

    fn rebuild_battles(&mut self) {
        self.registered_players = self.game_data.players.len();
        self.active = self
            .game_data
            .active_battle
            .as_ref()
            .map(BattleSummary::from_battle);

        self.lobby = match &self.session.identity {
            Some(local) => self
                .game_data
                .joinable_battles(local)
                .map(BattleSummary::from_battle)
                .collect(),
            None => self
                .game_data
                .pending_battles
                .iter()
                .map(BattleSummary::from_battle)
                .collect(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::{ConnectionStep, GameDataEvent, NavigationEvent};

    fn addr(tail: &str) -> Address {
        Address::new(format!("0x{tail:0>40}"))
    }

    fn snapshot(identity: Option<Address>) -> RuntimeSnapshot {
        let mut session = Session::new("bg-astral".into());
        session.identity = identity;
        session.step = ConnectionStep::Ready;
        RuntimeSnapshot {
            game_data: Arc::new(GameData::default()),
            update_counter: 0,
            alert: AlertState::idle(),
            route: Route::Home,
            session,
        }
    }

    fn battles() -> Vec<Battle> {
        vec![
            Battle::placeholder(),
            Battle::pending("mine", addr("a")),
            Battle::pending("theirs", addr("b")),
        ]
    }

    #[test]
    fn lobby_excludes_own_battles() {
        let mut vm = ViewModel::from_snapshot(&snapshot(Some(addr("a"))), &MessageConfig::default());
        let data = GameData::from_battles(&battles(), Some(&addr("a")));

        let impact = vm.apply(&Event::GameData(GameDataEvent {
            data: Arc::new(data),
            update_counter: 1,
        }));

        assert!(impact.requires_redraw);
        let names: Vec<_> = vm.lobby.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["theirs"]);
        assert_eq!(vm.active.as_ref().map(|b| b.name.as_str()), Some("mine"));
        assert_eq!(vm.active.as_ref().and_then(|b| b.opponent.clone()), None);
    }

    #[test]
    fn older_game_data_is_ignored() {
        let mut vm = ViewModel::from_snapshot(&snapshot(None), &MessageConfig::default());
        vm.apply(&Event::GameData(GameDataEvent {
            data: Arc::new(GameData::from_battles(&battles(), None)),
            update_counter: 3,
        }));

        let impact = vm.apply(&Event::GameData(GameDataEvent {
            data: Arc::new(GameData::default()),
            update_counter: 2,
        }));

        assert!(!impact.requires_redraw);
        assert_eq!(vm.lobby.len(), 2);
        assert_eq!(vm.update_counter, 3);
    }

    #[test]
    fn alerts_are_logged_and_cleared() {
        let mut vm = ViewModel::from_snapshot(&snapshot(None), &MessageConfig::default());
        vm.apply(&Event::Alert(AlertState {
            visible: true,
            kind: AlertKind::Failure,
            message: "Battle already exists!".into(),
        }));
        assert!(vm.alert.is_some());

        vm.apply(&Event::Alert(AlertState::idle()));
        assert!(vm.alert.is_none());

        let entry = vm.messages().recent(1).next().expect("logged alert");
        assert_eq!(entry.level, MessageLevel::Error);
        assert_eq!(entry.text, "Battle already exists!");
    }

    #[test]
    fn muted_hits_leave_no_trace() {
        let config = MessageConfig {
            show_hits: false,
            ..MessageConfig::default()
        };
        let mut vm = ViewModel::from_snapshot(&snapshot(None), &config);

        let impact = vm.apply(&Event::Cue(CueEvent::Hit {
            anchor: CueAnchor::Opponent,
        }));

        assert!(!impact.requires_redraw);
        assert!(vm.messages().is_empty());
    }

    #[test]
    fn repeated_route_needs_no_redraw() {
        let mut vm = ViewModel::from_snapshot(&snapshot(None), &MessageConfig::default());
        let same = Event::Navigation(NavigationEvent { route: Route::Home });
        assert!(!vm.apply(&same).requires_redraw);

        let next = Event::Navigation(NavigationEvent {
            route: Route::Battle("arena".into()),
        });
        assert!(vm.apply(&next).requires_redraw);
        assert_eq!(vm.route, Route::Battle("arena".into()));
    }
}

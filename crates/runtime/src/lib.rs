//! State-synchronization core for the card battle client.
//!
//! The battle's authoritative state lives in a ledger contract. This crate
//! keeps a local view consistent with it: it listens for contract events,
//! re-fetches the battle list whenever one arrives, and derives navigation
//! and notifications from the result. Consumers embed [`Runtime`] and talk
//! to it through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`subscription`] installs ledger listeners and maps events to reactions
//! - [`state`] derives [`GameData`] from the battle list
//! - [`actions`] validates and submits player actions
//! - [`alerts`], [`navigation`] and [`onboarding`] are pure state machines
//! - [`workers`] keeps background tasks internal to the crate
pub mod actions;
pub mod alerts;
pub mod api;
pub mod config;
pub mod events;
pub mod navigation;
pub mod onboarding;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod state;
pub mod subscription;

mod workers;

pub use actions::{ActionError, NameInput, PlayerAction, is_valid_name};
pub use alerts::{AlertKind, AlertScheduler, AlertState};
pub use api::{Result, RuntimeError, RuntimeHandle, RuntimeSnapshot};
pub use config::{GasCeilings, NetworkRequirements, RuntimeConfig, TimingConfig};
pub use events::{CueEvent, Event, EventBus, GameDataEvent, NavigationEvent, Topic};
pub use navigation::{NavigationInputs, Navigator, Route, target_route};
pub use onboarding::ConnectionStep;
pub use runtime::{Runtime, RuntimeBuilder};
pub use session::Session;
pub use settings::{BATTLEGROUNDS, Battleground, BattlegroundStore, DEFAULT_BATTLEGROUND, SettingsError};
pub use state::{BattleView, GameData, PlayerCard};
pub use subscription::CueAnchor;

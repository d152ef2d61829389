//! Derived game state.
//!
//! [`GameData`] is a pure function of the ledger's battle list and the local
//! identity; [`GameStateReducer`] orders the asynchronous refreshes that
//! produce it.

mod battle_view;
mod game_data;
mod reducer;

pub use battle_view::{BattleView, PlayerCard};
pub use game_data::GameData;
pub use reducer::{GameStateReducer, RefreshOutcome, RefreshTicket};

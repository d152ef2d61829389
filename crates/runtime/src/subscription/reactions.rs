//! What each decoded ledger event means for the local client.
//!
//! [`react`] is pure: it inspects one event against the local identity and
//! lists the effects. The sync worker applies them in order.

use serde::{Deserialize, Serialize};

use client_blockchain_core::{Address, GameEvent};

use crate::alerts::AlertKind;
use crate::navigation::Route;

/// Screen anchor a hit cue plays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CueAnchor {
    LocalPlayer,
    Opponent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    Notify(AlertKind, String),
    MarkRegistered,
    MarkTokenMinted,
    Navigate(Route),
    /// Navigate after the battle-end delay.
    NavigateLater(Route),
    MarkStale,
    Hit(CueAnchor),
}

pub fn react(event: &GameEvent, local: Option<&Address>) -> Vec<Reaction> {
    let is_local = |who: &Address| local.is_some_and(|local| !local.is_zero() && local == who);

    match event {
        GameEvent::NewPlayer(new_player) => {
            if !is_local(&new_player.owner) {
                return Vec::new();
            }
            vec![
                Reaction::Notify(
                    AlertKind::Success,
                    format!("Player {} has been successfully registered", new_player.name),
                ),
                Reaction::MarkRegistered,
            ]
        }
        GameEvent::NewBattle(new_battle) => {
            let mut reactions = Vec::with_capacity(2);
            if is_local(&new_battle.player1) || is_local(&new_battle.player2) {
                reactions.push(Reaction::Navigate(Route::Battle(
                    new_battle.battle_name.clone(),
                )));
            }
            reactions.push(Reaction::MarkStale);
            reactions
        }
        GameEvent::NewGameToken(token) => {
            if !is_local(&token.owner) {
                return Vec::new();
            }
            vec![
                Reaction::Notify(
                    AlertKind::Success,
                    "Player game token has been successfully generated".to_string(),
                ),
                Reaction::MarkTokenMinted,
                Reaction::Navigate(Route::CreateBattle),
            ]
        }
        GameEvent::BattleMove(battle_move) => {
            tracing::debug!(
                battle = %battle_move.battle_name,
                first_move = battle_move.is_first_move,
                "battle move observed"
            );
            Vec::new()
        }
        GameEvent::RoundEnded(round) => {
            let mut reactions: Vec<Reaction> = round
                .damaged_players
                .iter()
                .filter(|damaged| !damaged.is_zero())
                .map(|damaged| {
                    if is_local(damaged) {
                        Reaction::Hit(CueAnchor::LocalPlayer)
                    } else {
                        Reaction::Hit(CueAnchor::Opponent)
                    }
                })
                .collect();
            reactions.push(Reaction::MarkStale);
            reactions
        }
        GameEvent::BattleEnded(ended) => {
            let outcome = if is_local(&ended.winner) {
                Reaction::Notify(AlertKind::Success, "You won!".to_string())
            } else {
                Reaction::Notify(AlertKind::Failure, "You lost!".to_string())
            };
            vec![outcome, Reaction::NavigateLater(Route::CreateBattle)]
        }
    }
}

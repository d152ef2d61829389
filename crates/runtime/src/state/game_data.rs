use serde::Serialize;

use client_blockchain_core::{Address, Battle, BattleStatus};

/// Client-side view of the battle list.
///
/// Always derived from one complete `get_all_battles` result, never patched
/// incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameData {
    /// Distinct participants across every battle, in first-seen order.
    pub players: Vec<Address>,
    /// Battles still waiting for a second player.
    pub pending_battles: Vec<Battle>,
    /// The one unfinished battle the local account takes part in.
    pub active_battle: Option<Battle>,
}

impl GameData {
    pub fn from_battles(battles: &[Battle], local: Option<&Address>) -> Self {
        let real = battles.iter().filter(|battle| !battle.is_placeholder());

        let mut players: Vec<Address> = Vec::new();
        for participant in real.clone().flat_map(|battle| battle.players.iter()) {
            if !participant.is_zero() && !players.contains(participant) {
                players.push(participant.clone());
            }
        }

        let pending_battles = real
            .clone()
            .filter(|battle| battle.status == BattleStatus::Pending)
            .cloned()
            .collect();

        let active_battle = local.and_then(|local| {
            let mut candidates = real
                .clone()
                .filter(|battle| battle.has_participant(local) && !battle.has_winner());
            let first = candidates.next()?;
            let extra = candidates.count();
            if extra > 0 {
                tracing::warn!(
                    account = %local.short(),
                    matches = extra + 1,
                    "several unfinished battles for one account, treating as none"
                );
                return None;
            }
            Some(first.clone())
        });

        Self {
            players,
            pending_battles,
            active_battle,
        }
    }

    pub fn active_battle_name(&self) -> Option<&str> {
        self.active_battle.as_ref().map(|battle| battle.name.as_str())
    }

    /// Pending battles `local` could join: not its own, and not full.
    pub fn joinable_battles<'a>(&'a self, local: &'a Address) -> impl Iterator<Item = &'a Battle> {
        self.pending_battles
            .iter()
            .filter(move |battle| !battle.has_participant(local) && battle.players[1].is_zero())
    }
}

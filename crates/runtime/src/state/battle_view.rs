use serde::Serialize;

use client_blockchain_core::{Address, Battle, Ledger, TransportError};

/// One side of the battle screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerCard {
    pub address: Address,
    pub name: String,
    pub health: u32,
    pub mana: u32,
    /// Card strengths. Hidden for the opponent.
    pub attack: Option<u32>,
    pub defense: Option<u32>,
}

/// Vitals for the active battle as seen by the local player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleView {
    pub battle: Battle,
    pub local: PlayerCard,
    /// `None` while the battle still waits for a second player.
    pub opponent: Option<PlayerCard>,
}

impl BattleView {
    pub async fn load(
        ledger: &dyn Ledger,
        battle: Battle,
        local: &Address,
    ) -> Result<Self, TransportError> {
        let local_card = load_card(ledger, local, true).await?;

        let opponent = match battle.opponent_of(local) {
            Some(opponent) if !opponent.is_zero() => Some(load_card(ledger, opponent, false).await?),
            _ => None,
        };

        Ok(Self {
            battle,
            local: local_card,
            opponent,
        })
    }
}

async fn load_card(
    ledger: &dyn Ledger,
    who: &Address,
    reveal: bool,
) -> Result<PlayerCard, TransportError> {
    let player = ledger.get_player(who).await?;
    let (attack, defense) = if reveal {
        let token = ledger.get_player_token(who).await?;
        (Some(token.attack_strength), Some(token.defense_strength))
    } else {
        (None, None)
    };

    Ok(PlayerCard {
        address: who.clone(),
        name: player.player_name,
        health: player.player_health,
        mana: player.player_mana,
        attack,
        defense,
    })
}

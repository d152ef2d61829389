//! In-memory battle contract.
//!
//! Mirrors the storage layout and revert conditions of the deployed contract
//! closely enough for client development: a placeholder battle at index 0,
//! one token per player, and round resolution once both participants moved.

use std::collections::HashMap;

use client_blockchain_core::{
    Address, Battle, BattleEnded, BattleMove, BattleStatus, ContractCall, GameEvent, GameToken,
    MoveChoice, NewBattle, NewGameToken, NewPlayer, Player, RoundEnded,
};
use sha2::{Digest, Sha256};

pub const STARTING_HEALTH: u32 = 25;
pub const STARTING_MANA: u32 = 10;
pub const MANA_PER_MOVE: u32 = 3;

/// Reason the contract refused a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct Revert(pub String);

fn revert<T>(reason: &str) -> Result<T, Revert> {
    Err(Revert(reason.to_string()))
}

#[derive(Debug)]
pub struct ContractState {
    players: Vec<Player>,
    player_index: HashMap<Address, usize>,
    tokens: HashMap<Address, GameToken>,
    battles: Vec<Battle>,
    battle_index: HashMap<String, usize>,
}

impl Default for ContractState {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractState {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            player_index: HashMap::new(),
            tokens: HashMap::new(),
            battles: vec![Battle::placeholder()],
            battle_index: HashMap::new(),
        }
    }

    pub fn is_player(&self, who: &Address) -> bool {
        self.player_index.contains_key(who)
    }

    pub fn is_player_token(&self, who: &Address) -> bool {
        self.tokens.contains_key(who)
    }

    pub fn player(&self, who: &Address) -> Option<&Player> {
        self.player_index.get(who).map(|&idx| &self.players[idx])
    }

    pub fn token(&self, who: &Address) -> Option<&GameToken> {
        self.tokens.get(who)
    }

    pub fn battles(&self) -> &[Battle] {
        &self.battles
    }

    /// Insert or replace a battle record directly, bypassing contract rules.
    pub fn put_battle(&mut self, battle: Battle) {
        match self.battle_index.get(&battle.name) {
            Some(&idx) => self.battles[idx] = battle,
            None => {
                self.battle_index
                    .insert(battle.name.clone(), self.battles.len());
                self.battles.push(battle);
            }
        }
    }

    /// Execute a call on behalf of `sender`, returning the emitted events.
    pub fn execute(
        &mut self,
        sender: &Address,
        call: &ContractCall,
    ) -> Result<Vec<GameEvent>, Revert> {
        match call {
            ContractCall::RegisterPlayer { name, token_name } => {
                self.register_player(sender, name, token_name)
            }
            ContractCall::CreateBattle { name } => self.create_battle(sender, name),
            ContractCall::JoinBattle { name } => self.join_battle(sender, name),
            ContractCall::QuitBattle { name } => self.quit_battle(sender, name),
            ContractCall::AttackOrDefend { choice, battle } => {
                self.attack_or_defend(sender, *choice, battle)
            }
        }
    }

    fn register_player(
        &mut self,
        sender: &Address,
        name: &str,
        token_name: &str,
    ) -> Result<Vec<GameEvent>, Revert> {
        if self.is_player(sender) {
            return revert("Player already registered");
        }
        if name.is_empty() {
            return revert("Player name cannot be empty");
        }

        self.player_index.insert(sender.clone(), self.players.len());
        self.players.push(Player {
            player_address: sender.clone(),
            player_name: name.to_string(),
            player_mana: STARTING_MANA,
            player_health: STARTING_HEALTH,
            in_battle: false,
        });

        let token = mint_token(sender, token_name, self.tokens.len() as u64 + 1);
        let minted = NewGameToken {
            owner: sender.clone(),
            id: token.id,
            attack_strength: token.attack_strength,
            defense_strength: token.defense_strength,
        };
        self.tokens.insert(sender.clone(), token);

        Ok(vec![
            GameEvent::NewPlayer(NewPlayer {
                owner: sender.clone(),
                name: name.to_string(),
            }),
            GameEvent::NewGameToken(minted),
        ])
    }

    fn create_battle(&mut self, sender: &Address, name: &str) -> Result<Vec<GameEvent>, Revert> {
        if !self.is_player(sender) {
            return revert("Please Register Player First");
        }
        if name.is_empty() {
            return revert("Battle name cannot be empty");
        }
        if self.battle_index.contains_key(name) {
            return revert("Battle already exists!");
        }
        if self.player(sender).is_some_and(|p| p.in_battle) {
            return revert("Player already in a battle");
        }

        self.put_battle(Battle::pending(name, sender.clone()));
        self.set_in_battle(sender);

        Ok(Vec::new())
    }

    fn join_battle(&mut self, sender: &Address, name: &str) -> Result<Vec<GameEvent>, Revert> {
        if !self.is_player(sender) {
            return revert("Please Register Player First");
        }
        let idx = self.battle_idx(name)?;
        let battle = &self.battles[idx];

        if battle.status != BattleStatus::Pending {
            return revert("Battle already started!");
        }
        if battle.players[0] == *sender {
            return revert("Only player two can join a battle");
        }
        if self.player(sender).is_some_and(|p| p.in_battle) {
            return revert("Player already in a battle");
        }

        let battle = &mut self.battles[idx];
        battle.status = BattleStatus::Active;
        battle.players[1] = sender.clone();
        let event = NewBattle {
            battle_name: battle.name.clone(),
            player1: battle.players[0].clone(),
            player2: battle.players[1].clone(),
        };
        self.set_in_battle(sender);

        Ok(vec![GameEvent::NewBattle(event)])
    }

    fn quit_battle(&mut self, sender: &Address, name: &str) -> Result<Vec<GameEvent>, Revert> {
        let idx = self.battle_idx(name)?;
        let battle = &self.battles[idx];

        let Some(opponent) = battle.opponent_of(sender).cloned() else {
            return revert("Only players in this battle can quit");
        };
        let status = battle.status;
        match status {
            BattleStatus::Pending => revert("Battle has not started"),
            BattleStatus::Ended => revert("Battle has already ended!"),
            BattleStatus::Active => Ok(vec![self.end_battle(idx, opponent)]),
        }
    }

    fn attack_or_defend(
        &mut self,
        sender: &Address,
        choice: MoveChoice,
        name: &str,
    ) -> Result<Vec<GameEvent>, Revert> {
        let idx = self.battle_idx(name)?;
        let battle = &self.battles[idx];

        let Some(slot) = battle.slot_of(sender) else {
            return revert("Only players in this battle can make a move");
        };
        match battle.status {
            BattleStatus::Pending => {
                return revert("Battle not started. Please tell another player to join the battle");
            }
            BattleStatus::Ended => return revert("Battle has already ended!"),
            BattleStatus::Active => {}
        }
        if battle.moves[slot] != 0 {
            return revert("You have already made a move!");
        }
        if choice == MoveChoice::Attack
            && self
                .player(sender)
                .is_some_and(|p| p.player_mana < MANA_PER_MOVE)
        {
            return revert("Mana not sufficient for attacking");
        }

        let battle = &mut self.battles[idx];
        battle.moves[slot] = choice.code();
        let first_move = battle.moves.iter().filter(|&&m| m != 0).count() == 1;

        let mut events = vec![GameEvent::BattleMove(BattleMove {
            battle_name: battle.name.clone(),
            is_first_move: first_move,
        })];

        if !first_move {
            events.push(self.resolve_round(idx));
        }

        Ok(events)
    }

    fn resolve_round(&mut self, idx: usize) -> GameEvent {
        let battle = &self.battles[idx];
        let [p1, p2] = battle.players.clone();
        let moves = (
            MoveChoice::from_code(battle.moves[0]),
            MoveChoice::from_code(battle.moves[1]),
        );
        let (t1, t2) = (self.token_or_default(&p1), self.token_or_default(&p2));
        let (h1, h2) = (self.health(&p1), self.health(&p2));

        let mut damaged = [Address::zero(), Address::zero()];

        match moves {
            (Some(MoveChoice::Attack), Some(MoveChoice::Attack)) => {
                if h1 <= t2.attack_strength {
                    return self.end_battle(idx, p2);
                }
                if h2 <= t1.attack_strength {
                    return self.end_battle(idx, p1);
                }
                self.set_health(&p1, h1 - t2.attack_strength);
                self.set_health(&p2, h2 - t1.attack_strength);
                self.spend_mana(&p1);
                self.spend_mana(&p2);
                damaged = [p1.clone(), p2.clone()];
            }
            (Some(MoveChoice::Attack), Some(MoveChoice::Defend)) => {
                match defend_against(h2, &t2, &t1) {
                    None => return self.end_battle(idx, p1),
                    Some(health) => self.set_health(&p2, health),
                }
                self.spend_mana(&p1);
                self.gain_mana(&p2);
                damaged[0] = p2.clone();
            }
            (Some(MoveChoice::Defend), Some(MoveChoice::Attack)) => {
                match defend_against(h1, &t1, &t2) {
                    None => return self.end_battle(idx, p2),
                    Some(health) => self.set_health(&p1, health),
                }
                self.gain_mana(&p1);
                self.spend_mana(&p2);
                damaged[0] = p1.clone();
            }
            _ => {
                self.gain_mana(&p1);
                self.gain_mana(&p2);
            }
        }

        self.battles[idx].moves = [0, 0];
        GameEvent::RoundEnded(RoundEnded {
            damaged_players: damaged,
        })
    }

    fn end_battle(&mut self, idx: usize, winner: Address) -> GameEvent {
        let battle = &mut self.battles[idx];
        let loser = battle
            .opponent_of(&winner)
            .cloned()
            .unwrap_or_else(Address::zero);
        battle.status = BattleStatus::Ended;
        battle.winner = winner.clone();
        battle.moves = [0, 0];
        let battle_name = battle.name.clone();

        for who in [&winner, &loser] {
            if let Some(&pidx) = self.player_index.get(who) {
                let player = &mut self.players[pidx];
                player.player_health = STARTING_HEALTH;
                player.player_mana = STARTING_MANA;
                player.in_battle = false;
            }
        }

        GameEvent::BattleEnded(BattleEnded {
            battle_name,
            winner,
            loser,
        })
    }

    fn battle_idx(&self, name: &str) -> Result<usize, Revert> {
        match self.battle_index.get(name) {
            Some(&idx) => Ok(idx),
            None => revert("Battle does not exist"),
        }
    }

    fn player_mut(&mut self, who: &Address) -> Option<&mut Player> {
        let idx = *self.player_index.get(who)?;
        self.players.get_mut(idx)
    }

    fn set_health(&mut self, who: &Address, health: u32) {
        if let Some(player) = self.player_mut(who) {
            player.player_health = health;
        }
    }

    fn set_in_battle(&mut self, who: &Address) {
        if let Some(player) = self.player_mut(who) {
            player.in_battle = true;
        }
    }

    fn health(&self, who: &Address) -> u32 {
        self.player(who).map_or(0, |p| p.player_health)
    }

    fn token_or_default(&self, who: &Address) -> GameToken {
        self.token(who).cloned().unwrap_or(GameToken {
            name: String::new(),
            id: 0,
            attack_strength: 0,
            defense_strength: 0,
        })
    }

    fn spend_mana(&mut self, who: &Address) {
        if let Some(player) = self.player_mut(who) {
            player.player_mana = player.player_mana.saturating_sub(MANA_PER_MOVE);
        }
    }

    fn gain_mana(&mut self, who: &Address) {
        if let Some(player) = self.player_mut(who) {
            player.player_mana += MANA_PER_MOVE;
        }
    }
}

/// Health of a defender after being attacked, or `None` if the hit is lethal.
///
/// Defense absorbs damage up to its strength; a defense stronger than the
/// attack leaves health untouched.
fn defend_against(health: u32, defender: &GameToken, attacker: &GameToken) -> Option<u32> {
    let shielded = health + defender.defense_strength;
    if shielded <= attacker.attack_strength {
        return None;
    }
    if defender.defense_strength >= attacker.attack_strength {
        Some(health)
    } else {
        Some(shielded - attacker.attack_strength)
    }
}

/// Deterministic token stats in 1..=10 derived from the owner's address.
fn mint_token(owner: &Address, name: &str, id: u64) -> GameToken {
    let mut hasher = Sha256::new();
    hasher.update(owner.as_str().to_ascii_lowercase().as_bytes());
    hasher.update(id.to_le_bytes());
    let digest = hasher.finalize();

    GameToken {
        name: name.to_string(),
        id,
        attack_strength: 1 + u32::from(digest[0]) % 10,
        defense_strength: 1 + u32::from(digest[1]) % 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn register(state: &mut ContractState, who: &str) {
        state
            .execute(
                &addr(who),
                &ContractCall::RegisterPlayer {
                    name: who.trim_start_matches("0x").into(),
                    token_name: who.trim_start_matches("0x").into(),
                },
            )
            .unwrap();
    }

    fn started_battle(state: &mut ContractState) {
        register(state, "0xaa");
        register(state, "0xbb");
        state
            .execute(&addr("0xaa"), &ContractCall::CreateBattle { name: "arena".into() })
            .unwrap();
        state
            .execute(&addr("0xbb"), &ContractCall::JoinBattle { name: "arena".into() })
            .unwrap();
    }

    fn play(state: &mut ContractState, who: &str, choice: MoveChoice) -> Vec<GameEvent> {
        state
            .execute(
                &addr(who),
                &ContractCall::AttackOrDefend {
                    choice,
                    battle: "arena".into(),
                },
            )
            .unwrap()
    }

    #[test]
    fn registration_mints_token_and_emits_both_events() {
        let mut state = ContractState::new();
        let events = state
            .execute(
                &addr("0xaa"),
                &ContractCall::RegisterPlayer {
                    name: "neo".into(),
                    token_name: "neo".into(),
                },
            )
            .unwrap();

        assert_eq!(events.len(), 2);
        assert!(state.is_player(&addr("0xAA")));
        let token = state.token(&addr("0xaa")).unwrap();
        assert!((1..=10).contains(&token.attack_strength));
        assert!((1..=10).contains(&token.defense_strength));
    }

    #[test]
    fn duplicate_registration_reverts() {
        let mut state = ContractState::new();
        register(&mut state, "0xaa");
        let err = state
            .execute(
                &addr("0xaa"),
                &ContractCall::RegisterPlayer {
                    name: "again".into(),
                    token_name: "again".into(),
                },
            )
            .unwrap_err();
        assert_eq!(err.0, "Player already registered");
    }

    #[test]
    fn placeholder_battle_is_enumerated_first() {
        let state = ContractState::new();
        assert_eq!(state.battles().len(), 1);
        assert!(state.battles()[0].is_placeholder());
    }

    #[test]
    fn join_starts_battle_and_emits_new_battle() {
        let mut state = ContractState::new();
        started_battle(&mut state);

        let battle = &state.battles()[1];
        assert_eq!(battle.status, BattleStatus::Active);
        assert_eq!(battle.players[1], addr("0xbb"));
    }

    #[test]
    fn first_move_waits_second_move_resolves() {
        let mut state = ContractState::new();
        started_battle(&mut state);

        let first = play(&mut state, "0xaa", MoveChoice::Defend);
        assert_eq!(first.len(), 1);

        let second = play(&mut state, "0xbb", MoveChoice::Defend);
        assert!(matches!(second.last(), Some(GameEvent::RoundEnded(_))));
        assert_eq!(
            state.player(&addr("0xaa")).unwrap().player_mana,
            STARTING_MANA + MANA_PER_MOVE
        );
        assert_eq!(state.battles()[1].moves, [0, 0]);
    }

    #[test]
    fn double_move_reverts() {
        let mut state = ContractState::new();
        started_battle(&mut state);
        play(&mut state, "0xaa", MoveChoice::Attack);

        let err = state
            .execute(
                &addr("0xaa"),
                &ContractCall::AttackOrDefend {
                    choice: MoveChoice::Attack,
                    battle: "arena".into(),
                },
            )
            .unwrap_err();
        assert_eq!(err.0, "You have already made a move!");
    }

    #[test]
    fn mutual_attacks_eventually_end_the_battle() {
        let mut state = ContractState::new();
        started_battle(&mut state);

        let mut ended = None;
        for _ in 0..40 {
            play(&mut state, "0xaa", MoveChoice::Attack);
            let events = play(&mut state, "0xbb", MoveChoice::Attack);
            if let Some(GameEvent::BattleEnded(end)) = events.last() {
                ended = Some(end.clone());
                break;
            }
            // Recover mana so both sides can keep attacking.
            play(&mut state, "0xaa", MoveChoice::Defend);
            play(&mut state, "0xbb", MoveChoice::Defend);
        }

        let ended = ended.expect("battle should end");
        assert!(state.battles()[1].has_winner());
        assert_eq!(state.battles()[1].winner, ended.winner);
        assert_eq!(
            state.player(&ended.loser).unwrap().player_health,
            STARTING_HEALTH
        );
    }

    #[test]
    fn quit_awards_the_opponent() {
        let mut state = ContractState::new();
        started_battle(&mut state);

        let events = state
            .execute(&addr("0xaa"), &ContractCall::QuitBattle { name: "arena".into() })
            .unwrap();
        let Some(GameEvent::BattleEnded(end)) = events.first() else {
            panic!("expected BattleEnded");
        };
        assert_eq!(end.winner, addr("0xbb"));
        assert_eq!(state.battles()[1].status, BattleStatus::Ended);
    }

    #[test]
    fn quitting_a_pending_battle_reverts() {
        let mut state = ContractState::new();
        register(&mut state, "0xaa");
        state
            .execute(&addr("0xaa"), &ContractCall::CreateBattle { name: "arena".into() })
            .unwrap();

        let err = state
            .execute(&addr("0xaa"), &ContractCall::QuitBattle { name: "arena".into() })
            .unwrap_err();
        assert_eq!(err.0, "Battle has not started");
    }

    #[test]
    fn strong_defense_blocks_all_damage() {
        let defender = GameToken {
            name: "d".into(),
            id: 1,
            attack_strength: 1,
            defense_strength: 8,
        };
        let attacker = GameToken {
            name: "a".into(),
            id: 2,
            attack_strength: 5,
            defense_strength: 1,
        };
        assert_eq!(defend_against(10, &defender, &attacker), Some(10));
        assert_eq!(defend_against(10, &attacker, &defender), Some(10));
    }
}

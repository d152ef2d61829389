//! Common types for ledger interactions.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Account or contract identity on the ledger.
///
/// Addresses are opaque hex strings. Equality and hashing ignore ASCII case so
/// that checksummed and lowercase spellings of the same account compare equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// The empty sentinel used by the contract for unset slots and winners.
    pub const ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    /// Returns true for the empty sentinel (any spelling of all-zero digits, or empty).
    pub fn is_zero(&self) -> bool {
        let digits = self
            .0
            .strip_prefix("0x")
            .or_else(|| self.0.strip_prefix("0X"))
            .unwrap_or(&self.0);
        digits.chars().all(|c| c == '0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for logs and compact UI labels.
    pub fn short(&self) -> String {
        if self.0.len() <= 10 || !self.0.is_ascii() {
            return self.0.clone();
        }
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Transaction hash returned by a submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: TransactionId,
    pub block_number: u64,
    pub gas_used: u64,
}

/// Lifecycle status of a battle as stored by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleStatus {
    Pending,
    Active,
    Ended,
}

impl BattleStatus {
    /// Maps the contract's numeric enum (0 = pending, 1 = started, 2 = ended).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Active),
            2 => Some(Self::Ended),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Active => 1,
            Self::Ended => 2,
        }
    }
}

/// One match instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battle {
    pub name: String,
    pub players: [Address; 2],
    #[serde(rename = "battleStatus")]
    pub status: BattleStatus,
    pub winner: Address,
    /// Move codes recorded for the current round (0 = none yet).
    #[serde(default)]
    pub moves: [u8; 2],
}

impl Battle {
    pub fn pending(name: impl Into<String>, creator: Address) -> Self {
        Self {
            name: name.into(),
            players: [creator, Address::zero()],
            status: BattleStatus::Pending,
            winner: Address::zero(),
            moves: [0, 0],
        }
    }

    /// The contract keeps an unnamed, participant-less battle at index 0.
    pub fn placeholder() -> Self {
        Self {
            name: String::new(),
            players: [Address::zero(), Address::zero()],
            status: BattleStatus::Pending,
            winner: Address::zero(),
            moves: [0, 0],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.name.is_empty() && self.players.iter().all(Address::is_zero)
    }

    pub fn has_participant(&self, who: &Address) -> bool {
        !who.is_zero() && self.players.iter().any(|p| p == who)
    }

    pub fn has_winner(&self) -> bool {
        !self.winner.is_zero()
    }

    /// Slot index of `who`, if participating.
    pub fn slot_of(&self, who: &Address) -> Option<usize> {
        if who.is_zero() {
            return None;
        }
        self.players.iter().position(|p| p == who)
    }

    pub fn opponent_of(&self, who: &Address) -> Option<&Address> {
        self.slot_of(who).map(|slot| &self.players[1 - slot])
    }
}

/// Registered player record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_address: Address,
    pub player_name: String,
    pub player_mana: u32,
    pub player_health: u32,
    pub in_battle: bool,
}

/// Game token minted for a player at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameToken {
    pub name: String,
    pub id: u64,
    pub attack_strength: u32,
    pub defense_strength: u32,
}

/// A player's move for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveChoice {
    Attack,
    Defend,
}

impl MoveChoice {
    pub const fn code(self) -> u8 {
        match self {
            Self::Attack => 1,
            Self::Defend => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Attack),
            2 => Some(Self::Defend),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defend => "defense",
        }
    }
}

/// State-changing calls accepted by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCall {
    RegisterPlayer { name: String, token_name: String },
    CreateBattle { name: String },
    JoinBattle { name: String },
    QuitBattle { name: String },
    AttackOrDefend { choice: MoveChoice, battle: String },
}

impl ContractCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::RegisterPlayer { .. } => CallKind::RegisterPlayer,
            Self::CreateBattle { .. } => CallKind::CreateBattle,
            Self::JoinBattle { .. } => CallKind::JoinBattle,
            Self::QuitBattle { .. } => CallKind::QuitBattle,
            Self::AttackOrDefend { .. } => CallKind::AttackOrDefend,
        }
    }
}

/// Discriminant of [`ContractCall`], used to look up gas ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum CallKind {
    RegisterPlayer,
    CreateBattle,
    JoinBattle,
    QuitBattle,
    AttackOrDefend,
}

/// What the wallet reports about the local environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletStatus {
    /// Whether an injected wallet provider exists at all.
    pub provider_available: bool,
    /// First authorized account, if any.
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    /// Native balance in base units.
    pub balance: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn address_equality_ignores_case() {
        let lower = Address::new("0xabcdef0000000000000000000000000000000001");
        let upper = Address::new("0xABCDEF0000000000000000000000000000000001");
        assert_eq!(lower, upper);

        let set: HashSet<_> = [lower, upper].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn zero_sentinel_detection() {
        assert!(Address::zero().is_zero());
        assert!(Address::new("0x00").is_zero());
        assert!(Address::new("").is_zero());
        assert!(!Address::new("0x0000000000000000000000000000000000000001").is_zero());
    }

    #[test]
    fn placeholder_has_no_participants() {
        let placeholder = Battle::placeholder();
        assert!(placeholder.is_placeholder());
        assert!(!placeholder.has_participant(&Address::zero()));

        let battle = Battle::pending("arena", Address::new("0x01"));
        assert!(!battle.is_placeholder());
    }

    #[test]
    fn opponent_lookup_is_slot_independent() {
        let a = Address::new("0xaa");
        let b = Address::new("0xbb");
        let mut battle = Battle::pending("arena", a.clone());
        battle.players[1] = b.clone();

        assert_eq!(battle.opponent_of(&a), Some(&b));
        assert_eq!(battle.opponent_of(&Address::new("0xBB")), Some(&a));
        assert_eq!(battle.opponent_of(&Address::new("0xcc")), None);
    }
}

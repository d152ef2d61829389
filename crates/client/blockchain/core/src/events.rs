//! Contract event schema and log decoding.
//!
//! Raw logs arrive as a topic (the event signature) plus a JSON payload of
//! named arguments. The schema below is the static equivalent of the
//! contract ABI: every known signature maps to one [`EventKind`] and one
//! payload type, and [`decode_log`] turns a [`RawLog`] into a typed
//! [`GameEvent`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::IntoEnumIterator;

use crate::types::{Address, TransactionId};

/// Event kinds emitted by the battle contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum EventKind {
    NewPlayer,
    NewBattle,
    NewGameToken,
    BattleMove,
    RoundEnded,
    BattleEnded,
}

impl EventKind {
    /// Canonical signature, used as the log topic.
    pub const fn signature(self) -> &'static str {
        match self {
            Self::NewPlayer => "NewPlayer(address,string)",
            Self::NewBattle => "NewBattle(string,address,address)",
            Self::NewGameToken => "NewGameToken(address,uint256,uint256,uint256)",
            Self::BattleMove => "BattleMove(string,bool)",
            Self::RoundEnded => "RoundEnded(address[2])",
            Self::BattleEnded => "BattleEnded(string,address,address)",
        }
    }

    pub fn from_signature(signature: &str) -> Option<Self> {
        Self::iter().find(|kind| kind.signature() == signature)
    }
}

/// Identity of a log subscription: one contract, one event kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventFilter {
    pub contract: Address,
    pub kind: EventKind,
}

impl EventFilter {
    pub fn new(contract: Address, kind: EventKind) -> Self {
        Self { contract, kind }
    }
}

/// Undecoded log entry as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLog {
    pub contract: Address,
    pub topic: String,
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_id: Option<TransactionId>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub owner: Address,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBattle {
    pub battle_name: String,
    pub player1: Address,
    pub player2: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGameToken {
    pub owner: Address,
    pub id: u64,
    pub attack_strength: u32,
    pub defense_strength: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleMove {
    pub battle_name: String,
    pub is_first_move: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundEnded {
    pub damaged_players: [Address; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleEnded {
    pub battle_name: String,
    pub winner: Address,
    pub loser: Address,
}

/// Typed contract event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    NewPlayer(NewPlayer),
    NewBattle(NewBattle),
    NewGameToken(NewGameToken),
    BattleMove(BattleMove),
    RoundEnded(RoundEnded),
    BattleEnded(BattleEnded),
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::NewPlayer(_) => EventKind::NewPlayer,
            Self::NewBattle(_) => EventKind::NewBattle,
            Self::NewGameToken(_) => EventKind::NewGameToken,
            Self::BattleMove(_) => EventKind::BattleMove,
            Self::RoundEnded(_) => EventKind::RoundEnded,
            Self::BattleEnded(_) => EventKind::BattleEnded,
        }
    }

    /// Encode the payload in the wire format understood by [`decode_log`].
    pub fn to_log(
        &self,
        contract: Address,
        block_number: u64,
        log_index: u64,
        transaction_id: Option<TransactionId>,
    ) -> Result<RawLog, DecodeError> {
        let data = match self {
            Self::NewPlayer(args) => serde_json::to_value(args),
            Self::NewBattle(args) => serde_json::to_value(args),
            Self::NewGameToken(args) => serde_json::to_value(args),
            Self::BattleMove(args) => serde_json::to_value(args),
            Self::RoundEnded(args) => serde_json::to_value(args),
            Self::BattleEnded(args) => serde_json::to_value(args),
        }
        .map_err(|source| DecodeError::Payload {
            kind: self.kind(),
            source,
        })?;

        Ok(RawLog {
            contract,
            topic: self.kind().signature().to_string(),
            block_number,
            log_index,
            transaction_id,
            data,
        })
    }
}

/// Log decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown event topic: {0}")]
    UnknownTopic(String),

    #[error("expected {expected} log, got {actual}")]
    KindMismatch {
        expected: EventKind,
        actual: EventKind,
    },

    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a raw log using the static event schema.
pub fn decode_log(log: &RawLog) -> Result<GameEvent, DecodeError> {
    let kind = EventKind::from_signature(&log.topic)
        .ok_or_else(|| DecodeError::UnknownTopic(log.topic.clone()))?;

    let event = match kind {
        EventKind::NewPlayer => GameEvent::NewPlayer(payload(kind, &log.data)?),
        EventKind::NewBattle => GameEvent::NewBattle(payload(kind, &log.data)?),
        EventKind::NewGameToken => GameEvent::NewGameToken(payload(kind, &log.data)?),
        EventKind::BattleMove => GameEvent::BattleMove(payload(kind, &log.data)?),
        EventKind::RoundEnded => GameEvent::RoundEnded(payload(kind, &log.data)?),
        EventKind::BattleEnded => GameEvent::BattleEnded(payload(kind, &log.data)?),
    };

    Ok(event)
}

/// Decode a log delivered on a subscription for `expected`.
pub fn decode_log_as(expected: EventKind, log: &RawLog) -> Result<GameEvent, DecodeError> {
    let event = decode_log(log)?;
    if event.kind() != expected {
        return Err(DecodeError::KindMismatch {
            expected,
            actual: event.kind(),
        });
    }
    Ok(event)
}

fn payload<T: DeserializeOwned>(kind: EventKind, data: &serde_json::Value) -> Result<T, DecodeError> {
    T::deserialize(data).map_err(|source| DecodeError::Payload { kind, source })
}

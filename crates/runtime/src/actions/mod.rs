//! Outgoing state-changing requests.
//!
//! Actions are validated synchronously by [`prepare`] before anything reaches
//! the ledger. [`ActionSubmitter`] then submits with the configured gas
//! ceiling and describes the result as a [`SubmissionOutcome`]. It never
//! touches [`GameData`](crate::state::GameData); the ledger event that
//! follows an accepted submission drives the refresh.

mod revert;
mod validation;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use client_blockchain_core::{
    ContractCall, Ledger, MoveChoice, TransactionId, TransportError,
};

use crate::alerts::AlertKind;
use crate::config::GasCeilings;

pub use revert::{failure_message, parse_revert_reason};
pub use validation::{NameInput, is_valid_name};

/// A request from the local player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Register { name: String },
    CreateBattle { name: String },
    JoinBattle { name: String },
    QuitBattle,
    Move(MoveChoice),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("names may only contain letters and digits: {0:?}")]
    InvalidName(String),

    #[error("no active battle")]
    NoActiveBattle,

    #[error("wallet is not connected")]
    NotConnected,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Validated action, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedAction {
    /// Registration checks `isPlayer` first and waits for confirmation.
    Register { name: String },
    /// Everything else is fire-and-forget.
    Call {
        call: ContractCall,
        notice: Option<(AlertKind, String)>,
        awaiting_opponent: bool,
    },
}

/// Validate `action` against the current view.
pub fn prepare(
    action: PlayerAction,
    active_battle: Option<&str>,
) -> Result<PreparedAction, ActionError> {
    let battle_name = || {
        active_battle
            .map(str::to_string)
            .ok_or(ActionError::NoActiveBattle)
    };

    let prepared = match action {
        PlayerAction::Register { name } => {
            if !is_valid_name(&name) {
                return Err(ActionError::InvalidName(name));
            }
            PreparedAction::Register { name }
        }
        PlayerAction::CreateBattle { name } => {
            if !is_valid_name(&name) {
                return Err(ActionError::InvalidName(name));
            }
            PreparedAction::Call {
                notice: Some((
                    AlertKind::Info,
                    format!("Battle {name} created, waiting for an opponent"),
                )),
                call: ContractCall::CreateBattle { name },
                awaiting_opponent: true,
            }
        }
        PlayerAction::JoinBattle { name } => {
            if name.trim().is_empty() {
                return Err(ActionError::InvalidName(name));
            }
            PreparedAction::Call {
                notice: Some((AlertKind::Success, format!("Joining {name}"))),
                call: ContractCall::JoinBattle { name },
                awaiting_opponent: false,
            }
        }
        PlayerAction::QuitBattle => {
            let name = battle_name()?;
            PreparedAction::Call {
                notice: Some((AlertKind::Success, format!("You're quitting the {name}"))),
                call: ContractCall::QuitBattle { name },
                awaiting_opponent: false,
            }
        }
        PlayerAction::Move(choice) => PreparedAction::Call {
            notice: Some((AlertKind::Info, format!("Initiating {}", choice.label()))),
            call: ContractCall::AttackOrDefend {
                choice,
                battle: battle_name()?,
            },
            awaiting_opponent: false,
        },
    };
    Ok(prepared)
}

/// What a finished submission means for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub alert: Option<(AlertKind, String)>,
    /// The account turned out to be registered already.
    pub registered: bool,
    pub awaiting_opponent: bool,
    pub result: Result<Option<TransactionId>, ActionError>,
}

impl SubmissionOutcome {
    fn failed(error: TransportError) -> Self {
        let message = failure_message(&error);
        warn!(%error, %message, "submission rejected");
        Self {
            alert: Some((AlertKind::Failure, message)),
            registered: false,
            awaiting_opponent: false,
            result: Err(ActionError::Transport(error)),
        }
    }
}

/// Submits prepared actions through the connected ledger handle.
#[derive(Clone)]
pub struct ActionSubmitter {
    ledger: Arc<dyn Ledger>,
    gas: GasCeilings,
}

impl ActionSubmitter {
    pub fn new(ledger: Arc<dyn Ledger>, gas: GasCeilings) -> Self {
        Self { ledger, gas }
    }

    pub async fn submit(&self, action: PreparedAction) -> SubmissionOutcome {
        match action {
            PreparedAction::Register { name } => self.register(name).await,
            PreparedAction::Call {
                call,
                notice,
                awaiting_opponent,
            } => {
                let gas_limit = self.gas.for_call(call.kind());
                debug!(call = %call.kind(), gas_limit, "submitting");
                match self.ledger.submit(call, gas_limit).await {
                    Ok(tx_id) => SubmissionOutcome {
                        alert: notice,
                        registered: false,
                        awaiting_opponent,
                        result: Ok(Some(tx_id)),
                    },
                    Err(error) => SubmissionOutcome::failed(error),
                }
            }
        }
    }

    async fn register(&self, name: String) -> SubmissionOutcome {
        let signer = self.ledger.signer().clone();
        match self.ledger.is_player(&signer).await {
            Ok(true) => {
                info!(account = %signer.short(), "account already registered");
                return SubmissionOutcome {
                    alert: None,
                    registered: true,
                    awaiting_opponent: false,
                    result: Ok(None),
                };
            }
            Ok(false) => {}
            Err(error) => return SubmissionOutcome::failed(error),
        }

        let call = ContractCall::RegisterPlayer {
            name: name.clone(),
            token_name: name.clone(),
        };
        let gas_limit = self.gas.for_call(call.kind());

        let confirmed = async {
            let tx_id = self.ledger.submit(call, gas_limit).await?;
            let receipt = self.ledger.wait_for_confirmation(&tx_id).await?;
            debug!(block = receipt.block_number, gas_used = receipt.gas_used, "registration mined");
            Ok::<_, TransportError>(tx_id)
        }
        .await;

        match confirmed {
            Ok(tx_id) => SubmissionOutcome {
                alert: Some((AlertKind::Info, format!("{name} is being summoned!"))),
                registered: false,
                awaiting_opponent: false,
                result: Ok(Some(tx_id)),
            },
            Err(error) => SubmissionOutcome::failed(error),
        }
    }
}

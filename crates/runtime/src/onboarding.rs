//! Wallet readiness probe.
//!
//! The client is usable only once a provider exists, an account is
//! authorized, the wallet sits on the required chain and holds enough native
//! balance to pay for gas. [`ConnectionStep`] names the first unmet
//! requirement.

use serde::{Deserialize, Serialize};

use client_blockchain_core::WalletStatus;

use crate::config::NetworkRequirements;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStep {
    NeedsProvider,
    NeedsAccount,
    NeedsNetwork,
    NeedsBalance,
    Ready,
}

impl ConnectionStep {
    /// Evaluate requirements in order and stop at the first one that fails.
    pub fn evaluate(status: &WalletStatus, requirements: &NetworkRequirements) -> Self {
        if !status.provider_available {
            return Self::NeedsProvider;
        }
        if status.account.as_ref().is_none_or(|account| account.is_zero()) {
            return Self::NeedsAccount;
        }
        if status.chain_id != Some(requirements.chain_id) {
            return Self::NeedsNetwork;
        }
        if status.balance < requirements.min_balance {
            return Self::NeedsBalance;
        }
        Self::Ready
    }

    /// Numeric step as shown by the onboarding screen; `-1` means ready.
    pub const fn code(self) -> i8 {
        match self {
            Self::NeedsProvider => 0,
            Self::NeedsAccount => 1,
            Self::NeedsNetwork => 2,
            Self::NeedsBalance => 3,
            Self::Ready => -1,
        }
    }

    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn instructions(self) -> &'static str {
        match self {
            Self::NeedsProvider => "Install a browser wallet to play",
            Self::NeedsAccount => "Connect an account to your wallet",
            Self::NeedsNetwork => "Switch your wallet to the Fuji C-Chain",
            Self::NeedsBalance => "Fund your account with at least 0.2 AVAX",
            Self::Ready => "Ready to play",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::Address;

    fn ready_status() -> WalletStatus {
        WalletStatus {
            provider_available: true,
            account: Some(Address::new("0x01")),
            chain_id: Some(43_113),
            balance: 10u128.pow(18),
        }
    }

    #[test]
    fn ready_when_every_requirement_holds() {
        let step = ConnectionStep::evaluate(&ready_status(), &NetworkRequirements::default());
        assert_eq!(step, ConnectionStep::Ready);
        assert_eq!(step.code(), -1);
    }

    #[test]
    fn reports_first_unmet_requirement() {
        let requirements = NetworkRequirements::default();

        let mut status = ready_status();
        status.balance = 0;
        status.chain_id = Some(1);
        assert_eq!(
            ConnectionStep::evaluate(&status, &requirements),
            ConnectionStep::NeedsNetwork
        );

        status.account = None;
        assert_eq!(ConnectionStep::evaluate(&status, &requirements).code(), 1);

        status.provider_available = false;
        assert_eq!(ConnectionStep::evaluate(&status, &requirements).code(), 0);
    }

    #[test]
    fn balance_threshold_is_inclusive() {
        let requirements = NetworkRequirements::default();
        let mut status = ready_status();

        status.balance = requirements.min_balance - 1;
        assert_eq!(
            ConnectionStep::evaluate(&status, &requirements),
            ConnectionStep::NeedsBalance
        );

        status.balance = requirements.min_balance;
        assert!(ConnectionStep::evaluate(&status, &requirements).is_ready());
    }
}

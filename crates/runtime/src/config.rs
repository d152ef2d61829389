//! Runtime tuning knobs and their environment overrides.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use client_blockchain_core::CallKind;

/// Gas ceiling attached to every submission kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasCeilings {
    pub register: u64,
    pub create_battle: u64,
    pub join_battle: u64,
    pub quit_battle: u64,
    pub moves: u64,
}

impl GasCeilings {
    pub fn for_call(&self, kind: CallKind) -> u64 {
        match kind {
            CallKind::RegisterPlayer => self.register,
            CallKind::CreateBattle => self.create_battle,
            CallKind::JoinBattle => self.join_battle,
            CallKind::QuitBattle => self.quit_battle,
            CallKind::AttackOrDefend => self.moves,
        }
    }
}

impl Default for GasCeilings {
    fn default() -> Self {
        Self {
            register: 500_000,
            create_battle: 300_000,
            join_battle: 300_000,
            quit_battle: 200_000,
            moves: 200_000,
        }
    }
}

/// Delays driving transient UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// How long a notification stays visible.
    pub alert_duration: Duration,
    /// Delay between a battle ending and leaving the battle screen.
    pub battle_end_redirect: Duration,
    /// Delay between picking a battleground and returning to the previous screen.
    pub battleground_back: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            alert_duration: Duration::from_millis(5_000),
            battle_end_redirect: Duration::from_millis(5_000),
            battleground_back: Duration::from_millis(1_000),
        }
    }
}

/// Wallet environment required before the client is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkRequirements {
    pub chain_id: u64,
    /// Minimum native balance in wei.
    pub min_balance: u128,
}

impl Default for NetworkRequirements {
    fn default() -> Self {
        Self {
            // Avalanche Fuji testnet
            chain_id: 43_113,
            min_balance: 200_000_000_000_000_000,
        }
    }
}

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    pub timing: TimingConfig,
    pub gas: GasCeilings,
    pub network: NetworkRequirements,
    /// Where settings are persisted. `None` uses the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 100,
            command_buffer_size: 32,
            timing: TimingConfig::default(),
            gas: GasCeilings::default(),
            network: NetworkRequirements::default(),
            data_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by environment variables.
    ///
    /// Unparseable values fall back to the default silently.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timing = TimingConfig {
            alert_duration: read_env_millis("ALERT_DURATION_MS")
                .unwrap_or(defaults.timing.alert_duration),
            battle_end_redirect: read_env_millis("BATTLE_END_REDIRECT_MS")
                .unwrap_or(defaults.timing.battle_end_redirect),
            battleground_back: read_env_millis("BATTLEGROUND_BACK_MS")
                .unwrap_or(defaults.timing.battleground_back),
        };

        let gas = GasCeilings {
            register: read_env("GAS_REGISTER").unwrap_or(defaults.gas.register),
            create_battle: read_env("GAS_CREATE_BATTLE").unwrap_or(defaults.gas.create_battle),
            join_battle: read_env("GAS_JOIN_BATTLE").unwrap_or(defaults.gas.join_battle),
            quit_battle: read_env("GAS_QUIT_BATTLE").unwrap_or(defaults.gas.quit_battle),
            moves: read_env("GAS_MOVE").unwrap_or(defaults.gas.moves),
        };

        let network = NetworkRequirements {
            chain_id: read_env("REQUIRED_CHAIN_ID").unwrap_or(defaults.network.chain_id),
            min_balance: read_env("MIN_BALANCE").unwrap_or(defaults.network.min_balance),
        };

        Self {
            event_buffer_size: read_env("RUNTIME_EVENT_BUFFER")
                .unwrap_or(defaults.event_buffer_size),
            command_buffer_size: read_env("RUNTIME_COMMAND_BUFFER")
                .unwrap_or(defaults.command_buffer_size),
            timing,
            gas,
            network,
            data_dir: std::env::var("BATTLE_DATA_DIR").ok().map(PathBuf::from),
        }
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

fn read_env_millis(key: &str) -> Option<Duration> {
    read_env::<u64>(key).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_ceilings_cover_every_call() {
        let gas = GasCeilings::default();
        assert_eq!(gas.for_call(CallKind::RegisterPlayer), 500_000);
        assert_eq!(gas.for_call(CallKind::AttackOrDefend), 200_000);
        assert_eq!(gas.for_call(CallKind::QuitBattle), 200_000);
    }

    #[test]
    fn default_network_is_fuji() {
        let network = NetworkRequirements::default();
        assert_eq!(network.chain_id, 43_113);
        assert_eq!(network.min_balance, 2 * 10u128.pow(17));
    }
}

//! Frontend configuration structures and loaders.
//!
//! This module contains UI-specific configuration that is shared across
//! different frontend implementations (CLI, GUI, etc.).

use std::env;

/// Frontend-specific configuration.
#[derive(Clone, Debug, Default)]
pub struct FrontendConfig {
    pub messages: MessageConfig,
}

impl FrontendConfig {
    pub const fn new(messages: MessageConfig) -> Self {
        Self { messages }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `CLI_MESSAGE_CAPACITY` - Message log capacity (default: 64)
    /// - `CLI_MESSAGE_LIMIT` - Messages shown by `status` (default: 5)
    /// - `SHOW_HIT_MESSAGES` - Log a line for every hit cue (default: true)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(capacity) = read_env::<usize>("CLI_MESSAGE_CAPACITY") {
            config.messages.capacity = capacity.max(1);
        }
        if let Some(limit) = read_env::<usize>("CLI_MESSAGE_LIMIT") {
            config.messages.display_limit = limit;
        }
        if let Some(show) = read_env_bool("SHOW_HIT_MESSAGES") {
            config.messages.show_hits = show;
        }

        config
    }
}

#[derive(Clone, Debug)]
pub struct MessageConfig {
    pub capacity: usize,
    pub display_limit: usize,
    /// Hit cues are also visible in the vitals, so they can be muted.
    pub show_hits: bool,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            display_limit: 5,
            show_hits: true,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

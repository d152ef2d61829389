//! CLI-specific configuration for the terminal prompt.
use std::env;

/// CLI terminal configuration.
///
/// This contains settings specific to the terminal interface,
/// separate from cross-frontend client configuration.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub prompt: String,
    /// Print route changes as they happen.
    pub announce_routes: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            announce_routes: true,
        }
    }
}

impl CliConfig {
    /// Construct CLI configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CLI_PROMPT` - Prompt printed before each command (default: "> ")
    /// - `CLI_ANNOUNCE_ROUTES` - Print screen changes (default: true)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(prompt) = env::var("CLI_PROMPT") {
            config.prompt = prompt;
        }
        if let Some(announce) = read_env::<bool>("CLI_ANNOUNCE_ROUTES") {
            config.announce_routes = announce;
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

//! Cross-frontend primitives for presenting the battle client.
//!
//! Houses the message log, configuration, and view-model types that both the
//! line-oriented CLI and future graphical clients can reuse.
pub mod config;
pub mod frontend;
pub mod message;
pub mod view_model;

pub use config::{FrontendConfig, MessageConfig};
pub use frontend::Frontend;
pub use message::{MessageEntry, MessageLevel, MessageLog};
pub use view_model::{BattleSummary, EventImpact, ViewModel};

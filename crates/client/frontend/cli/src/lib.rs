//! Line-oriented terminal frontend for the card battle client.
//!
//! It implements the `client_frontend_core::Frontend` trait.
//!
//! # Architecture
//!
//! CliFrontend is a pure UI layer that:
//! - Receives a RuntimeHandle for communication
//! - Does NOT own the Runtime
//! - Subscribes to events and submits actions via the handle

mod app;
mod commands;
mod config;
pub mod logging;
mod render;

pub use app::CliFrontend;
pub use config::CliConfig;

// Re-export for convenience (used in main.rs)
pub use client_frontend_core::FrontendConfig;

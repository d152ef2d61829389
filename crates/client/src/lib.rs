//! Top-level client orchestrating the Runtime and Frontend layers.
//!
//! # Architecture
//!
//! ```text
//! Client (Top-level container)
//!   ├─→ Runtime (ledger sync, navigation, notifications)
//!   └─→ Frontend (UI layer - CLI, GUI, etc.)
//! ```
//!
//! The runtime talks to the ledger through the wallet it was built with;
//! the frontend only ever sees a RuntimeHandle.

mod builder;

pub use builder::ClientBuilder;

// Re-export Frontend trait from client-frontend-core
pub use client_frontend_core::Frontend;

use anyhow::{Context, Result};

/// Top-level client container.
///
/// # Lifecycle
///
/// 1. Client::builder() receives an already running runtime and a frontend
/// 2. Client::run() transfers control to the frontend (blocking)
/// 3. On frontend exit, the runtime shuts down and removes its listeners
pub struct Client {
    runtime: runtime::Runtime,
    frontend: Box<dyn Frontend>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Run the frontend until the user quits, then stop the runtime.
    ///
    /// A frontend error is reported in preference to a shutdown error.
    pub async fn run(self) -> Result<()> {
        let handle = self.runtime.handle();

        let mut frontend = self.frontend;
        let frontend_result = frontend.run(handle).await;

        let shutdown_result = self
            .runtime
            .shutdown()
            .await
            .context("shutting down runtime");

        frontend_result.and(shutdown_result)
    }
}

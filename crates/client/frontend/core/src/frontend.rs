//! Trait describing a runnable client front-end.
use anyhow::Result;
use async_trait::async_trait;
use runtime::RuntimeHandle;

/// Frontend abstraction for UI layers.
///
/// Frontends communicate with the sync core via RuntimeHandle:
/// - Subscribe to events (GameData, Alert, Navigation, Cue, Session)
/// - Submit player actions
/// - Query snapshots
///
/// Frontends do NOT own the Runtime - they receive a handle for communication only.
///
/// # Example Implementation
///
/// ```no_run
/// use async_trait::async_trait;
/// use client_frontend_core::Frontend;
/// use runtime::RuntimeHandle;
/// use anyhow::Result;
///
/// struct MyFrontend;
///
/// #[async_trait]
/// impl Frontend for MyFrontend {
///     async fn run(&mut self, handle: RuntimeHandle) -> Result<()> {
///         let mut alerts = handle.subscribe(runtime::Topic::Alert);
///
///         while let Ok(event) = alerts.recv().await {
///             // Render the notification
///         }
///
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Frontend: Send {
    /// Run the frontend event loop.
    ///
    /// It should block until the user quits the application.
    ///
    /// # Errors
    ///
    /// Returns an error if the frontend encounters a fatal error.
    async fn run(&mut self, handle: RuntimeHandle) -> Result<()>;
}

//! Navigation Abstraction
//!
//! The authorization-code flow ends with the user agent leaving for the
//! authorization server. How that happens is host business: a web host
//! assigns the window location, a desktop host opens the system browser.

use async_trait::async_trait;

use crate::error::Result;

/// Redirect mechanism trait
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Send the user agent to `url`
    ///
    /// On web hosts this ends the current execution context; callers must
    /// not rely on code after the call running.
    async fn navigate(&self, url: &str) -> Result<()>;
}

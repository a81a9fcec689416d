//! The one-shot model invocation seam.
//!
//! Stages and the chat layer only ever need a single operation: send a user
//! message with a system prompt and get text back. Backends live in the CLI.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Model: Send + Sync {
    /// Send `user` with `system` as the system prompt, return the reply text.
    /// No retry, no streaming.
    async fn invoke(&self, user: &str, system: &str) -> Result<String>;
}

#[async_trait]
impl<M: Model + ?Sized> Model for Arc<M> {
    async fn invoke(&self, user: &str, system: &str) -> Result<String> {
        (**self).invoke(user, system).await
    }
}

pub mod gemini;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;

pub use gemini::GeminiClient;
pub use local::{LocalMatch, LocalMatcher};

/// A remote conversational service that answers one message at a time.
/// Implementations keep their own conversation state between calls.
#[async_trait]
pub trait RemoteProvider: Send {
    fn name(&self) -> &str;

    /// Sends one user message. An empty string means the service answered with no text.
    async fn send_message(&mut self, message: &str) -> Result<String>;

    /// Forgets the conversation so far. The session itself stays open.
    fn reset(&mut self) {}
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Ways a single chat turn can fall short of an answer.
/// None of these reach the user; the agent logs them and moves to the next stage.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No credential, or the session could not be created. Permanent for the agent.
    #[error("remote provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Network, auth, quota or decoding failure for one call.
    #[error("remote provider call failed: {0}")]
    ProviderCallFailed(#[from] anyhow::Error),

    #[error("no knowledge base entry matched the query")]
    NoLocalMatch,
}

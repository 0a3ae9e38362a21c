use crate::types::ChatMessage;
use async_trait::async_trait;

// ============================================
// Error Types
// ============================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("no assistant endpoint configured; set ASSISTANT_ENDPOINT")]
    NotConfigured,

    #[error("assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("assistant endpoint error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("assistant response has no reply content")]
    MissingReply,

    #[error("failed to encode assistant payload: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;

/// A remote assistant that turns a message list into one reply.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> ChatResult<String>;
}

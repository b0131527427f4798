//! Model types - messages, requests, outcomes, and error taxonomy

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One turn of conversation context, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// An image attached to the request prompt, carried as base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: String,
}

impl ImageAttachment {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes into an attachment.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64.encode(bytes),
        }
    }

    /// Data URI form used by OpenAI-style message parts.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One completion request: prompt, prior turns, optional images, and a
/// cancellation handle for abandoning an in-flight stream.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub prompt: String,
    pub history: Vec<ChatMessage>,
    pub images: Vec<ImageAttachment>,
    pub cancel: CancellationToken,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
            images: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_images(mut self, images: Vec<ImageAttachment>) -> Self {
        self.images = images;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// What the winning attempt produced.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    /// Provider id of the winning candidate
    pub provider: String,
    /// Model name of the winning candidate
    pub model: String,
    /// Full accumulated response text
    pub text: String,
    /// Number of non-empty fragments relayed to the sink
    pub tokens: u64,
    /// Wall time of the winning attempt
    pub elapsed: Duration,
}

/// Receives streamed fragments as they arrive.
///
/// `token` is called strictly in arrival order, before the next chunk is
/// awaited, so implementations must not block. `candidate_selected` fires
/// once per request, on the first non-empty fragment of the winning attempt.
pub trait TokenSink: Send {
    fn token(&mut self, fragment: &str);

    fn candidate_selected(&mut self, _label: &str) {}
}

impl<F> TokenSink for F
where
    F: FnMut(&str) + Send,
{
    fn token(&mut self, fragment: &str) {
        self(fragment);
    }
}

/// Errors that cross the client boundary.
///
/// Per-candidate failures never appear here individually; they are absorbed
/// by the failover loop and logged.
#[derive(Debug, Clone, Error)]
pub enum FailoverError {
    #[error("no providers with credentials are configured")]
    NoCandidates,

    #[error("all {attempts} providers were unreachable")]
    AllProvidersFailed { attempts: usize },

    #[error("stream from '{provider}' was interrupted after {tokens} fragments")]
    StreamInterrupted { provider: String, tokens: u64 },

    #[error("request was cancelled")]
    Cancelled,
}

/// Failure of a single attempt against one candidate.
///
/// Every variant except `Cancelled` triggers failover to the next candidate
/// rather than propagating to the caller.
#[derive(Debug, Clone, Error)]
pub enum AttemptError {
    #[error("endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("stream ended without content")]
    EmptyStream,

    #[error("malformed stream chunk: {reason}")]
    MalformedChunk { reason: String },

    #[error("no response within {0:?}")]
    TimedOut(Duration),

    #[error("attempt cancelled")]
    Cancelled,
}

impl AttemptError {
    pub fn http_status(status: u16) -> Self {
        Self::HttpStatus { status }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedChunk {
            reason: reason.into(),
        }
    }
}

//! Streaming completion client: candidate construction, per-attempt
//! invocation, and the failover loop.

pub mod adapter;
pub mod candidates;
pub mod failover;
mod invoker;
pub mod routing;
pub mod transport;
pub mod types;

pub use candidates::{Candidate, ProviderEntry, RequestSignals, build_candidates, resolve_api_key};
pub use failover::{ClientOptions, FailoverClient};
pub use routing::{KeywordClassifier, PromptClassifier};
pub use transport::{FragmentStream, HttpSseTransport, StreamTransport};
pub use types::{
    AttemptError, ChatMessage, ChatRequest, FailoverError, ImageAttachment, MessageRole,
    StreamOutcome, TokenSink,
};

//! Failover loop driving candidates through the streaming invoker.

use super::candidates::{self, Candidate, ProviderEntry, RequestSignals, build_candidates};
use super::invoker::run_attempt;
use super::routing::{KeywordClassifier, PromptClassifier};
use super::transport::{HttpSseTransport, StreamTransport};
use super::types::{AttemptError, ChatMessage, ChatRequest, FailoverError, MessageRole,
    StreamOutcome, TokenSink};
use crate::config::{AppConfig, ProviderConfig};
use crate::constants::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_TEMPERATURE};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Deployment-fixed knobs; none of these vary per request.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub temperature: f32,
    pub attempt_timeout: Duration,
    pub system_prompt: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            system_prompt: None,
        }
    }
}

/// Streaming completion client with sequential provider failover.
///
/// An explicit value, not a process-wide singleton: configuration is
/// injected at construction and the client holds only read-only state, so
/// independent requests may run concurrently on one client.
pub struct FailoverClient {
    providers: Vec<ProviderEntry>,
    transport: Arc<dyn StreamTransport>,
    classifier: Arc<dyn PromptClassifier>,
    options: ClientOptions,
}

impl FailoverClient {
    /// Build a client from provider configs, resolving credentials once.
    pub fn from_configs(configs: Vec<ProviderConfig>) -> Self {
        let providers = configs.into_iter().map(ProviderEntry::from_config).collect();
        Self {
            providers,
            transport: Arc::new(HttpSseTransport::new()),
            classifier: Arc::new(KeywordClassifier),
            options: ClientOptions::default(),
        }
    }

    /// Build a client from a loaded application config.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::from_configs(config.providers.clone()).with_options(ClientOptions {
            temperature: config.temperature,
            attempt_timeout: config.attempt_timeout,
            system_prompt: config.system_prompt.clone(),
        })
    }

    /// Replace the transport (test harnesses, recording proxies).
    pub fn with_transport(mut self, transport: Arc<dyn StreamTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the math-heavy prompt classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn PromptClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// The candidate list this client would attempt for a request.
    pub fn candidates_for(&self, request: &ChatRequest) -> Vec<Candidate> {
        build_candidates(&self.providers, &self.signals(request))
    }

    fn signals(&self, request: &ChatRequest) -> RequestSignals {
        RequestSignals {
            has_images: !request.images.is_empty(),
            math_heavy: self.classifier.is_math_heavy(&request.prompt),
        }
    }

    /// Stream a completion, failing over across candidates until one
    /// produces non-empty output.
    ///
    /// Candidates are attempted strictly sequentially; a candidate is never
    /// retried within one request and there is no backoff between attempts.
    /// Per-candidate failures are absorbed and logged; only configuration
    /// errors, cancellation, and total exhaustion are returned.
    pub async fn stream_response(
        &self,
        request: &ChatRequest,
        sink: &mut dyn TokenSink,
    ) -> Result<StreamOutcome, FailoverError> {
        let candidates = self.candidates_for(request);
        if candidates.is_empty() {
            return Err(FailoverError::NoCandidates);
        }

        let request_id = Uuid::new_v4();
        let messages = self.assemble_messages(request);
        let mut attempts = 0usize;

        for candidate in &candidates {
            if request.cancel.is_cancelled() {
                return Err(FailoverError::Cancelled);
            }
            attempts += 1;
            info!(
                request_id = %request_id,
                provider = candidate.provider.as_str(),
                model = candidate.model.as_str(),
                protocol = candidate.protocol.as_str(),
                attempt = attempts,
                "trying candidate"
            );

            let body = super::adapter::build_request_body(
                candidate,
                &messages,
                &request.images,
                self.options.temperature,
            );

            match run_attempt(
                self.transport.as_ref(),
                candidate,
                body,
                self.options.attempt_timeout,
                &request.cancel,
                sink,
            )
            .await
            {
                Ok(outcome) => {
                    info!(
                        request_id = %request_id,
                        provider = outcome.provider.as_str(),
                        model = outcome.model.as_str(),
                        tokens = outcome.tokens,
                        elapsed_ms = outcome.elapsed.as_millis() as u64,
                        "stream completed"
                    );
                    return Ok(outcome);
                }
                Err(failure) => {
                    if matches!(failure.error, AttemptError::Cancelled) {
                        return Err(FailoverError::Cancelled);
                    }
                    // Once output has reached the sink the candidate is
                    // committed; a later provider cannot replace what the
                    // caller already saw.
                    if failure.tokens_delivered > 0 {
                        warn!(
                            request_id = %request_id,
                            candidate = candidate.label().as_str(),
                            tokens = failure.tokens_delivered,
                            err = %failure.error,
                            "stream interrupted after partial output"
                        );
                        return Err(FailoverError::StreamInterrupted {
                            provider: candidate.label(),
                            tokens: failure.tokens_delivered,
                        });
                    }
                    warn!(
                        request_id = %request_id,
                        candidate = candidate.label().as_str(),
                        kind = candidates::failure_kind(&failure.error),
                        err = %failure.error,
                        "candidate failed, trying next"
                    );
                }
            }
        }

        Err(FailoverError::AllProvidersFailed { attempts })
    }

    /// History plus the prompt, with the configured system prompt prepended
    /// when the caller's history does not already start with one.
    fn assemble_messages(&self, request: &ChatRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);

        let has_system = request
            .history
            .first()
            .is_some_and(|m| m.role == MessageRole::System);
        if !has_system {
            if let Some(system) = &self.options.system_prompt {
                messages.push(ChatMessage::system(system.clone()));
            }
        }

        messages.extend(request.history.iter().cloned());
        messages.push(ChatMessage::user(request.prompt.clone()));
        messages
    }
}

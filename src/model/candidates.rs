//! Candidate list construction.
//!
//! Turns static provider configuration plus per-request signals into the
//! ordered attempt list consumed by the failover loop. Providers that
//! require a credential but have none resolved are excluded entirely.

use super::types::AttemptError;
use crate::config::{ProviderConfig, WireProtocol};
use std::env;
use tracing::warn;

/// Resolve an API key from the environment variable named in the config.
pub fn resolve_api_key(provider: &str, spec: Option<&str>) -> Option<String> {
    let raw = spec.map(str::trim).filter(|s| !s.is_empty())?;
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// A provider config with its credential resolved once at client build time.
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub config: ProviderConfig,
    pub api_key: Option<String>,
}

impl ProviderEntry {
    /// Resolve the credential for a provider from the environment.
    pub fn from_config(config: ProviderConfig) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self { config, api_key }
    }

    fn usable(&self) -> bool {
        self.api_key.is_some() || !self.config.requires_credential
    }
}

/// One (provider, model) pair eligible to serve a request.
///
/// Immutable once built; a fresh list is constructed per request.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub provider: String,
    pub protocol: WireProtocol,
    pub model: String,
    pub endpoint: String,
    pub api_path: Option<String>,
    pub api_key: Option<String>,
    pub priority: u32,
    pub vision: bool,
    pub reasoning: bool,
}

impl Candidate {
    /// Stable label surfaced to sinks and logs: `provider/model`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}

/// Per-request signals that reorder the candidate list.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSignals {
    pub has_images: bool,
    pub math_heavy: bool,
}

/// Build the priority-ordered candidate list.
///
/// Providers expand to one candidate per model in declaration order, sorted
/// ascending by priority with ties kept in declaration order. When the
/// request carries images, vision-capable candidates move to the front;
/// otherwise a math-heavy prompt moves reasoning-capable candidates to the
/// front. Image handling is a hard capability gate, so the vision boost
/// wins when both signals are present.
pub fn build_candidates(entries: &[ProviderEntry], signals: &RequestSignals) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();

    for entry in entries {
        if !entry.usable() {
            warn!(
                provider = entry.config.id.as_str(),
                "skipping provider without a resolved credential"
            );
            continue;
        }
        for model in &entry.config.models {
            candidates.push(Candidate {
                provider: entry.config.id.clone(),
                protocol: entry.config.protocol,
                model: model.name.clone(),
                endpoint: entry.config.endpoint.clone(),
                api_path: entry.config.api_path.clone(),
                api_key: entry.api_key.clone(),
                priority: entry.config.priority,
                vision: model.vision,
                reasoning: model.reasoning,
            });
        }
    }

    let boosted: fn(&Candidate) -> bool = if signals.has_images {
        |c| c.vision
    } else if signals.math_heavy {
        |c| c.reasoning
    } else {
        |_| false
    };

    // Stable sort: boosted candidates first, then declared priority, with
    // declaration order breaking ties.
    candidates.sort_by_key(|c| (!boosted(c), c.priority));
    candidates
}

/// Classify an attempt failure for diagnostics.
pub fn failure_kind(error: &AttemptError) -> &'static str {
    match error {
        AttemptError::HttpStatus { .. } => "http_status",
        AttemptError::Transport { .. } => "transport",
        AttemptError::EmptyStream => "empty_stream",
        AttemptError::MalformedChunk { .. } => "malformed_chunk",
        AttemptError::TimedOut(_) => "timeout",
        AttemptError::Cancelled => "cancelled",
    }
}

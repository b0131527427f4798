//! Single-attempt execution.
//!
//! Runs exactly one streaming attempt against one candidate: opens the
//! transport, relays fragments to the sink in arrival order, and accounts
//! for the session. Every wait is bounded by the per-attempt timeout and
//! the request's cancellation token.

use super::candidates::Candidate;
use super::transport::StreamTransport;
use super::types::{AttemptError, StreamOutcome, TokenSink};
use futures::StreamExt;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Transient per-attempt accounting. Created at the start of an attempt,
/// discarded on completion or failure; never shared across candidates.
struct StreamSession {
    provider: String,
    model: String,
    label: String,
    started_at: Instant,
    tokens_received: u64,
    accumulated: String,
}

impl StreamSession {
    fn begin(candidate: &Candidate) -> Self {
        Self {
            provider: candidate.provider.clone(),
            model: candidate.model.clone(),
            label: candidate.label(),
            started_at: Instant::now(),
            tokens_received: 0,
            accumulated: String::new(),
        }
    }

    fn record(&mut self, fragment: &str) {
        self.tokens_received += 1;
        self.accumulated.push_str(fragment);
    }

    fn finish(self) -> StreamOutcome {
        StreamOutcome {
            provider: self.provider,
            model: self.model,
            text: self.accumulated,
            tokens: self.tokens_received,
            elapsed: self.started_at.elapsed(),
        }
    }

    fn fail(&self, error: AttemptError) -> AttemptFailure {
        AttemptFailure {
            error,
            tokens_delivered: self.tokens_received,
        }
    }
}

/// How one attempt failed, and whether the sink had already seen output
/// from it when it did.
pub(super) struct AttemptFailure {
    pub error: AttemptError,
    pub tokens_delivered: u64,
}

/// Execute one attempt. Success requires at least one non-empty fragment
/// and normal stream termination; an HTTP 200 with no usable content is an
/// `EmptyStream` failure.
pub(super) async fn run_attempt(
    transport: &dyn StreamTransport,
    candidate: &Candidate,
    body: Value,
    attempt_timeout: Duration,
    cancel: &CancellationToken,
    sink: &mut dyn TokenSink,
) -> Result<StreamOutcome, AttemptFailure> {
    let mut session = StreamSession::begin(candidate);

    let mut fragments = bounded(transport.open(candidate, body), attempt_timeout, cancel)
        .await
        .map_err(|err| session.fail(err))?
        .map_err(|err| session.fail(err))?;

    loop {
        let next = bounded(fragments.next(), attempt_timeout, cancel)
            .await
            .map_err(|err| session.fail(err))?;

        match next {
            Some(Ok(fragment)) => {
                if fragment.is_empty() {
                    continue;
                }
                if session.tokens_received == 0 {
                    debug!(candidate = session.label.as_str(), "first fragment received");
                    sink.candidate_selected(&session.label);
                }
                sink.token(&fragment);
                session.record(&fragment);
            }
            Some(Err(err)) => return Err(session.fail(err)),
            None => break,
        }
    }

    if session.tokens_received == 0 {
        return Err(session.fail(AttemptError::EmptyStream));
    }
    Ok(session.finish())
}

/// Await a future under the attempt timeout, aborting early on cancellation.
async fn bounded<F: Future>(
    future: F,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<F::Output, AttemptError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AttemptError::Cancelled),
        output = tokio::time::timeout(limit, future) => {
            output.map_err(|_| AttemptError::TimedOut(limit))
        }
    }
}

//! Streaming transport abstraction and the HTTP/SSE implementation.
//!
//! The failover loop only sees `StreamTransport`, so tests drive it with
//! scripted in-memory transports while production uses reqwest with
//! server-sent events.

use super::adapter::{self, ChunkPayload};
use super::candidates::Candidate;
use super::types::AttemptError;
use crate::config::WireProtocol;
use async_stream::stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest_eventsource::{Event, EventSource};
use serde_json::Value;
use std::pin::Pin;
use tracing::trace;

/// Decoded text fragments from one attempt, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, AttemptError>> + Send>>;

/// Opens one streaming completion attempt against one candidate.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, candidate: &Candidate, body: Value) -> Result<FragmentStream, AttemptError>;
}

/// Production transport: POST + SSE via reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpSseTransport {
    http: reqwest::Client,
}

impl HttpSseTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StreamTransport for HttpSseTransport {
    async fn open(&self, candidate: &Candidate, body: Value) -> Result<FragmentStream, AttemptError> {
        let url = adapter::endpoint_url(candidate);
        let mut request = self.http.post(&url).json(&body);

        match candidate.protocol {
            WireProtocol::OpenAi => {
                if let Some(key) = &candidate.api_key {
                    request = request.bearer_auth(key);
                }
            }
            WireProtocol::Gemini => {
                request = request.query(&[("alt", "sse")]);
                if let Some(key) = &candidate.api_key {
                    request = request.query(&[("key", key.as_str())]);
                }
            }
        }

        let source = EventSource::new(request)
            .map_err(|err| AttemptError::transport(err.to_string()))?;

        Ok(fragment_stream(source, candidate.protocol))
    }
}

/// Adapt an event source into decoded fragments, closing the connection on
/// the first terminal condition. reqwest-eventsource reconnects on its own
/// after errors, which must not happen inside a single attempt.
fn fragment_stream(mut source: EventSource, protocol: WireProtocol) -> FragmentStream {
    Box::pin(stream! {
        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => {
                    trace!("stream opened");
                }
                Ok(Event::Message(message)) => {
                    match adapter::decode_chunk(protocol, &message.data) {
                        Ok(ChunkPayload::Token(text)) => yield Ok(text),
                        Ok(ChunkPayload::Done) => {
                            source.close();
                            break;
                        }
                        Err(err) => {
                            source.close();
                            yield Err(err);
                            break;
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(err) => {
                    source.close();
                    yield Err(map_eventsource_error(err));
                    break;
                }
            }
        }
    })
}

fn map_eventsource_error(err: reqwest_eventsource::Error) -> AttemptError {
    use reqwest_eventsource::Error;

    match err {
        Error::InvalidStatusCode(status, _) => AttemptError::http_status(status.as_u16()),
        Error::InvalidContentType(value, _) => AttemptError::malformed(format!(
            "unexpected content type {value:?} (expected text/event-stream)"
        )),
        Error::Utf8(err) => AttemptError::malformed(err.to_string()),
        Error::Parser(err) => AttemptError::malformed(err.to_string()),
        other => AttemptError::transport(other.to_string()),
    }
}

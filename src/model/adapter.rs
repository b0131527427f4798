//! Request shaping and stream decoding per wire-protocol family.
//!
//! Converts the neutral message sequence into the JSON body each protocol
//! expects, and decodes incremental SSE payloads back into text fragments.

use super::candidates::Candidate;
use super::types::{AttemptError, ChatMessage, ImageAttachment, MessageRole};
use crate::config::WireProtocol;
use crate::constants::{DEFAULT_GEMINI_API_PATH, DEFAULT_OPENAI_API_PATH};
use serde::Deserialize;
use serde_json::{Value, json};

/// Decoded payload of one stream chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkPayload {
    /// A text fragment; may be empty for keep-alive or metadata chunks
    Token(String),
    /// Provider-side end-of-stream sentinel
    Done,
}

/// URL for one candidate's streaming endpoint, without auth query params.
pub fn endpoint_url(candidate: &Candidate) -> String {
    let base = candidate.endpoint.trim_end_matches('/');
    match candidate.protocol {
        WireProtocol::OpenAi => {
            let path = candidate
                .api_path
                .as_deref()
                .unwrap_or(DEFAULT_OPENAI_API_PATH)
                .trim_start_matches('/');
            format!("{base}/{path}")
        }
        WireProtocol::Gemini => {
            let path = candidate
                .api_path
                .as_deref()
                .unwrap_or(DEFAULT_GEMINI_API_PATH)
                .trim_matches('/');
            format!("{base}/{path}/{}:streamGenerateContent", candidate.model)
        }
    }
}

/// Build the streaming request body for one candidate.
///
/// Images are attached to the final user message (the prompt).
pub fn build_request_body(
    candidate: &Candidate,
    messages: &[ChatMessage],
    images: &[ImageAttachment],
    temperature: f32,
) -> Value {
    match candidate.protocol {
        WireProtocol::OpenAi => openai_body(&candidate.model, messages, images, temperature),
        WireProtocol::Gemini => gemini_body(messages, images, temperature),
    }
}

fn openai_body(
    model: &str,
    messages: &[ChatMessage],
    images: &[ImageAttachment],
    temperature: f32,
) -> Value {
    let last_user = messages
        .iter()
        .rposition(|m| m.role == MessageRole::User)
        .filter(|_| !images.is_empty());

    let rendered: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            if Some(index) == last_user {
                let mut parts = vec![json!({"type": "text", "text": message.content.clone()})];
                for image in images {
                    parts.push(json!({
                        "type": "image_url",
                        "image_url": {"url": image.to_data_uri()}
                    }));
                }
                json!({"role": message.role.as_str(), "content": parts})
            } else {
                json!({"role": message.role.as_str(), "content": message.content.clone()})
            }
        })
        .collect();

    json!({
        "model": model,
        "messages": rendered,
        "temperature": temperature,
        "stream": true,
    })
}

fn gemini_body(messages: &[ChatMessage], images: &[ImageAttachment], temperature: f32) -> Value {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    let last_user = messages.iter().rposition(|m| m.role == MessageRole::User);

    for (index, message) in messages.iter().enumerate() {
        match message.role {
            MessageRole::System => system_parts.push(message.content.clone()),
            MessageRole::User => {
                let mut parts = vec![json!({"text": message.content.clone()})];
                if Some(index) == last_user {
                    for image in images {
                        parts.push(json!({
                            "inline_data": {
                                "mime_type": image.mime_type.clone(),
                                "data": image.data.clone(),
                            }
                        }));
                    }
                }
                contents.push(json!({"role": "user", "parts": parts}));
            }
            MessageRole::Assistant => contents.push(json!({
                "role": "model",
                "parts": [{"text": message.content.clone()}]
            })),
        }
    }

    let mut payload = json!({
        "contents": contents,
        "generationConfig": {"temperature": temperature},
    });

    if !system_parts.is_empty() {
        payload["system_instruction"] = json!({
            "parts": [{"text": system_parts.join("\n\n")}]
        });
    }

    payload
}

/// Decode one SSE data payload into a fragment.
pub fn decode_chunk(protocol: WireProtocol, data: &str) -> Result<ChunkPayload, AttemptError> {
    match protocol {
        WireProtocol::OpenAi => decode_openai_chunk(data),
        WireProtocol::Gemini => decode_gemini_chunk(data),
    }
}

fn decode_openai_chunk(data: &str) -> Result<ChunkPayload, AttemptError> {
    if data.trim() == "[DONE]" {
        return Ok(ChunkPayload::Done);
    }

    let chunk: OpenAiChunk = serde_json::from_str(data)
        .map_err(|err| AttemptError::malformed(format!("openai chunk: {err}")))?;

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .unwrap_or_default();

    Ok(ChunkPayload::Token(text))
}

fn decode_gemini_chunk(data: &str) -> Result<ChunkPayload, AttemptError> {
    let chunk: GeminiChunk = serde_json::from_str(data)
        .map_err(|err| AttemptError::malformed(format!("gemini chunk: {err}")))?;

    let text: String = chunk
        .candidates
        .unwrap_or_default()
        .into_iter()
        .flat_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();

    Ok(ChunkPayload::Token(text))
}

#[derive(Deserialize)]
struct OpenAiChunk {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    delta: Option<OpenAiDelta>,
}

#[derive(Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct GeminiChunk {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(protocol: WireProtocol) -> Candidate {
        Candidate {
            provider: "test".into(),
            protocol,
            model: "test-model".into(),
            endpoint: "https://api.example.com/".into(),
            api_path: None,
            api_key: Some("key".into()),
            priority: 0,
            vision: false,
            reasoning: false,
        }
    }

    #[test]
    fn openai_url_uses_default_path() {
        let url = endpoint_url(&candidate(WireProtocol::OpenAi));
        assert_eq!(url, "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn gemini_url_embeds_model_and_action() {
        let url = endpoint_url(&candidate(WireProtocol::Gemini));
        assert_eq!(
            url,
            "https://api.example.com/v1beta/models/test-model:streamGenerateContent"
        );
    }

    #[test]
    fn openai_body_is_streaming_chat_request() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
        ];
        let body = openai_body("m1", &messages, &[], 0.7);

        assert_eq!(body["model"], "m1");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn openai_body_attaches_images_to_last_user_message() {
        let messages = vec![ChatMessage::user("what is this?")];
        let images = vec![ImageAttachment::new("image/png", "AAAA")];
        let body = openai_body("m1", &messages, &images, 0.7);

        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(
            content[1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn gemini_body_splits_out_system_instruction() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];
        let body = gemini_body(&messages, &[], 0.5);

        assert_eq!(
            body["system_instruction"]["parts"][0]["text"],
            "be brief"
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
    }

    #[test]
    fn decodes_openai_delta_and_done() {
        let payload = decode_chunk(
            WireProtocol::OpenAi,
            r#"{"choices":[{"delta":{"content":"Hi"}}]}"#,
        );
        assert_eq!(payload.unwrap(), ChunkPayload::Token("Hi".into()));

        let done = decode_chunk(WireProtocol::OpenAi, "[DONE]");
        assert_eq!(done.unwrap(), ChunkPayload::Done);
    }

    #[test]
    fn role_only_openai_delta_is_an_empty_token() {
        let payload = decode_chunk(
            WireProtocol::OpenAi,
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
        );
        assert_eq!(payload.unwrap(), ChunkPayload::Token(String::new()));
    }

    #[test]
    fn decodes_gemini_parts() {
        let payload = decode_chunk(
            WireProtocol::Gemini,
            r#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#,
        );
        assert_eq!(payload.unwrap(), ChunkPayload::Token("Hello".into()));
    }

    #[test]
    fn malformed_chunk_is_an_error() {
        let err = decode_chunk(WireProtocol::OpenAi, "not json").unwrap_err();
        assert!(matches!(err, AttemptError::MalformedChunk { .. }));
    }
}

//! # Provider Configuration
//!
//! Configuration types for upstream completion providers. Each provider
//! declares which wire protocol it speaks, where it lives, how to
//! authenticate, and which models it serves.
//!
//! ## Wire protocols
//!
//! | Protocol | Request shape | Auth |
//! |----------|---------------|------|
//! | `openai` | Chat Completions JSON, SSE stream | Bearer header |
//! | `gemini` | `streamGenerateContent?alt=sse` | Query key |

use serde::{Deserialize, Serialize};

/// Wire-protocol family spoken by a provider endpoint.
///
/// This is a closed set: request shaping and stream decoding dispatch on
/// this tag, never on free-text provider names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireProtocol {
    /// OpenAI Chat Completions and compatible gateways (OpenRouter, Groq, ...)
    OpenAi,
    /// Google Gemini `generativelanguage` API
    Gemini,
}

impl WireProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            WireProtocol::OpenAi => "openai",
            WireProtocol::Gemini => "gemini",
        }
    }
}

/// One model served by a provider, with its capability flags.
///
/// Models can be listed as a bare name or with capability flags for the
/// request-signal boosts (vision, reasoning).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelSpec {
    /// Model identifier used in API calls (e.g., "gemini-2.0-flash")
    pub name: String,
    /// Model accepts image input
    #[serde(default)]
    pub vision: bool,
    /// Model is preferred for math-heavy prompts
    #[serde(default)]
    pub reasoning: bool,
}

/// Configuration for one completion provider.
///
/// # Example
///
/// ```toml
/// [[providers]]
/// id = "gateway"
/// protocol = "openai"
/// endpoint = "https://gateway.example.com"
/// api_key = "GATEWAY_API_KEY"
/// priority = 0
/// models = [
///     { name = "gpt-4o", vision = true },
///     "gpt-4o-mini",
/// ]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Unique identifier for this provider (e.g., "gateway", "gemini")
    pub id: String,
    /// Wire protocol the endpoint speaks
    pub protocol: WireProtocol,
    /// API endpoint base URL
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API path override (e.g., "v1beta/models" for Gemini)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    /// Attempt order across providers; lower is tried first
    pub priority: u32,
    /// Whether the provider is unusable without a resolved API key.
    /// Local or keyless gateways set this to false.
    pub requires_credential: bool,
    /// Models served by this provider, in preferred order
    pub models: Vec<ModelSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: String,
    pub(super) protocol: WireProtocol,
    pub(super) endpoint: Option<String>,
    pub(super) api_key: Option<String>,
    #[serde(default)]
    pub(super) api_path: Option<String>,
    #[serde(default)]
    pub(super) priority: u32,
    #[serde(default = "default_requires_credential")]
    pub(super) requires_credential: bool,
    #[serde(default)]
    pub(super) models: Vec<RawModelSpec>,
}

fn default_requires_credential() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum RawModelSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        vision: bool,
        #[serde(default)]
        reasoning: bool,
    },
}

impl From<RawModelSpec> for ModelSpec {
    fn from(value: RawModelSpec) -> Self {
        match value {
            RawModelSpec::Name(name) => Self {
                name,
                vision: false,
                reasoning: false,
            },
            RawModelSpec::Detailed {
                name,
                vision,
                reasoning,
            } => Self {
                name,
                vision,
                reasoning,
            },
        }
    }
}

impl From<RawProviderConfig> for ProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        Self {
            id: raw.id,
            protocol: raw.protocol,
            endpoint: raw.endpoint.unwrap_or_default(),
            api_key: raw.api_key,
            api_path: raw.api_path,
            priority: raw.priority,
            requires_credential: raw.requires_credential,
            models: raw.models.into_iter().map(ModelSpec::from).collect(),
        }
    }
}

impl ProviderConfig {
    /// Check if this provider speaks the Gemini protocol.
    pub fn is_gemini(&self) -> bool {
        self.protocol == WireProtocol::Gemini
    }
}

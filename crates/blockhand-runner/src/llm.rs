//! LLM backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for LLM backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for OpenAI-compatible APIs and the Anthropic
//! Messages API. All backends communicate over HTTP via `reqwest` and
//! offer the action vocabulary as tools.

use serde_json::Value;

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::RunnerError;
use crate::prompt::RenderedPrompt;
use crate::tools::{self, ToolSpec};

/// Upper bound on generated tokens; replies are one or two sentences.
const MAX_TOKENS: u32 = 512;

/// What the model answered.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmReply {
    /// Free text (possibly a JSON object in the text-protocol form).
    Text(String),
    /// The model called one of the offered tools.
    ToolCall {
        /// Tool name.
        name: String,
        /// Arguments object.
        arguments: Value,
    },
}

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait)
// ---------------------------------------------------------------------------

/// An LLM backend that can process a prompt and return a reply.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Send a prompt to the LLM and return its reply.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::LlmBackend`] if the HTTP call fails or the
    /// reply cannot be extracted.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<LlmReply, RunnerError> {
        match self {
            Self::OpenAi(backend) => backend.complete(prompt).await,
            Self::Anthropic(backend) => backend.complete(prompt).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Sends requests to `{api_url}/chat/completions` with `tool_choice: auto`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    tools: Value,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &LlmBackendConfig, specs: &[ToolSpec]) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            tools: tools::openai_tools(specs),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<LlmReply, RunnerError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "max_tokens": MAX_TOKENS,
            "tools": self.tools,
            "tool_choice": "auto"
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(RunnerError::LlmBackend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_reply(&json)
    }
}

/// Extract the reply from an `OpenAI` chat completions response: the
/// first tool call if any, else the message content.
fn extract_openai_reply(json: &Value) -> Result<LlmReply, RunnerError> {
    if let Some(error) = json.get("error") {
        return Err(RunnerError::LlmBackend(format!("OpenAI error: {error}")));
    }
    let message = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| {
            RunnerError::LlmBackend("OpenAI response missing choices[0].message".to_owned())
        })?;

    if let Some(call) = message
        .get("tool_calls")
        .and_then(|calls| calls.get(0))
        .and_then(|call| call.get("function"))
    {
        let name = call
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RunnerError::LlmBackend("tool call without a name".to_owned()))?;
        // Arguments arrive as a JSON-encoded string. Malformed strings are
        // kept as-is for the parser's recovery ladder.
        let arguments = match call.get("arguments") {
            Some(Value::String(raw)) if raw.trim().is_empty() => {
                Value::Object(serde_json::Map::new())
            }
            Some(Value::String(raw)) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            }
            Some(other) => other.clone(),
            None => Value::Object(serde_json::Map::new()),
        };
        return Ok(LlmReply::ToolCall {
            name: name.to_owned(),
            arguments,
        });
    }

    message
        .get("content")
        .and_then(Value::as_str)
        .map(|text| LlmReply::Text(text.to_owned()))
        .ok_or_else(|| {
            RunnerError::LlmBackend(
                "OpenAI response has neither tool_calls nor content".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic uses a different request format from `OpenAI`:
/// - Uses `x-api-key` header instead of `Authorization: Bearer`
/// - The system prompt is a top-level field
/// - Replies are content blocks: `text` or `tool_use`
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    tools: Value,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: &LlmBackendConfig, specs: &[ToolSpec]) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            tools: tools::anthropic_tools(specs),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<LlmReply, RunnerError> {
        let url = format!("{}/messages", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": prompt.system,
            "messages": [
                {"role": "user", "content": prompt.user}
            ],
            "tools": self.tools
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(RunnerError::LlmBackend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        let json: Value = response.json().await.map_err(|e| {
            RunnerError::LlmBackend(format!("Anthropic response parse failed: {e}"))
        })?;

        extract_anthropic_reply(&json)
    }
}

/// Extract the reply from an Anthropic Messages response: the first
/// `tool_use` block if any, else the first `text` block.
fn extract_anthropic_reply(json: &Value) -> Result<LlmReply, RunnerError> {
    let blocks = json
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| RunnerError::LlmBackend("Anthropic response missing content".to_owned()))?;

    let block_type = |block: &Value| block.get("type").and_then(Value::as_str).map(str::to_owned);

    if let Some(tool_use) = blocks
        .iter()
        .find(|b| block_type(b).as_deref() == Some("tool_use"))
    {
        let name = tool_use
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RunnerError::LlmBackend("tool_use block without a name".to_owned()))?;
        return Ok(LlmReply::ToolCall {
            name: name.to_owned(),
            arguments: tool_use
                .get("input")
                .cloned()
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        });
    }

    blocks
        .iter()
        .find(|b| block_type(b).as_deref() == Some("text"))
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .map(|text| LlmReply::Text(text.to_owned()))
        .ok_or_else(|| {
            RunnerError::LlmBackend("Anthropic response has no text or tool_use block".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM backend from configuration, offering `specs` as tools.
pub fn create_backend(config: &LlmBackendConfig, specs: &[ToolSpec]) -> LlmBackend {
    match config.backend_type {
        BackendType::OpenAi => LlmBackend::OpenAi(OpenAiBackend::new(config, specs)),
        BackendType::Anthropic => LlmBackend::Anthropic(AnthropicBackend::new(config, specs)),
    }
}

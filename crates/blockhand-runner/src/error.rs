//! Error types for the agent runner.
//!
//! Uses `thiserror` for typed errors that surface through the runner
//! pipeline: configuration, LLM calls, prompt rendering, response parsing.

/// Errors that can occur during agent runner operation.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// The LLM response could not be parsed into a decision.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}

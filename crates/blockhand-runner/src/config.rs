//! Configuration types for the agent runner.
//!
//! All configuration is loaded from environment variables. The LLM backend
//! is optional: without one the runner answers only routine commands.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::RunnerError;

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// LLM backend configuration; `None` runs the offline oracle.
    pub backend: Option<LlmBackendConfig>,
    /// Maximum time allowed for one decision (LLM call + parsing).
    pub decision_timeout: Duration,
    /// Directory with `system.j2` and `user.j2` overrides.
    pub templates_dir: Option<PathBuf>,
    /// When true, unambiguous routine commands skip the LLM.
    pub routine_command_bypass: bool,
    /// Optional YAML file with behaviour tuning.
    pub behavior_config: Option<PathBuf>,
    /// Observer bind host.
    pub observer_host: String,
    /// Observer bind port.
    pub observer_port: u16,
    /// The agent's account name.
    pub username: String,
    /// Period of the background telemetry refresh.
    pub stats_interval: Duration,
    /// Seed for the sandbox world; random when unset.
    pub sandbox_seed: Option<u64>,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type (openai, anthropic).
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://openrouter.ai/api/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier (e.g. `openai/gpt-4o-mini`).
    pub model: String,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible API (`OpenAI`, `OpenRouter`, `DeepSeek`, Ollama).
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `LLM_DEFAULT_BACKEND` -- backend type; when set, `LLM_DEFAULT_API_URL`,
    ///   `LLM_DEFAULT_API_KEY`, and `LLM_DEFAULT_MODEL` are required
    /// - `DECISION_TIMEOUT_MS` -- decision deadline in milliseconds (default 15000)
    /// - `TEMPLATES_DIR` -- prompt template overrides (default: built-in)
    /// - `ROUTINE_COMMAND_BYPASS` -- skip the LLM for routine commands (default `true`)
    /// - `BEHAVIOR_CONFIG` -- path to a behaviour YAML file
    /// - `OBSERVER_HOST` -- observer bind host (default `0.0.0.0`)
    /// - `OBSERVER_PORT` -- observer port (default 3000)
    /// - `AGENT_USERNAME` -- account name (default `Pengu`)
    /// - `STATS_INTERVAL_MS` -- telemetry period in milliseconds (default 2000)
    /// - `SANDBOX_SEED` -- sandbox world seed
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(&|name: &str| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, RunnerError> {
        let backend = match lookup("LLM_DEFAULT_BACKEND") {
            Some(kind) => Some(load_backend_config(lookup, "LLM_DEFAULT", &kind)?),
            None => None,
        };

        let decision_timeout_ms: u64 = parse_or(lookup, "DECISION_TIMEOUT_MS", 15_000)?;
        let routine_command_bypass: bool = parse_or(lookup, "ROUTINE_COMMAND_BYPASS", true)?;
        let observer_port: u16 = parse_or(lookup, "OBSERVER_PORT", 3000)?;
        let stats_interval_ms: u64 = parse_or(lookup, "STATS_INTERVAL_MS", 2000)?;
        if stats_interval_ms == 0 {
            return Err(RunnerError::Config(
                "STATS_INTERVAL_MS must be positive".to_owned(),
            ));
        }
        let sandbox_seed = lookup("SANDBOX_SEED")
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|e| RunnerError::Config(format!("invalid SANDBOX_SEED: {e}")))
            })
            .transpose()?;

        Ok(Self {
            backend,
            decision_timeout: Duration::from_millis(decision_timeout_ms),
            templates_dir: lookup("TEMPLATES_DIR").map(PathBuf::from),
            routine_command_bypass,
            behavior_config: lookup("BEHAVIOR_CONFIG").map(PathBuf::from),
            observer_host: lookup("OBSERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            observer_port,
            username: lookup("AGENT_USERNAME").unwrap_or_else(|| "Pengu".to_owned()),
            stats_interval: Duration::from_millis(stats_interval_ms),
            sandbox_seed,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, RunnerError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| RunnerError::Config(format!("invalid {name}: {e}")))
    })
}

/// Load an LLM backend config from a set of prefixed variables.
fn load_backend_config(
    lookup: &impl Fn(&str) -> Option<String>,
    prefix: &str,
    kind: &str,
) -> Result<LlmBackendConfig, RunnerError> {
    let required = |suffix: &str| {
        let name = format!("{prefix}_{suffix}");
        lookup(&name).ok_or_else(|| RunnerError::Config(format!("missing required env var {name}")))
    };
    let api_url = required("API_URL")?;
    let api_key = required("API_KEY")?;
    let model = required("MODEL")?;

    let backend_type = match kind.to_lowercase().as_str() {
        "openai" | "openrouter" | "deepseek" | "ollama" => BackendType::OpenAi,
        "anthropic" | "claude" => BackendType::Anthropic,
        other => {
            return Err(RunnerError::Config(format!(
                "unknown backend type: {other}"
            )));
        }
    };

    Ok(LlmBackendConfig {
        backend_type,
        api_url: api_url.trim_end_matches('/').to_owned(),
        api_key,
        model,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_any_variables() {
        let config = RunnerConfig::from_lookup(&lookup(&[])).unwrap();
        assert!(config.backend.is_none());
        assert_eq!(config.decision_timeout, Duration::from_millis(15_000));
        assert!(config.routine_command_bypass);
        assert_eq!(config.observer_port, 3000);
        assert_eq!(config.username, "Pengu");
        assert_eq!(config.stats_interval, Duration::from_millis(2000));
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn backend_needs_all_fields() {
        let err = RunnerConfig::from_lookup(&lookup(&[
            ("LLM_DEFAULT_BACKEND", "openai"),
            ("LLM_DEFAULT_API_URL", "https://openrouter.ai/api/v1"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_DEFAULT_API_KEY"));
    }

    #[test]
    fn backend_type_parsing() {
        let config = RunnerConfig::from_lookup(&lookup(&[
            ("LLM_DEFAULT_BACKEND", "Claude"),
            ("LLM_DEFAULT_API_URL", "https://api.anthropic.com/v1/"),
            ("LLM_DEFAULT_API_KEY", "test-key"),
            ("LLM_DEFAULT_MODEL", "claude-haiku-4-5"),
        ]))
        .unwrap();
        let backend = config.backend.unwrap();
        assert_eq!(backend.backend_type, BackendType::Anthropic);
        assert_eq!(backend.api_url, "https://api.anthropic.com/v1");

        let err = RunnerConfig::from_lookup(&lookup(&[
            ("LLM_DEFAULT_BACKEND", "carrier-pigeon"),
            ("LLM_DEFAULT_API_URL", "x"),
            ("LLM_DEFAULT_API_KEY", "x"),
            ("LLM_DEFAULT_MODEL", "x"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("unknown backend type"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(RunnerConfig::from_lookup(&lookup(&[("OBSERVER_PORT", "eighty")])).is_err());
        assert!(RunnerConfig::from_lookup(&lookup(&[("STATS_INTERVAL_MS", "0")])).is_err());
        assert!(RunnerConfig::from_lookup(&lookup(&[("ROUTINE_COMMAND_BYPASS", "maybe")])).is_err());
    }
}

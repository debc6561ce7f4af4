//! The decision oracle: free text in, [`Decision`] out.
//!
//! Pipeline for one utterance:
//!
//! 1. Routine command rules (always consulted when offline)
//! 2. Offline reply when no backend is configured
//! 3. Render prompt, call the LLM, parse the reply, all under one deadline
//!
//! The oracle never fails. Backend errors and missed deadlines become the
//! apology narration so the speaker always hears something back.

use std::time::{Duration, Instant};

use blockhand_types::{ContextSummary, Decision, InboundCommand};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::RunnerError;
use crate::llm::LlmBackend;
use crate::parse::{APOLOGY, parse_reply};
use crate::prompt::{ActionLine, PromptEngine, PromptInput};
use crate::rules::{self, DecisionSource, OFFLINE_REPLY};
use crate::tools::ToolSpec;

/// Maps utterances to decisions via rules and an optional LLM.
pub struct DecisionOracle {
    backend: Option<LlmBackend>,
    prompts: PromptEngine,
    actions: Vec<ActionLine>,
    username: String,
    decision_timeout: Duration,
    routine_command_bypass: bool,
}

impl DecisionOracle {
    /// Create an oracle.
    ///
    /// With `backend` set to `None` only routine commands are understood.
    pub fn new(
        backend: Option<LlmBackend>,
        prompts: PromptEngine,
        specs: &[ToolSpec],
        username: &str,
        decision_timeout: Duration,
        routine_command_bypass: bool,
    ) -> Self {
        Self {
            backend,
            prompts,
            actions: ActionLine::from_specs(specs),
            username: username.to_owned(),
            decision_timeout,
            routine_command_bypass,
        }
    }

    /// Whether an LLM backend is configured.
    pub const fn is_online(&self) -> bool {
        self.backend.is_some()
    }

    /// Decide how to answer `command` given the agent's current `context`.
    pub async fn decide(&self, command: &InboundCommand, context: ContextSummary) -> Decision {
        let use_rules = self.routine_command_bypass || self.backend.is_none();
        if use_rules && let Some(request) = rules::try_routine_command(&command.utterance) {
            info!(
                speaker = %command.speaker,
                action = %request.name(),
                decision_source = DecisionSource::RuleEngine.as_str(),
                "decision bypassed LLM (routine command)"
            );
            return Decision::act(request);
        }

        let Some(backend) = &self.backend else {
            info!(
                speaker = %command.speaker,
                decision_source = DecisionSource::Offline.as_str(),
                "no LLM backend configured"
            );
            return Decision::say(OFFLINE_REPLY);
        };

        match timeout(
            self.decision_timeout,
            self.decide_inner(backend, command, context),
        )
        .await
        {
            Ok(Ok(decision)) => {
                debug!(
                    speaker = %command.speaker,
                    decision_source = DecisionSource::Llm.as_str(),
                    "decision made via LLM"
                );
                decision
            }
            Ok(Err(e)) => {
                warn!(
                    speaker = %command.speaker,
                    error = %e,
                    decision_source = DecisionSource::Fallback.as_str(),
                    "decision pipeline failed, apologising"
                );
                Decision::say(APOLOGY)
            }
            Err(_) => {
                warn!(
                    speaker = %command.speaker,
                    timeout_ms = self.decision_timeout.as_millis(),
                    decision_source = DecisionSource::Fallback.as_str(),
                    "decision deadline exceeded, apologising"
                );
                Decision::say(APOLOGY)
            }
        }
    }

    /// Render, call, parse.
    async fn decide_inner(
        &self,
        backend: &LlmBackend,
        command: &InboundCommand,
        context: ContextSummary,
    ) -> Result<Decision, RunnerError> {
        let prompt = self.prompts.render(&PromptInput {
            username: &self.username,
            speaker: &command.speaker,
            message: &command.utterance,
            context: context.to_string(),
            actions: self.actions.clone(),
        })?;

        let start = Instant::now();
        let reply = backend.complete(&prompt).await?;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let decision = parse_reply(&reply);
        info!(
            speaker = %command.speaker,
            backend = backend.name(),
            latency_ms,
            decision = ?decision,
            "decision parsed"
        );
        Ok(decision)
    }
}

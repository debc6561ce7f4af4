//! Rule-based fast path for routine commands.
//!
//! A handful of utterances have exactly one sensible reading ("stop",
//! "follow me", "mine 5 dirt"). These resolve in microseconds without an
//! LLM round trip. With no backend configured they are the only commands
//! the agent understands.

use blockhand_types::ActionRequest;
use tracing::info;

/// Said for anything the rules cannot handle when no LLM is configured.
pub const OFFLINE_REPLY: &str = "I can only follow simple commands right now.";

// ---------------------------------------------------------------------------
// Decision source tagging
// ---------------------------------------------------------------------------

/// Indicates where a decision came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    /// Decision was made by the LLM backend.
    Llm,
    /// Decision was made by the routine command rules.
    RuleEngine,
    /// No backend is configured and the rules did not match.
    Offline,
    /// The LLM call failed or timed out.
    Fallback,
}

impl DecisionSource {
    /// Human-readable label for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::RuleEngine => "rule_engine",
            Self::Offline => "offline",
            Self::Fallback => "fallback",
        }
    }
}

// ---------------------------------------------------------------------------
// Routine command matching
// ---------------------------------------------------------------------------

/// Lowercase, trim, drop trailing punctuation, and collapse whitespace.
fn normalize(utterance: &str) -> String {
    utterance
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Map an unambiguous routine command onto an action.
///
/// Returns `None` when the utterance needs interpretation.
pub fn try_routine_command(utterance: &str) -> Option<ActionRequest> {
    let text = normalize(utterance);
    let request = match text.as_str() {
        "stop" | "stop all" => ActionRequest::StopAll {},
        "stop following" | "stop follow" => ActionRequest::StopFollow {},
        "status" | "report status" => ActionRequest::ReportStatus {},
        "follow me" | "come here" => ActionRequest::FollowPlayer { username: None },
        "build a house" | "build house" => ActionRequest::BuildHouse {},
        other => parse_mine(other)?,
    };
    info!(utterance, action = %request.name(), "routine command matched");
    Some(request)
}

/// `mine <n> <block words...>`
fn parse_mine(text: &str) -> Option<ActionRequest> {
    let mut words = text.strip_prefix("mine ")?.split(' ');
    let quantity = words.next()?.parse::<u32>().ok().filter(|n| *n > 0)?;
    let block_name = words.collect::<Vec<_>>().join("_");
    if block_name.is_empty() {
        return None;
    }
    Some(ActionRequest::MineBlock {
        block_name,
        quantity: Some(quantity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_source_labels() {
        assert_eq!(DecisionSource::Llm.as_str(), "llm");
        assert_eq!(DecisionSource::RuleEngine.as_str(), "rule_engine");
        assert_eq!(DecisionSource::Offline.as_str(), "offline");
        assert_eq!(DecisionSource::Fallback.as_str(), "fallback");
    }

    #[test]
    fn fixed_phrases() {
        assert_eq!(try_routine_command("Stop!"), Some(ActionRequest::StopAll {}));
        assert_eq!(
            try_routine_command("  stop   following "),
            Some(ActionRequest::StopFollow {})
        );
        assert_eq!(try_routine_command("status?"), Some(ActionRequest::ReportStatus {}));
        assert_eq!(
            try_routine_command("Come here"),
            Some(ActionRequest::FollowPlayer { username: None })
        );
        assert_eq!(
            try_routine_command("Build a house."),
            Some(ActionRequest::BuildHouse {})
        );
    }

    #[test]
    fn mine_with_count() {
        assert_eq!(
            try_routine_command("mine 5 dirt"),
            Some(ActionRequest::MineBlock {
                block_name: "dirt".to_owned(),
                quantity: Some(5),
            })
        );
        assert_eq!(
            try_routine_command("Mine 2 oak log"),
            Some(ActionRequest::MineBlock {
                block_name: "oak_log".to_owned(),
                quantity: Some(2),
            })
        );
    }

    #[test]
    fn ambiguous_utterances_fall_through() {
        assert_eq!(try_routine_command("mine some dirt"), None);
        assert_eq!(try_routine_command("mine 0 dirt"), None);
        assert_eq!(try_routine_command("mine 3"), None);
        assert_eq!(try_routine_command("could you stop for a sec"), None);
        assert_eq!(try_routine_command(""), None);
    }
}

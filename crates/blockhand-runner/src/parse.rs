//! LLM reply parsing into oracle decisions.
//!
//! The model answers either with a tool call or with text that should hold
//! one JSON object: `{"reply": "..."}` or
//! `{"action": "<name>", "parameters": {...}, "chat_message": "..."}`.
//! Text that is not JSON at all is taken as a plain narration. Anything
//! that looks like JSON but cannot be recovered degrades to an apology.

use blockhand_types::{ActionName, Decision};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::llm::LlmReply;
use crate::tools::CHAT_MESSAGE;

/// Said when the reply cannot be turned into a decision.
pub const APOLOGY: &str = "Sorry, I had trouble processing that.";

/// Said when the model picks an action outside the vocabulary.
pub const UNKNOWN_ACTION: &str = "I'm not sure how to do that yet.";

/// The text-protocol object before validation.
#[derive(Debug, serde::Deserialize)]
struct RawReply {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    parameters: Value,
    #[serde(default)]
    chat_message: Option<String>,
}

/// Turn an LLM reply into a [`Decision`].
///
/// Never fails: unrecoverable replies become the [`APOLOGY`] narration.
pub fn parse_reply(reply: &LlmReply) -> Decision {
    let result = match reply {
        LlmReply::Text(text) => parse_text(text),
        LlmReply::ToolCall { name, arguments } => parse_tool_call(name, arguments),
    };
    result.unwrap_or_else(|e| {
        warn!(error = %e, raw_reply = ?reply, "failed to parse LLM reply, apologising");
        Decision::say(APOLOGY)
    })
}

fn parse_text(raw: &str) -> Result<Decision, RunnerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RunnerError::Parse("empty reply".to_owned()));
    }
    if !trimmed.contains('{') {
        return Ok(Decision::say(trimmed));
    }

    let parsed: RawReply = recover(trimmed)?;
    match (parsed.action, parsed.reply) {
        (Some(action), reply) => {
            build_decision(&action, parsed.parameters, parsed.chat_message.or(reply))
        }
        (None, Some(reply)) if !reply.trim().is_empty() => Ok(Decision::say(reply.trim())),
        (None, _) => Err(RunnerError::Parse(
            "object has neither `action` nor `reply`".to_owned(),
        )),
    }
}

fn parse_tool_call(name: &str, arguments: &Value) -> Result<Decision, RunnerError> {
    let parameters = match arguments {
        Value::String(raw) => recover(raw.trim())?,
        other => other.clone(),
    };
    build_decision(name, parameters, None)
}

/// Deserialize `text` through the recovery ladder:
/// 1. Direct parse
/// 2. Extract from a markdown code block
/// 3. Strip trailing commas
/// 4. Code block, then strip trailing commas
fn recover<T: DeserializeOwned>(text: &str) -> Result<T, RunnerError> {
    if let Ok(parsed) = serde_json::from_str::<T>(text) {
        return Ok(parsed);
    }

    if let Some(inner) = extract_json_from_codeblock(text)
        && let Ok(parsed) = serde_json::from_str::<T>(inner)
    {
        return Ok(parsed);
    }

    let cleaned = strip_trailing_commas(text);
    if let Ok(parsed) = serde_json::from_str::<T>(&cleaned) {
        return Ok(parsed);
    }

    if let Some(inner) = extract_json_from_codeblock(text) {
        let cleaned_inner = strip_trailing_commas(inner);
        if let Ok(parsed) = serde_json::from_str::<T>(&cleaned_inner) {
            return Ok(parsed);
        }
    }

    Err(RunnerError::Parse(format!(
        "all parse strategies failed for: {text}"
    )))
}

/// Validate the action name and parameters into a decision.
///
/// `chat_message` may sit at the top level (`narration`) or inside the
/// parameters; the top-level one wins.
fn build_decision(
    name: &str,
    parameters: Value,
    narration: Option<String>,
) -> Result<Decision, RunnerError> {
    let Ok(action) = name.trim().parse::<ActionName>() else {
        debug!(action = name, "model chose an unknown action");
        return Ok(Decision::say(UNKNOWN_ACTION));
    };

    let mut params = match parameters {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(RunnerError::Parse(format!(
                "parameters for {action} must be an object, got {other}"
            )));
        }
    };

    let inline = params
        .remove(CHAT_MESSAGE)
        .and_then(|v| v.as_str().map(str::to_owned));
    params.retain(|_, v| !v.is_null());
    normalize_quantity(&mut params);

    let request = serde_json::from_value(json!({
        "action": action.as_str(),
        "parameters": params,
    }))
    .map_err(|e| RunnerError::Parse(format!("invalid parameters for {action}: {e}")))?;

    let narration = narration
        .or(inline)
        .map(|line| line.trim().to_owned())
        .filter(|line| !line.is_empty());

    Ok(Decision::Action { request, narration })
}

/// Coerce `quantity` to a non-negative integer, dropping it when that is
/// impossible so the action falls back to its default.
fn normalize_quantity(params: &mut Map<String, Value>) {
    let Some(raw) = params.remove("quantity") else {
        return;
    };
    let quantity = match &raw {
        Value::Number(n) => n.as_u64().and_then(|u| u32::try_from(u).ok()).or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0)
                .and_then(|f| format!("{f:.0}").parse::<u32>().ok())
        }),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    if let Some(q) = quantity {
        params.insert("quantity".to_owned(), Value::from(q));
    } else {
        debug!(quantity = %raw, "ignoring unusable quantity");
    }
}

/// Extract JSON content from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let after_fence = |i: usize, tag_len: usize| {
        let after_tag = i.checked_add(tag_len).unwrap_or(i);
        text.get(after_tag..)
            .and_then(|s| s.find('\n'))
            .and_then(|nl| after_tag.checked_add(nl))
            .and_then(|pos| pos.checked_add(1))
            .unwrap_or(after_tag)
    };
    let start = text
        .find("```json")
        .map(|i| after_fence(i, 7))
        .or_else(|| text.find("```").map(|i| after_fence(i, 3)))?;

    let remaining = text.get(start..)?;
    let end = remaining.find("```")?;
    remaining.get(..end).map(str::trim)
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == ',' {
            let rest = chars.clone().find(|next| !next.is_whitespace());
            if matches!(rest, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockhand_types::ActionRequest;

    use super::*;

    fn text(raw: &str) -> Decision {
        parse_reply(&LlmReply::Text(raw.to_owned()))
    }

    fn mine(block: &str, quantity: Option<u32>, narration: Option<&str>) -> Decision {
        Decision::Action {
            request: ActionRequest::MineBlock {
                block_name: block.to_owned(),
                quantity,
            },
            narration: narration.map(str::to_owned),
        }
    }

    #[test]
    fn plain_text_is_narration() {
        assert_eq!(text("  Hello there!  "), Decision::say("Hello there!"));
    }

    #[test]
    fn reply_object_is_narration() {
        assert_eq!(text(r#"{"reply": "Hi Steve"}"#), Decision::say("Hi Steve"));
    }

    #[test]
    fn action_object_with_chat_message() {
        let decision = text(
            r#"{"action": "mine_block", "parameters": {"block_name": "dirt", "quantity": 3}, "chat_message": "On it!"}"#,
        );
        assert_eq!(decision, mine("dirt", Some(3), Some("On it!")));
    }

    #[test]
    fn chat_message_inside_parameters() {
        let decision = text(
            r#"{"action": "mine_block", "parameters": {"block_name": "dirt", "chat_message": "Digging"}}"#,
        );
        assert_eq!(decision, mine("dirt", None, Some("Digging")));
    }

    #[test]
    fn missing_parameters_default_to_empty() {
        let decision = text(r#"{"action": "build_house"}"#);
        assert_eq!(decision, Decision::act(ActionRequest::BuildHouse {}));
    }

    #[test]
    fn fenced_block_with_trailing_comma() {
        let raw = "Sure!\n```json\n{\"action\": \"stop_all\", \"parameters\": {},}\n```";
        assert_eq!(text(raw), Decision::act(ActionRequest::StopAll {}));
    }

    #[test]
    fn quantity_is_coerced() {
        let float = text(r#"{"action": "mine_block", "parameters": {"block_name": "stone", "quantity": 5.0}}"#);
        assert_eq!(float, mine("stone", Some(5), None));

        let string = text(r#"{"action": "mine_block", "parameters": {"block_name": "stone", "quantity": " 4 "}}"#);
        assert_eq!(string, mine("stone", Some(4), None));

        let junk = text(r#"{"action": "mine_block", "parameters": {"block_name": "stone", "quantity": "lots"}}"#);
        assert_eq!(junk, mine("stone", None, None));

        let null = text(r#"{"action": "give_items", "parameters": {"item_name": "log", "quantity": null}}"#);
        assert_eq!(
            null,
            Decision::act(ActionRequest::GiveItems {
                item_name: "log".to_owned(),
                quantity: None,
            })
        );
    }

    #[test]
    fn unknown_action_is_declined() {
        assert_eq!(
            text(r#"{"action": "dance", "parameters": {}}"#),
            Decision::say(UNKNOWN_ACTION)
        );
    }

    #[test]
    fn broken_json_and_empty_replies_apologise() {
        assert_eq!(text(r#"{"action": "mine_block", "parameters": "#), Decision::say(APOLOGY));
        assert_eq!(text("   "), Decision::say(APOLOGY));
        assert_eq!(text("{}"), Decision::say(APOLOGY));
    }

    #[test]
    fn tool_call_arguments() {
        let decision = parse_reply(&LlmReply::ToolCall {
            name: "kill_mobs".to_owned(),
            arguments: json!({"mob_name": "zombie", "chat_message": "Charge!"}),
        });
        assert_eq!(
            decision,
            Decision::Action {
                request: ActionRequest::KillMobs {
                    mob_name: Some("zombie".to_owned()),
                },
                narration: Some("Charge!".to_owned()),
            }
        );
    }

    #[test]
    fn malformed_tool_arguments_are_recovered() {
        let decision = parse_reply(&LlmReply::ToolCall {
            name: "follow_player".to_owned(),
            arguments: Value::String(r#"{"chat_message": "Coming",}"#.to_owned()),
        });
        assert_eq!(
            decision,
            Decision::Action {
                request: ActionRequest::FollowPlayer { username: None },
                narration: Some("Coming".to_owned()),
            }
        );
    }

    #[test]
    fn extract_json_from_codeblock_plain_fence() {
        let input = "```\n{\"reply\": \"x\"}\n```";
        assert_eq!(extract_json_from_codeblock(input), Some("{\"reply\": \"x\"}"));
        assert_eq!(extract_json_from_codeblock("no fence"), None);
    }

    #[test]
    fn strip_trailing_commas_basic() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": 2,}"#), r#"{"a": 1, "b": 2}"#);
        assert_eq!(strip_trailing_commas("[1, 2, 3, ]"), "[1, 2, 3 ]");
    }
}

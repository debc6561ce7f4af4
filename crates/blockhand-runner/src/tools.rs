//! The action vocabulary as LLM tool definitions.
//!
//! Every action carries an optional `chat_message` the agent says before
//! acting. The same catalogue is rendered in the `OpenAI` `tools` shape and
//! the Anthropic `input_schema` shape.

use blockhand_types::ActionName;
use serde_json::{Value, json};

/// Parameter every tool accepts: a line to say before acting.
pub const CHAT_MESSAGE: &str = "chat_message";

/// One tool: name, description, and JSON-schema properties.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Action the tool maps to.
    pub name: ActionName,
    /// Human-readable description shown to the model.
    pub description: &'static str,
    /// Properties beyond `chat_message`.
    pub properties: Value,
    /// Required properties beyond `chat_message`.
    pub required: &'static [&'static str],
}

impl ToolSpec {
    /// JSON schema of the tool's parameters, `chat_message` included.
    pub fn schema(&self) -> Value {
        let mut properties = self.properties.clone();
        if let Some(map) = properties.as_object_mut() {
            map.insert(
                CHAT_MESSAGE.to_owned(),
                json!({ "type": "string", "description": "Message to the player" }),
            );
        }
        let mut required: Vec<&str> = self.required.to_vec();
        required.push(CHAT_MESSAGE);
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn spec(
    name: ActionName,
    description: &'static str,
    properties: Value,
    required: &'static [&'static str],
) -> ToolSpec {
    ToolSpec {
        name,
        description,
        properties,
        required,
    }
}

/// The full vocabulary, in [`ActionName::ALL`] order.
pub fn catalogue() -> Vec<ToolSpec> {
    ActionName::ALL
        .into_iter()
        .map(|name| match name {
            ActionName::MineBlock => spec(
                name,
                "Mines blocks. Can mine multiple blocks if quantity specified.",
                json!({
                    "block_name": { "type": "string", "description": "Block to mine (e.g., 'dirt', 'cobblestone', 'oak_log')" },
                    "quantity": { "type": "number", "description": "How many to mine (default: 1)" }
                }),
                &["block_name"],
            ),
            ActionName::GiveItems => spec(
                name,
                "Gives items from inventory to the player",
                json!({
                    "item_name": { "type": "string", "description": "Item to give" },
                    "quantity": { "type": "number", "description": "How many (default: all)" }
                }),
                &["item_name"],
            ),
            ActionName::FollowPlayer => spec(name, "Follows the player", json!({}), &[]),
            ActionName::BuildHouse => spec(
                name,
                "Builds a small house with oak logs, cobblestone walls, a doorway, and an oak plank roof",
                json!({}),
                &[],
            ),
            ActionName::KillMobs => spec(
                name,
                "Attacks mobs nearby; hostile ones unless a specific mob is named",
                json!({
                    "mob_name": { "type": "string", "description": "Specific mob to kill" }
                }),
                &[],
            ),
            ActionName::StopAll => spec(name, "Stops all tasks", json!({}), &[]),
            ActionName::StopFollow => spec(name, "Stops following", json!({}), &[]),
            ActionName::ReportStatus => {
                spec(name, "Reports health, hunger, inventory, and position", json!({}), &[])
            }
            ActionName::StashItems => {
                spec(name, "Deposits items in a nearby chest", json!({}), &[])
            }
        })
        .collect()
}

/// `tools` array for an `OpenAI`-compatible chat completion request.
pub fn openai_tools(specs: &[ToolSpec]) -> Value {
    Value::Array(
        specs
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name.as_str(),
                        "description": tool.description,
                        "parameters": tool.schema(),
                    }
                })
            })
            .collect(),
    )
}

/// `tools` array for an Anthropic Messages request.
pub fn anthropic_tools(specs: &[ToolSpec]) -> Value {
    Value::Array(
        specs
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name.as_str(),
                    "description": tool.description,
                    "input_schema": tool.schema(),
                })
            })
            .collect(),
    )
}

//! Prompt template loading and rendering via `minijinja`.
//!
//! Two templates make up a prompt: `system.j2` (persona, output protocol,
//! action list, context summary) and `user.j2` (who said what). Built-in
//! copies are compiled in; a templates directory overrides them so
//! operators can tune the persona without recompiling.

use std::path::Path;

use minijinja::Environment;
use serde::Serialize;

use crate::error::RunnerError;
use crate::tools::ToolSpec;

const BUILTIN_SYSTEM: &str = include_str!("../templates/system.j2");
const BUILTIN_USER: &str = include_str!("../templates/user.j2");

/// Manages prompt template loading and rendering.
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message: persona, protocol, and context.
    pub system: String,
    /// User message: the utterance and its speaker.
    pub user: String,
}

/// Everything the templates can refer to.
#[derive(Debug, Serialize)]
pub struct PromptInput<'a> {
    /// The agent's account name.
    pub username: &'a str,
    /// Who issued the command.
    pub speaker: &'a str,
    /// The utterance.
    pub message: &'a str,
    /// Rendered context summary.
    pub context: String,
    /// Action vocabulary.
    pub actions: Vec<ActionLine>,
}

/// One action as listed in the system prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ActionLine {
    /// Wire name.
    pub name: &'static str,
    /// Description.
    pub description: &'static str,
}

impl ActionLine {
    /// The listing for every tool in `specs`.
    pub fn from_specs(specs: &[ToolSpec]) -> Vec<Self> {
        specs
            .iter()
            .map(|spec| Self {
                name: spec.name.as_str(),
                description: spec.description,
            })
            .collect()
    }
}

impl PromptEngine {
    /// Create a prompt engine with the compiled-in templates.
    pub fn builtin() -> Result<Self, RunnerError> {
        Self::with_sources(BUILTIN_SYSTEM.to_owned(), BUILTIN_USER.to_owned())
    }

    /// Create a prompt engine loading `system.j2` and `user.j2` from
    /// `templates_dir`.
    pub fn from_dir(templates_dir: &Path) -> Result<Self, RunnerError> {
        let system = load_template(templates_dir, "system.j2")?;
        let user = load_template(templates_dir, "user.j2")?;
        Self::with_sources(system, user)
    }

    fn with_sources(system: String, user: String) -> Result<Self, RunnerError> {
        let mut env = Environment::new();
        env.add_template_owned("system", system)
            .map_err(|e| RunnerError::Template(format!("failed to add system template: {e}")))?;
        env.add_template_owned("user", user)
            .map_err(|e| RunnerError::Template(format!("failed to add user template: {e}")))?;
        Ok(Self { env })
    }

    /// Render the prompt for one utterance.
    pub fn render(&self, input: &PromptInput<'_>) -> Result<RenderedPrompt, RunnerError> {
        let system = self
            .env
            .get_template("system")
            .map_err(|e| RunnerError::Template(format!("missing system template: {e}")))?
            .render(input)
            .map_err(|e| RunnerError::Template(format!("system render failed: {e}")))?;

        let user = self
            .env
            .get_template("user")
            .map_err(|e| RunnerError::Template(format!("missing user template: {e}")))?
            .render(input)
            .map_err(|e| RunnerError::Template(format!("user render failed: {e}")))?;

        Ok(RenderedPrompt {
            system,
            user: user.trim_end().to_owned(),
        })
    }
}

/// Read a template file from disk.
fn load_template(dir: &Path, filename: &str) -> Result<String, RunnerError> {
    let path = dir.join(filename);
    std::fs::read_to_string(&path)
        .map_err(|e| RunnerError::Template(format!("failed to read {}: {e}", path.display())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use blockhand_types::{ContextSummary, TaskKind};

    use super::*;
    use crate::tools::catalogue;

    fn input(message: &str) -> PromptInput<'_> {
        PromptInput {
            username: "Pengu",
            speaker: "Steve",
            message,
            context: ContextSummary {
                task: TaskKind::Idle,
                health: 20.0,
                item_count: 3,
            }
            .to_string(),
            actions: ActionLine::from_specs(&catalogue()),
        }
    }

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let unique = format!(
            "blockhand_{tag}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn builtin_templates_render_context_and_actions() {
        let engine = PromptEngine::builtin().unwrap();
        let prompt = engine.render(&input("mine some dirt")).unwrap();

        assert!(prompt.system.contains("You are Pengu"));
        assert!(prompt.system.contains("Context: Task: idle. HP: 20/20. Items: 3"));
        assert!(prompt.system.contains("- stash_items: "));
        assert_eq!(prompt.user, "User Steve says: mine some dirt");
    }

    #[test]
    fn templates_dir_overrides_builtins() {
        let dir = temp_dir("templates");
        std::fs::write(dir.join("system.j2"), "Bot {{ username }}. {{ context }}").ok();
        std::fs::write(dir.join("user.j2"), "{{ speaker }}: {{ message }}").ok();

        let engine = PromptEngine::from_dir(&dir).unwrap();
        let prompt = engine.render(&input("hello")).unwrap();
        assert_eq!(prompt.system, "Bot Pengu. Task: idle. HP: 20/20. Items: 3");
        assert_eq!(prompt.user, "Steve: hello");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_template_returns_error() {
        let dir = temp_dir("missing_templates");
        std::fs::write(dir.join("system.j2"), "test").ok();

        let result = PromptEngine::from_dir(&dir);
        assert!(result.is_err(), "should fail when user.j2 is missing");

        std::fs::remove_dir_all(&dir).ok();
    }
}

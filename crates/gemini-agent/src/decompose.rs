use regex::Regex;
use std::sync::OnceLock;

use crate::types::CommandStep;
use crate::{GeminiError, Result};

/// Wrap a free-form user request in the instruction that asks the model for
/// a JSON array of `{command, description}` objects.
pub fn decompose_prompt(request: &str) -> String {
    format!(
        r#"Analyze the following user request and decompose it into a JSON array of discrete, executable CLI commands. Each command object should have a 'command' field (the CLI command) and a 'description' field (a brief explanation). Ensure the response is a valid JSON array and contains only the JSON.

User Request: "{request}"

Example format:
[
  {{ "command": "mkdir my-project", "description": "Create a new directory for the project" }},
  {{ "command": "cd my-project", "description": "Navigate into the project directory" }}
]
"#
    )
}

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"```(?:json|JSON)?\n?|\n?```").unwrap())
}

/// Remove markdown code-fence markup around a model reply and trim it.
pub fn strip_code_fences(text: &str) -> String {
    fence_re().replace_all(text, "").trim().to_string()
}

/// Parse a decomposition reply into ordered command steps.
///
/// On failure the fence-stripped text is kept in [`GeminiError::Parse`] so
/// callers can show the operator what the model actually said.
pub fn parse_commands(text: &str) -> Result<Vec<CommandStep>> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).map_err(|source| GeminiError::Parse {
        raw: cleaned,
        source,
    })
}

//! Natural-language code generation requests
//!
//! Builds the (system, user) prompt pair from a "write ..." command, asks the
//! generator, and pulls the first fenced block out of the reply. Building is
//! synchronous; only the clipboard read and the generator call suspend.

use super::normalize::Token;
use super::state::InterpreterSession;
use crate::clipboard::ClipboardReader;
use crate::editor::{EditorSurface, TextEdit};
use crate::error::{CommandError, Result};
use crate::llm::CodeGenerator;
use regex::Regex;
use std::sync::OnceLock;

/// Leading tokens that route to generation
pub const GENERATION_TRIGGERS: &[&str] = &["write", "using", "with"];

/// Leading tokens that pull clipboard text in as context
const CONTEXT_TRIGGERS: &[&str] = &["using", "with"];

static CONTEXT_TOGGLE_RE: OnceLock<Regex> = OnceLock::new();
static FENCED_BLOCK_RE: OnceLock<Regex> = OnceLock::new();

fn context_toggle_re() -> &'static Regex {
    CONTEXT_TOGGLE_RE.get_or_init(|| {
        Regex::new(r"\b(?:without|with|using) context\b").expect("toggle pattern is valid")
    })
}

fn fenced_block_re() -> &'static Regex {
    // Optional language tag on the opening fence, shortest body wins
    FENCED_BLOCK_RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:[\w+#.-]*[ \t]*\r?\n)?(.*?)```").expect("fence pattern is valid")
    })
}

fn system_prompt(language: &str) -> String {
    format!(
        r#"You are a code generator embedded in a {language} editor.

- Reply with {language} code only.
- Wrap the code in exactly one fenced code block.
- Do not write explanations, notes, or any text outside the code block.
- If context is provided, treat it as existing code the new code must fit with."#
    )
}

/// A prompt ready to send, minus the clipboard context that is fetched
/// when the request runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub command: String,
    pub use_clipboard: bool,
}

impl GenerationRequest {
    pub fn build(tokens: &[Token], language: &str) -> Result<Self> {
        let use_clipboard = tokens
            .first()
            .is_some_and(|t| CONTEXT_TRIGGERS.contains(&t.as_str()));

        let joined = tokens.join(" ");
        let stripped = context_toggle_re().replace_all(&joined, " ");
        let command = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        if command.is_empty() {
            return Err(CommandError::missing("Nothing to generate"));
        }

        Ok(Self {
            system_prompt: system_prompt(language),
            command,
            use_clipboard,
        })
    }

    /// User prompt with optional labeled context
    pub fn user_prompt(&self, context: Option<&str>) -> String {
        match context.map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => format!("{}\n\nContext:\n{}", self.command, context),
            None => self.command.clone(),
        }
    }

    /// Fetch context, call the generator and extract the code
    pub async fn run(
        &self,
        clipboard: &dyn ClipboardReader,
        generator: &dyn CodeGenerator,
    ) -> Result<String> {
        let context = if self.use_clipboard {
            match clipboard.read_text().await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!("clipboard unavailable, generating without context: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let user_prompt = self.user_prompt(context.as_deref());
        tracing::info!(
            command = %self.command,
            with_context = context.is_some(),
            "requesting code"
        );

        let response = generator.generate(&self.system_prompt, &user_prompt).await?;
        if response.trim().is_empty() {
            return Err(CommandError::Generation("empty response".into()));
        }
        extract_code_block(&response).ok_or(CommandError::MalformedResponse)
    }
}

/// Inner text of the first fenced block, trimmed
pub fn extract_code_block(response: &str) -> Option<String> {
    let caps = fenced_block_re().captures(response)?;
    let code = caps.get(1)?.as_str().trim();
    (!code.is_empty()).then(|| code.to_string())
}

/// Replace the selection with generated code and remember it
pub fn apply_generated(
    code: String,
    session: &mut InterpreterSession,
    editor: &mut dyn EditorSurface,
) -> Result<()> {
    let selection = editor.selection();
    editor.apply_edit(TextEdit::replace(selection, code.clone()))?;
    session.last_snippet = Some(code);
    Ok(())
}

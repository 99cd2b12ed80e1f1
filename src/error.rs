//! Error taxonomy for command interpretation
//!
//! Every variant is non-fatal: the dispatcher turns it into a user-visible
//! message and leaves the document untouched.

use thiserror::Error;

/// Which handler rejected an unroutable command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFamily {
    Goto,
    Other,
}

impl std::fmt::Display for CommandFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandFamily::Goto => write!(f, "goto"),
            CommandFamily::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    /// No grammar entry matched
    #[error("Unsupported {family} command: {command}")]
    Unsupported {
        family: CommandFamily,
        command: String,
    },

    /// Required editor, selection or snippet state is absent
    #[error("{0}")]
    MissingContext(String),

    #[error("Word not found: {0}")]
    WordNotFound(String),

    #[error("Line {requested} is out of range (document has {line_count} lines)")]
    LineOutOfRange { requested: usize, line_count: usize },

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Code generation failed: {0}")]
    Generation(String),

    #[error("Generated response contained no fenced code block")]
    MalformedResponse,

    #[error("Edit rejected: {0}")]
    Edit(String),

    #[error("Host action failed: {0}")]
    Host(String),

    /// Unexpected failure inside a handler
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommandError {
    pub fn unsupported(family: CommandFamily, command: impl Into<String>) -> Self {
        CommandError::Unsupported {
            family,
            command: command.into(),
        }
    }

    pub fn missing(what: impl Into<String>) -> Self {
        CommandError::MissingContext(what.into())
    }
}

pub type Result<T, E = CommandError> = std::result::Result<T, E>;

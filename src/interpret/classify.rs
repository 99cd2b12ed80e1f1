//! Command family selection from the leading token

use super::generate::GENERATION_TRIGGERS;
use super::normalize::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Halt recording
    Stop,
    /// Run the active document
    Compile,
    /// Navigation; arguments follow the leading "goto"
    Goto,
    /// Code generation; the full token sequence is kept
    Generate,
    /// Fixed phrase, including the empty command
    Other,
}

/// Only `tokens[0]` is inspected
pub fn classify(tokens: &[Token]) -> CommandKind {
    match tokens.first().map(String::as_str) {
        Some("stop") => CommandKind::Stop,
        Some("compile") => CommandKind::Compile,
        Some("goto") => CommandKind::Goto,
        Some(first) if GENERATION_TRIGGERS.contains(&first) => CommandKind::Generate,
        _ => CommandKind::Other,
    }
}

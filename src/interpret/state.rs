//! Interpreter state carried between utterances

use crate::editor::Position;

/// Granularity remembered for elliptical "next"/"previous"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MoveUnit {
    Line,
    #[default]
    Word,
}

impl MoveUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveUnit::Line => "line",
            MoveUnit::Word => "word",
        }
    }
}

/// All mutable interpreter state. One session per document; passed
/// explicitly into every dispatch.
#[derive(Debug, Clone, Default)]
pub struct InterpreterSession {
    /// Set only by explicit-unit directional moves
    pub last_unit: MoveUnit,
    pub selection_start: Option<Position>,
    pub selection_end: Option<Position>,
    /// Most recent generated snippet, for "paste previous"
    pub last_snippet: Option<String>,
}

impl InterpreterSession {
    pub fn new() -> Self {
        Self::default()
    }
}

//! Spatial navigation ("goto ...")
//!
//! Commands resolve against an ordered grammar: exact phrases first, then
//! parametrized shapes, so "line end" never parses as "line <N>" or as a
//! literal word. A bare "next"/"previous" borrows the remembered unit.

use super::normalize::Token;
use super::state::{InterpreterSession, MoveUnit};
use crate::editor::{byte_offset, char_column, EditorSurface, Position, Range};
use crate::error::{CommandError, CommandFamily, Result};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Motion {
    NextLine,
    PreviousLine,
    /// One-based line number as spoken
    Line(usize),
    LineEnd,
    LineStart,
    DocumentEnd,
    DocumentStart,
    NextWord,
    PreviousWord,
    /// Literal word on the current line
    Word(String),
}

impl Motion {
    /// Unit memory update applied after a successful move
    pub fn unit(&self) -> Option<MoveUnit> {
        match self {
            Motion::NextLine | Motion::PreviousLine => Some(MoveUnit::Line),
            Motion::NextWord | Motion::PreviousWord | Motion::Word(_) => Some(MoveUnit::Word),
            _ => None,
        }
    }
}

type PatternFn = fn(&str) -> Option<Motion>;

pub struct Navigator {
    exact: Vec<(&'static str, Motion)>,
    patterns: Vec<(&'static str, PatternFn)>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

static NEXT_WORD_RE: OnceLock<Regex> = OnceLock::new();
static PREVIOUS_WORD_RE: OnceLock<Regex> = OnceLock::new();

fn next_word_re() -> &'static Regex {
    NEXT_WORD_RE.get_or_init(|| Regex::new(r"\w+").expect("word pattern is valid"))
}

fn previous_word_re() -> &'static Regex {
    // Word plus the non-word run trailing it, anchored at the cursor
    PREVIOUS_WORD_RE.get_or_init(|| Regex::new(r"\w+\W*$").expect("word pattern is valid"))
}

impl Navigator {
    pub fn new() -> Self {
        let exact = vec![
            ("next line", Motion::NextLine),
            ("previous line", Motion::PreviousLine),
            ("line end", Motion::LineEnd),
            ("line start", Motion::LineStart),
            ("document end", Motion::DocumentEnd),
            ("document start", Motion::DocumentStart),
            ("next word", Motion::NextWord),
            ("previous word", Motion::PreviousWord),
        ];

        let patterns: Vec<(&'static str, PatternFn)> = vec![
            ("line <N>", parse_line_number),
            ("<word>", parse_single_word),
        ];

        Self { exact, patterns }
    }

    /// Resolve the tokens following "goto" into a motion
    pub fn resolve(&self, args: &[Token], last_unit: MoveUnit) -> Option<Motion> {
        let mut command = args.join(" ").to_lowercase();
        if command == "next" || command == "previous" {
            command = format!("{} {}", command, last_unit.as_str());
        }

        if let Some((_, motion)) = self.exact.iter().find(|(phrase, _)| *phrase == command) {
            return Some(motion.clone());
        }

        self.patterns.iter().find_map(|(_, parse)| parse(&command))
    }

    /// Resolve and perform a goto command. Unit memory changes only when the
    /// move succeeds.
    pub fn execute(
        &self,
        args: &[Token],
        session: &mut InterpreterSession,
        editor: &mut dyn EditorSurface,
    ) -> Result<Motion> {
        let motion = self.resolve(args, session.last_unit).ok_or_else(|| {
            CommandError::unsupported(CommandFamily::Goto, format!("goto {}", args.join(" ")))
        })?;

        let target = target_for(&motion, editor)?;
        if let Some(target) = target {
            editor.set_cursor(target);
            editor.reveal(Range::collapsed(target));
        }

        if let Some(unit) = motion.unit() {
            session.last_unit = unit;
        }
        tracing::debug!(?motion, cursor = %editor.cursor(), "navigated");
        Ok(motion)
    }
}

fn parse_line_number(command: &str) -> Option<Motion> {
    let number = command.strip_prefix("line ")?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse().ok().map(Motion::Line)
}

fn parse_single_word(command: &str) -> Option<Motion> {
    if command.is_empty() || command.contains(char::is_whitespace) {
        return None;
    }
    Some(Motion::Word(command.to_string()))
}

/// Where `motion` lands; `None` for a boundary no-op
fn target_for(motion: &Motion, editor: &dyn EditorSurface) -> Result<Option<Position>> {
    let cursor = editor.cursor();
    let line_count = editor.line_count();

    let target = match motion {
        Motion::NextLine => {
            (cursor.line + 1 < line_count).then(|| Position::new(cursor.line + 1, 0))
        }
        Motion::PreviousLine => (cursor.line > 0).then(|| Position::new(cursor.line - 1, 0)),
        Motion::Line(number) => {
            if *number == 0 || *number > line_count {
                return Err(CommandError::LineOutOfRange {
                    requested: *number,
                    line_count,
                });
            }
            Some(Position::new(number - 1, 0))
        }
        Motion::LineEnd => Some(Position::new(cursor.line, editor.line_len(cursor.line))),
        Motion::LineStart => Some(Position::new(cursor.line, 0)),
        Motion::DocumentEnd => Some(editor.document_end()),
        Motion::DocumentStart => Some(Position::new(0, 0)),
        Motion::NextWord => {
            let line = editor.line(cursor.line).unwrap_or("");
            let from = byte_offset(line, cursor.column);
            let found = next_word_re()
                .find_at(line, from)
                .ok_or_else(|| CommandError::WordNotFound("no next word on this line".into()))?;
            Some(Position::new(cursor.line, char_column(line, found.end())))
        }
        Motion::PreviousWord => {
            let line = editor.line(cursor.line).unwrap_or("");
            let before = &line[..byte_offset(line, cursor.column)];
            let found = previous_word_re().find(before).ok_or_else(|| {
                CommandError::WordNotFound("no previous word on this line".into())
            })?;
            Some(Position::new(cursor.line, char_column(line, found.start())))
        }
        Motion::Word(word) => {
            let line = editor.line(cursor.line).unwrap_or("");
            let from = byte_offset(line, cursor.column);
            let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
            let re = Regex::new(&pattern).map_err(|e| CommandError::Internal(e.to_string()))?;
            let found = re
                .find_at(line, from)
                .ok_or_else(|| CommandError::WordNotFound(word.clone()))?;
            Some(Position::new(cursor.line, char_column(line, found.end())))
        }
    };

    Ok(target)
}

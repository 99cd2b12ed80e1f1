//! Editor capability surface
//!
//! The interpreter only talks to the document through [`EditorSurface`].
//! Positions are zero-based `(line, column)` pairs where the column counts
//! characters, not bytes.

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A span between two positions. `start` may come after `end`; the
/// surface treats the pair as describing the same characters either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub const fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Start and end in document order
    pub fn ordered(&self) -> (Position, Position) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }
}

/// One atomic replacement: the text in `range` becomes `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub text: String,
}

impl TextEdit {
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self {
            range: Range::collapsed(at),
            text: text.into(),
        }
    }

    pub fn delete(range: Range) -> Self {
        Self {
            range,
            text: String::new(),
        }
    }

    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// Capabilities the interpreter needs from a host editor.
///
/// Edits go through [`EditorSurface::apply_edit`], which must apply the whole
/// edit or nothing. Named host actions each get their own method.
pub trait EditorSurface: Send {
    /// Language of the active document, `None` when no document is open
    fn language_id(&self) -> Option<&str>;

    fn line_count(&self) -> usize;

    /// Text of a line without its terminator
    fn line(&self, index: usize) -> Option<&str>;

    fn text(&self) -> String;

    /// Active end of the selection
    fn cursor(&self) -> Position;

    fn set_cursor(&mut self, position: Position);

    fn selection(&self) -> Range;

    fn set_selection(&mut self, range: Range);

    /// Scroll so that `range` is visible
    fn reveal(&mut self, range: Range);

    /// Apply an edit atomically; on success the cursor sits after the
    /// inserted text
    fn apply_edit(&mut self, edit: TextEdit) -> Result<()>;

    fn undo(&mut self) -> Result<()>;
    fn redo(&mut self) -> Result<()>;
    fn copy(&mut self) -> Result<()>;
    fn cut(&mut self) -> Result<()>;
    fn paste(&mut self) -> Result<()>;
    fn select_all(&mut self) -> Result<()>;
    fn format_document(&mut self) -> Result<()>;
    fn toggle_line_comment(&mut self) -> Result<()>;

    /// Run or debug the active document
    fn run_active_document(&mut self) -> Result<()>;

    /// Character length of a line, zero for lines past the end
    fn line_len(&self, index: usize) -> usize {
        self.line(index).map(|l| l.chars().count()).unwrap_or(0)
    }

    /// Position just past the last character of the document
    fn document_end(&self) -> Position {
        let last = self.line_count().saturating_sub(1);
        Position::new(last, self.line_len(last))
    }
}

/// Convert a character column to a byte offset within `line`
pub fn byte_offset(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

/// Convert a byte offset within `line` to a character column
pub fn char_column(line: &str, offset: usize) -> usize {
    line[..offset.min(line.len())].chars().count()
}

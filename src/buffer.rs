//! In-memory document implementing [`EditorSurface`]
//!
//! Lines are stored without terminators. Every edit is validated before it
//! touches the lines and is recorded as one undo snapshot, so an edit either
//! applies completely or not at all.

use crate::clipboard::{ClipboardStore, LocalClipboard};
use crate::editor::{byte_offset, EditorSurface, Position, Range, TextEdit};
use crate::error::{CommandError, Result};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::Arc;
use std::thread;

#[derive(Clone)]
struct Snapshot {
    lines: Vec<String>,
    selection: Range,
}

pub struct TextBuffer {
    path: Option<PathBuf>,
    language: String,
    lines: Vec<String>,
    /// `start` is the anchor, `end` the cursor
    selection: Range,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    clipboard: Arc<dyn ClipboardStore>,
    interpreters: HashMap<String, String>,
    revealed: Option<Range>,
}

/// Language id for a file extension
pub fn language_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "py" | "pyw" => "python",
        "rs" => "rust",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" => "typescript",
        "c" | "h" => "c",
        "cc" | "cpp" | "hpp" | "cxx" => "cpp",
        "java" => "java",
        "go" => "go",
        "sh" | "bash" => "shellscript",
        "toml" => "toml",
        "yml" | "yaml" => "yaml",
        _ => "plaintext",
    }
}

fn comment_prefix(language: &str) -> Option<&'static str> {
    match language {
        "python" | "shellscript" | "toml" | "yaml" => Some("#"),
        "rust" | "javascript" | "typescript" | "c" | "cpp" | "java" | "go" => Some("//"),
        _ => None,
    }
}

impl TextBuffer {
    pub fn from_text(text: &str, language: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        Self {
            path: None,
            language: language.to_string(),
            lines,
            selection: Range::default(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            clipboard: Arc::new(LocalClipboard::new()),
            interpreters: HashMap::new(),
            revealed: None,
        }
    }

    /// Open a file; a missing file starts as an empty document
    pub fn open(path: &Path) -> io::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        let language = path
            .extension()
            .and_then(|e| e.to_str())
            .map(language_for_extension)
            .unwrap_or("plaintext");

        let mut buffer = Self::from_text(&text, language);
        buffer.path = Some(path.to_path_buf());
        Ok(buffer)
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn ClipboardStore>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Interpreters for "run", keyed by language id
    pub fn with_interpreters(mut self, interpreters: HashMap<String, String>) -> Self {
        self.interpreters = interpreters;
        self
    }

    pub fn revealed(&self) -> Option<Range> {
        self.revealed
    }

    pub fn save(&self) -> io::Result<()> {
        match &self.path {
            Some(path) => fs::write(path, self.text()),
            None => Ok(()),
        }
    }

    fn clamp(&self, position: Position) -> Position {
        let line = position.line.min(self.lines.len() - 1);
        Position::new(line, position.column.min(self.line_len(line)))
    }

    fn validate(&self, position: Position) -> Result<()> {
        match self.lines.get(position.line) {
            Some(line) if position.column <= line.chars().count() => Ok(()),
            _ => Err(CommandError::Edit(format!("position {} is outside the document", position))),
        }
    }

    /// Byte offset of `position` in the joined text
    fn offset_of(&self, position: Position) -> usize {
        let before: usize = self.lines[..position.line].iter().map(|l| l.len() + 1).sum();
        before + byte_offset(&self.lines[position.line], position.column)
    }

    fn position_of(text: &str, offset: usize) -> Position {
        let before = &text[..offset];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Position::new(line, before[line_start..].chars().count())
    }

    fn text_in(&self, range: Range) -> String {
        let (start, end) = range.ordered();
        let text = self.text();
        text[self.offset_of(start)..self.offset_of(end)].to_string()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            lines: self.lines.clone(),
            selection: self.selection,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.lines = snapshot.lines;
        self.selection = snapshot.selection;
    }

    /// Record an undo point for a change about to be committed
    fn checkpoint(&mut self) {
        self.undo_stack.push(self.snapshot());
        self.redo_stack.clear();
    }

    fn set_lines(&mut self, text: &str) {
        self.lines = text.split('\n').map(String::from).collect();
    }
}

impl EditorSurface for TextBuffer {
    fn language_id(&self) -> Option<&str> {
        Some(&self.language)
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn cursor(&self) -> Position {
        self.selection.end
    }

    fn set_cursor(&mut self, position: Position) {
        self.selection = Range::collapsed(self.clamp(position));
    }

    fn selection(&self) -> Range {
        self.selection
    }

    fn set_selection(&mut self, range: Range) {
        self.selection = Range::new(self.clamp(range.start), self.clamp(range.end));
    }

    fn reveal(&mut self, range: Range) {
        self.revealed = Some(range);
    }

    fn apply_edit(&mut self, edit: TextEdit) -> Result<()> {
        self.validate(edit.range.start)?;
        self.validate(edit.range.end)?;

        let (start, end) = edit.range.ordered();
        let (from, to) = (self.offset_of(start), self.offset_of(end));
        let mut text = self.text();
        text.replace_range(from..to, &edit.text);

        self.checkpoint();
        self.set_lines(&text);
        self.selection = Range::collapsed(Self::position_of(&text, from + edit.text.len()));
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        if let Some(previous) = self.undo_stack.pop() {
            self.redo_stack.push(self.snapshot());
            self.restore(previous);
        }
        Ok(())
    }

    fn redo(&mut self) -> Result<()> {
        if let Some(next) = self.redo_stack.pop() {
            self.undo_stack.push(self.snapshot());
            self.restore(next);
        }
        Ok(())
    }

    fn copy(&mut self) -> Result<()> {
        if self.selection.is_empty() {
            return Ok(());
        }
        self.clipboard.set_text(&self.text_in(self.selection))
    }

    fn cut(&mut self) -> Result<()> {
        if self.selection.is_empty() {
            return Ok(());
        }
        self.copy()?;
        self.apply_edit(TextEdit::delete(self.selection))
    }

    fn paste(&mut self) -> Result<()> {
        let text = self.clipboard.get_text()?;
        if text.is_empty() {
            return Ok(());
        }
        self.apply_edit(TextEdit::replace(self.selection, text))
    }

    fn select_all(&mut self) -> Result<()> {
        self.selection = Range::new(Position::new(0, 0), self.document_end());
        Ok(())
    }

    fn format_document(&mut self) -> Result<()> {
        let mut formatted: Vec<String> =
            self.lines.iter().map(|l| l.trim_end().to_string()).collect();
        while formatted.len() > 1 && formatted.last().is_some_and(|l| l.is_empty()) {
            formatted.pop();
        }
        formatted.push(String::new());

        if formatted != self.lines {
            self.checkpoint();
            self.lines = formatted;
            let cursor = self.clamp(self.selection.end);
            self.selection = Range::collapsed(cursor);
        }
        Ok(())
    }

    fn toggle_line_comment(&mut self) -> Result<()> {
        let prefix = comment_prefix(&self.language).ok_or_else(|| {
            CommandError::Host(format!("no line comment syntax for {}", self.language))
        })?;
        let cursor = self.cursor();
        let line = &self.lines[cursor.line];
        let indent = line.len() - line.trim_start().len();
        let body = &line[indent..];

        let toggled = match body.strip_prefix(prefix) {
            Some(rest) => format!("{}{}", &line[..indent], rest.strip_prefix(' ').unwrap_or(rest)),
            None => format!("{}{} {}", &line[..indent], prefix, body),
        };

        let range = Range::new(
            Position::new(cursor.line, 0),
            Position::new(cursor.line, self.line_len(cursor.line)),
        );
        self.apply_edit(TextEdit::replace(range, toggled))?;
        self.set_cursor(cursor);
        Ok(())
    }

    fn run_active_document(&mut self) -> Result<()> {
        let interpreter = self.interpreters.get(&self.language).cloned().ok_or_else(|| {
            CommandError::Host(format!("cannot run {} files", self.language))
        })?;
        let path = self
            .path
            .clone()
            .ok_or_else(|| CommandError::missing("Document has no file on disk"))?;

        self.save()
            .map_err(|e| CommandError::Host(format!("save failed: {}", e)))?;
        tracing::info!("running {} {}", interpreter, path.display());
        let child = Command::new(&interpreter)
            .arg(&path)
            .spawn()
            .map_err(|e| CommandError::Host(format!("failed to start {}: {}", interpreter, e)))?;
        reap(child, interpreter);
        Ok(())
    }
}

/// Wait for a spawned run in the background so it never lingers as a zombie
fn reap(mut child: Child, label: String) -> thread::JoinHandle<()> {
    thread::spawn(move || match child.wait() {
        Ok(status) if status.success() => tracing::info!("{} finished", label),
        Ok(status) => tracing::warn!("{} exited with {}", label, status),
        Err(e) => tracing::warn!("failed to wait for {}: {}", label, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_moves_cursor_after_insert() {
        let mut buffer = TextBuffer::from_text("ab\ncd", "python");
        buffer
            .apply_edit(TextEdit::insert(Position::new(1, 1), "x\ny"))
            .unwrap();
        assert_eq!(buffer.text(), "ab\ncx\nyd");
        assert_eq!(buffer.cursor(), Position::new(2, 1));
    }

    #[test]
    fn test_invalid_edit_leaves_buffer_untouched() {
        let mut buffer = TextBuffer::from_text("abc", "python");
        let err = buffer
            .apply_edit(TextEdit::delete(Range::new(Position::new(0, 1), Position::new(3, 0))))
            .unwrap_err();
        assert!(matches!(err, CommandError::Edit(_)));
        assert_eq!(buffer.text(), "abc");
        buffer.undo().unwrap();
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_reversed_range_edits_same_span() {
        let mut buffer = TextBuffer::from_text("hello world", "python");
        buffer
            .apply_edit(TextEdit::replace(
                Range::new(Position::new(0, 11), Position::new(0, 6)),
                "there",
            ))
            .unwrap();
        assert_eq!(buffer.text(), "hello there");
    }

    #[test]
    fn test_undo_redo() {
        let mut buffer = TextBuffer::from_text("one", "python");
        buffer.apply_edit(TextEdit::insert(Position::new(0, 3), " two")).unwrap();
        buffer.undo().unwrap();
        assert_eq!(buffer.text(), "one");
        buffer.redo().unwrap();
        assert_eq!(buffer.text(), "one two");
    }

    #[test]
    fn test_cut_and_paste() {
        let clipboard = LocalClipboard::new();
        let mut buffer = TextBuffer::from_text("alpha beta", "python")
            .with_clipboard(Arc::new(clipboard.clone()));
        buffer.set_selection(Range::new(Position::new(0, 0), Position::new(0, 6)));
        buffer.cut().unwrap();
        assert_eq!(buffer.text(), "beta");
        assert_eq!(clipboard.get_text().unwrap(), "alpha ");

        buffer.set_cursor(Position::new(0, 4));
        buffer.paste().unwrap();
        assert_eq!(buffer.text(), "betaalpha ");
    }

    #[test]
    fn test_toggle_comment_round_trip() {
        let mut buffer = TextBuffer::from_text("    x = 1", "python");
        buffer.set_cursor(Position::new(0, 6));
        buffer.toggle_line_comment().unwrap();
        assert_eq!(buffer.text(), "    # x = 1");
        buffer.toggle_line_comment().unwrap();
        assert_eq!(buffer.text(), "    x = 1");

        let mut plain = TextBuffer::from_text("notes", "plaintext");
        assert!(matches!(plain.toggle_line_comment(), Err(CommandError::Host(_))));
    }

    #[test]
    fn test_format_document() {
        let mut buffer = TextBuffer::from_text("x = 1   \ny = 2\t\n\n\n", "python");
        buffer.format_document().unwrap();
        assert_eq!(buffer.text(), "x = 1\ny = 2\n");
    }

    #[test]
    fn test_run_requires_known_language() {
        let mut buffer = TextBuffer::from_text("fn main() {}", "rust");
        let err = buffer.run_active_document().unwrap_err();
        assert_eq!(err.to_string(), "Host action failed: cannot run rust files");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_waits_for_child() {
        let path = std::env::temp_dir().join(format!("voxedit-run-{}.py", std::process::id()));
        let mut buffer = TextBuffer::open(&path)
            .unwrap()
            .with_interpreters(HashMap::from([("python".to_string(), "true".to_string())]));
        buffer.apply_edit(TextEdit::insert(Position::new(0, 0), "pass")).unwrap();
        buffer.run_active_document().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "pass");

        // The waiter returns only once the child has been collected
        let child = Command::new("true").spawn().unwrap();
        reap(child, "true".into()).join().unwrap();
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(language_for_extension("PY"), "python");
        assert_eq!(language_for_extension("rs"), "rust");
        assert_eq!(language_for_extension("weird"), "plaintext");
    }
}

//! Fixed-phrase editing commands
//!
//! A closed table from exact command strings to primitive edits, plus the
//! single parametrized shape `select from <A> to <B>`. Exact entries are
//! consulted first.

use super::normalize::Token;
use super::state::InterpreterSession;
use crate::editor::{EditorSurface, Position, Range, TextEdit};
use crate::error::{CommandError, CommandFamily, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseAction {
    Copy,
    CopyLine,
    Cut,
    Paste,
    PastePrevious,
    Undo,
    Redo,
    Delete,
    DeleteLine,
    NewLine,
    FormatDocument,
    CommentLine,
    SelectAll,
    SelectLine,
    StartSelection,
    EndSelection,
    /// Zero-based line indices as spoken
    SelectLines { from: usize, to: usize },
}

type PatternFn = fn(&[&str]) -> Option<PhraseAction>;

pub struct PhraseDispatcher {
    exact: Vec<(&'static str, PhraseAction)>,
    patterns: Vec<(&'static str, PatternFn)>,
}

impl Default for PhraseDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseDispatcher {
    pub fn new() -> Self {
        let exact = vec![
            ("copy", PhraseAction::Copy),
            ("copy line", PhraseAction::CopyLine),
            ("cut", PhraseAction::Cut),
            ("paste", PhraseAction::Paste),
            ("paste previous", PhraseAction::PastePrevious),
            ("undo", PhraseAction::Undo),
            // Common mis-transcription of "undo"
            ("and do", PhraseAction::Undo),
            ("redo", PhraseAction::Redo),
            ("delete", PhraseAction::Delete),
            ("delete line", PhraseAction::DeleteLine),
            ("new line", PhraseAction::NewLine),
            ("format document", PhraseAction::FormatDocument),
            ("comment line", PhraseAction::CommentLine),
            ("select all", PhraseAction::SelectAll),
            ("select line", PhraseAction::SelectLine),
            ("start selection", PhraseAction::StartSelection),
            ("end selection", PhraseAction::EndSelection),
        ];

        let patterns: Vec<(&'static str, PatternFn)> =
            vec![("select from <A> to <B>", parse_select_range)];

        Self { exact, patterns }
    }

    pub fn resolve(&self, tokens: &[Token]) -> Option<PhraseAction> {
        let command = tokens.join(" ").to_lowercase();
        if let Some((_, action)) = self.exact.iter().find(|(phrase, _)| *phrase == command) {
            return Some(*action);
        }

        let words: Vec<&str> = command.split(' ').collect();
        self.patterns.iter().find_map(|(_, parse)| parse(&words))
    }

    /// Run a fixed-phrase command. `Ok(None)` means the input was empty.
    pub fn execute(
        &self,
        tokens: &[Token],
        session: &mut InterpreterSession,
        editor: &mut dyn EditorSurface,
    ) -> Result<Option<PhraseAction>> {
        if tokens.is_empty() {
            return Ok(None);
        }

        let action = self.resolve(tokens).ok_or_else(|| {
            CommandError::unsupported(CommandFamily::Other, tokens.join(" "))
        })?;

        perform(action, session, editor)?;
        tracing::debug!(?action, "phrase executed");
        Ok(Some(action))
    }
}

fn parse_select_range(words: &[&str]) -> Option<PhraseAction> {
    match words {
        ["select", "from", from, "to", to] => Some(PhraseAction::SelectLines {
            from: parse_index(from)?,
            to: parse_index(to)?,
        }),
        _ => None,
    }
}

fn parse_index(word: &str) -> Option<usize> {
    if word.is_empty() || !word.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    word.parse().ok()
}

/// Full range of `line` including its terminator when one follows
fn line_with_terminator(editor: &dyn EditorSurface, line: usize) -> Range {
    if line + 1 < editor.line_count() {
        Range::new(Position::new(line, 0), Position::new(line + 1, 0))
    } else if line > 0 {
        // Last line: take the terminator in front of it instead
        let previous = line - 1;
        Range::new(
            Position::new(previous, editor.line_len(previous)),
            Position::new(line, editor.line_len(line)),
        )
    } else {
        Range::new(Position::new(0, 0), Position::new(0, editor.line_len(0)))
    }
}

fn perform(
    action: PhraseAction,
    session: &mut InterpreterSession,
    editor: &mut dyn EditorSurface,
) -> Result<()> {
    let cursor = editor.cursor();

    match action {
        PhraseAction::Copy => editor.copy(),
        PhraseAction::Cut => editor.cut(),
        PhraseAction::Paste => editor.paste(),
        PhraseAction::Undo => editor.undo(),
        PhraseAction::Redo => editor.redo(),
        PhraseAction::FormatDocument => editor.format_document(),
        PhraseAction::CommentLine => editor.toggle_line_comment(),
        PhraseAction::SelectAll => editor.select_all(),

        PhraseAction::CopyLine => {
            let previous = editor.selection();
            let end = if cursor.line + 1 < editor.line_count() {
                Position::new(cursor.line + 1, 0)
            } else {
                Position::new(cursor.line, editor.line_len(cursor.line))
            };
            editor.set_selection(Range::new(Position::new(cursor.line, 0), end));
            let copied = editor.copy();
            editor.set_selection(previous);
            copied
        }

        PhraseAction::PastePrevious => {
            let snippet = session
                .last_snippet
                .clone()
                .ok_or_else(|| CommandError::missing("No generated code to paste yet"))?;
            editor.apply_edit(TextEdit::insert(cursor, snippet))
        }

        PhraseAction::Delete => {
            let selection = editor.selection();
            if selection.is_empty() {
                return Ok(());
            }
            editor.apply_edit(TextEdit::delete(selection))
        }

        PhraseAction::DeleteLine => {
            let range = line_with_terminator(editor, cursor.line);
            editor.apply_edit(TextEdit::delete(range))
        }

        PhraseAction::NewLine => editor.apply_edit(TextEdit::insert(cursor, "\n")),

        PhraseAction::SelectLine => {
            let end = Position::new(cursor.line, editor.line_len(cursor.line));
            editor.set_selection(Range::new(Position::new(cursor.line, 0), end));
            Ok(())
        }

        PhraseAction::StartSelection => {
            session.selection_start = Some(cursor);
            // One-character highlight as feedback; the active end stays on the anchor
            let end_column = (cursor.column + 1).min(editor.line_len(cursor.line));
            editor.set_selection(Range::new(Position::new(cursor.line, end_column), cursor));
            Ok(())
        }

        PhraseAction::EndSelection => {
            let start = session.selection_start.ok_or_else(|| {
                CommandError::missing("Selection start not set, say \"start selection\" first")
            })?;
            session.selection_end = Some(cursor);
            editor.set_selection(Range::new(start, cursor));
            Ok(())
        }

        PhraseAction::SelectLines { from, to } => {
            let line_count = editor.line_count();
            if from >= line_count {
                return Err(CommandError::LineOutOfRange {
                    requested: from,
                    line_count,
                });
            }
            let end = if to.saturating_add(1) < line_count {
                Position::new(to + 1, 0)
            } else {
                editor.document_end()
            };
            let range = Range::new(Position::new(from, 0), end);
            editor.set_selection(range);
            editor.reveal(range);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::clipboard::{ClipboardStore, LocalClipboard};
    use std::sync::Arc;

    fn tokens(command: &str) -> Vec<Token> {
        command.split_whitespace().map(String::from).collect()
    }

    fn run(
        command: &str,
        session: &mut InterpreterSession,
        editor: &mut TextBuffer,
    ) -> Result<Option<PhraseAction>> {
        PhraseDispatcher::new().execute(&tokens(command), session, editor)
    }

    #[test]
    fn test_resolve_table() {
        let phrases = PhraseDispatcher::new();
        assert_eq!(phrases.resolve(&tokens("and do")), Some(PhraseAction::Undo));
        assert_eq!(phrases.resolve(&tokens("delete line")), Some(PhraseAction::DeleteLine));
        assert_eq!(
            phrases.resolve(&tokens("select from 2 to 4")),
            Some(PhraseAction::SelectLines { from: 2, to: 4 })
        );
        assert_eq!(phrases.resolve(&tokens("select from two to 4")), None);
        assert_eq!(phrases.resolve(&tokens("dance")), None);
    }

    #[test]
    fn test_empty_is_noop() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("x", "python");
        assert_eq!(run("", &mut session, &mut editor).unwrap(), None);
    }

    #[test]
    fn test_unsupported_other() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("x", "python");
        let err = run("make coffee", &mut session, &mut editor).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported other command: make coffee");
        assert_eq!(editor.text(), "x");
    }

    #[test]
    fn test_delete_line_middle_and_last() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("a\nb\nc", "python");

        editor.set_cursor(Position::new(1, 0));
        run("delete line", &mut session, &mut editor).unwrap();
        assert_eq!(editor.text(), "a\nc");

        editor.set_cursor(Position::new(1, 1));
        run("delete line", &mut session, &mut editor).unwrap();
        assert_eq!(editor.text(), "a");

        run("delete line", &mut session, &mut editor).unwrap();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_new_line_and_delete_selection() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("abcdef", "python");
        editor.set_cursor(Position::new(0, 3));
        run("new line", &mut session, &mut editor).unwrap();
        assert_eq!(editor.text(), "abc\ndef");
        assert_eq!(editor.cursor(), Position::new(1, 0));

        editor.set_selection(Range::new(Position::new(0, 1), Position::new(1, 1)));
        run("delete", &mut session, &mut editor).unwrap();
        assert_eq!(editor.text(), "aef");

        // Nothing selected: nothing happens
        run("delete", &mut session, &mut editor).unwrap();
        assert_eq!(editor.text(), "aef");
    }

    #[test]
    fn test_selection_anchors() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("first line\nsecond line", "python");

        editor.set_cursor(Position::new(0, 6));
        run("start selection", &mut session, &mut editor).unwrap();
        assert_eq!(
            editor.selection(),
            Range::new(Position::new(0, 7), Position::new(0, 6))
        );
        assert_eq!(editor.cursor(), Position::new(0, 6));

        editor.set_cursor(Position::new(1, 6));
        run("end selection", &mut session, &mut editor).unwrap();
        assert_eq!(
            editor.selection(),
            Range::new(Position::new(0, 6), Position::new(1, 6))
        );
        assert_eq!(session.selection_end, Some(Position::new(1, 6)));
        // The start anchor stays set after ending
        assert_eq!(session.selection_start, Some(Position::new(0, 6)));
    }

    #[test]
    fn test_end_selection_without_start() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("text", "python");
        editor.set_cursor(Position::new(0, 2));
        let err = run("end selection", &mut session, &mut editor).unwrap_err();
        assert!(matches!(err, CommandError::MissingContext(_)));
        assert!(session.selection_end.is_none());
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn test_select_from_to() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("0\n1\n2\n3\n4", "python");
        run("select from 1 to 2", &mut session, &mut editor).unwrap();
        let expected = Range::new(Position::new(1, 0), Position::new(3, 0));
        assert_eq!(editor.selection(), expected);
        assert_eq!(editor.revealed(), Some(expected));

        // End past the last line clamps to the document end
        run("select from 3 to 9", &mut session, &mut editor).unwrap();
        assert_eq!(
            editor.selection(),
            Range::new(Position::new(3, 0), Position::new(4, 1))
        );
        assert_eq!(
            editor.revealed(),
            Some(Range::new(Position::new(3, 0), Position::new(4, 1)))
        );
    }

    #[test]
    fn test_select_to_largest_index_clamps() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("a
b
c", "python");
        let command = format!("select from 0 to {}", usize::MAX);
        assert_eq!(
            run(&command, &mut session, &mut editor).unwrap(),
            Some(PhraseAction::SelectLines { from: 0, to: usize::MAX })
        );
        assert_eq!(
            editor.selection(),
            Range::new(Position::new(0, 0), Position::new(2, 1))
        );
    }

    #[test]
    fn test_start_then_end_selection_in_place() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("a bc", "python");

        run("start selection", &mut session, &mut editor).unwrap();
        assert_eq!(editor.cursor(), Position::new(0, 0));

        run("end selection", &mut session, &mut editor).unwrap();
        assert_eq!(session.selection_end, Some(Position::new(0, 0)));
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn test_select_line() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("a\n  indented\nb", "python");
        editor.set_cursor(Position::new(1, 4));
        run("select line", &mut session, &mut editor).unwrap();
        assert_eq!(
            editor.selection(),
            Range::new(Position::new(1, 0), Position::new(1, 10))
        );
    }

    #[test]
    fn test_paste_previous() {
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("x = ", "python");
        editor.set_cursor(Position::new(0, 4));

        let err = run("paste previous", &mut session, &mut editor).unwrap_err();
        assert!(matches!(err, CommandError::MissingContext(_)));

        session.last_snippet = Some("sum(values)".into());
        run("paste previous", &mut session, &mut editor).unwrap();
        assert_eq!(editor.text(), "x = sum(values)");
    }

    #[test]
    fn test_copy_line_restores_selection() {
        let clipboard = LocalClipboard::new();
        let mut session = InterpreterSession::new();
        let mut editor = TextBuffer::from_text("keep\ncopy me\n", "python")
            .with_clipboard(Arc::new(clipboard.clone()));
        editor.set_cursor(Position::new(1, 2));

        run("copy line", &mut session, &mut editor).unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "copy me\n");
        assert_eq!(editor.cursor(), Position::new(1, 2));
        assert!(editor.selection().is_empty());
    }
}

//! Top-level dispatcher
//!
//! One token sequence per utterance is routed to exactly one handler. Errors
//! and panics from handlers are caught here, logged, and reported through the
//! notifier; dispatch itself never fails.

use super::classify::{classify, CommandKind};
use super::generate::{apply_generated, GenerationRequest};
use super::navigate::{Motion, Navigator};
use super::normalize::{Token, Tokenizer};
use super::phrases::{PhraseAction, PhraseDispatcher};
use super::state::InterpreterSession;
use crate::clipboard::ClipboardReader;
use crate::editor::EditorSurface;
use crate::error::{CommandError, Result};
use crate::llm::CodeGenerator;
use crate::notify::Notifier;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// What a single dispatch did
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    /// Empty utterance
    Empty,
    /// Recording should halt
    Stop,
    Compiled,
    Navigated(Motion),
    Phrase(PhraseAction),
    /// Generation accepted; run it and hand the outcome to
    /// [`Interpreter::complete_generation`]
    Generate(GenerationRequest),
    /// Generated code was inserted
    Generated,
    /// Reported to the user; document untouched
    Failed(String),
}

pub struct Interpreter {
    tokenizer: Tokenizer,
    navigator: Navigator,
    phrases: PhraseDispatcher,
    feedback_duration: Option<Duration>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Tokenizer::default())
    }
}

impl Interpreter {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            navigator: Navigator::new(),
            phrases: PhraseDispatcher::new(),
            feedback_duration: Some(Duration::from_millis(1000)),
        }
    }

    /// How long success messages stay visible
    pub fn with_feedback_duration(mut self, duration: Option<Duration>) -> Self {
        self.feedback_duration = duration;
        self
    }

    pub fn tokenize(&self, raw: &str) -> Vec<Token> {
        self.tokenizer.tokenize(raw)
    }

    /// Tokenize and dispatch one finalized transcript
    pub fn dispatch_transcript(
        &self,
        raw: &str,
        session: &mut InterpreterSession,
        editor: &mut dyn EditorSurface,
        notifier: &dyn Notifier,
    ) -> DispatchResult {
        let tokens = self.tokenize(raw);
        tracing::info!(transcript = raw, ?tokens, "utterance");
        self.dispatch(&tokens, session, editor, notifier)
    }

    #[hotpath::measure]
    pub fn dispatch(
        &self,
        tokens: &[Token],
        session: &mut InterpreterSession,
        editor: &mut dyn EditorSurface,
        notifier: &dyn Notifier,
    ) -> DispatchResult {
        let kind = classify(tokens);
        tracing::debug!(?kind, "classified");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.route(kind, tokens, session, &mut *editor)
        }))
        .unwrap_or_else(|payload| {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            Err(CommandError::Internal(detail))
        });

        match outcome {
            Ok(result) => {
                self.acknowledge(&result, tokens, notifier);
                result
            }
            Err(e) => self.report(e, notifier),
        }
    }

    fn route(
        &self,
        kind: CommandKind,
        tokens: &[Token],
        session: &mut InterpreterSession,
        editor: &mut dyn EditorSurface,
    ) -> Result<DispatchResult> {
        match kind {
            CommandKind::Stop => Ok(DispatchResult::Stop),
            CommandKind::Compile => {
                if editor.language_id().is_none() {
                    return Err(CommandError::missing("No active editor"));
                }
                editor.run_active_document()?;
                Ok(DispatchResult::Compiled)
            }
            CommandKind::Goto => self
                .navigator
                .execute(&tokens[1..], session, editor)
                .map(DispatchResult::Navigated),
            CommandKind::Generate => {
                let language = editor
                    .language_id()
                    .ok_or_else(|| CommandError::missing("No active editor"))?;
                GenerationRequest::build(tokens, language).map(DispatchResult::Generate)
            }
            CommandKind::Other => Ok(self
                .phrases
                .execute(tokens, session, editor)?
                .map(DispatchResult::Phrase)
                .unwrap_or(DispatchResult::Empty)),
        }
    }

    fn acknowledge(&self, result: &DispatchResult, tokens: &[Token], notifier: &dyn Notifier) {
        match result {
            DispatchResult::Empty => {}
            DispatchResult::Stop => {
                notifier.show_transient("Recording stopped", self.feedback_duration)
            }
            DispatchResult::Generate(request) => {
                notifier.show_transient(&format!("Generating: {}", request.command), None)
            }
            _ => {
                let message = format!("✓ {}", tokens.join(" "));
                notifier.show_transient(&message, self.feedback_duration)
            }
        }
    }

    fn report(&self, error: CommandError, notifier: &dyn Notifier) -> DispatchResult {
        let message = match &error {
            CommandError::Internal(detail) => {
                tracing::error!("command handler failed: {}", detail);
                "Something went wrong running that command".to_string()
            }
            other => {
                tracing::warn!("{}", other);
                other.to_string()
            }
        };
        notifier.error(&message);
        DispatchResult::Failed(message)
    }

    /// Apply the outcome of a generation request
    pub fn complete_generation(
        &self,
        outcome: Result<String>,
        session: &mut InterpreterSession,
        editor: &mut dyn EditorSurface,
        notifier: &dyn Notifier,
    ) -> DispatchResult {
        match outcome.and_then(|code| apply_generated(code, session, editor)) {
            Ok(()) => {
                notifier.show_transient("✓ Code inserted", self.feedback_duration);
                DispatchResult::Generated
            }
            Err(e) => self.report(e, notifier),
        }
    }

    /// Dispatch and, for generation commands, run the request to completion
    pub async fn dispatch_and_wait(
        &self,
        tokens: &[Token],
        session: &mut InterpreterSession,
        editor: &mut dyn EditorSurface,
        notifier: &dyn Notifier,
        clipboard: &dyn ClipboardReader,
        generator: &dyn CodeGenerator,
    ) -> DispatchResult {
        match self.dispatch(tokens, session, editor, notifier) {
            DispatchResult::Generate(request) => {
                let outcome = request.run(clipboard, generator).await;
                self.complete_generation(outcome, session, editor, notifier)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::editor::Position;
    use crate::notify::RecordingNotifier;

    fn setup(text: &str) -> (Interpreter, InterpreterSession, TextBuffer, RecordingNotifier) {
        (
            Interpreter::default(),
            InterpreterSession::new(),
            TextBuffer::from_text(text, "python"),
            RecordingNotifier::new(),
        )
    }

    #[test]
    fn test_go_to_line_two() {
        let (interpreter, mut session, mut editor, notifier) = setup("a\nb\nc");
        let result =
            interpreter.dispatch_transcript("go to line two", &mut session, &mut editor, &notifier);
        assert_eq!(result, DispatchResult::Navigated(Motion::Line(2)));
        assert_eq!(editor.cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_stop_does_not_fall_through() {
        let (interpreter, mut session, mut editor, notifier) = setup("a");
        let result = interpreter.dispatch_transcript(
            "stop delete line",
            &mut session,
            &mut editor,
            &notifier,
        );
        assert_eq!(result, DispatchResult::Stop);
        assert_eq!(editor.text(), "a");
    }

    #[test]
    fn test_empty_utterance_is_noop() {
        let (interpreter, mut session, mut editor, notifier) = setup("a");
        let result =
            interpreter.dispatch_transcript("uh", &mut session, &mut editor, &notifier);
        assert_eq!(result, DispatchResult::Empty);
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_unroutable_is_reported() {
        let (interpreter, mut session, mut editor, notifier) = setup("a");
        let result =
            interpreter.dispatch_transcript("goto the moon", &mut session, &mut editor, &notifier);
        assert_eq!(
            result,
            DispatchResult::Failed("Unsupported goto command: goto the moon".into())
        );
        assert_eq!(notifier.last().as_deref(), Some("Unsupported goto command: goto the moon"));

        // The next utterance still works
        let result =
            interpreter.dispatch_transcript("new line", &mut session, &mut editor, &notifier);
        assert_eq!(result, DispatchResult::Phrase(PhraseAction::NewLine));
    }

    #[test]
    fn test_compile_unsupported_kind() {
        let (interpreter, mut session, mut editor, notifier) = setup("a");
        let result =
            interpreter.dispatch_transcript("compiled", &mut session, &mut editor, &notifier);
        assert_eq!(
            result,
            DispatchResult::Failed("Host action failed: cannot run python files".into())
        );
    }

    #[test]
    fn test_generation_is_deferred() {
        let (interpreter, mut session, mut editor, notifier) = setup("");
        let result = interpreter.dispatch_transcript(
            "right some function",
            &mut session,
            &mut editor,
            &notifier,
        );
        match result {
            DispatchResult::Generate(request) => {
                assert_eq!(request.command, "write sum function");
                assert!(!request.use_clipboard);
            }
            other => panic!("expected generation, got {:?}", other),
        }
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_complete_generation_failure_leaves_document() {
        let (interpreter, mut session, mut editor, notifier) = setup("keep");
        let result = interpreter.complete_generation(
            Err(CommandError::MalformedResponse),
            &mut session,
            &mut editor,
            &notifier,
        );
        assert!(matches!(result, DispatchResult::Failed(_)));
        assert_eq!(editor.text(), "keep");
        assert!(session.last_snippet.is_none());
    }

    #[test]
    fn test_complete_generation_replaces_selection() {
        let (interpreter, mut session, mut editor, notifier) = setup("x = TODO");
        editor.set_selection(crate::editor::Range::new(Position::new(0, 4), Position::new(0, 8)));
        let result =
            interpreter.complete_generation(Ok("42".into()), &mut session, &mut editor, &notifier);
        assert_eq!(result, DispatchResult::Generated);
        assert_eq!(editor.text(), "x = 42");
        assert_eq!(session.last_snippet.as_deref(), Some("42"));
    }
}

//! Session manager - owns the document and interpreter state and processes
//! utterances one at a time in arrival order

use crate::buffer::TextBuffer;
use crate::clipboard::ClipboardReader;
use crate::error::Result;
use crate::interpret::{DispatchResult, Interpreter, InterpreterSession};
use crate::llm::CodeGenerator;
use crate::notify::Notifier;
use flume::{Receiver, Sender};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;

pub enum SessionCommand {
    /// One finalized transcript
    Utterance(String),
    /// A generation request finished
    Generated(Result<String>),
    /// Stop listening (spoken "stop" or Ctrl-C)
    Stop,
    /// The speech source has no more utterances
    EndOfInput,
}

pub struct SessionManager {
    interpreter: Interpreter,
    session: InterpreterSession,
    editor: TextBuffer,
    notifier: Arc<dyn Notifier>,
    clipboard: Arc<dyn ClipboardReader>,
    generator: Arc<dyn CodeGenerator>,
    cmd_tx: Sender<SessionCommand>,
    pending_generations: usize,
}

impl SessionManager {
    pub fn new(
        interpreter: Interpreter,
        editor: TextBuffer,
        notifier: Arc<dyn Notifier>,
        clipboard: Arc<dyn ClipboardReader>,
        generator: Arc<dyn CodeGenerator>,
        cmd_tx: Sender<SessionCommand>,
    ) -> Self {
        Self {
            interpreter,
            session: InterpreterSession::new(),
            editor,
            notifier,
            clipboard,
            generator,
            cmd_tx,
            pending_generations: 0,
        }
    }

    /// Process commands until stopped or the input ends, then wait for any
    /// outstanding generations. Returns the document.
    pub async fn run(mut self, cmd_rx: Receiver<SessionCommand>) -> TextBuffer {
        let mut listening = true;

        while listening || self.pending_generations > 0 {
            let Ok(cmd) = cmd_rx.recv_async().await else {
                break;
            };

            match cmd {
                SessionCommand::Utterance(text) if listening => {
                    if self.process_utterance(&text) == DispatchResult::Stop {
                        listening = false;
                    }
                }
                SessionCommand::Utterance(text) => {
                    tracing::debug!("ignoring utterance after stop: {}", text);
                }
                SessionCommand::Generated(outcome) => {
                    self.pending_generations = self.pending_generations.saturating_sub(1);
                    self.interpreter.complete_generation(
                        outcome,
                        &mut self.session,
                        &mut self.editor,
                        self.notifier.as_ref(),
                    );
                }
                SessionCommand::Stop | SessionCommand::EndOfInput => {
                    if listening {
                        tracing::info!("stopped listening");
                    }
                    listening = false;
                }
            }
        }

        if self.pending_generations > 0 {
            tracing::warn!("{} generation(s) abandoned", self.pending_generations);
        }
        self.editor
    }

    fn process_utterance(&mut self, text: &str) -> DispatchResult {
        let result = self.interpreter.dispatch_transcript(
            text,
            &mut self.session,
            &mut self.editor,
            self.notifier.as_ref(),
        );

        if let DispatchResult::Generate(request) = &result {
            self.spawn_generation(request.clone());
        }
        result
    }

    /// Run a generation without blocking later utterances; the outcome comes
    /// back through the command channel
    fn spawn_generation(&mut self, request: crate::interpret::GenerationRequest) {
        self.pending_generations += 1;
        let clipboard = Arc::clone(&self.clipboard);
        let generator = Arc::clone(&self.generator);
        let tx = self.cmd_tx.clone();

        tokio::spawn(async move {
            let outcome = request.run(clipboard.as_ref(), generator.as_ref()).await;
            let _ = tx.send(SessionCommand::Generated(outcome));
        });
    }
}

/// Feed one utterance per non-empty line into the session, then signal the
/// end of input
pub fn spawn_line_source<R>(reader: R, tx: Sender<SessionCommand>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else { break };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if tx.send(SessionCommand::Utterance(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(SessionCommand::EndOfInput);
    })
}

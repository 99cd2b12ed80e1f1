//! Voice-command interpretation
//!
//! Turns finalized transcripts into editing operations against an
//! [`EditorSurface`](crate::editor::EditorSurface).
//!
//! # Pipeline
//!
//! - **Tokenizer/Normalizer**: corrections, "go to" fusion, filler removal
//! - **Classifier**: the first token picks stop, compile, goto, generation or
//!   fixed phrase
//! - **Navigator**: cursor motion with line/word unit memory
//! - **Phrases**: copy, paste, delete line, selection anchors, ...
//! - **Generation**: prompt building and fenced-code extraction
//!
//! All state lives in an [`InterpreterSession`] passed into each dispatch.

mod classify;
mod dispatch;
mod generate;
mod navigate;
mod normalize;
mod phrases;
mod state;

pub use classify::{classify, CommandKind};
pub use dispatch::{DispatchResult, Interpreter};
pub use generate::{apply_generated, extract_code_block, GenerationRequest};
pub use navigate::{Motion, Navigator};
pub use normalize::{split_words, Normalizer, Token, Tokenizer};
pub use phrases::{PhraseAction, PhraseDispatcher};
pub use state::{InterpreterSession, MoveUnit};

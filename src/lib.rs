//! voxedit - drive a text document with spoken commands
//!
//! Finalized speech transcripts are normalized into tokens, classified, and
//! executed as cursor moves, fixed editing phrases, or code-generation
//! requests against an [`editor::EditorSurface`].

pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod error;
pub mod interpret;
pub mod llm;
pub mod notify;
pub mod session;

pub use error::{CommandError, Result};

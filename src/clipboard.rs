//! Clipboard collaborators
//!
//! - **LocalClipboard**: process-local text shared between the buffer and the
//!   generation context reader
//! - **SystemClipboard**: the OS clipboard via arboard (feature `system-clipboard`)

use crate::error::{CommandError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Synchronous clipboard used by copy/cut/paste host actions
pub trait ClipboardStore: Send + Sync {
    fn get_text(&self) -> Result<String>;
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Asynchronous clipboard read used for generation context
#[async_trait]
pub trait ClipboardReader: Send + Sync {
    async fn read_text(&self) -> Result<String>;
}

#[derive(Clone, Default)]
pub struct LocalClipboard {
    text: Arc<Mutex<String>>,
}

impl LocalClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        let clipboard = Self::new();
        *clipboard.text.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
        clipboard
    }
}

impl ClipboardStore for LocalClipboard {
    fn get_text(&self) -> Result<String> {
        Ok(self.text.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set_text(&self, text: &str) -> Result<()> {
        *self.text.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
        Ok(())
    }
}

#[async_trait]
impl ClipboardReader for LocalClipboard {
    async fn read_text(&self) -> Result<String> {
        self.get_text()
    }
}

/// OS clipboard; a fresh arboard handle is opened per access
#[cfg(feature = "system-clipboard")]
#[derive(Clone, Copy, Default)]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl ClipboardStore for SystemClipboard {
    fn get_text(&self) -> Result<String> {
        arboard::Clipboard::new()
            .and_then(|mut c| c.get_text())
            .map_err(|e| CommandError::Clipboard(e.to_string()))
    }

    fn set_text(&self, text: &str) -> Result<()> {
        arboard::Clipboard::new()
            .and_then(|mut c| c.set_text(text))
            .map_err(|e| CommandError::Clipboard(e.to_string()))
    }
}

#[cfg(feature = "system-clipboard")]
#[async_trait]
impl ClipboardReader for SystemClipboard {
    async fn read_text(&self) -> Result<String> {
        let clipboard = *self;
        tokio::task::spawn_blocking(move || clipboard.get_text())
            .await
            .map_err(|e| CommandError::Clipboard(format!("clipboard reader failed: {}", e)))?
    }
}

/// Reader that always fails, for hosts without clipboard access
#[derive(Clone, Copy, Default)]
pub struct NoClipboard;

#[async_trait]
impl ClipboardReader for NoClipboard {
    async fn read_text(&self) -> Result<String> {
        Err(CommandError::Clipboard("no clipboard available".into()))
    }
}

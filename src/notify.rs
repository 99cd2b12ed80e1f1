//! Transient user feedback
//!
//! Messages replace each other; a timed message reverts to the idle status
//! only if nothing newer was shown in the meantime.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait Notifier: Send + Sync {
    /// Display `message`, auto-reverting after `duration` if given
    fn show_transient(&self, message: &str, duration: Option<Duration>);

    fn error(&self, message: &str) {
        self.show_transient(message, None);
    }
}

/// Single status line on stderr
pub struct StatusLine {
    idle: String,
    shown: Arc<AtomicU64>,
}

impl StatusLine {
    pub fn new(idle: &str) -> Self {
        Self {
            idle: idle.to_string(),
            shown: Arc::new(AtomicU64::new(0)),
        }
    }

    fn draw(text: &str) {
        // Clear the line and rewrite it in place
        eprint!("\r\x1b[2K{}", text);
        let _ = io::stderr().flush();
    }
}

impl Notifier for StatusLine {
    fn show_transient(&self, message: &str, duration: Option<Duration>) {
        let id = self.shown.fetch_add(1, Ordering::SeqCst) + 1;
        Self::draw(message);

        let Some(duration) = duration else { return };
        let shown = Arc::clone(&self.shown);
        let idle = self.idle.clone();
        let revert = move || {
            if shown.load(Ordering::SeqCst) == id {
                Self::draw(&idle);
            }
        };

        // Timers ride the session's runtime; plain threads only outside one
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(duration).await;
                    revert();
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    std::thread::sleep(duration);
                    revert();
                });
            }
        }
    }

    fn error(&self, message: &str) {
        self.shown.fetch_add(1, Ordering::SeqCst);
        Self::draw(&format!("✗ {}", message));
        eprintln!();
    }
}

/// Records every message; used by tests and headless hosts
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<String> {
        self.messages().pop()
    }
}

impl Notifier for RecordingNotifier {
    fn show_transient(&self, message: &str, _duration: Option<Duration>) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.show_transient("one", Some(Duration::from_millis(10)));
        notifier.error("two");
        assert_eq!(notifier.messages(), vec!["one", "two"]);
        assert_eq!(notifier.last().as_deref(), Some("two"));
    }

    #[test]
    fn test_status_line_newer_message_wins() {
        let status = StatusLine::new("idle");
        status.show_transient("first", Some(Duration::from_millis(1)));
        status.show_transient("second", None);
        std::thread::sleep(Duration::from_millis(20));
        // The revert for "first" saw a newer message and did nothing
        assert_eq!(status.shown.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_status_line_revert_on_runtime() {
        let status = StatusLine::new("idle");
        status.show_transient("first", Some(Duration::from_millis(1)));
        status.show_transient("second", Some(Duration::from_millis(1)));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(status.shown.load(Ordering::SeqCst), 2);
    }
}

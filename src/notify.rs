// src/notify.rs
//! Transient user-facing notifications

use tracing::error;

pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Logs the notification and echoes it on stderr
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn error(&self, message: &str) {
        error!("Notification: {}", message);
        eprintln!("✗ {}", message);
    }
}

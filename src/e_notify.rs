use nu_ansi_term::Color;
use std::sync::Mutex;

/// User-facing, non-blocking notifications.
pub trait Notifier: Send + Sync {
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Prints notifications to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier {
    pub color: bool,
}

impl ConsoleNotifier {
    pub fn new(color: bool) -> Self {
        ConsoleNotifier { color }
    }
}

impl Notifier for ConsoleNotifier {
    fn warning(&self, message: &str) {
        log::warn!("{}", message);
        if self.color {
            eprintln!("{} {}", Color::Yellow.bold().paint("warning:"), message);
        } else {
            eprintln!("warning: {}", message);
        }
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
        if self.color {
            eprintln!("{} {}", Color::Red.bold().paint("error:"), message);
        } else {
            eprintln!("error: {}", message);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Warning(String),
    Error(String),
}

/// Keeps every notification in memory, for hosts that render them later.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        let mut received = self
            .received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *received)
    }

    fn push(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}

impl Notifier for RecordingNotifier {
    fn warning(&self, message: &str) {
        self.push(Notification::Warning(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Notification::Error(message.to_string()));
    }
}

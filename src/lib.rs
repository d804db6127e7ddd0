#![doc = include_str!("../README.md")]

// Re-export the types most hosts need
pub mod prelude {
    pub use crate::e_config::{Interpreter, LinterConfig};
    pub use crate::e_diagnostic::{Diagnostic, Position, Range, Severity};
    pub use crate::e_document::{DocumentId, LineAccessor, TextDocument};
    pub use crate::e_notify::{ConsoleNotifier, Notifier, RecordingNotifier};
    pub use crate::e_registry::DiagnosticRegistry;
    pub use crate::e_session::{DocumentEvent, LintOutcome, LintSession};
    pub use log::{debug, error, info, trace, warn};
    pub use std::path::{Path, PathBuf};
    pub use std::sync::Arc;
}

pub mod e_cli;
pub use e_cli::Cli;
pub mod e_command_builder;
pub mod e_config;
pub mod e_diagnostic;
pub use e_diagnostic::{Diagnostic, ParsedMessage, Position, Range, Severity};
pub mod e_document;
pub mod e_notify;
pub mod e_parser;
pub use e_parser::{parse_diagnostic, parse_message};
pub mod e_registry;
pub mod e_report;
pub mod e_runner;
pub use e_runner::LintError;
pub mod e_session;
pub mod e_watch;

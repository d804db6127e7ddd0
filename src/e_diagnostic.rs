//! Diagnostic data types shared by the parser, the registry and the reporters.

use std::fmt;

#[cfg(feature = "uses_serde")]
use serde::Serialize;

/// What the compiler said, before it is mapped onto the source text.
///
/// `line` is 1-based as printed by the compiler. `at` holds the offending
/// token, or the literal `"eof"` when the compiler hit the end of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub line: u32,
    pub text: String,
    pub at: String,
}

impl ParsedMessage {
    pub fn is_eof(&self) -> bool {
        self.at == EOF_MARKER
    }
}

/// Token the compilers print instead of a real token at end of input.
pub const EOF_MARKER: &str = "eof";

/// A 0-based line/column pair. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Range on a single line covering `[start, end)`.
    pub fn on_line(line: u32, start: u32, end: u32) -> Self {
        Range {
            start: Position::new(line, start),
            end: Position::new(line, end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
#[cfg_attr(feature = "uses_serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Hint => "hint",
        };
        f.write_str(s)
    }
}

/// An annotation attached to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "uses_serde", derive(Serialize))]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    pub severity: Severity,
    /// Name of the compiler that produced the message. Empty until the
    /// session stamps it.
    #[cfg_attr(feature = "uses_serde", serde(skip_serializing_if = "String::is_empty"))]
    pub source: String,
}

impl Diagnostic {
    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Diagnostic {
            range,
            message: message.into(),
            severity: Severity::Error,
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

//! Turns a line of `luac`/`luajit` error output into a [`Diagnostic`].
//!
//! The compilers report syntax errors as
//! `luac: stdin:3: 'end' expected near 'bar'`. The line number, the message
//! and the token after `near` are pulled out with one regular expression and
//! the token is then searched for in the source line to narrow the range.

use crate::e_diagnostic::{Diagnostic, ParsedMessage, Range};
use crate::e_document::LineAccessor;
use once_cell::sync::Lazy;
use regex::Regex;

/// `<process>: <chunk>:<line>: <message> near <junk><token>`, where the
/// token is wrapped in `'...'` or `<...>`. The process prefix is optional.
pub const OUTPUT_PATTERN: &str = r"(?:.+: )?.+:([0-9]+): (.+) near.*[<'](.*)['>]";

static OUTPUT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(OUTPUT_PATTERN).expect("OUTPUT_PATTERN is a valid regex"));

/// Extracts line, message and offending token from a chunk of compiler
/// output. Returns `None` when the chunk does not look like an error or the
/// line number is zero or unrepresentable.
///
/// # Example
/// ```
/// use lualinter::e_parser::parse_message;
///
/// let msg = parse_message("luac: stdin:3: 'end' expected near 'bar'").unwrap();
/// assert_eq!(msg.line, 3);
/// assert_eq!(msg.text, "'end' expected");
/// assert_eq!(msg.at, "bar");
/// ```
pub fn parse_message(chunk: &str) -> Option<ParsedMessage> {
    let caps = OUTPUT_REGEX.captures(chunk)?;
    let line: u32 = caps.get(1)?.as_str().parse().ok()?;
    if line == 0 {
        return None;
    }
    Some(ParsedMessage {
        line,
        text: caps.get(2)?.as_str().to_string(),
        at: caps.get(3)?.as_str().to_string(),
    })
}

/// Maps a parsed message onto `doc`. The range covers the first occurrence
/// of the offending token on the reported line, or the whole line when the
/// token is `eof` or cannot be found verbatim.
pub fn resolve_diagnostic<D: LineAccessor + ?Sized>(doc: &D, msg: &ParsedMessage) -> Option<Diagnostic> {
    let index = msg.line.checked_sub(1)?;
    let text = doc.line_at(usize::try_from(index).ok()?)?;

    let line_len = char_len(text)?;
    let mut range = Range::on_line(index, 0, line_len);
    if !msg.is_eof() {
        if let Some(byte_pos) = text.find(msg.at.as_str()) {
            let start = char_len(&text[..byte_pos])?;
            let width = char_len(&msg.at)?;
            range = Range::on_line(index, start, start + width);
        }
    }
    Some(Diagnostic::error(range, msg.text.clone()))
}

/// Full pipeline for one chunk of stderr: pattern match, then range
/// resolution. Never fails loudly; anything unusable yields `None`.
pub fn parse_diagnostic<D: LineAccessor + ?Sized>(doc: &D, chunk: &str) -> Option<Diagnostic> {
    if chunk.is_empty() {
        return None;
    }
    let msg = parse_message(chunk)?;
    log::trace!("parsed compiler message {:?}", msg);
    let diagnostic = resolve_diagnostic(doc, &msg);
    if diagnostic.is_none() {
        log::debug!(
            "line {} is outside the document ({} lines), dropping message",
            msg.line,
            doc.line_count()
        );
    }
    diagnostic
}

fn char_len(s: &str) -> Option<u32> {
    u32::try_from(s.chars().count()).ok()
}

use crate::e_diagnostic::{Diagnostic, Severity};
use crate::e_document::DocumentId;
use nu_ansi_term::Color;

/// `file:line:col: severity: message`, with 1-based line and column as
/// terminals and editors expect when jumping to a location.
pub fn format_human(id: &DocumentId, diagnostic: &Diagnostic, color: bool) -> String {
    let location = format!(
        "{}:{}:{}",
        id,
        diagnostic.range.start.line + 1,
        diagnostic.range.start.character + 1
    );
    let severity = diagnostic.severity.to_string();
    let source = if diagnostic.source.is_empty() {
        String::new()
    } else {
        format!(" [{}]", diagnostic.source)
    };
    if color {
        let painted = match diagnostic.severity {
            Severity::Error => Color::Red.bold().paint(severity),
            Severity::Warning => Color::Yellow.bold().paint(severity),
            Severity::Information | Severity::Hint => Color::Cyan.paint(severity),
        };
        format!(
            "{}: {}: {}{}",
            Color::White.bold().paint(location),
            painted,
            diagnostic.message,
            source
        )
    } else {
        format!("{}: {}: {}{}", location, severity, diagnostic.message, source)
    }
}

/// Caret line underlining the diagnostic range in `line_text`.
pub fn underline(line_text: &str, diagnostic: &Diagnostic) -> String {
    let start = diagnostic.range.start.character as usize;
    let end = (diagnostic.range.end.character as usize).max(start + 1);
    let mut out = String::new();
    // keep tabs so the carets line up under the token
    for c in line_text.chars().take(start) {
        out.push(if c == '\t' { '\t' } else { ' ' });
    }
    out.push_str(&"^".repeat(end - start));
    out
}

#[cfg(feature = "uses_serde")]
#[derive(serde::Serialize)]
struct JsonEntry<'a> {
    file: &'a str,
    diagnostics: &'a [Diagnostic],
}

/// All entries as a JSON array of `{ "file", "diagnostics" }` objects.
#[cfg(feature = "uses_serde")]
pub fn format_json(entries: &[(DocumentId, Vec<Diagnostic>)]) -> serde_json::Result<String> {
    let json: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|(id, diagnostics)| JsonEntry {
            file: id.as_str(),
            diagnostics,
        })
        .collect();
    serde_json::to_string_pretty(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e_diagnostic::Range;

    #[test]
    fn human_format_is_one_based() {
        let d = Diagnostic::error(Range::on_line(2, 10, 13), "'end' expected").with_source("luac");
        let id = DocumentId::new("src/main.lua");
        assert_eq!(
            format_human(&id, &d, false),
            "src/main.lua:3:11: error: 'end' expected [luac]"
        );
    }

    #[test]
    fn underline_marks_the_token() {
        let d = Diagnostic::error(Range::on_line(0, 10, 13), "x");
        assert_eq!(underline("print(foo bar)", &d), "          ^^^");
        let empty = Diagnostic::error(Range::on_line(0, 0, 0), "x");
        assert_eq!(underline("", &empty), "^");
    }

    #[cfg(feature = "uses_serde")]
    #[test]
    fn json_lists_files_and_ranges() {
        let d = Diagnostic::error(Range::on_line(0, 0, 5), "unexpected symbol").with_source("luac");
        let out = format_json(&[(DocumentId::new("a.lua"), vec![d])]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["file"], "a.lua");
        assert_eq!(value[0]["diagnostics"][0]["message"], "unexpected symbol");
        assert_eq!(value[0]["diagnostics"][0]["severity"], "error");
        assert_eq!(value[0]["diagnostics"][0]["range"]["end"]["character"], 5);
        assert_eq!(value[0]["diagnostics"][0]["source"], "luac");
    }
}

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Language identifier of documents the linter acts on.
pub const LUA_LANGUAGE_ID: &str = "lua";

/// 0-based random access to the lines of a source text.
pub trait LineAccessor {
    fn line_count(&self) -> usize;
    /// Text of line `index` without its line terminator, or `None` when the
    /// index is past the end of the document.
    fn line_at(&self, index: usize) -> Option<&str>;
}

impl<S: AsRef<str>> LineAccessor for [S] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_at(&self, index: usize) -> Option<&str> {
        self.get(index).map(|s| s.as_ref())
    }
}

/// Identity of a document in the diagnostics registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        DocumentId(id.into())
    }

    /// Canonical form of `path`; falls back to the path as given when it
    /// cannot be resolved (unsaved or deleted files).
    pub fn from_path(path: &Path) -> Self {
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        DocumentId(resolved.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A snapshot of a source document: where it lives, what language it is and
/// its full current text.
#[derive(Debug, Clone)]
pub struct TextDocument {
    id: DocumentId,
    path: PathBuf,
    language_id: String,
    text: String,
    // byte span of each line, terminator excluded
    lines: Vec<(usize, usize)>,
}

impl TextDocument {
    pub fn new(path: impl Into<PathBuf>, language_id: impl Into<String>, text: impl Into<String>) -> Self {
        let path = path.into();
        let text = text.into();
        let lines = split_lines(&text);
        TextDocument {
            id: DocumentId::from_path(&path),
            path,
            language_id: language_id.into(),
            text,
            lines,
        }
    }

    /// Reads `path` from disk and guesses the language from its extension.
    pub fn open(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(TextDocument::new(path, language_for_path(path), text))
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_lua(&self) -> bool {
        self.language_id == LUA_LANGUAGE_ID
    }

    /// Directory the compiler runs in. Relative paths without a parent run
    /// in the current directory.
    pub fn working_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl LineAccessor for TextDocument {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_at(&self, index: usize) -> Option<&str> {
        self.lines
            .get(index)
            .map(|&(start, end)| &self.text[start..end])
    }
}

/// Language id for a file, by extension. Anything that is not `.lua` is
/// reported as `plaintext` and ignored by the session.
pub fn language_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("lua") => LUA_LANGUAGE_ID,
        _ => "plaintext",
    }
}

/// Splits on `\n`, dropping a trailing `\r`. A text ending in a newline has
/// an empty last line, and the empty text has exactly one line.
fn split_lines(text: &str) -> Vec<(usize, usize)> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            let end = if i > start && text.as_bytes()[i - 1] == b'\r' {
                i - 1
            } else {
                i
            };
            lines.push((start, end));
            start = i + 1;
        }
    }
    lines.push((start, text.len()));
    lines
}

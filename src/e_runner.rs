//! One lint cycle: spawn the compiler, feed it the document, read its error
//! stream through the parser and wait for it to exit.

use crate::e_command_builder::CompilerCommand;
use crate::e_diagnostic::Diagnostic;
use crate::e_document::TextDocument;
use crate::e_parser::parse_diagnostic;
use std::error::Error;
use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

#[derive(Debug)]
pub enum LintError {
    /// The compiler could not be launched.
    Spawn { program: String, source: io::Error },
    Io(io::Error),
    Config { path: PathBuf, message: String },
}

impl fmt::Display for LintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintError::Spawn { program, source } => write!(f, "failed to run {}: {}", program, source),
            LintError::Io(err) => write!(f, "i/o error: {}", err),
            LintError::Config { path, message } => {
                write!(f, "invalid config {}: {}", path.display(), message)
            }
        }
    }
}

impl Error for LintError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LintError::Spawn { source, .. } => Some(source),
            LintError::Io(err) => Some(err),
            LintError::Config { .. } => None,
        }
    }
}

impl From<io::Error> for LintError {
    fn from(err: io::Error) -> Self {
        LintError::Io(err)
    }
}

/// Shared handle to a running cycle, used to cancel it from another thread.
#[derive(Debug, Clone, Default)]
pub struct CycleHandle {
    cancelled: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
}

impl CycleHandle {
    pub fn new() -> Self {
        CycleHandle::default()
    }

    /// Marks the cycle superseded and kills its compiler if still running.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(child) = self.lock_child().as_mut() {
            if let Err(err) = child.kill() {
                log::debug!("kill of pid {} failed: {}", child.id(), err);
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn lock_child(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// What a finished cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Last diagnostic parsed from the error stream, if any.
    pub diagnostic: Option<Diagnostic>,
    pub exit_code: Option<i32>,
    /// Non-empty stderr lines seen.
    pub stderr_lines: usize,
    pub cancelled: bool,
}

pub struct LintCycle {
    command: CompilerCommand,
    handle: CycleHandle,
}

impl LintCycle {
    pub fn new(command: CompilerCommand) -> Self {
        LintCycle {
            command,
            handle: CycleHandle::new(),
        }
    }

    pub fn with_handle(command: CompilerCommand, handle: CycleHandle) -> Self {
        LintCycle { command, handle }
    }

    /// write stdin -> drain stderr keeping the last parse -> wait for exit.
    pub fn run(&self, doc: &TextDocument) -> Result<CycleOutcome, LintError> {
        log::debug!(
            "linting {} with `{}` in {}",
            doc.id(),
            self.command.command_line(),
            self.command.cwd.display()
        );
        let mut child = self
            .command
            .to_command()
            .spawn()
            .map_err(|source| LintError::Spawn {
                program: self.command.display_name(),
                source,
            })?;
        let pid = child.id();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        *self.handle.lock_child() = Some(child);
        if self.handle.is_cancelled() {
            self.handle.cancel();
        }

        let text = doc.text().to_owned();
        let writer = stdin.map(|mut stdin| {
            thread::spawn(move || {
                // the compiler may stop reading at the first error
                if let Err(err) = stdin.write_all(text.as_bytes()) {
                    log::debug!("writing to compiler stdin failed: {}", err);
                }
            })
        });
        let sink = stdout.map(|mut stdout| {
            thread::spawn(move || {
                if let Err(err) = io::copy(&mut stdout, &mut io::sink()) {
                    log::debug!("draining compiler stdout failed: {}", err);
                }
            })
        });

        let mut diagnostic = None;
        let mut stderr_lines = 0;
        if let Some(stderr) = stderr {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let raw = String::from_utf8_lossy(&buf);
                        let chunk = raw.trim_end_matches(&['\r', '\n'][..]);
                        if chunk.is_empty() {
                            continue;
                        }
                        stderr_lines += 1;
                        log::trace!("{}: {}", pid, chunk);
                        if let Some(found) = parse_diagnostic(doc, chunk) {
                            diagnostic = Some(found);
                        }
                    }
                    Err(err) => {
                        log::debug!("reading compiler stderr failed: {}", err);
                        break;
                    }
                }
            }
        }

        for worker in writer.into_iter().chain(sink) {
            let _ = worker.join();
        }

        let child = self.handle.lock_child().take();
        let exit_code = match child {
            Some(mut child) => child.wait()?.code(),
            None => None,
        };
        let cancelled = self.handle.is_cancelled();
        log::debug!(
            "compiler {} exited with {:?} (diagnostic: {}, cancelled: {})",
            pid,
            exit_code,
            diagnostic.is_some(),
            cancelled
        );

        Ok(CycleOutcome {
            diagnostic,
            exit_code,
            stderr_lines,
            cancelled,
        })
    }
}

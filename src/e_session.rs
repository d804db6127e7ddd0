//! The lint session: owns the config, the diagnostics registry and the
//! notifier, and turns document events into lint cycles.

use crate::e_command_builder::CompilerCommandBuilder;
use crate::e_config::LinterConfig;
use crate::e_diagnostic::Diagnostic;
use crate::e_document::{DocumentId, TextDocument};
use crate::e_notify::Notifier;
use crate::e_registry::DiagnosticRegistry;
use crate::e_runner::{CycleHandle, LintCycle, LintError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Document lifecycle events that trigger a lint cycle.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    Opened(TextDocument),
    Changed(TextDocument),
    Saved(TextDocument),
    /// The document became the active one in the host.
    Activated(TextDocument),
}

impl DocumentEvent {
    pub fn document(&self) -> &TextDocument {
        match self {
            DocumentEvent::Opened(doc)
            | DocumentEvent::Changed(doc)
            | DocumentEvent::Saved(doc)
            | DocumentEvent::Activated(doc) => doc,
        }
    }

    pub fn is_save(&self) -> bool {
        matches!(self, DocumentEvent::Saved(_))
    }
}

/// How an event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintOutcome {
    /// Linting is switched off.
    Disabled,
    /// Not a Lua document.
    Skipped,
    /// A diagnostic replaced the document's previous one.
    Published(Diagnostic),
    /// The compiler reported nothing; the document's diagnostics were removed.
    Cleared,
    /// A newer event for the same document took over; nothing was published.
    Superseded,
    /// The compiler could not be run; the user was notified.
    Failed(String),
}

struct PendingCycle {
    cycle: LintCycle,
    generation: u64,
    program: String,
    source: &'static str,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    handle: CycleHandle,
}

pub struct LintSession {
    config: LinterConfig,
    registry: Arc<DiagnosticRegistry>,
    notifier: Arc<dyn Notifier>,
    in_flight: Mutex<HashMap<DocumentId, InFlight>>,
    // shared by all documents so a finished id is never handed out twice
    next_generation: AtomicU64,
}

impl LintSession {
    pub fn new(config: LinterConfig, notifier: Arc<dyn Notifier>) -> Self {
        LintSession::with_registry(config, Arc::new(DiagnosticRegistry::new()), notifier)
    }

    pub fn with_registry(
        config: LinterConfig,
        registry: Arc<DiagnosticRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        LintSession {
            config,
            registry,
            notifier,
            in_flight: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &LinterConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DiagnosticRegistry> {
        &self.registry
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<DocumentId, InFlight>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs one lint cycle for the event's document and publishes or clears
    /// its diagnostics. Blocks until the compiler exits.
    pub fn handle_event(&self, event: &DocumentEvent) -> LintOutcome {
        match self.prepare(event.document()) {
            Ok(pending) => self.finish(event, pending),
            Err(outcome) => outcome,
        }
    }

    /// Like `handle_event`, but the compiler runs on its own thread. The
    /// cycle is registered before this returns, so events started in order
    /// supersede each other in that order.
    pub fn spawn_event(self: &Arc<Self>, event: DocumentEvent) -> JoinHandle<LintOutcome> {
        let prepared = self.prepare(event.document());
        let session = Arc::clone(self);
        thread::spawn(move || match prepared {
            Ok(pending) => session.finish(&event, pending),
            Err(outcome) => outcome,
        })
    }

    /// Applies the gates and registers a cycle for `doc`, cancelling the one
    /// it replaces.
    fn prepare(&self, doc: &TextDocument) -> Result<PendingCycle, LintOutcome> {
        if !self.config.enable {
            return Err(LintOutcome::Disabled);
        }
        if !doc.is_lua() {
            log::trace!("skipping {} ({})", doc.id(), doc.language_id());
            return Err(LintOutcome::Skipped);
        }

        let command = CompilerCommandBuilder::new()
            .with_config(&self.config)
            .with_cwd(&doc.working_dir())
            .build();
        let program = command.display_name();
        let source = command.interpreter.program();

        let handle = CycleHandle::new();
        let generation = self.begin(doc.id(), handle.clone());
        Ok(PendingCycle {
            cycle: LintCycle::with_handle(command, handle),
            generation,
            program,
            source,
        })
    }

    fn finish(&self, event: &DocumentEvent, pending: PendingCycle) -> LintOutcome {
        let doc = event.document();
        let result = pending.cycle.run(doc);

        let mut in_flight = self.lock_in_flight();
        let latest = in_flight
            .get(doc.id())
            .map_or(false, |entry| entry.generation == pending.generation);
        if !latest {
            log::debug!("cycle {} for {} was superseded", pending.generation, doc.id());
            return LintOutcome::Superseded;
        }
        in_flight.remove(doc.id());

        let outcome = match result {
            Err(LintError::Spawn { program: _, source }) => {
                self.notifier.error(&format!("{} error: {}", pending.program, source));
                return LintOutcome::Failed(source.to_string());
            }
            Err(err) => {
                self.notifier.error(&format!("{} error: {}", pending.program, err));
                return LintOutcome::Failed(err.to_string());
            }
            Ok(outcome) => outcome,
        };

        match outcome.diagnostic {
            Some(diagnostic) => {
                let diagnostic = diagnostic.with_source(pending.source);
                self.registry.set(doc.id(), vec![diagnostic.clone()]);
                if event.is_save() && self.config.warn_on_save {
                    self.notifier.warning(&format!(
                        "Current file contains an error: '{}' at line {}",
                        diagnostic.message,
                        diagnostic.range.start.line + 1
                    ));
                }
                LintOutcome::Published(diagnostic)
            }
            None => {
                self.registry.clear(doc.id());
                LintOutcome::Cleared
            }
        }
    }

    /// Drops the diagnostics of a document that went away and stops any
    /// cycle still running for it.
    pub fn forget(&self, id: &DocumentId) {
        if let Some(entry) = self.lock_in_flight().remove(id) {
            entry.handle.cancel();
        }
        self.registry.clear(id);
    }

    /// Stops every running cycle. Their results are discarded.
    pub fn cancel_all(&self) {
        for (id, entry) in self.lock_in_flight().drain() {
            log::debug!("cancelling cycle {} for {}", entry.generation, id);
            entry.handle.cancel();
        }
    }

    /// Registers a new cycle for `id`, cancelling the one it replaces.
    fn begin(&self, id: &DocumentId, handle: CycleHandle) -> u64 {
        let mut in_flight = self.lock_in_flight();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = in_flight.insert(id.clone(), InFlight { generation, handle }) {
            previous.handle.cancel();
        }
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e_notify::{Notification, RecordingNotifier};

    fn session(config: LinterConfig) -> (LintSession, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        (LintSession::new(config, notifier.clone()), notifier)
    }

    #[test]
    fn disabled_session_does_nothing() {
        let (session, notifier) = session(LinterConfig {
            enable: false,
            ..LinterConfig::default()
        });
        let doc = TextDocument::new("a.lua", "lua", "x = ");
        assert_eq!(session.handle_event(&DocumentEvent::Opened(doc)), LintOutcome::Disabled);
        assert!(session.registry().is_empty());
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn non_lua_documents_are_skipped() {
        let (session, _) = session(LinterConfig::default());
        let doc = TextDocument::new("notes.txt", "plaintext", "x = ");
        assert_eq!(session.handle_event(&DocumentEvent::Saved(doc)), LintOutcome::Skipped);
    }

    #[test]
    fn spawn_failure_notifies_and_keeps_registry() {
        let (session, notifier) = session(LinterConfig {
            compiler_path: Some("no-such-luac-7c1e".into()),
            ..LinterConfig::default()
        });
        let doc = TextDocument::new("a.lua", "lua", "x = ");
        let id = doc.id().clone();
        let stale = Diagnostic::error(crate::e_diagnostic::Range::on_line(0, 0, 3), "old");
        session.registry().set(&id, vec![stale.clone()]);

        let outcome = session.handle_event(&DocumentEvent::Changed(doc));
        assert!(matches!(outcome, LintOutcome::Failed(_)));
        assert_eq!(session.registry().get(&id), Some(vec![stale]));
        match notifier.take().as_slice() {
            [Notification::Error(msg)] => assert!(msg.starts_with("no-such-luac-7c1e error:")),
            other => panic!("unexpected notifications {:?}", other),
        }
    }

    #[test]
    fn newer_cycle_supersedes_older() {
        let (session, _) = session(LinterConfig::default());
        let id = DocumentId::new("a.lua");
        let first = CycleHandle::new();
        let g1 = session.begin(&id, first.clone());
        let g2 = session.begin(&id, CycleHandle::new());
        assert_eq!((g1, g2), (1, 2));
        assert!(first.is_cancelled());
        session.forget(&id);
        assert!(session.lock_in_flight().is_empty());
    }
}

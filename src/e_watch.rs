//! Polling file watcher used by `lualinter watch` as its source of document
//! events.

use crate::e_document::{DocumentId, TextDocument};
use crate::e_session::{DocumentEvent, LintOutcome, LintSession};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

// upper bound on how long a stop request goes unnoticed
const STOP_CHECK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File seen for the first time (or again after disappearing).
    Opened(PathBuf),
    /// Modification time changed since the last poll.
    Saved(PathBuf),
    Removed(PathBuf),
}

#[derive(Debug)]
pub struct FileWatcher {
    paths: Vec<PathBuf>,
    interval: Duration,
    seen: HashMap<PathBuf, SystemTime>,
}

impl FileWatcher {
    pub fn new(paths: Vec<PathBuf>, interval: Duration) -> Self {
        FileWatcher {
            paths,
            interval,
            seen: HashMap::new(),
        }
    }

    /// One scan over the watched paths.
    pub fn poll(&mut self) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        for path in &self.paths {
            match modified(path) {
                Some(mtime) => match self.seen.insert(path.clone(), mtime) {
                    None => events.push(WatchEvent::Opened(path.clone())),
                    Some(previous) if previous != mtime => {
                        events.push(WatchEvent::Saved(path.clone()))
                    }
                    Some(_) => {}
                },
                None => {
                    if self.seen.remove(path).is_some() {
                        events.push(WatchEvent::Removed(path.clone()));
                    }
                }
            }
        }
        events
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

enum Prepared {
    Lint(DocumentEvent),
    Done(DocumentId, LintOutcome),
}

fn prepare(session: &LintSession, event: WatchEvent) -> Option<Prepared> {
    let (path, saved) = match event {
        WatchEvent::Opened(path) => (path, false),
        WatchEvent::Saved(path) => (path, true),
        WatchEvent::Removed(path) => {
            let id = DocumentId::from_path(&path);
            log::info!("{} removed, clearing its diagnostics", path.display());
            session.forget(&id);
            return Some(Prepared::Done(id, LintOutcome::Cleared));
        }
    };
    let doc = match TextDocument::open(&path) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("cannot read {}: {}", path.display(), err);
            return None;
        }
    };
    Some(Prepared::Lint(if saved {
        DocumentEvent::Saved(doc)
    } else {
        DocumentEvent::Opened(doc)
    }))
}

/// Feeds a watch event to the session and waits for its cycle. Returns the
/// document id and the outcome, or `None` when the file could not be read.
pub fn dispatch(session: &LintSession, event: WatchEvent) -> Option<(DocumentId, LintOutcome)> {
    match prepare(session, event)? {
        Prepared::Done(id, outcome) => Some((id, outcome)),
        Prepared::Lint(event) => {
            let id = event.document().id().clone();
            Some((id, session.handle_event(&event)))
        }
    }
}

/// Polls `watcher` until `stop` is set and lints every event on a worker
/// thread, so a save made while the compiler is still running supersedes
/// that cycle. Outcomes are handed to `on_outcome` on the calling thread.
/// Cycles still running when `stop` is seen are cancelled.
pub fn watch(
    session: &Arc<LintSession>,
    mut watcher: FileWatcher,
    stop: &AtomicBool,
    mut on_outcome: impl FnMut(&DocumentId, &LintOutcome),
) {
    let mut running: Vec<(DocumentId, JoinHandle<LintOutcome>)> = Vec::new();
    while !stop.load(Ordering::SeqCst) {
        for event in watcher.poll() {
            match prepare(session, event) {
                Some(Prepared::Done(id, outcome)) => on_outcome(&id, &outcome),
                Some(Prepared::Lint(event)) => {
                    let id = event.document().id().clone();
                    running.push((id, session.spawn_event(event)));
                }
                None => {}
            }
        }
        collect(&mut running, false, &mut on_outcome);
        sleep_unless_stopped(watcher.interval, stop);
    }
    session.cancel_all();
    collect(&mut running, true, &mut on_outcome);
}

/// Reports finished cycles in start order; with `wait` joins all of them.
fn collect(
    running: &mut Vec<(DocumentId, JoinHandle<LintOutcome>)>,
    wait: bool,
    on_outcome: &mut impl FnMut(&DocumentId, &LintOutcome),
) {
    let mut index = 0;
    while index < running.len() {
        if !wait && !running[index].1.is_finished() {
            index += 1;
            continue;
        }
        let (id, worker) = running.remove(index);
        match worker.join() {
            Ok(outcome) => on_outcome(&id, &outcome),
            Err(_) => log::error!("lint worker for {} panicked", id),
        }
    }
}

fn sleep_unless_stopped(interval: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(STOP_CHECK));
    }
}

// Watch mode against a real session: saves during a hung compile, stop, removal.
#![cfg(unix)]

mod common {
    pub mod test_utils;
}

use common::test_utils::TestProject;
use lualinter::e_watch::{dispatch, watch, FileWatcher, WatchEvent};
use lualinter::prelude::*;
use std::fs::{self, File};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

/// Hangs on documents containing `slow`, reports documents containing `broken`.
const HANGING_LUAC: &str = r#"input=$(cat)
case "$input" in
  *slow*) exec sleep 10 ;;
  *broken*) echo "luac: stdin:1: unexpected symbol near 'broken'" >&2; exit 1 ;;
esac
exit 0"#;

fn session_for(compiler: &Path) -> Arc<LintSession> {
    let config = LinterConfig {
        compiler_path: Some(compiler.to_path_buf()),
        ..LinterConfig::default()
    };
    Arc::new(LintSession::new(config, Arc::new(RecordingNotifier::new())))
}

/// Rewrites `path` and moves its mtime forward so the next poll sees a save.
fn save(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)?;
    File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now() + Duration::from_secs(60))
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    done()
}

#[test]
fn save_during_hung_cycle_supersedes_it() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    let luac = project.fake_compiler("luac", HANGING_LUAC)?;
    let path = project.write("main.lua", "-- slow\n")?;
    let session = session_for(&luac);
    let id = TextDocument::open(&path)?.id().clone();
    let stop = AtomicBool::new(false);
    let started = Instant::now();

    let outcomes = thread::scope(|scope| -> Result<_, Box<dyn std::error::Error>> {
        let watcher = FileWatcher::new(vec![path.clone()], Duration::from_millis(20));
        let worker = scope.spawn(|| {
            let mut outcomes = Vec::new();
            watch(&session, watcher, &stop, |id, outcome| {
                outcomes.push((id.clone(), outcome.clone()))
            });
            outcomes
        });

        thread::sleep(Duration::from_millis(300));
        let published = save(&path, "x = broken\n").map(|()| {
            wait_until(Duration::from_secs(3), || session.registry().get(&id).is_some())
        });
        stop.store(true, Ordering::SeqCst);
        let outcomes = worker.join().map_err(|_| "watch thread panicked")?;
        assert!(published?, "the save was not linted while the first cycle hung");
        Ok(outcomes)
    })?;

    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    let for_doc: Vec<&LintOutcome> = outcomes
        .iter()
        .filter(|(doc, _)| doc == &id)
        .map(|(_, outcome)| outcome)
        .collect();
    assert_eq!(for_doc.len(), 2, "{:?}", outcomes);
    assert!(for_doc.contains(&&LintOutcome::Superseded), "{:?}", outcomes);
    assert!(for_doc
        .iter()
        .any(|outcome| matches!(outcome, LintOutcome::Published(d) if d.message == "unexpected symbol")));
    assert_eq!(session.registry().get(&id).map(|d| d.len()), Some(1));
    Ok(())
}

#[test]
fn stop_cancels_a_hung_cycle() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    let luac = project.fake_compiler("luac", HANGING_LUAC)?;
    let path = project.write("main.lua", "-- slow\n")?;
    let session = session_for(&luac);
    let stop = AtomicBool::new(false);

    let (outcomes, stopped_after) = thread::scope(|scope| {
        let watcher = FileWatcher::new(vec![path.clone()], Duration::from_millis(20));
        let worker = scope.spawn(|| {
            let mut outcomes = Vec::new();
            watch(&session, watcher, &stop, |_, outcome| outcomes.push(outcome.clone()));
            outcomes
        });
        thread::sleep(Duration::from_millis(300));
        let stopped = Instant::now();
        stop.store(true, Ordering::SeqCst);
        (worker.join(), stopped.elapsed())
    });
    let outcomes = outcomes.map_err(|_| "watch thread panicked")?;

    assert!(stopped_after < Duration::from_secs(2), "took {:?}", stopped_after);
    assert_eq!(outcomes, vec![LintOutcome::Superseded]);
    assert!(session.registry().is_empty());
    Ok(())
}

#[test]
fn removed_file_is_forgotten() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    let luac = project.fake_compiler("luac", HANGING_LUAC)?;
    let path = project.write("main.lua", "x = broken\n")?;
    let session = session_for(&luac);

    let (id, outcome) = dispatch(&session, WatchEvent::Opened(path.clone())).ok_or("unreadable")?;
    assert!(matches!(outcome, LintOutcome::Published(_)));
    assert_eq!(session.registry().get(&id).map(|d| d.len()), Some(1));

    let (removed_id, outcome) = dispatch(&session, WatchEvent::Removed(path.clone())).ok_or("no outcome")?;
    assert_eq!(outcome, LintOutcome::Cleared);
    assert_eq!(removed_id, id);
    assert!(session.registry().is_empty());

    fs::remove_file(&path)?;
    assert_eq!(dispatch(&session, WatchEvent::Saved(path)), None);
    Ok(())
}

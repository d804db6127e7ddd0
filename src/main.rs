//! # lualinter
//!
//! Runs Lua sources through `luac -p -` or `luajit -bl -` and reports the
//! syntax error the compiler prints, if any.
//!
//! ## Quick Start
//! ```sh
//! lualinter check init.lua
//! lualinter watch src/*.lua --warn-on-save
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use lualinter::e_cli::{Command, OutputFormat};
use lualinter::e_document::LineAccessor;
use lualinter::e_report::{format_human, underline};
use lualinter::e_watch::{watch, FileWatcher};
use lualinter::prelude::*;
use lualinter::Cli;
use std::io::{self, IsTerminal, Read};
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let file_config = match &cli.config {
        Some(path) => LinterConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let (config, found) = LinterConfig::discover().context("loading config")?;
            if let Some(found) = found {
                debug!("config from {}", found.display());
            }
            config
        }
    };
    let config = cli.apply_to(file_config);
    debug!("effective config: {:?}", config);

    let color = !cli.no_color && io::stdout().is_terminal();
    let notifier = Arc::new(ConsoleNotifier::new(!cli.no_color && io::stderr().is_terminal()));
    let session = Arc::new(LintSession::new(config, notifier));

    let code = match &cli.command {
        Command::Check { files } => run_check(&session, files, cli.format, color)?,
        Command::Watch { files, interval } => {
            run_watch(&session, files, Duration::from_millis(*interval), cli.format, color)?
        }
        Command::Parse { file, line } => run_parse(file, line.as_deref(), cli.format, color)?,
    };
    exit(code);
}

/// Lints every file once. Exit code 1 when any file has a diagnostic or
/// could not be linted.
fn run_check(session: &Arc<LintSession>, files: &[PathBuf], format: OutputFormat, color: bool) -> Result<i32> {
    let mut docs = Vec::new();
    let mut failed = false;
    for path in files {
        match TextDocument::open(path) {
            Ok(doc) => docs.push(doc),
            Err(err) => {
                eprintln!("cannot read {}: {}", path.display(), err);
                failed = true;
            }
        }
    }

    let outcomes = lint_all(session, &docs);
    for (doc, outcome) in docs.iter().zip(&outcomes) {
        match outcome {
            LintOutcome::Published(_) | LintOutcome::Failed(_) => failed = true,
            LintOutcome::Skipped => info!("{} is not a Lua file, skipped", doc.path().display()),
            LintOutcome::Disabled => info!("linting is disabled"),
            LintOutcome::Cleared | LintOutcome::Superseded => {}
        }
    }

    match format {
        OutputFormat::Human => {
            for (doc, outcome) in docs.iter().zip(&outcomes) {
                if let LintOutcome::Published(diagnostic) = outcome {
                    print_human(doc, diagnostic, color);
                }
            }
        }
        OutputFormat::Json => print_json(session)?,
    }
    Ok(if failed { 1 } else { 0 })
}

#[cfg(feature = "concurrent")]
fn lint_all(session: &Arc<LintSession>, docs: &[TextDocument]) -> Vec<LintOutcome> {
    use std::sync::mpsc;
    use threadpool::ThreadPool;

    let num_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let pool = ThreadPool::new(num_threads.min(docs.len().max(1)));
    let (tx, rx) = mpsc::channel();
    for (index, doc) in docs.iter().enumerate() {
        let tx = tx.clone();
        let session = Arc::clone(session);
        let event = DocumentEvent::Opened(doc.clone());
        pool.execute(move || {
            let _ = tx.send((index, session.handle_event(&event)));
        });
    }
    drop(tx);

    let mut outcomes = vec![LintOutcome::Superseded; docs.len()];
    for (index, outcome) in rx {
        outcomes[index] = outcome;
    }
    outcomes
}

#[cfg(not(feature = "concurrent"))]
fn lint_all(session: &Arc<LintSession>, docs: &[TextDocument]) -> Vec<LintOutcome> {
    docs.iter()
        .map(|doc| session.handle_event(&DocumentEvent::Opened(doc.clone())))
        .collect()
}

fn run_watch(
    session: &Arc<LintSession>,
    files: &[PathBuf],
    interval: Duration,
    format: OutputFormat,
    color: bool,
) -> Result<i32> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        eprintln!("Ctrl+C pressed, stopping watch...");
        stop_handler.store(true, Ordering::SeqCst);
    })
    .context("installing Ctrl+C handler")?;

    eprintln!("watching {} file(s), Ctrl+C to stop", files.len());
    let watcher = FileWatcher::new(files.to_vec(), interval);
    watch(session, watcher, &stop, |id, outcome| match format {
        OutputFormat::Human => match outcome {
            LintOutcome::Published(diagnostic) => match TextDocument::open(Path::new(id.as_str())) {
                Ok(doc) => print_human(&doc, diagnostic, color),
                Err(_) => println!("{}", format_human(id, diagnostic, color)),
            },
            LintOutcome::Cleared => println!("{}: ok", id),
            LintOutcome::Superseded => debug!("{}: superseded by a newer save", id),
            _ => {}
        },
        OutputFormat::Json => {
            if let Err(err) = print_json(session) {
                error!("{}", err);
            }
        }
    });
    Ok(0)
}

/// Parses compiler output against `file`. With several lines the last one
/// that parses wins, as in a lint cycle.
fn run_parse(file: &Path, line: Option<&str>, format: OutputFormat, color: bool) -> Result<i32> {
    let doc = TextDocument::open(file).with_context(|| format!("reading {}", file.display()))?;
    let output = match line {
        Some(line) => line.to_string(),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let Some(diagnostic) = output
        .lines()
        .filter_map(|chunk| lualinter::parse_diagnostic(&doc, chunk))
        .last()
    else {
        eprintln!("no diagnostic");
        return Ok(1);
    };

    match format {
        OutputFormat::Human => print_human(&doc, &diagnostic, color),
        OutputFormat::Json => {
            let registry = DiagnosticRegistry::new();
            registry.set(doc.id(), vec![diagnostic]);
            print_snapshot(&registry)?;
        }
    }
    Ok(0)
}

fn print_human(doc: &TextDocument, diagnostic: &Diagnostic, color: bool) {
    println!("{}", format_human(doc.id(), diagnostic, color));
    if let Some(text) = doc.line_at(diagnostic.range.start.line as usize) {
        println!("    {}", text);
        println!("    {}", underline(text, diagnostic));
    }
}

fn print_json(session: &LintSession) -> Result<()> {
    print_snapshot(session.registry())
}

#[cfg(feature = "uses_serde")]
fn print_snapshot(registry: &DiagnosticRegistry) -> Result<()> {
    let json = lualinter::e_report::format_json(&registry.snapshot()).context("serializing diagnostics")?;
    println!("{}", json);
    Ok(())
}

#[cfg(not(feature = "uses_serde"))]
fn print_snapshot(_registry: &DiagnosticRegistry) -> Result<()> {
    anyhow::bail!("JSON output needs the uses_serde feature")
}

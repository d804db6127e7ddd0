use crate::e_config::{Interpreter, LinterConfig};
use crate::e_watch::DEFAULT_POLL_INTERVAL;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lua syntax checking through luac or luajit.", long_about = None)]
pub struct Cli {
    /// Config file; by default lualinter.toml or .lualinter.toml is searched upward.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        short = 'i',
        global = true,
        help = "Compiler to use: luac or luajit. Unknown names fall back to luac."
    )]
    pub interpreter: Option<String>,

    #[arg(long, global = true, help = "Explicit path of the compiler executable.")]
    pub compiler_path: Option<PathBuf>,

    #[arg(long, global = true, help = "Warn when a saved file contains an error.")]
    pub warn_on_save: bool,

    #[arg(long, global = true, help = "Turn linting off.")]
    pub disable: bool,

    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    #[arg(long, global = true, help = "Disable colored output.")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lint each file once and exit non-zero if any has an error.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Lint files when they appear and every time they are saved.
    Watch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64, help = "Polling interval in milliseconds.")]
        interval: u64,
    },
    /// Parse one line of compiler output against a source file.
    Parse {
        #[arg(long)]
        file: PathBuf,
        /// Compiler output line; read from stdin when omitted.
        line: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded config.
    pub fn apply_to(&self, mut config: LinterConfig) -> LinterConfig {
        if self.disable {
            config.enable = false;
        }
        if let Some(name) = &self.interpreter {
            config.interpreter = Interpreter::from_name_or_default(name);
        }
        if let Some(path) = &self.compiler_path {
            config.compiler_path = Some(path.clone());
        }
        if self.warn_on_save {
            config.warn_on_save = true;
        }
        config
    }
}

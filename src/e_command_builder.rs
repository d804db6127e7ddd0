use crate::e_config::{Interpreter, LinterConfig};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use which::which;

/// Argument telling both compilers to read the chunk from stdin.
pub const STDIN_ARG: &str = "-";

/// Everything needed to launch one lint cycle's compiler process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCommand {
    pub interpreter: Interpreter,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CompilerCommand {
    /// Name used in notifications, e.g. `luac` or the configured path.
    pub fn display_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// A `Command` with all three standard streams piped.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.display_name()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// A builder that constructs the compiler invocation for a document.
#[derive(Debug, Clone, Default)]
pub struct CompilerCommandBuilder {
    interpreter: Interpreter,
    program: Option<PathBuf>,
    cwd: Option<PathBuf>,
}

impl CompilerCommandBuilder {
    pub fn new() -> Self {
        CompilerCommandBuilder::default()
    }

    /// Takes the interpreter and optional executable path from the config.
    pub fn with_config(mut self, config: &LinterConfig) -> Self {
        self.interpreter = config.interpreter;
        self.program = config.compiler_path.clone();
        self
    }

    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_cwd(mut self, cwd: &Path) -> Self {
        self.cwd = Some(cwd.to_path_buf());
        self
    }

    /// Resolves the executable through `PATH` when no explicit path was
    /// given. An unresolvable name is kept as is so the spawn error names it.
    pub fn build(self) -> CompilerCommand {
        let program = match self.program {
            Some(path) => path,
            None => {
                let name = self.interpreter.program();
                match which(name) {
                    Ok(path) => path,
                    Err(err) => {
                        log::debug!("'{}' not found in PATH: {}", name, err);
                        PathBuf::from(name)
                    }
                }
            }
        };

        let args = vec![
            self.interpreter.check_flag().to_string(),
            STDIN_ARG.to_string(),
        ];

        CompilerCommand {
            interpreter: self.interpreter,
            program,
            args,
            cwd: self.cwd.unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

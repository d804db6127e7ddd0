use crate::e_runner::LintError;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml::Value;

/// File names searched for, in order, in each directory walking upward.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["lualinter.toml", ".lualinter.toml"];

/// Table holding the linter settings inside the config file.
pub const CONFIG_TABLE: &str = "lualinter";

/// The compilers the linter knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpreter {
    #[default]
    Luac,
    LuaJit,
}

impl Interpreter {
    /// Recognised names map to themselves; anything else is `luac`.
    pub fn from_name_or_default(name: &str) -> Self {
        match name.parse() {
            Ok(interpreter) => interpreter,
            Err(_) => {
                log::warn!("unknown interpreter {:?}, falling back to luac", name);
                Interpreter::Luac
            }
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Interpreter::Luac => "luac",
            Interpreter::LuaJit => "luajit",
        }
    }

    /// Flags that make the compiler only check syntax.
    pub fn check_flag(&self) -> &'static str {
        match self {
            Interpreter::Luac => "-p",
            Interpreter::LuaJit => "-bl",
        }
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for Interpreter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "luac" => Ok(Interpreter::Luac),
            "luajit" => Ok(Interpreter::LuaJit),
            other => Err(format!("unknown interpreter '{}'", other)),
        }
    }
}

/// Settings recognised by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinterConfig {
    /// Master switch.
    pub enable: bool,
    pub interpreter: Interpreter,
    /// Raise a warning notification when a saved file has an error.
    pub warn_on_save: bool,
    /// Explicit compiler executable; the interpreter still picks the flags.
    pub compiler_path: Option<PathBuf>,
}

impl Default for LinterConfig {
    fn default() -> Self {
        LinterConfig {
            enable: true,
            interpreter: Interpreter::Luac,
            warn_on_save: false,
            compiler_path: None,
        }
    }
}

impl LinterConfig {
    /// Parses the `[lualinter]` table of a TOML document. A missing table
    /// yields the defaults. Keys use the editor-setting spelling
    /// (`warnOnSave`, `compilerPath`).
    pub fn from_toml_str(contents: &str) -> Result<Self, String> {
        let value: Value = contents.parse::<Value>().map_err(|e| e.to_string())?;
        let mut config = LinterConfig::default();
        let table = match value.get(CONFIG_TABLE) {
            Some(Value::Table(table)) => table,
            Some(_) => return Err(format!("'{}' must be a table", CONFIG_TABLE)),
            None => return Ok(config),
        };

        for (key, value) in table {
            match key.as_str() {
                "enable" => config.enable = expect_bool(key, value)?,
                "warnOnSave" => config.warn_on_save = expect_bool(key, value)?,
                "interpreter" => {
                    config.interpreter = Interpreter::from_name_or_default(expect_str(key, value)?)
                }
                "compilerPath" => {
                    let path = expect_str(key, value)?;
                    config.compiler_path = (!path.is_empty()).then(|| PathBuf::from(path));
                }
                other => log::warn!("ignoring unknown setting {}.{}", CONFIG_TABLE, other),
            }
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, LintError> {
        let contents = fs::read_to_string(path)?;
        LinterConfig::from_toml_str(&contents).map_err(|message| LintError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Loads the config found by [`locate_config`] from the current
    /// directory, or the defaults when there is none.
    pub fn discover() -> Result<(Self, Option<PathBuf>), LintError> {
        let cwd = env::current_dir()?;
        match locate_config(&cwd) {
            Some(path) => {
                log::debug!("using config {}", path.display());
                Ok((LinterConfig::load(&path)?, Some(path)))
            }
            None => Ok((LinterConfig::default(), None)),
        }
    }
}

/// Walks from `start` up to the filesystem root and returns the first config
/// file found.
pub fn locate_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

fn expect_bool(key: &str, value: &Value) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("{}.{} must be a boolean", CONFIG_TABLE, key))
}

fn expect_str<'a>(key: &str, value: &'a Value) -> Result<&'a str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("{}.{} must be a string", CONFIG_TABLE, key))
}

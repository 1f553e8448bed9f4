use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "abook-parser";
const DEFAULT_ADDRESSBOOK: &str = "~/.abook/addressbook";
const DEFAULT_PICKER_PROGRAM: &str = "fzf";

const KNOWN_TOP_LEVEL: &[&str] = &["addressbook", "editor", "picker"];
const KNOWN_EDITOR: &[&str] = &["command"];
const KNOWN_PICKER: &[&str] = &["backend", "command"];

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the configuration came from; `None` when running on defaults.
    pub config_path: Option<PathBuf>,
    /// Addressbook used by `edit` when no file is given.
    pub addressbook: PathBuf,
    /// Explicit editor command. When unset `$VISUAL`, then `$EDITOR`, then `vi`.
    pub editor: Option<CommandExec>,
    pub picker: PickerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            addressbook: expand_tilde(Path::new(DEFAULT_ADDRESSBOOK)),
            editor: None,
            picker: PickerConfig::default(),
        }
    }
}

/// An external program plus fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandExec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Split a shell-style string such as `code --wait` on whitespace.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => Self::from_command_line(&cmd),
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerBackend {
    /// Full-screen list drawn by this program.
    Builtin,
    /// External fuzzy finder, `fzf` unless configured otherwise.
    Fzf,
}

impl PickerBackend {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "builtin" | "tui" => Some(PickerBackend::Builtin),
            "fzf" | "external" => Some(PickerBackend::Fzf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub backend: PickerBackend,
    pub command: CommandExec,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            backend: PickerBackend::Builtin,
            command: CommandExec::new(DEFAULT_PICKER_PROGRAM),
        }
    }
}

// =============================================================================
// File representation
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    addressbook: Option<PathBuf>,
    editor: EditorFile,
    picker: PickerFile,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EditorFile {
    command: Option<CommandDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PickerFile {
    backend: Option<String>,
    command: Option<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

impl ConfigFile {
    fn into_config(self, path: PathBuf) -> Result<Config> {
        let defaults = Config::default();

        let backend = match self.picker.backend.as_deref() {
            None => defaults.picker.backend,
            Some(raw) => match PickerBackend::from_str(raw) {
                Some(backend) => backend,
                None => bail!(
                    "picker.backend must be \"builtin\" or \"fzf\", got \"{}\"",
                    raw
                ),
            },
        };

        Ok(Config {
            config_path: Some(path),
            addressbook: self
                .addressbook
                .map(|p| expand_tilde(&p))
                .unwrap_or(defaults.addressbook),
            editor: self.editor.command.and_then(CommandExec::from_def),
            picker: PickerConfig {
                backend,
                command: self
                    .picker
                    .command
                    .and_then(CommandExec::from_def)
                    .unwrap_or(defaults.picker.command),
            },
        })
    }
}

// =============================================================================
// Loading
// =============================================================================

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration. An explicit path must exist; the default location
/// is optional and falls back to built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            let path = expand_tilde(path);
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path
        }
        None => match config_path() {
            Ok(path) if path.exists() => path,
            Ok(_) => return Ok(Config::default()),
            Err(err) => {
                log::debug!("no configuration directory: {:#}", err);
                return Ok(Config::default());
            }
        },
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    let config = parse(&raw, path.clone())
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    log::debug!("loaded configuration from {}", path.display());
    Ok(config)
}

fn parse(raw: &str, path: PathBuf) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse TOML")?;
    warn_unknown_keys(&value);

    let file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;
    file.into_config(path)
}

/// Expand ~ to home directory in paths
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };
    for (key, nested) in table {
        match key.as_str() {
            "editor" => warn_unknown_in_context(nested, "editor", KNOWN_EDITOR),
            "picker" => warn_unknown_in_context(nested, "picker", KNOWN_PICKER),
            other if !KNOWN_TOP_LEVEL.contains(&other) => {
                log::warn!("unknown configuration key `{}`", other);
            }
            _ => {}
        }
    }
}

fn warn_unknown_in_context(value: &toml::Value, context: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    for key in table.keys() {
        if !known.contains(&key.as_str()) {
            log::warn!("unknown configuration key `{}.{}`", context, key);
        }
    }
}

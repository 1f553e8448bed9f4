use std::env;
use std::fs;
use std::process::Command;

use anyhow::{Context, Result};

use crate::config::CommandExec;

const FALLBACK_EDITOR: &str = "vi";

/// Lets the user change a piece of text. `Ok(None)` means the edit was
/// abandoned and the original should be kept.
pub trait Editor {
    fn edit(&mut self, text: &str) -> Result<Option<String>>;
}

/// Runs an external editor on a temporary file.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: CommandExec,
}

impl ExternalEditor {
    pub fn new(command: CommandExec) -> Self {
        Self { command }
    }

    /// Use the configured command, else `$VISUAL`, else `$EDITOR`, else `vi`.
    pub fn from_config(configured: Option<&CommandExec>) -> Self {
        let command = configured
            .cloned()
            .or_else(|| editor_from_env("VISUAL"))
            .or_else(|| editor_from_env("EDITOR"))
            .unwrap_or_else(|| CommandExec::new(FALLBACK_EDITOR));
        Self::new(command)
    }

    #[cfg(test)]
    pub fn command(&self) -> &CommandExec {
        &self.command
    }
}

fn editor_from_env(var: &str) -> Option<CommandExec> {
    env::var(var)
        .ok()
        .and_then(|value| CommandExec::from_command_line(&value))
}

impl Editor for ExternalEditor {
    fn edit(&mut self, text: &str) -> Result<Option<String>> {
        let file = tempfile::Builder::new()
            .prefix("abook-contact-")
            .suffix(".ini")
            .tempfile()
            .context("failed to create temporary file for editing")?;
        fs::write(file.path(), text)
            .with_context(|| format!("failed to write {}", file.path().display()))?;

        log::debug!(
            "launching `{}` on {}",
            self.command.program,
            file.path().display()
        );
        let status = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(file.path())
            .status()
            .with_context(|| format!("failed to launch editor `{}`", self.command.program))?;

        if !status.success() {
            log::warn!(
                "editor `{}` exited with {}; discarding changes",
                self.command.program,
                status
            );
            return Ok(None);
        }

        let edited = fs::read_to_string(file.path())
            .with_context(|| format!("failed to read back {}", file.path().display()))?;
        Ok(Some(edited))
    }
}

use std::io::{self, ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use crate::config::{CommandExec, PickerBackend, PickerConfig};
use crate::ui::app::TuiPicker;

/// Asks the user to choose one of `candidates`. Returns the index of the
/// chosen entry, or `None` when the user backed out.
pub trait Picker {
    fn pick(&mut self, prompt: &str, candidates: &[String]) -> Result<Option<usize>>;
}

pub fn from_config(config: &PickerConfig) -> Box<dyn Picker> {
    match config.backend {
        PickerBackend::Builtin => Box::new(TuiPicker::new()),
        PickerBackend::Fzf => Box::new(FzfPicker::new(config.command.clone())),
    }
}

/// Pipes candidates through an external fuzzy finder such as `fzf` or `sk`.
#[derive(Debug, Clone)]
pub struct FzfPicker {
    command: CommandExec,
}

impl FzfPicker {
    pub fn new(command: CommandExec) -> Self {
        Self { command }
    }

    /// fzf and skim both accept `--prompt`; other finders get no extra flags.
    fn prompt_args(&self, prompt: &str) -> Vec<String> {
        let name = Path::new(&self.command.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if matches!(name, "fzf" | "sk") {
            vec![format!("--prompt={}> ", prompt)]
        } else {
            Vec::new()
        }
    }
}

impl Picker for FzfPicker {
    fn pick(&mut self, prompt: &str, candidates: &[String]) -> Result<Option<usize>> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .args(self.prompt_args(prompt))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.command.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A finder may quit before reading everything.
            match write_candidates(&mut stdin, candidates) {
                Err(err) if err.kind() != ErrorKind::BrokenPipe => return Err(err.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output()?;
        match output.status.code() {
            Some(0) => {}
            // no match / interrupted
            Some(1) | Some(130) => return Ok(None),
            _ => bail!("`{}` exited with {}", self.command.program, output.status),
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(chosen) = stdout.lines().next().filter(|line| !line.is_empty()) else {
            return Ok(None);
        };
        Ok(candidates.iter().position(|c| c == chosen))
    }
}

fn write_candidates(out: &mut impl Write, candidates: &[String]) -> io::Result<()> {
    for candidate in candidates {
        writeln!(out, "{}", candidate)?;
    }
    out.flush()
}

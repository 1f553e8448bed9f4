//! An addressbook bound to the file it was read from.
//!
//! `save` rewrites the whole file in place. There is no locking, no
//! temporary file and no backup: a crash mid-write can truncate the
//! addressbook, and a concurrent writer is silently overwritten.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::expand_tilde;
use crate::editor::Editor;
use crate::error::AbookError;
use crate::fragment;
use crate::model::{AddressbookData, Record};
use crate::picker::Picker;

/// Result of handing one record to an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The editor was closed without saving or reported failure.
    Cancelled,
    /// The record came back identical; nothing was written.
    Unchanged,
    /// The record changed and the file was rewritten.
    Updated,
}

#[derive(Debug)]
pub struct AbookFile {
    path: PathBuf,
    pub data: AddressbookData,
}

impl AbookFile {
    pub fn load(path: &Path) -> Result<Self> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read addressbook at {}", path.display()))?;
        let data = AddressbookData::parse(&text)
            .with_context(|| format!("failed to parse addressbook at {}", path.display()))?;
        log::debug!("loaded {} from {}", data, path.display());
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the bound file with the current in-memory state.
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.data.serialize())
            .with_context(|| format!("failed to write addressbook to {}", self.path.display()))?;
        log::info!(
            "wrote {} records to {}",
            self.data.items.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Two prompts: first a field name (most common first), then one of
    /// the records carrying that field.
    pub fn find_interactive(&self, picker: &mut dyn Picker) -> Result<(u32, Record)> {
        if self.data.items.is_empty() {
            log::info!("{} has no contacts to pick from", self.path.display());
            return Err(AbookError::Aborted.into());
        }
        let fields = self.data.field_names();
        let field = picker
            .pick("field", &fields)?
            .and_then(|idx| fields.get(idx))
            .ok_or(AbookError::Aborted)?;

        let candidates: Vec<(u32, &Record)> = self
            .data
            .items
            .iter()
            .filter(|(_, record)| record.contains_key(field))
            .collect();
        let summaries: Vec<String> = candidates
            .iter()
            .map(|(id, record)| summary_line(*id, record))
            .collect();

        let (id, record) = picker
            .pick(field, &summaries)?
            .and_then(|idx| candidates.get(idx).copied())
            .ok_or(AbookError::Aborted)?;
        Ok((id, record.clone()))
    }

    /// Let the user rewrite record `id` through `editor`. A changed record
    /// replaces the old one in place and the file is saved; an edited
    /// fragment that breaks the contract leaves both memory and disk alone.
    pub fn edit_record(
        &mut self,
        id: u32,
        original: &Record,
        editor: &mut dyn Editor,
    ) -> Result<EditOutcome> {
        let text = fragment::render(id, original);
        let Some(edited) = editor.edit(&text)? else {
            return Ok(EditOutcome::Cancelled);
        };

        let updated = fragment::parse_edited(&edited, id)?;
        if &updated == original {
            log::debug!("record {} unchanged", id);
            return Ok(EditOutcome::Unchanged);
        }

        self.data.items.insert(id, updated);
        self.save()?;
        Ok(EditOutcome::Updated)
    }
}

impl fmt::Display for AbookFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AbookFile(path={})", self.path.display())
    }
}

/// `<id>: key=value key=value ...`
pub fn summary_line(id: u32, record: &Record) -> String {
    let fields = record
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}: {}", id, fields)
}

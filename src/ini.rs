//! Minimal INI tokenizer for addressbook files.
//!
//! Only the subset abook writes is understood: `[section]` headers,
//! `key=value` entries, blank lines and whole-line `#` / `;` comments.
//! There is no interpolation, no continuation lines and no inline comments.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{AbookError, Result};

/// One `[name]` block together with its entries in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// 1-based line number of the header.
    pub line: usize,
    pub entries: IndexMap<String, String>,
}

pub fn parse_sections(text: &str) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r').trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = inner.trim();
            if name.is_empty() {
                return Err(AbookError::format_at(line_no, "empty section name"));
            }
            if !seen.insert(name.to_string()) {
                return Err(AbookError::format_at(
                    line_no,
                    format!("duplicate section [{}]", name),
                ));
            }
            sections.push(Section {
                name: name.to_string(),
                line: line_no,
                entries: IndexMap::new(),
            });
            continue;
        }

        let Some(current) = sections.last_mut() else {
            return Err(AbookError::format_at(
                line_no,
                "entry found before any section header",
            ));
        };

        let Some((key, value)) = line.split_once('=') else {
            return Err(AbookError::format_at(
                line_no,
                format!("expected `key=value`, found `{}`", line),
            ));
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(AbookError::format_at(line_no, "empty key"));
        }

        // Repeated keys overwrite in place, like ordinary INI readers.
        current
            .entries
            .insert(key.to_string(), value.trim().to_string());
    }

    Ok(sections)
}

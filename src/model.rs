//! In-memory addressbook: the `[format]` block plus numbered contact records,
//! and the text/JSON codecs for it.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{AbookError, Result};
use crate::fragment;
use crate::ini;

pub const FORMAT_SECTION: &str = "format";
const FILE_HEADER: &str = "# abook addressbook file\n";

/// One contact: field name to value, in the order the fields were written.
pub type Record = IndexMap<String, String>;

/// Records keyed by id. Iteration follows insertion order, which is the
/// order sections appeared in the file or the order produced by `sort`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    entries: IndexMap<u32, Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store with ids `0..n` assigned in the given order.
    pub fn from_ordered<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let entries = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| (idx as u32, record))
            .collect();
        Self { entries }
    }

    /// Replacing an existing id keeps its position; new ids are appended.
    pub fn insert(&mut self, id: u32, record: Record) -> Option<Record> {
        self.entries.insert(id, record)
    }

    #[cfg(test)]
    pub fn get(&self, id: u32) -> Option<&Record> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Record)> {
        self.entries.iter().map(|(id, record)| (*id, record))
    }

    pub fn into_records(self) -> impl Iterator<Item = (u32, Record)> {
        self.entries.into_iter()
    }
}

impl Serialize for RecordStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, record) in &self.entries {
            map.serialize_entry(&id.to_string(), record)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressbookData {
    pub format: Record,
    #[serde(rename = "contacts")]
    pub items: RecordStore,
}

impl AddressbookData {
    /// Parse addressbook text. A `[format]` section is mandatory and every
    /// other section name must be a non-negative integer.
    pub fn parse(text: &str) -> Result<Self> {
        let mut format = None;
        let mut items = RecordStore::new();

        for section in ini::parse_sections(text)? {
            if section.name == FORMAT_SECTION {
                format = Some(section.entries);
                continue;
            }
            let id = record_id(&section)?;
            ensure_unique(&items, id, &section)?;
            items.insert(id, section.entries);
        }

        let format = format.ok_or_else(|| AbookError::format("missing [format] section"))?;
        Ok(Self { format, items })
    }

    /// Render in abook's on-disk layout. Output order mirrors the in-memory
    /// order of both the format block and the records.
    pub fn serialize(&self) -> String {
        let mut out = String::from(FILE_HEADER);
        out.push_str("\n[format]\n");
        for (key, value) in &self.format {
            out.push_str(&format!("{}={}\n", key, value));
        }
        out.push('\n');

        for (id, record) in self.items.iter() {
            out.push_str(&fragment::render(id, record));
        }
        out
    }

    /// `{"format": {..}, "contacts": {"<id>": {..}}}` with 4-space indentation.
    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }

    #[cfg(test)]
    pub fn get(&self, id: u32) -> Option<&Record> {
        self.items.get(id)
    }

    /// Records carrying `sort_key` come first, stably ordered by the
    /// case-folded value (`ß` and `ss` compare equal); the rest keep their relative order. Ids are
    /// reassigned as `0..n` afterwards.
    pub fn sort(&mut self, sort_key: &str) {
        let (mut sortable, rest): (Vec<Record>, Vec<Record>) = std::mem::take(&mut self.items)
            .into_records()
            .map(|(_, record)| record)
            .partition(|record| record.contains_key(sort_key));

        sortable.sort_by_cached_key(|record| {
            record
                .get(sort_key)
                .map(|value| caseless::default_case_fold_str(value))
                .unwrap_or_default()
        });

        self.items = RecordStore::from_ordered(sortable.into_iter().chain(rest));
    }

    /// Field names seen across all records, most frequent first. Ties keep
    /// the order in which the names were first encountered.
    pub fn field_names(&self) -> Vec<String> {
        self.field_frequencies()
            .into_iter()
            .map(|(key, _)| key)
            .collect()
    }

    /// Like `field_names`, with the number of records carrying each field.
    pub fn field_frequencies(&self) -> Vec<(String, usize)> {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for (_, record) in self.items.iter() {
            for key in record.keys() {
                *counts.entry(key.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(key, count)| (key.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

impl fmt::Display for AddressbookData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = self
            .format
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "AddressbookData(items=<{} items>, format={{{}}})",
            self.items.len(),
            format
        )
    }
}

/// Pretty JSON with 4-space indentation; map keys keep insertion order.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn parse_record_id(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Record id named by a section header.
pub(crate) fn record_id(section: &ini::Section) -> Result<u32> {
    parse_record_id(&section.name).ok_or_else(|| {
        AbookError::format_at(
            section.line,
            format!("section [{}] is not a record id", section.name),
        )
    })
}

/// `[1]` and `[01]` name the same record.
pub(crate) fn ensure_unique(items: &RecordStore, id: u32, section: &ini::Section) -> Result<()> {
    if items.contains(id) {
        return Err(AbookError::format_at(
            section.line,
            format!("duplicate record id {}", id),
        ));
    }
    Ok(())
}

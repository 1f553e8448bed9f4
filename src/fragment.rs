//! Single-contact text, used to hand one record to an editor and read it back.

use crate::error::{AbookError, Result};
use crate::ini;
use crate::model::{ensure_unique, record_id, Record, RecordStore};

/// `\n[<id>]\n` followed by one `key=value` line per field. The same text
/// is what the full serializer writes for each record.
pub fn render(id: u32, record: &Record) -> String {
    let mut out = format!("\n[{}]\n", id);
    for (key, value) in record {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Parse fragment text into records. Unlike a full addressbook no
/// `[format]` section is expected, and one is rejected like any other
/// non-numeric section.
pub fn parse_fragment(text: &str) -> Result<RecordStore> {
    let mut records = RecordStore::new();
    for section in ini::parse_sections(text)? {
        let id = record_id(&section)?;
        ensure_unique(&records, id, &section)?;
        records.insert(id, section.entries);
    }
    Ok(records)
}

/// Read back an edited fragment. It must still contain exactly one record,
/// under the id it was rendered with.
pub fn parse_edited(text: &str, expected_id: u32) -> Result<Record> {
    let records = parse_fragment(text)
        .map_err(|err| AbookError::EditContract(err.to_string()))?;

    if records.len() != 1 {
        return Err(AbookError::EditContract(format!(
            "expected exactly one contact, found {}",
            records.len()
        )));
    }

    let Some((id, record)) = records.into_records().next() else {
        return Err(AbookError::EditContract("no contact found".to_string()));
    };
    if id != expected_id {
        return Err(AbookError::EditContract(format!(
            "contact id changed from {} to {}",
            expected_id, id
        )));
    }
    Ok(record)
}

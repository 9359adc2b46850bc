//! Line-oriented entry list format, the reference implementation of the
//! import/export adapter contract (a list of flat entry records).
//!
//! One entry per line, `;`-separated:
//!
//! ```text
//! last_name;first_name;gender;year;chip;club;class
//! ```
//!
//! Trailing columns may be omitted; `#` starts a comment line.

use otime_types::competitor::Gender;
use otime_types::entry::{EntryImport, EntryType};

use crate::error::{Error, Result};

pub fn parse(content: &str) -> Result<Vec<EntryImport>> {
    let mut records = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = line.split(';').map(str::trim).collect();
        if columns.len() < 2 {
            return Err(Error::Validation(format!(
                "line {}: expected at least last and first name",
                number + 1
            )));
        }
        let column = |index: usize| columns.get(index).copied().unwrap_or("");

        let gender = match column(2) {
            "" => None,
            raw => Some(Gender::from_db(raw).ok_or_else(|| {
                Error::Validation(format!("line {}: invalid gender {raw:?}", number + 1))
            })?),
        };
        let year = match column(3) {
            "" => None,
            raw => Some(raw.parse::<i32>().map_err(|_| {
                Error::Validation(format!("line {}: invalid year {raw:?}", number + 1))
            })?),
        };

        records.push(EntryImport {
            last_name: column(0).to_string(),
            first_name: column(1).to_string(),
            gender,
            year,
            chip: column(4).to_string(),
            club_name: Some(column(5).to_string()).filter(|s| !s.is_empty()),
            class_name: Some(column(6).to_string()).filter(|s| !s.is_empty()),
            ..EntryImport::default()
        });
    }
    Ok(records)
}

/// Export entries in the same format; unassigned results have no name and
/// are skipped.
pub fn create(entries: &[EntryType]) -> String {
    let mut out = String::new();
    for entry in entries {
        let (Some(last), Some(first)) = (&entry.last_name, &entry.first_name) else {
            continue;
        };
        out.push_str(&format!(
            "{};{};{};{};{};{};{}\n",
            last,
            first,
            entry.gender.map_or("", Gender::as_str),
            entry.year.map_or(String::new(), |y| y.to_string()),
            entry.chip,
            entry.club_name.as_deref().unwrap_or(""),
            entry.class_name.as_deref().unwrap_or(""),
        ));
    }
    out
}

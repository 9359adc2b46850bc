use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::competitor::{Gender, gender_str};
use crate::event::ClassType;
use crate::result::PersonRaceResult;

/// Scheduled start, distinct from the punched start on the card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonRaceStart {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

/// An entry of an event: a registration plus its result. `competitor_id`
/// and `class_id` are both unset for unassigned results (card reads not yet
/// tied to a registered competitor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryType {
    pub id: i64,
    pub event_id: i64,
    pub competitor_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub year: Option<i32>,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
    pub club_id: Option<i64>,
    pub club_name: Option<String>,
    pub not_competing: bool,
    pub chip: String,
    /// Values of the event's custom columns, keyed by column index.
    pub fields: BTreeMap<usize, String>,
    pub result: PersonRaceResult,
    pub start: PersonRaceStart,
}

/// A flat entry record as produced by the import adapters
/// (one record per competitor, names instead of ids).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryImport {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, with = "gender_str")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub chip: String,
    #[serde(default)]
    pub club_name: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub not_competing: bool,
    #[serde(default)]
    pub result: PersonRaceResult,
    #[serde(default)]
    pub start: PersonRaceStart,
}

/// An entry with its place in the class ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Unset for entries outside the ranking (not competing, not OK).
    pub rank: Option<u32>,
    /// Seconds behind the class winner.
    pub time_behind: Option<i64>,
    pub entry: EntryType,
}

/// Ranked results of one class of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassResults {
    pub class: ClassType,
    pub entries: Vec<RankedEntry>,
}

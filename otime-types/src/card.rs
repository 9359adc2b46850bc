use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::{PersonRaceResult, ResultStatus};

/// Kind of a card-reader log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardEntryType {
    CardRead,
    CardInserted,
    ReaderConnected,
    ReaderDisconnected,
}

/// One punch as transmitted by a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPunch {
    pub control_code: String,
    pub punch_time: DateTime<Utc>,
}

/// The raw JSON document a card reader sends. Strict typed deserialization
/// is the schema: unknown entry types or malformed timestamps are rejected
/// before any state is touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardReaderLog {
    pub entry_type: CardEntryType,
    pub entry_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub punches: Vec<CardPunch>,
}

/// A validated card-reader message, with the seed result built for card reads.
#[derive(Debug, Clone, PartialEq)]
pub struct CardReaderMessage {
    pub entry_type: CardEntryType,
    pub entry_time: DateTime<Utc>,
    pub control_card: Option<String>,
    pub result: Option<PersonRaceResult>,
}

/// Outcome of a card read in a light event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightStatus {
    SecondReading,
    Unassigned,
    OkRegistered,
}

/// The answer delivered back to the reader. Problems are reported through
/// `error` rather than by failing the connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardReaderResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<DateTime<Utc>>,
    pub event_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<String>,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResultStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_controls: Option<Vec<String>>,
    #[serde(default, rename = "light_status", skip_serializing_if = "Option::is_none")]
    pub light_status: Option<LightStatus>,
}

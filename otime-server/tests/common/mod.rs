#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use otime_server::cache::ResultCache;
use otime_server::db::Database;
use otime_server::model::{entries::EntryUpsert, events, registry};
use otime_types::card::{CardEntryType, CardReaderMessage};
use otime_types::class_params::ClassParams;
use otime_types::competitor::Gender;
use otime_types::event::EventType;
use otime_types::result::{PersonRaceResult, PunchTime, ResultStatus, SplitTime};

pub async fn test_db() -> Database {
    Database::open_in_memory().await.expect("in-memory database")
}

pub fn ts(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 1, 1, hour, min, sec).unwrap()
}

pub async fn create_event(
    db: &Database,
    cache: &ResultCache,
    name: &str,
    key: &str,
    light: bool,
) -> EventType {
    events::add_or_update_event(
        db,
        cache,
        events::EventUpsert {
            id: None,
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            key: Some(key.to_string()),
            publish: false,
            series: None,
            fields: Vec::new(),
            light,
            streaming_address: None,
            streaming_key: None,
            streaming_enabled: None,
        },
    )
    .await
    .expect("create event")
}

pub async fn create_course(
    db: &Database,
    cache: &ResultCache,
    event_id: i64,
    name: &str,
    controls: &[&str],
) -> i64 {
    registry::add_course(
        db,
        cache,
        event_id,
        name,
        Some(4500.0),
        Some(90.0),
        controls.iter().map(|c| c.to_string()).collect(),
    )
    .await
    .expect("create course")
}

pub async fn create_class(
    db: &Database,
    cache: &ResultCache,
    event_id: i64,
    name: &str,
    course_id: Option<i64>,
) -> i64 {
    registry::add_class(db, cache, event_id, name, None, course_id, ClassParams::default())
        .await
        .expect("create class")
}

pub async fn create_competitor(
    db: &Database,
    first_name: &str,
    last_name: &str,
    chip: &str,
) -> i64 {
    registry::add_competitor(
        db,
        first_name,
        last_name,
        None,
        Some(Gender::Female),
        Some(1990),
        chip,
    )
    .await
    .expect("create competitor")
}

/// A freshly read card: status Finished, SI times mirrored, punches
/// additional, exactly like the reader message parser produces.
pub fn read_result(
    start: Option<DateTime<Utc>>,
    finish: Option<DateTime<Utc>>,
    punches: &[(&str, DateTime<Utc>)],
) -> PersonRaceResult {
    PersonRaceResult {
        status: ResultStatus::Finished,
        start_time: start,
        finish_time: finish,
        punched_start_time: start,
        punched_finish_time: finish,
        si_punched_start_time: start,
        si_punched_finish_time: finish,
        split_times: punches
            .iter()
            .map(|(code, t)| SplitTime {
                control_code: code.to_string(),
                punch_time: Some(PunchTime::Known(*t)),
                si_punch_time: Some(PunchTime::Known(*t)),
                ..SplitTime::default()
            })
            .collect(),
        ..PersonRaceResult::default()
    }
}

/// Start 12:38:59, all of 101/102/103 punched, finish 12:39:07.
pub fn clean_run() -> PersonRaceResult {
    read_result(
        Some(ts(12, 38, 59)),
        Some(ts(12, 39, 7)),
        &[
            ("101", ts(12, 39, 1)),
            ("102", ts(12, 39, 3)),
            ("103", ts(12, 39, 5)),
        ],
    )
}

/// Like [`clean_run`], but control 102 was never punched.
pub fn run_missing_102() -> PersonRaceResult {
    read_result(
        Some(ts(12, 38, 59)),
        Some(ts(12, 39, 7)),
        &[("101", ts(12, 39, 1)), ("103", ts(12, 39, 5))],
    )
}

pub fn card_read(card: &str, result: PersonRaceResult) -> CardReaderMessage {
    CardReaderMessage {
        entry_type: CardEntryType::CardRead,
        entry_time: ts(13, 38, 59),
        control_card: Some(card.to_string()),
        result: Some(result),
    }
}

pub fn entry_upsert(event_id: i64, class_id: i64, first: &str, last: &str, chip: &str) -> EntryUpsert {
    EntryUpsert {
        id: None,
        event_id,
        competitor_id: None,
        first_name: first.to_string(),
        last_name: last.to_string(),
        gender: Some(Gender::Female),
        year: Some(1957),
        class_id,
        club_id: None,
        not_competing: false,
        chip: chip.to_string(),
        fields: BTreeMap::new(),
        status: ResultStatus::Inactive,
        start_time: None,
        result_id: None,
    }
}

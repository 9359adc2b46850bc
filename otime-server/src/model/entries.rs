use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use otime_engine::compute_result;
use otime_types::class_params::ClassParams;
use otime_types::competitor::Gender;
use otime_types::entry::{EntryImport, EntryType, PersonRaceStart};
use otime_types::result::{PersonRaceResult, PunchTime, ResultStatus, SplitTime};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::cache::ResultCache;
use crate::db::{Database, TransactionMode, Tx, queries};
use crate::error::{Error, Result};
use crate::model::class_controls;

/// Parameters of [`add_or_update_entry`]. `result_id` transfers another
/// entry's result onto this one (`-1` clears the result instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryUpsert {
    #[serde(default)]
    pub id: Option<i64>,
    pub event_id: i64,
    #[serde(default)]
    pub competitor_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub year: Option<i32>,
    pub class_id: i64,
    #[serde(default)]
    pub club_id: Option<i64>,
    #[serde(default)]
    pub not_competing: bool,
    #[serde(default)]
    pub chip: String,
    #[serde(default)]
    pub fields: BTreeMap<usize, String>,
    #[serde(default)]
    pub status: ResultStatus,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_id: Option<i64>,
}

/// Add a new entry to an event or update an existing one, reconciling the
/// competitor record along the way.
///
/// Returns the entry id and whether the entry was forced to `not_competing`
/// because the competitor is already registered for the event.
pub async fn add_or_update_entry(
    db: &Database,
    cache: &ResultCache,
    req: EntryUpsert,
) -> Result<(i64, bool)> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    match upsert(&mut tx, &req).await {
        Ok((id, promoted)) => {
            tx.commit().await?;
            cache.clear(Some(req.event_id));
            Ok((id, promoted))
        }
        Err(err) if err.needs_reprobe() => {
            let remapped = reprobe(&mut tx, &req, err).await;
            Err(remapped)
        }
        Err(err) => Err(err),
    }
}

async fn upsert(tx: &mut Tx, req: &EntryUpsert) -> Result<(i64, bool)> {
    let mut chip = req.chip.clone();
    let mut gender = req.gender;
    let mut year = req.year;
    let mut club_id = req.club_id;

    let (id, mut result, promoted) = match req.id {
        None => {
            let competitor_id = match req.competitor_id {
                Some(id) => id,
                None => {
                    match queries::competitors::get_competitor_by_name(
                        &mut *tx,
                        &req.first_name,
                        &req.last_name,
                    )
                    .await?
                    {
                        Some(competitor) => {
                            // Fill blanks of the submission from the record.
                            if gender.is_none() {
                                gender = competitor.gender;
                            }
                            if year.is_none() {
                                year = competitor.year;
                            }
                            if chip.is_empty() {
                                chip = competitor.chip.clone();
                            }
                            if club_id.is_none() {
                                club_id = competitor.club_id;
                            }
                            competitor.id
                        }
                        None => {
                            queries::competitors::add_competitor(
                                &mut *tx,
                                &req.first_name,
                                &req.last_name,
                                club_id,
                                gender,
                                year,
                                &chip,
                            )
                            .await?
                        }
                    }
                }
            };

            // Keep the competitor's own club and chip once they are set.
            let mut competitor =
                queries::competitors::get_competitor(&mut *tx, competitor_id).await?;
            if competitor.club_id.is_none() {
                competitor.club_id = club_id;
            }
            if competitor.chip.is_empty() {
                competitor.chip = chip.clone();
            }
            queries::competitors::update_competitor(
                &mut *tx,
                competitor_id,
                &req.first_name,
                &req.last_name,
                gender,
                year,
                competitor.club_id,
                &competitor.chip,
            )
            .await?;

            // A second registration of the same competitor runs outside the
            // competition.
            let already_registered =
                queries::entries::entry_id_for_competitor(&mut *tx, req.event_id, competitor_id)
                    .await?
                    .is_some();
            let not_competing = req.not_competing || already_registered;

            let id = queries::entries::add_entry(
                &mut *tx,
                req.event_id,
                Some(competitor_id),
                Some(req.class_id),
                club_id,
                not_competing,
                &chip,
                &req.fields,
                &PersonRaceResult {
                    status: req.status,
                    ..PersonRaceResult::default()
                },
                &PersonRaceStart {
                    start_time: req.start_time,
                },
            )
            .await?;
            (
                id,
                PersonRaceResult::default(),
                already_registered && !req.not_competing,
            )
        }
        Some(id) => {
            let entry = queries::entries::get_entry(&mut *tx, id).await?;

            // The result about to be replaced is re-stored as an unassigned
            // entry so no card read is ever lost.
            if req.result_id.is_some() {
                let raw = entry.result.reset();
                if raw.has_punches() {
                    let computed =
                        compute_result(&raw, &[], &ClassParams::default(), None, None, None);
                    queries::entries::add_entry_result(
                        &mut *tx,
                        entry.event_id,
                        &entry.chip,
                        &computed,
                        &PersonRaceStart::default(),
                    )
                    .await?;
                }
            }

            if let Some(competitor_id) = entry.competitor_id {
                let competitor =
                    queries::competitors::get_competitor(&mut *tx, competitor_id).await?;
                queries::competitors::update_competitor(
                    &mut *tx,
                    competitor_id,
                    &req.first_name,
                    &req.last_name,
                    gender,
                    year,
                    competitor.club_id,
                    &competitor.chip,
                )
                .await?;
            }

            let mut updated = entry.result.clone();
            updated.status = req.status;
            queries::entries::update_entry(
                &mut *tx,
                id,
                Some(req.class_id),
                club_id,
                req.not_competing,
                &chip,
                &req.fields,
                &updated,
                &PersonRaceStart {
                    start_time: req.start_time,
                },
            )
            .await?;
            (id, entry.result, false)
        }
    };

    let old_status = result.status;

    match req.result_id {
        Some(-1) => {
            result = PersonRaceResult::default();
        }
        Some(result_id) => match queries::entries::get_entry(&mut *tx, result_id).await {
            Ok(source) => {
                queries::entries::delete_entry(&mut *tx, result_id).await?;
                chip = source.chip;
                result = source.result;
            }
            Err(e) if e.is_not_found() => return Err(Error::constraint("Result deleted")),
            Err(e) => return Err(e),
        },
        None => {}
    }

    // A cleared result keeps its fresh default status unless the submitted
    // status changed or is a disqualification.
    if req.result_id != Some(-1) || req.status != old_status || req.status == ResultStatus::Disqualified
    {
        result.status = req.status;
    }

    let (controls, class_params) = class_controls(&mut *tx, Some(req.class_id)).await?;
    let computed = compute_result(&result, &controls, &class_params, req.start_time, year, gender);
    queries::entries::update_entry_result(
        &mut *tx,
        id,
        &chip,
        &computed,
        &PersonRaceStart {
            start_time: req.start_time,
        },
    )
    .await?;

    Ok((id, promoted))
}

/// After a failed mutation, identify which referenced row vanished and
/// re-raise a constraint error with a specific message; the original error
/// propagates when every reference still exists.
async fn reprobe(tx: &mut Tx, req: &EntryUpsert, original: Error) -> Error {
    match queries::events::get_event(&mut *tx, req.event_id).await {
        Err(e) if e.is_not_found() => return e,
        _ => {}
    }
    if let Some(id) = req.id {
        if let Err(e) = queries::entries::get_entry(&mut *tx, id).await {
            if e.is_not_found() {
                return Error::constraint("Entry deleted");
            }
        }
    }
    if let Some(competitor_id) = req.competitor_id {
        if let Err(e) = queries::competitors::get_competitor(&mut *tx, competitor_id).await {
            if e.is_not_found() {
                return Error::constraint("Competitor deleted");
            }
        }
    }
    if let Err(e) = queries::classes::get_class(&mut *tx, req.class_id).await {
        if e.is_not_found() {
            return Error::constraint("Class deleted");
        }
    }
    if let Some(club_id) = req.club_id {
        if let Err(e) = queries::clubs::get_club(&mut *tx, club_id).await {
            if e.is_not_found() {
                return Error::constraint("Club deleted");
            }
        }
    }
    original
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditCommand {
    Edit,
    Delete,
    InsertBefore,
}

/// Which row of the split table an edit addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitSelector {
    Start,
    Finish,
    Row(usize),
}

/// Operator editing of a stored result: insert, change or remove punches,
/// or adjust the punched start/finish, then recompute.
pub async fn edit_entry_result(
    db: &Database,
    cache: &ResultCache,
    entry_id: i64,
    event_id: i64,
    command: EditCommand,
    control: &str,
    selector: SplitSelector,
    punch_time: Option<NaiveTime>,
) -> Result<EntryType> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    let event = queries::events::get_event(&mut tx, event_id).await?;
    let entry = queries::entries::get_entry(&mut tx, entry_id).await?;
    let mut result = entry.result.clone();

    let at = |time: NaiveTime| Utc.from_utc_datetime(&event.date.and_time(time));

    match selector {
        SplitSelector::Start => {
            result.punched_start_time = match punch_time {
                None => None,
                Some(time) if result.punched_start_time.is_some_and(|cur| cur.time() == time) => {
                    result.punched_start_time
                }
                Some(time) => Some(at(time)),
            };
        }
        SplitSelector::Finish => {
            result.punched_finish_time = match punch_time {
                None => None,
                Some(time) if result.punched_finish_time.is_some_and(|cur| cur.time() == time) => {
                    result.punched_finish_time
                }
                Some(time) => Some(at(time)),
            };
        }
        SplitSelector::Row(index) => {
            if index >= result.split_times.len() && command != EditCommand::InsertBefore {
                return Err(Error::Validation(format!("split row {index} out of range")));
            }
            match command {
                EditCommand::Delete => {
                    if result.split_times[index].si_punch_time.is_none() {
                        // The row only exists through an edit; drop it.
                        result.split_times.remove(index);
                    } else {
                        result.split_times[index].punch_time = None;
                    }
                }
                EditCommand::Edit | EditCommand::InsertBefore => {
                    let used = punch_time.map_or(PunchTime::NoTime, |t| PunchTime::Known(at(t)));
                    if command == EditCommand::Edit {
                        result.split_times[index].punch_time = Some(used);
                    } else {
                        let index = index.min(result.split_times.len());
                        result.split_times.insert(
                            index,
                            SplitTime {
                                control_code: control.to_string(),
                                punch_time: Some(used),
                                ..SplitTime::default()
                            },
                        );
                    }
                }
            }
        }
    }

    let (controls, params) = class_controls(&mut tx, entry.class_id).await?;
    let computed = compute_result(
        &result,
        &controls,
        &params,
        entry.start.start_time,
        entry.year,
        entry.gender,
    );
    queries::entries::update_entry_result(&mut tx, entry_id, &entry.chip, &computed, &entry.start)
        .await?;
    let updated = queries::entries::get_entry(&mut tx, entry_id).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(updated)
}

pub async fn get_entries(db: &Database, event_id: i64) -> Result<Vec<EntryType>> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let entries = queries::entries::get_entries(&mut tx, event_id).await?;
    tx.commit().await?;
    Ok(entries)
}

pub async fn get_entry(db: &Database, id: i64) -> Result<EntryType> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let entry = queries::entries::get_entry(&mut tx, id).await?;
    tx.commit().await?;
    Ok(entry)
}

pub async fn delete_entry(db: &Database, cache: &ResultCache, id: i64) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::entries::delete_entry(&mut tx, id).await?;
    tx.commit().await?;
    cache.clear(None);
    Ok(())
}

pub async fn delete_entries(db: &Database, cache: &ResultCache, event_id: i64) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::entries::delete_entries(&mut tx, event_id).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(())
}

/// Import flat entry records: clubs, classes and competitors are matched by
/// name (created when missing), results recomputed against the class course.
pub async fn import_entries(
    db: &Database,
    cache: &ResultCache,
    event_id: i64,
    records: Vec<EntryImport>,
) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::events::get_event(&mut tx, event_id).await?;
    import_in_tx(&mut tx, event_id, records).await?;
    tx.commit().await?;
    cache.clear(Some(event_id));
    Ok(())
}

pub(crate) async fn import_in_tx(
    conn: &mut SqliteConnection,
    event_id: i64,
    records: Vec<EntryImport>,
) -> Result<()> {
    for record in records {
        let club_id = match record.club_name.as_deref() {
            Some(name) if !name.is_empty() => {
                Some(match queries::clubs::get_club_by_name(&mut *conn, name).await? {
                    Some(club) => club.id,
                    None => queries::clubs::add_club(&mut *conn, name).await?,
                })
            }
            _ => None,
        };

        let class_id = match record.class_name.as_deref() {
            Some(name) if !name.is_empty() => Some(
                match queries::classes::get_class_by_name(&mut *conn, event_id, name).await? {
                    Some(class) => class.id,
                    None => {
                        queries::classes::add_class(
                            &mut *conn,
                            event_id,
                            name,
                            None,
                            None,
                            &ClassParams::default(),
                        )
                        .await?
                    }
                },
            ),
            _ => None,
        };

        let competitor_id = match queries::competitors::get_competitor_by_name(
            &mut *conn,
            &record.first_name,
            &record.last_name,
        )
        .await?
        {
            Some(competitor) => competitor.id,
            None => {
                queries::competitors::add_competitor(
                    &mut *conn,
                    &record.first_name,
                    &record.last_name,
                    club_id,
                    record.gender,
                    record.year,
                    &record.chip,
                )
                .await?
            }
        };

        let (controls, params) = class_controls(&mut *conn, class_id).await?;
        let computed = compute_result(
            &record.result,
            &controls,
            &params,
            record.start.start_time,
            record.year,
            record.gender,
        );

        match queries::entries::entry_id_for_competitor(&mut *conn, event_id, competitor_id).await? {
            Some(entry_id) => {
                queries::entries::update_entry(
                    &mut *conn,
                    entry_id,
                    class_id,
                    club_id,
                    record.not_competing,
                    &record.chip,
                    &BTreeMap::new(),
                    &computed,
                    &record.start,
                )
                .await?;
            }
            None => {
                queries::entries::add_entry(
                    &mut *conn,
                    event_id,
                    Some(competitor_id),
                    class_id,
                    club_id,
                    record.not_competing,
                    &record.chip,
                    &BTreeMap::new(),
                    &computed,
                    &record.start,
                )
                .await?;
            }
        }
    }
    Ok(())
}

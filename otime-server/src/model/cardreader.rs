//! Card-reader ingestion: the transactional state machine consuming each
//! incoming reader message.
//!
//! Every message is handled inside a single IMMEDIATE transaction, so
//! observers never see a partially matched card read; reads for the same
//! event serialize on the store.

use std::collections::BTreeMap;

use otime_engine::compute_result;
use otime_types::card::{
    CardEntryType, CardReaderLog, CardReaderMessage, CardReaderResponse, LightStatus,
};
use otime_types::class_params::ClassParams;
use otime_types::competitor::CompetitorType;
use otime_types::entry::{EntryType, PersonRaceStart};
use otime_types::event::{ClassType, EventType};
use otime_types::result::{
    PersonRaceResult, PunchTime, ResultStatus, SplitStatus, SplitTime,
};
use sqlx::SqliteConnection;
use tracing::info;

use crate::cache::ResultCache;
use crate::db::{Database, TransactionMode, queries};
use crate::error::{Error, Result};
use crate::model::{class_controls, events::find_event_by_key};

/// Validate a raw reader document and build the seed result for card reads:
/// status Finished, SI times mirrored, every punch an additional split.
pub fn parse_cardreader_message(raw: &str) -> Result<CardReaderMessage> {
    let log: CardReaderLog =
        serde_json::from_str(raw).map_err(|e| Error::Validation(e.to_string()))?;

    let mut message = CardReaderMessage {
        entry_type: log.entry_type,
        entry_time: log.entry_time,
        control_card: log.control_card.clone(),
        result: None,
    };

    if log.entry_type == CardEntryType::CardRead {
        let mut result = PersonRaceResult {
            status: ResultStatus::Finished,
            punched_clear_time: log.clear_time,
            punched_check_time: log.check_time,
            ..PersonRaceResult::default()
        };
        if let Some(t) = log.start_time {
            result.punched_start_time = Some(t);
            result.si_punched_start_time = Some(t);
        }
        if let Some(t) = log.finish_time {
            result.punched_finish_time = Some(t);
            result.si_punched_finish_time = Some(t);
        }
        result.start_time = result.punched_start_time;
        result.finish_time = result.punched_finish_time;
        for punch in &log.punches {
            result.split_times.push(SplitTime {
                control_code: punch.control_code.clone(),
                punch_time: Some(PunchTime::Known(punch.punch_time)),
                si_punch_time: Some(PunchTime::Known(punch.punch_time)),
                ..SplitTime::default()
            });
        }
        message.result = Some(result);
    }

    Ok(message)
}

/// Process one reader message against the event matching `event_key`.
/// Returns the message kind, the resolved event and the reader response.
pub async fn store_cardreader_result(
    db: &Database,
    cache: &ResultCache,
    event_key: &str,
    message: &CardReaderMessage,
) -> Result<(CardEntryType, EventType, CardReaderResponse)> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    let event = find_event_by_key(&mut tx, event_key).await?;

    let response = if event.light {
        handle_light(&mut tx, &event, message).await?
    } else {
        handle_standard(&mut tx, &event, message).await?
    };

    tx.commit().await?;
    cache.clear(Some(event.id));
    Ok((message.entry_type, event, response))
}

/// Controls the responder reports as missing: the finish and start punches
/// trump individual controls.
fn missing_controls(result: &PersonRaceResult) -> Vec<String> {
    if result.finish_time.is_none() {
        return vec!["FINISH".to_string()];
    }
    if result.start_time.is_none() {
        return vec!["START".to_string()];
    }
    result
        .split_times
        .iter()
        .filter(|sp| sp.status == SplitStatus::Missing)
        .map(|sp| sp.control_code.clone())
        .collect()
}

/// The time shown to the reader: the raw running time when a handicap
/// applied, else the total.
fn response_time(result: &PersonRaceResult) -> Option<i64> {
    result.extensions.running_time.or(result.time)
}

fn card_read_parts<'a>(
    message: &'a CardReaderMessage,
) -> Result<(&'a PersonRaceResult, String)> {
    let result = message
        .result
        .as_ref()
        .ok_or_else(|| Error::Validation("cardRead without punch data".to_string()))?;
    let card = message
        .control_card
        .clone()
        .ok_or_else(|| Error::Validation("cardRead without controlCard".to_string()))?;
    Ok((result, card))
}

/// Compute the incoming result against every class with a course and keep
/// the candidates that classify OK. Each candidate computes on its own copy.
async fn match_courses(
    conn: &mut SqliteConnection,
    event: &EventType,
    result: &PersonRaceResult,
    competitor: &CompetitorType,
) -> Result<Vec<(ClassType, PersonRaceResult)>> {
    let mut matching = Vec::new();
    for class in queries::classes::get_classes(&mut *conn, event.id).await? {
        let Some(course_id) = class.course_id else {
            continue;
        };
        let controls = match queries::courses::get_course(&mut *conn, course_id).await {
            Ok(course) => course.controls,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        };
        let candidate = compute_result(
            result,
            &controls,
            &class.params,
            None,
            competitor.year,
            competitor.gender,
        );
        if candidate.status == ResultStatus::Ok {
            matching.push((class, candidate));
        }
    }
    Ok(matching)
}

async fn store_unassigned(
    conn: &mut SqliteConnection,
    event_id: i64,
    card: &str,
    result: &PersonRaceResult,
) -> Result<PersonRaceResult> {
    let computed = compute_result(result, &[], &ClassParams::default(), None, None, None);
    queries::entries::add_entry_result(conn, event_id, card, &computed, &PersonRaceStart::default())
        .await?;
    Ok(computed)
}

fn registered_response(
    entry_time: Option<chrono::DateTime<chrono::Utc>>,
    event_id: i64,
    entry: &EntryType,
    result: &PersonRaceResult,
    light_status: Option<LightStatus>,
) -> CardReaderResponse {
    CardReaderResponse {
        entry_time,
        event_id,
        control_card: Some(entry.chip.clone()),
        first_name: entry.first_name.clone(),
        last_name: entry.last_name.clone(),
        club: entry.club_name.clone(),
        class_name: entry.class_name.clone(),
        status: Some(result.status),
        time: response_time(result),
        missing_controls: Some(missing_controls(result)),
        light_status,
        ..CardReaderResponse::default()
    }
}

async fn handle_light(
    tx: &mut SqliteConnection,
    event: &EventType,
    message: &CardReaderMessage,
) -> Result<CardReaderResponse> {
    match message.entry_type {
        CardEntryType::CardRead => {}
        CardEntryType::CardInserted => {
            return Ok(CardReaderResponse {
                event_id: event.id,
                control_card: message.control_card.clone(),
                ..CardReaderResponse::default()
            });
        }
        _ => {
            return Ok(CardReaderResponse {
                event_id: event.id,
                ..CardReaderResponse::default()
            });
        }
    }
    let (result, card) = card_read_parts(message)?;

    // A chip already present in the event means the card was read before.
    let entries = queries::entries::get_entries(&mut *tx, event.id).await?;
    if entries.iter().any(|e| e.chip == card) {
        info!(event_id = event.id, card = %card, "second reading");
        return Ok(CardReaderResponse {
            entry_time: Some(message.entry_time),
            event_id: event.id,
            control_card: Some(card),
            status: Some(result.status),
            light_status: Some(LightStatus::SecondReading),
            ..CardReaderResponse::default()
        });
    }

    let Some(competitor) = queries::competitors::get_competitor_by_chip(&mut *tx, &card).await?
    else {
        let computed = store_unassigned(&mut *tx, event.id, &card, result).await?;
        return Ok(CardReaderResponse {
            entry_time: Some(message.entry_time),
            event_id: event.id,
            control_card: Some(card),
            status: Some(computed.status),
            error: Some("Control card unknown".to_string()),
            light_status: Some(LightStatus::Unassigned),
            ..CardReaderResponse::default()
        });
    };

    let mut matching = match_courses(&mut *tx, event, result, &competitor).await?;
    if matching.len() == 1 {
        let (class, matched) = matching.remove(0);
        let entry_id = queries::entries::add_entry(
            &mut *tx,
            event.id,
            Some(competitor.id),
            Some(class.id),
            competitor.club_id,
            false,
            &card,
            &BTreeMap::new(),
            &matched,
            &PersonRaceStart::default(),
        )
        .await?;
        let entry = queries::entries::get_entry(&mut *tx, entry_id).await?;
        info!(
            event_id = event.id,
            card = %card,
            class = %class.name,
            "card auto-registered"
        );
        return Ok(registered_response(
            Some(message.entry_time),
            event.id,
            &entry,
            &matched,
            Some(LightStatus::OkRegistered),
        ));
    }

    // Zero or ambiguous course matches: keep the read, let an operator decide.
    let computed = store_unassigned(&mut *tx, event.id, &card, result).await?;
    Ok(CardReaderResponse {
        entry_time: Some(message.entry_time),
        event_id: event.id,
        control_card: Some(card),
        status: Some(computed.status),
        error: Some("No unique matching course".to_string()),
        light_status: Some(LightStatus::Unassigned),
        ..CardReaderResponse::default()
    })
}

async fn handle_standard(
    tx: &mut SqliteConnection,
    event: &EventType,
    message: &CardReaderMessage,
) -> Result<CardReaderResponse> {
    match message.entry_type {
        CardEntryType::CardRead => {}
        CardEntryType::CardInserted => {
            return Ok(CardReaderResponse {
                event_id: event.id,
                control_card: message.control_card.clone(),
                ..CardReaderResponse::default()
            });
        }
        _ => {
            return Ok(CardReaderResponse {
                event_id: event.id,
                ..CardReaderResponse::default()
            });
        }
    }
    let (result, card) = card_read_parts(message)?;

    let entries = queries::entries::get_entries(&mut *tx, event.id).await?;
    let with_chip: Vec<EntryType> = entries.into_iter().filter(|e| e.chip == card).collect();
    let (assigned, unassigned): (Vec<EntryType>, Vec<EntryType>) =
        with_chip.into_iter().partition(|e| e.class_name.is_some());

    // Already stored and assigned to a competitor: nothing to do.
    for entry in &assigned {
        if entry.result.same_si_punches(result) {
            return Ok(registered_response(
                Some(message.entry_time),
                event.id,
                entry,
                &entry.result,
                None,
            ));
        }
    }

    let matching_unassigned = unassigned.iter().find(|e| e.result.same_si_punches(result));

    // The read merges into the sole assigned entry when that entry has no
    // punches yet and no conflicting unassigned read exists.
    let mergeable = assigned.len() == 1
        && !assigned[0].result.has_punches()
        && (unassigned.is_empty() || (unassigned.len() == 1 && matching_unassigned.is_some()));

    if mergeable {
        let entry = &assigned[0];
        let (controls, params) = class_controls(&mut *tx, entry.class_id).await?;
        let computed = compute_result(
            result,
            &controls,
            &params,
            entry.start.start_time,
            entry.year,
            entry.gender,
        );
        queries::entries::update_entry_result(&mut *tx, entry.id, &entry.chip, &computed, &entry.start)
            .await?;
        if unassigned.len() == 1 {
            queries::entries::delete_entry(&mut *tx, unassigned[0].id).await?;
        }
        info!(event_id = event.id, card = %card, entry_id = entry.id, "card read merged");
        return Ok(registered_response(
            Some(message.entry_time),
            event.id,
            entry,
            &computed,
            None,
        ));
    }

    // Otherwise the read is kept as an unassigned result (unless the very
    // same read is already stored).
    let computed = if matching_unassigned.is_none() {
        store_unassigned(&mut *tx, event.id, &card, result).await?
    } else {
        compute_result(result, &[], &ClassParams::default(), None, None, None)
    };
    let error = if assigned.is_empty() {
        "Control card unknown"
    } else if assigned.len() >= 2 {
        "There are several entries for this card"
    } else {
        "There are other results for this card"
    };
    Ok(CardReaderResponse {
        entry_time: Some(message.entry_time),
        event_id: event.id,
        control_card: Some(card),
        status: Some(computed.status),
        error: Some(error.to_string()),
        ..CardReaderResponse::default()
    })
}

/// Tie an unassigned light-mode result to a competitor by name: all entries
/// of the chip are dropped, the competitor found or created, and the stored
/// result re-run through the course matching.
pub async fn assign_name(
    db: &Database,
    cache: &ResultCache,
    event_key: &str,
    chip: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(EventType, CardReaderResponse)> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    let event = find_event_by_key(&mut tx, event_key).await?;

    let entries = queries::entries::get_entries(&mut tx, event.id).await?;
    let with_chip: Vec<&EntryType> = entries.iter().filter(|e| e.chip == chip).collect();
    let stored = with_chip
        .first()
        .map(|e| e.result.clone())
        .ok_or_else(|| Error::constraint("No result for this control card"))?;
    for entry in &with_chip {
        queries::entries::delete_entry(&mut tx, entry.id).await?;
    }

    let competitor = match queries::competitors::get_competitor_by_name(&mut tx, first_name, last_name)
        .await?
    {
        Some(existing) => {
            queries::competitors::update_competitor(
                &mut tx,
                existing.id,
                &existing.first_name,
                &existing.last_name,
                existing.gender,
                existing.year,
                existing.club_id,
                chip,
            )
            .await?;
            queries::competitors::get_competitor(&mut tx, existing.id).await?
        }
        None => {
            let id = queries::competitors::add_competitor(
                &mut tx, first_name, last_name, None, None, None, chip,
            )
            .await?;
            queries::competitors::get_competitor(&mut tx, id).await?
        }
    };

    let mut matching = match_courses(&mut tx, &event, &stored, &competitor).await?;
    let response = if matching.len() == 1 {
        let (class, matched) = matching.remove(0);
        let entry_id = queries::entries::add_entry(
            &mut tx,
            event.id,
            Some(competitor.id),
            Some(class.id),
            competitor.club_id,
            false,
            chip,
            &BTreeMap::new(),
            &matched,
            &PersonRaceStart::default(),
        )
        .await?;
        let entry = queries::entries::get_entry(&mut tx, entry_id).await?;
        registered_response(None, event.id, &entry, &matched, Some(LightStatus::OkRegistered))
    } else {
        let computed = store_unassigned(&mut tx, event.id, chip, &stored).await?;
        CardReaderResponse {
            event_id: event.id,
            control_card: Some(chip.to_string()),
            status: Some(computed.status),
            error: Some("No unique matching course".to_string()),
            light_status: Some(LightStatus::Unassigned),
            ..CardReaderResponse::default()
        }
    };

    tx.commit().await?;
    cache.clear(Some(event.id));
    Ok((event, response))
}

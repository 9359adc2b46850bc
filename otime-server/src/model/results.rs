//! Result queries (cache-backed) and series assembly.

use std::sync::Arc;

use otime_engine::{build_class_results, build_series_totals};
use otime_types::entry::{ClassResults, EntryImport, EntryType};
use otime_types::event::EventType;
use otime_types::series::{PersonSeriesResult, SeriesSettings};

use crate::cache::ResultCache;
use crate::db::{Database, TransactionMode, queries};
use crate::error::Result;
use crate::model::{entries, events::find_event_by_key};

fn is_organizer(entry: &EntryType) -> bool {
    matches!(entry.class_name.as_deref(), Some("Organizer") | Some("Organizers"))
}

/// Ranked class results of one event, served from the cache when the event's
/// data has not changed since the last build.
pub async fn event_class_results(
    db: &Database,
    cache: &ResultCache,
    event_id: i64,
) -> Result<(EventType, Arc<Vec<ClassResults>>)> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let event = queries::events::get_event(&mut tx, event_id).await?;
    if let Some(cached) = cache.get(event_id) {
        return Ok((event, cached));
    }
    let classes = queries::classes::get_classes(&mut tx, event_id).await?;
    let entries = queries::entries::get_entries(&mut tx, event_id).await?;
    tx.commit().await?;

    let results = Arc::new(build_class_results(&classes, &entries));
    cache.insert(event_id, results.clone());
    Ok((event, results))
}

/// Season standing across all events carrying a series tag, ordered by
/// (date, series).
pub async fn build_series_result(
    db: &Database,
) -> Result<(
    SeriesSettings,
    Vec<EventType>,
    Vec<(String, Vec<PersonSeriesResult>)>,
)> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let settings = queries::series::get_series_settings(&mut tx).await?;
    let mut events: Vec<EventType> = queries::events::get_events(&mut tx)
        .await?
        .into_iter()
        .filter(|e| e.series.is_some())
        .collect();
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.series.cmp(&b.series)));

    let mut list_of_results = Vec::with_capacity(events.len());
    let mut organizers = Vec::with_capacity(events.len());
    for event in &events {
        let classes = queries::classes::get_classes(&mut tx, event.id).await?;
        let entries = queries::entries::get_entries(&mut tx, event.id).await?;
        list_of_results.push(build_class_results(&classes, &entries));
        organizers.push(entries.into_iter().filter(is_organizer).collect());
    }
    tx.commit().await?;

    let ranked = build_series_totals(&settings, &list_of_results, &organizers);
    Ok((settings, events, ranked))
}

pub async fn get_series_settings(db: &Database) -> Result<SeriesSettings> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let settings = queries::series::get_series_settings(&mut tx).await?;
    tx.commit().await?;
    Ok(settings)
}

pub async fn update_series_settings(db: &Database, settings: &SeriesSettings) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::series::update_series_settings(&mut tx, settings).await?;
    tx.commit().await?;
    Ok(())
}

/// Import a result list into the event matching `event_key`. A non-delta
/// list replaces the event's entries and classes wholesale.
pub async fn import_result_list(
    db: &Database,
    cache: &ResultCache,
    event_key: &str,
    records: Vec<EntryImport>,
    delta: bool,
) -> Result<EventType> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    let event = find_event_by_key(&mut tx, event_key).await?;
    if !delta {
        queries::entries::delete_entries(&mut tx, event.id).await?;
        queries::classes::delete_classes(&mut tx, event.id).await?;
    }
    entries::import_in_tx(&mut tx, event.id, records).await?;
    tx.commit().await?;
    cache.clear(Some(event.id));
    Ok(event)
}

use chrono::NaiveDate;
use otime_types::event::EventType;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::cache::ResultCache;
use crate::db::{Database, TransactionMode, queries};
use crate::db::queries::events::EventFields;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventUpsert {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub publish: bool,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub light: bool,
    #[serde(default)]
    pub streaming_address: Option<String>,
    #[serde(default)]
    pub streaming_key: Option<String>,
    #[serde(default)]
    pub streaming_enabled: Option<bool>,
}

impl EventUpsert {
    fn fields(&self) -> EventFields {
        EventFields {
            name: self.name.clone(),
            date: self.date,
            // An empty key means "no card-reader routing", not an empty match.
            key: self.key.clone().filter(|k| !k.is_empty()),
            publish: self.publish,
            series: self.series.clone().filter(|s| !s.is_empty()),
            fields: self.fields.clone(),
            light: self.light,
            streaming_address: self.streaming_address.clone(),
            streaming_key: self.streaming_key.clone(),
            streaming_enabled: self.streaming_enabled,
        }
    }
}

pub async fn add_or_update_event(
    db: &Database,
    cache: &ResultCache,
    req: EventUpsert,
) -> Result<EventType> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    let id = match req.id {
        None => queries::events::add_event(&mut tx, &req.fields()).await?,
        Some(id) => {
            queries::events::update_event(&mut tx, id, &req.fields()).await?;
            id
        }
    };
    let event = queries::events::get_event(&mut tx, id).await?;
    tx.commit().await?;
    cache.clear(Some(id));
    Ok(event)
}

pub async fn get_events(db: &Database) -> Result<Vec<EventType>> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let events = queries::events::get_events(&mut tx).await?;
    tx.commit().await?;
    Ok(events)
}

pub async fn get_event(db: &Database, id: i64) -> Result<EventType> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let event = queries::events::get_event(&mut tx, id).await?;
    tx.commit().await?;
    Ok(event)
}

pub async fn get_event_by_key(db: &Database, key: &str) -> Result<EventType> {
    let mut tx = db.begin(TransactionMode::Deferred).await?;
    let event = find_event_by_key(&mut tx, key).await?;
    tx.commit().await?;
    Ok(event)
}

pub async fn delete_event(db: &Database, cache: &ResultCache, id: i64) -> Result<()> {
    let mut tx = db.begin(TransactionMode::Immediate).await?;
    queries::events::delete_event(&mut tx, id).await?;
    tx.commit().await?;
    cache.clear(Some(id));
    Ok(())
}

/// Resolve an event by its card-reader routing key. Events without a key
/// never match; an empty incoming key never matches either.
pub(crate) async fn find_event_by_key(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<EventType> {
    if !key.is_empty() {
        for event in queries::events::get_events(conn).await? {
            if event.key.as_deref() == Some(key) {
                return Ok(event);
            }
        }
    }
    Err(Error::EventNotFound(format!(
        "Event for key \"{key}\" not found"
    )))
}

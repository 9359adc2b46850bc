use otime_types::event::EventType;
use sqlx::SqliteConnection;

use crate::db::models::EventRow;
use crate::error::{Error, Result, map_unique};

const SELECT: &str = "SELECT id, name, date, key, publish, series, fields, light, \
                      streaming_address, streaming_key, streaming_enabled FROM events";

/// Field values of an event row; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct EventFields {
    pub name: String,
    pub date: chrono::NaiveDate,
    pub key: Option<String>,
    pub publish: bool,
    pub series: Option<String>,
    pub fields: Vec<String>,
    pub light: bool,
    pub streaming_address: Option<String>,
    pub streaming_key: Option<String>,
    pub streaming_enabled: Option<bool>,
}

pub async fn get_events(conn: &mut SqliteConnection) -> Result<Vec<EventType>> {
    let rows: Vec<EventRow> = sqlx::query_as(&format!("{SELECT} ORDER BY date, name"))
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(EventRow::into_event).collect()
}

pub async fn get_event(conn: &mut SqliteConnection, id: i64) -> Result<EventType> {
    let row: Option<EventRow> = sqlx::query_as(&format!("{SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    match row {
        Some(row) => row.into_event(),
        None => Err(Error::EventNotFound(format!("Event {id} not found"))),
    }
}

pub async fn add_event(conn: &mut SqliteConnection, event: &EventFields) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO events (name, date, key, publish, series, fields, light, \
         streaming_address, streaming_key, streaming_enabled) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.name)
    .bind(event.date.format("%Y-%m-%d").to_string())
    .bind(&event.key)
    .bind(event.publish)
    .bind(&event.series)
    .bind(serde_json::to_string(&event.fields)?)
    .bind(event.light)
    .bind(&event.streaming_address)
    .bind(&event.streaming_key)
    .bind(event.streaming_enabled)
    .execute(conn)
    .await
    .map_err(|e| map_unique(e, "Event or event key already exist"))?;
    Ok(result.last_insert_rowid())
}

pub async fn update_event(conn: &mut SqliteConnection, id: i64, event: &EventFields) -> Result<()> {
    let result = sqlx::query(
        "UPDATE events SET name = ?, date = ?, key = ?, publish = ?, series = ?, fields = ?, \
         light = ?, streaming_address = ?, streaming_key = ?, streaming_enabled = ? WHERE id = ?",
    )
    .bind(&event.name)
    .bind(event.date.format("%Y-%m-%d").to_string())
    .bind(&event.key)
    .bind(event.publish)
    .bind(&event.series)
    .bind(serde_json::to_string(&event.fields)?)
    .bind(event.light)
    .bind(&event.streaming_address)
    .bind(&event.streaming_key)
    .bind(event.streaming_enabled)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| map_unique(e, "Event or event key already exist"))?;
    if result.rows_affected() == 0 {
        return Err(Error::EventNotFound(format!("Event {id} not found")));
    }
    Ok(())
}

/// Delete an event together with its entries, classes and courses.
pub async fn delete_event(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM entries WHERE event_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM classes WHERE event_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM courses WHERE event_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

use std::collections::BTreeMap;

use otime_types::entry::{EntryType, PersonRaceStart};
use otime_types::result::PersonRaceResult;
use sqlx::SqliteConnection;

use crate::db::models::EntryRow;
use crate::error::{Error, Result};

const SELECT: &str = "SELECT e.id, e.event_id, e.competitor_id, e.class_id, e.club_id, \
                      e.not_competing, e.chip, e.fields, e.result, e.start, \
                      co.first_name AS first_name, co.last_name AS last_name, \
                      co.gender AS gender, co.year AS year, \
                      cl.name AS class_name, cb.name AS club_name \
                      FROM entries e \
                      LEFT JOIN competitors co ON co.id = e.competitor_id \
                      LEFT JOIN classes cl ON cl.id = e.class_id \
                      LEFT JOIN clubs cb ON cb.id = e.club_id";

pub async fn get_entries(conn: &mut SqliteConnection, event_id: i64) -> Result<Vec<EntryType>> {
    let rows: Vec<EntryRow> = sqlx::query_as(&format!("{SELECT} WHERE e.event_id = ? ORDER BY e.id"))
        .bind(event_id)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(EntryRow::into_entry).collect()
}

pub async fn get_entry(conn: &mut SqliteConnection, id: i64) -> Result<EntryType> {
    let row: Option<EntryRow> = sqlx::query_as(&format!("{SELECT} WHERE e.id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    match row {
        Some(row) => row.into_entry(),
        None => Err(Error::EntryNotFound(id)),
    }
}

pub async fn entry_id_for_competitor(
    conn: &mut SqliteConnection,
    event_id: i64,
    competitor_id: i64,
) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM entries WHERE event_id = ? AND competitor_id = ? ORDER BY id LIMIT 1",
    )
    .bind(event_id)
    .bind(competitor_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(id,)| id))
}

#[allow(clippy::too_many_arguments)]
pub async fn add_entry(
    conn: &mut SqliteConnection,
    event_id: i64,
    competitor_id: Option<i64>,
    class_id: Option<i64>,
    club_id: Option<i64>,
    not_competing: bool,
    chip: &str,
    fields: &BTreeMap<usize, String>,
    result: &PersonRaceResult,
    start: &PersonRaceStart,
) -> Result<i64> {
    // At most one competing entry per competitor and event.
    if let Some(competitor_id) = competitor_id {
        if !not_competing {
            let (existing,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM entries \
                 WHERE event_id = ? AND competitor_id = ? AND not_competing = 0",
            )
            .bind(event_id)
            .bind(competitor_id)
            .fetch_one(&mut *conn)
            .await?;
            if existing > 0 {
                return Err(Error::constraint("Competitor already registered for this event"));
            }
        }
    }

    let outcome = sqlx::query(
        "INSERT INTO entries (event_id, competitor_id, class_id, club_id, not_competing, \
         chip, fields, result, start) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event_id)
    .bind(competitor_id)
    .bind(class_id)
    .bind(club_id)
    .bind(not_competing)
    .bind(chip)
    .bind(serde_json::to_string(fields)?)
    .bind(serde_json::to_string(result)?)
    .bind(serde_json::to_string(start)?)
    .execute(conn)
    .await?;
    Ok(outcome.last_insert_rowid())
}

/// Insert an unassigned result: a card read without competitor and class.
pub async fn add_entry_result(
    conn: &mut SqliteConnection,
    event_id: i64,
    chip: &str,
    result: &PersonRaceResult,
    start: &PersonRaceStart,
) -> Result<i64> {
    add_entry(
        conn,
        event_id,
        None,
        None,
        None,
        false,
        chip,
        &BTreeMap::new(),
        result,
        start,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_entry(
    conn: &mut SqliteConnection,
    id: i64,
    class_id: Option<i64>,
    club_id: Option<i64>,
    not_competing: bool,
    chip: &str,
    fields: &BTreeMap<usize, String>,
    result: &PersonRaceResult,
    start: &PersonRaceStart,
) -> Result<()> {
    let outcome = sqlx::query(
        "UPDATE entries SET class_id = ?, club_id = ?, not_competing = ?, chip = ?, \
         fields = ?, result = ?, start = ? WHERE id = ?",
    )
    .bind(class_id)
    .bind(club_id)
    .bind(not_competing)
    .bind(chip)
    .bind(serde_json::to_string(fields)?)
    .bind(serde_json::to_string(result)?)
    .bind(serde_json::to_string(start)?)
    .bind(id)
    .execute(conn)
    .await?;
    if outcome.rows_affected() == 0 {
        return Err(Error::EntryNotFound(id));
    }
    Ok(())
}

pub async fn update_entry_result(
    conn: &mut SqliteConnection,
    id: i64,
    chip: &str,
    result: &PersonRaceResult,
    start: &PersonRaceStart,
) -> Result<()> {
    let outcome = sqlx::query("UPDATE entries SET chip = ?, result = ?, start = ? WHERE id = ?")
        .bind(chip)
        .bind(serde_json::to_string(result)?)
        .bind(serde_json::to_string(start)?)
        .bind(id)
        .execute(conn)
        .await?;
    if outcome.rows_affected() == 0 {
        return Err(Error::EntryNotFound(id));
    }
    Ok(())
}

pub async fn delete_entry(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM entries WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_entries(conn: &mut SqliteConnection, event_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM entries WHERE event_id = ?")
        .bind(event_id)
        .execute(conn)
        .await?;
    Ok(())
}

use otime_types::class_params::ClassParams;
use otime_types::event::ClassType;
use sqlx::SqliteConnection;

use crate::db::models::ClassRow;
use crate::error::{Error, Result, map_foreign_key, map_unique};

const SELECT: &str = "SELECT id, event_id, name, short_name, course_id, params FROM classes";

pub async fn get_classes(conn: &mut SqliteConnection, event_id: i64) -> Result<Vec<ClassType>> {
    let rows: Vec<ClassRow> = sqlx::query_as(&format!("{SELECT} WHERE event_id = ? ORDER BY name"))
        .bind(event_id)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(ClassRow::into_class).collect()
}

pub async fn get_class(conn: &mut SqliteConnection, id: i64) -> Result<ClassType> {
    let row: Option<ClassRow> = sqlx::query_as(&format!("{SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    match row {
        Some(row) => row.into_class(),
        None => Err(Error::ClassNotFound(id)),
    }
}

pub async fn get_class_by_name(
    conn: &mut SqliteConnection,
    event_id: i64,
    name: &str,
) -> Result<Option<ClassType>> {
    let row: Option<ClassRow> =
        sqlx::query_as(&format!("{SELECT} WHERE event_id = ? AND name = ?"))
            .bind(event_id)
            .bind(name)
            .fetch_optional(conn)
            .await?;
    row.map(ClassRow::into_class).transpose()
}

pub async fn add_class(
    conn: &mut SqliteConnection,
    event_id: i64,
    name: &str,
    short_name: Option<&str>,
    course_id: Option<i64>,
    params: &ClassParams,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO classes (event_id, name, short_name, course_id, params) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(event_id)
    .bind(name)
    .bind(short_name)
    .bind(course_id)
    .bind(serde_json::to_string(params)?)
    .execute(conn)
    .await
    .map_err(|e| map_unique(e, "Class already exist"))?;
    Ok(result.last_insert_rowid())
}

pub async fn update_class(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
    short_name: Option<&str>,
    course_id: Option<i64>,
    params: &ClassParams,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE classes SET name = ?, short_name = ?, course_id = ?, params = ? WHERE id = ?",
    )
    .bind(name)
    .bind(short_name)
    .bind(course_id)
    .bind(serde_json::to_string(params)?)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| map_unique(e, "Class already exist"))?;
    if result.rows_affected() == 0 {
        return Err(Error::ClassNotFound(id));
    }
    Ok(())
}

pub async fn delete_class(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| map_foreign_key(e, "Class used in entries"))?;
    Ok(())
}

/// Drop all classes of an event; used by the non-delta result-list import.
pub async fn delete_classes(conn: &mut SqliteConnection, event_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM classes WHERE event_id = ?")
        .bind(event_id)
        .execute(conn)
        .await
        .map_err(|e| map_foreign_key(e, "Class used in entries"))?;
    Ok(())
}

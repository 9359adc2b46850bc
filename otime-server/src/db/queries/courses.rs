use otime_types::event::CourseType;
use sqlx::SqliteConnection;

use crate::db::models::CourseRow;
use crate::error::{Error, Result, map_foreign_key, map_unique};

const SELECT: &str = "SELECT id, event_id, name, length, climb, controls FROM courses";

pub async fn get_courses(conn: &mut SqliteConnection, event_id: i64) -> Result<Vec<CourseType>> {
    let rows: Vec<CourseRow> =
        sqlx::query_as(&format!("{SELECT} WHERE event_id = ? ORDER BY name"))
            .bind(event_id)
            .fetch_all(conn)
            .await?;
    rows.into_iter().map(CourseRow::into_course).collect()
}

pub async fn get_course(conn: &mut SqliteConnection, id: i64) -> Result<CourseType> {
    let row: Option<CourseRow> = sqlx::query_as(&format!("{SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    match row {
        Some(row) => row.into_course(),
        None => Err(Error::CourseNotFound(id)),
    }
}

pub async fn add_course(
    conn: &mut SqliteConnection,
    event_id: i64,
    name: &str,
    length: Option<f64>,
    climb: Option<f64>,
    controls: &[String],
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO courses (event_id, name, length, climb, controls) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(event_id)
    .bind(name)
    .bind(length)
    .bind(climb)
    .bind(serde_json::to_string(controls)?)
    .execute(conn)
    .await
    .map_err(|e| map_unique(e, "Course already exist"))?;
    Ok(result.last_insert_rowid())
}

pub async fn update_course(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
    length: Option<f64>,
    climb: Option<f64>,
    controls: &[String],
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE courses SET name = ?, length = ?, climb = ?, controls = ? WHERE id = ?",
    )
    .bind(name)
    .bind(length)
    .bind(climb)
    .bind(serde_json::to_string(controls)?)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| map_unique(e, "Course already exist"))?;
    if result.rows_affected() == 0 {
        return Err(Error::CourseNotFound(id));
    }
    Ok(())
}

pub async fn delete_course(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| map_foreign_key(e, "Course used in classes"))?;
    Ok(())
}

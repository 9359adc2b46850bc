use otime_types::competitor::ClubType;
use sqlx::SqliteConnection;

use crate::error::{Error, Result, map_foreign_key, map_unique};

#[derive(Debug, Clone, sqlx::FromRow)]
struct ClubRow {
    id: i64,
    name: String,
}

impl From<ClubRow> for ClubType {
    fn from(row: ClubRow) -> Self {
        ClubType {
            id: row.id,
            name: row.name,
        }
    }
}

pub async fn get_clubs(conn: &mut SqliteConnection) -> Result<Vec<ClubType>> {
    let rows: Vec<ClubRow> = sqlx::query_as("SELECT id, name FROM clubs ORDER BY name")
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_club(conn: &mut SqliteConnection, id: i64) -> Result<ClubType> {
    let row: Option<ClubRow> = sqlx::query_as("SELECT id, name FROM clubs WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(Into::into).ok_or(Error::ClubNotFound(id))
}

pub async fn get_club_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<ClubType>> {
    let row: Option<ClubRow> = sqlx::query_as("SELECT id, name FROM clubs WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Into::into))
}

pub async fn add_club(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO clubs (name) VALUES (?)")
        .bind(name)
        .execute(conn)
        .await
        .map_err(|e| map_unique(e, "Club already exist"))?;
    Ok(result.last_insert_rowid())
}

pub async fn update_club(conn: &mut SqliteConnection, id: i64, name: &str) -> Result<()> {
    let result = sqlx::query("UPDATE clubs SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| map_unique(e, "Club already exist"))?;
    if result.rows_affected() == 0 {
        return Err(Error::ClubNotFound(id));
    }
    Ok(())
}

pub async fn delete_club(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM clubs WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| map_foreign_key(e, "Club used in entries"))?;
    Ok(())
}

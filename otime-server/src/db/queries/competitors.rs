use otime_types::competitor::{CompetitorType, Gender};
use sqlx::SqliteConnection;

use crate::db::models::CompetitorRow;
use crate::error::{Error, Result, map_foreign_key, map_unique};

const SELECT: &str = "SELECT c.id, c.first_name, c.last_name, c.club_id, c.gender, c.year, c.chip, \
                      cb.name AS club_name \
                      FROM competitors c LEFT JOIN clubs cb ON cb.id = c.club_id";

pub async fn get_competitors(conn: &mut SqliteConnection) -> Result<Vec<CompetitorType>> {
    let rows: Vec<CompetitorRow> =
        sqlx::query_as(&format!("{SELECT} ORDER BY c.last_name, c.first_name"))
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().map(CompetitorRow::into_competitor).collect())
}

pub async fn get_competitor(conn: &mut SqliteConnection, id: i64) -> Result<CompetitorType> {
    let row: Option<CompetitorRow> = sqlx::query_as(&format!("{SELECT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(CompetitorRow::into_competitor)
        .ok_or(Error::CompetitorNotFound(id))
}

pub async fn get_competitor_by_name(
    conn: &mut SqliteConnection,
    first_name: &str,
    last_name: &str,
) -> Result<Option<CompetitorType>> {
    let row: Option<CompetitorRow> =
        sqlx::query_as(&format!("{SELECT} WHERE c.first_name = ? AND c.last_name = ?"))
            .bind(first_name)
            .bind(last_name)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(CompetitorRow::into_competitor))
}

pub async fn get_competitor_by_chip(
    conn: &mut SqliteConnection,
    chip: &str,
) -> Result<Option<CompetitorType>> {
    if chip.is_empty() {
        return Ok(None);
    }
    let row: Option<CompetitorRow> = sqlx::query_as(&format!("{SELECT} WHERE c.chip = ?"))
        .bind(chip)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(CompetitorRow::into_competitor))
}

#[allow(clippy::too_many_arguments)]
pub async fn add_competitor(
    conn: &mut SqliteConnection,
    first_name: &str,
    last_name: &str,
    club_id: Option<i64>,
    gender: Option<Gender>,
    year: Option<i32>,
    chip: &str,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO competitors (first_name, last_name, club_id, gender, year, chip) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(club_id)
    .bind(gender.map_or("", Gender::as_str))
    .bind(year)
    .bind(chip)
    .execute(conn)
    .await
    .map_err(|e| map_unique(e, "Competitor already exist"))?;
    Ok(result.last_insert_rowid())
}

#[allow(clippy::too_many_arguments)]
pub async fn update_competitor(
    conn: &mut SqliteConnection,
    id: i64,
    first_name: &str,
    last_name: &str,
    gender: Option<Gender>,
    year: Option<i32>,
    club_id: Option<i64>,
    chip: &str,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE competitors SET first_name = ?, last_name = ?, gender = ?, year = ?, \
         club_id = ?, chip = ? WHERE id = ?",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(gender.map_or("", Gender::as_str))
    .bind(year)
    .bind(club_id)
    .bind(chip)
    .bind(id)
    .execute(conn)
    .await
    .map_err(|e| map_unique(e, "Competitor already exist"))?;
    if result.rows_affected() == 0 {
        return Err(Error::CompetitorNotFound(id));
    }
    Ok(())
}

pub async fn delete_competitor(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM competitors WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| map_foreign_key(e, "Competitor used in entries"))?;
    Ok(())
}

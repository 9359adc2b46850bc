use otime_types::series::SeriesSettings;
use sqlx::SqliteConnection;

use crate::db::models::{SeriesSettingsRow, series_mode_str};
use crate::error::Result;

/// Read the stored series settings; defaults apply while none were saved.
pub async fn get_series_settings(conn: &mut SqliteConnection) -> Result<SeriesSettings> {
    let row: Option<SeriesSettingsRow> = sqlx::query_as(
        "SELECT name, nr_of_best_results, mode, maximum_points, decimal_places \
         FROM series_settings WHERE id = 1",
    )
    .fetch_optional(conn)
    .await?;
    match row {
        Some(row) => row.into_settings(),
        None => Ok(SeriesSettings::default()),
    }
}

pub async fn update_series_settings(
    conn: &mut SqliteConnection,
    settings: &SeriesSettings,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO series_settings (id, name, nr_of_best_results, mode, maximum_points, decimal_places) \
         VALUES (1, ?, ?, ?, ?, ?) \
         ON CONFLICT (id) DO UPDATE SET name = excluded.name, \
         nr_of_best_results = excluded.nr_of_best_results, mode = excluded.mode, \
         maximum_points = excluded.maximum_points, decimal_places = excluded.decimal_places",
    )
    .bind(&settings.name)
    .bind(settings.nr_of_best_results as i64)
    .bind(series_mode_str(settings.mode))
    .bind(settings.maximum_points)
    .bind(settings.decimal_places as i64)
    .execute(conn)
    .await?;
    Ok(())
}

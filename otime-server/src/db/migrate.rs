use sqlx::sqlite::SqlitePool;
use tracing::info;

/// Numbered schema migrations, applied stepwise. Each runs under an
/// EXCLUSIVE transaction, must pass the integrity and foreign-key checks,
/// and writes the version cell last before committing.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_initial_schema.sql")),
    (2, include_str!("../../migrations/002_event_light_mode.sql")),
];

pub async fn run(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query("CREATE TABLE IF NOT EXISTS version (value INTEGER NOT NULL)")
        .execute(pool)
        .await?;
    let current: Option<(i64,)> = sqlx::query_as("SELECT value FROM version")
        .fetch_optional(pool)
        .await?;
    let current = match current {
        Some((value,)) => value,
        None => {
            sqlx::query("INSERT INTO version (value) VALUES (0)")
                .execute(pool)
                .await?;
            0
        }
    };

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        let mut tx = pool.begin_with("BEGIN EXCLUSIVE").await?;
        for statement in sql.split(';') {
            let statement = statement.trim();
            if !statement.is_empty() {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
        }

        let (check,): (String,) = sqlx::query_as("PRAGMA integrity_check")
            .fetch_one(&mut *tx)
            .await?;
        anyhow::ensure!(
            check == "ok",
            "integrity check failed after migration {version}: {check}"
        );
        let fk_failure = sqlx::query("PRAGMA foreign_key_check")
            .fetch_optional(&mut *tx)
            .await?;
        anyhow::ensure!(
            fk_failure.is_none(),
            "foreign key check failed after migration {version}"
        );

        sqlx::query("UPDATE version SET value = ?")
            .bind(version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(version = *version, "schema migration applied");
    }

    Ok(())
}

/// Current schema version, for diagnostics and tests.
pub async fn schema_version(pool: &SqlitePool) -> anyhow::Result<i64> {
    let (value,): (i64,) = sqlx::query_as("SELECT value FROM version")
        .fetch_one(pool)
        .await?;
    Ok(value)
}

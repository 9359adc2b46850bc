pub mod migrate;
pub mod models;
pub mod queries;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::{Error, Result};

/// SQLite transaction isolation, mapped 1:1 onto BEGIN statements.
/// IMMEDIATE for mutations, DEFERRED for reads, EXCLUSIVE for migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    Deferred,
    Immediate,
    Exclusive,
}

impl TransactionMode {
    pub fn begin_statement(self) -> &'static str {
        match self {
            TransactionMode::Deferred => "BEGIN DEFERRED",
            TransactionMode::Immediate => "BEGIN IMMEDIATE",
            TransactionMode::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

pub type Tx = sqlx::Transaction<'static, sqlx::Sqlite>;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) and migrate an on-disk database.
    pub async fn open(path: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        migrate::run(&pool).await?;
        info!(path = %path, "database ready");
        Ok(Database { pool })
    }

    /// In-memory database for tests. A single connection keeps all reads and
    /// writes on the same memory store.
    pub async fn open_in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        migrate::run(&pool).await?;
        Ok(Database { pool })
    }

    /// Begin a transaction in the given mode. Dropping the returned
    /// transaction without committing rolls it back; no partial state is
    /// ever visible to other connections.
    pub async fn begin(&self, mode: TransactionMode) -> Result<Tx> {
        self.pool
            .begin_with(mode.begin_statement())
            .await
            .map_err(Error::from)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

use std::str::FromStr;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Sqlite, Transaction};
use tracing::debug;

use crate::error::Result;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// The single connection an import session works on.
///
/// Opened once, reused for every import, and handed out as a transaction
/// per unit of work.
pub struct Database {
    conn: SqliteConnection,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let conn = options.connect().await?;
        Ok(Self { conn })
    }

    /// A private in-memory database with the schema already applied.
    pub async fn in_memory() -> Result<Self> {
        let mut db = Self::new("sqlite::memory:").await?;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&mut self) -> Result<()> {
        debug!("Applying {} migration(s)", MIGRATOR.iter().count());
        MIGRATOR.run(&mut self.conn).await?;
        Ok(())
    }

    pub async fn begin(&mut self) -> Result<Transaction<'_, Sqlite>> {
        Ok(self.conn.begin().await?)
    }

    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

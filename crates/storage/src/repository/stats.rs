use std::collections::BTreeMap;

use sqlx::SqliteConnection;

use crate::error::Result;
use crate::models::Table;

/// Row count of every table, keyed by table.
pub type TableCounts = BTreeMap<Table, i64>;

pub struct StatsRepository<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> StatsRepository<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&mut self, table: Table) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }

    pub async fn counts(&mut self) -> Result<TableCounts> {
        let mut counts = TableCounts::new();
        for table in Table::all() {
            counts.insert(*table, self.count(*table).await?);
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_fresh_schema_is_empty() {
        let mut db = Database::in_memory().await.unwrap();
        let counts = StatsRepository::new(db.connection()).counts().await.unwrap();

        assert_eq!(counts.len(), Table::all().len());
        assert!(counts.values().all(|c| *c == 0));
    }

    #[tokio::test]
    async fn test_count_sees_inserted_rows() {
        let mut db = Database::in_memory().await.unwrap();
        sqlx::query("INSERT INTO person (name) VALUES ('Jaan Tamm'), ('Mari Mets')")
            .execute(db.connection())
            .await
            .unwrap();

        let mut stats = StatsRepository::new(db.connection());
        assert_eq!(stats.count(Table::Person).await.unwrap(), 2);
        assert_eq!(stats.count(Table::School).await.unwrap(), 0);
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the statement
    /// (SQLite extended codes 2067 and 1555).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Database(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_duplicate_name_is_a_unique_violation() {
        let mut db = Database::in_memory().await.unwrap();
        sqlx::query("INSERT INTO school (name) VALUES ('Miina Härma Gümnaasium')")
            .execute(db.connection())
            .await
            .unwrap();

        let err: StorageError =
            sqlx::query("INSERT INTO school (name) VALUES ('Miina Härma Gümnaasium')")
                .execute(db.connection())
                .await
                .unwrap_err()
                .into();

        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_other_failures_are_not_unique_violations() {
        let mut db = Database::in_memory().await.unwrap();
        let err: StorageError =
            sqlx::query("INSERT INTO school_alias (name, correct) VALUES ('HTG', 99)")
                .execute(db.connection())
                .await
                .unwrap_err()
                .into();

        assert!(!err.is_unique_violation());
        assert!(!StorageError::NotFound.is_unique_violation());
    }
}

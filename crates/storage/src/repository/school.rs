use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{Result, StorageError};
use crate::models::{NamedRow, SchoolAlias};

/// Schools and the alternate spellings that resolve to them.
pub struct SchoolRepository<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> SchoolRepository<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn find_by_name(&mut self, name: &str) -> Result<NamedRow> {
        let school = sqlx::query_as::<_, NamedRow>("SELECT id, name FROM school WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *self.conn)
            .await?
            .ok_or(StorageError::NotFound)?;

        Ok(school)
    }

    /// Register `alias` as another name of the existing school `canonical_name`.
    pub async fn add_alias(&mut self, alias: &str, canonical_name: &str) -> Result<SchoolAlias> {
        let school = self.find_by_name(canonical_name).await?;

        if alias == school.name {
            return Err(StorageError::ConstraintViolation(format!(
                "'{}' cannot be an alias of itself",
                alias
            )));
        }

        let created = sqlx::query_as::<_, SchoolAlias>(
            r#"
            INSERT INTO school_alias (name, correct)
            VALUES (?, ?)
            RETURNING id, name, correct
            "#,
        )
        .bind(alias)
        .bind(school.id)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(StorageError::from)
        .map_err(|e| {
            if e.is_unique_violation() {
                StorageError::ConstraintViolation(format!("alias '{}' already exists", alias))
            } else {
                e
            }
        })?;

        info!("Registered school alias '{}' -> '{}'", alias, school.name);
        Ok(created)
    }

    pub async fn aliases_for(&mut self, school_id: i64) -> Result<Vec<SchoolAlias>> {
        let aliases = sqlx::query_as::<_, SchoolAlias>(
            "SELECT id, name, correct FROM school_alias WHERE correct = ? ORDER BY name",
        )
        .bind(school_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(aliases)
    }
}

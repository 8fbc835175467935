use sqlx::SqliteConnection;
use storage::Table;
use tracing::debug;

use super::create_row;
use crate::{ImportContext, Result};

// A canonical school name wins over an alias of the same spelling.
const FIND_SCHOOL: &str = r#"
    SELECT id FROM (
        SELECT id, 0 AS source FROM school WHERE name = ?
        UNION ALL
        SELECT correct, 1 AS source FROM school_alias WHERE name = ?
    )
    ORDER BY source
    LIMIT 1
"#;

/// Resolve a school by canonical name or alias, creating it when neither
/// matches. Schools are created without asking.
pub async fn resolve_school(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext<'_>,
    name: &str,
) -> Result<i64> {
    if let Some(id) = ctx.cache.schools.get(name) {
        debug!("Using cached school '{}': {}", name, id);
        ctx.stats.cache_hits += 1;
        return Ok(id);
    }

    debug!("Query: \"{}\" ['{}', '{}']", FIND_SCHOOL.trim(), name, name);
    ctx.stats.selects += 1;
    let found = sqlx::query_scalar::<_, i64>(FIND_SCHOOL)
        .bind(name)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    let id = match found {
        Some(id) => id,
        None => {
            create_row(
                conn,
                Table::School,
                &[("name", name.into())],
                &mut ctx.stats,
            )
            .await?
        }
    };

    ctx.cache.schools.insert(name, id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::NeverConfirm;
    use crate::resolver::SessionCache;
    use storage::Database;
    use storage::repository::{SchoolRepository, StatsRepository};

    async fn school_count(db: &mut Database) -> i64 {
        StatsRepository::new(db.connection())
            .count(Table::School)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_alias_resolves_to_canonical_school() {
        let mut db = Database::in_memory().await.unwrap();
        let canonical: i64 = sqlx::query_scalar(
            "INSERT INTO school (name) VALUES ('Hugo Treffneri Gümnaasium') RETURNING id",
        )
        .fetch_one(db.connection())
        .await
        .unwrap();
        SchoolRepository::new(db.connection())
            .add_alias("HTG", "Hugo Treffneri Gümnaasium")
            .await
            .unwrap();

        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &NeverConfirm);
        let first = resolve_school(db.connection(), &mut ctx, "HTG").await.unwrap();
        let second = resolve_school(db.connection(), &mut ctx, "HTG").await.unwrap();

        assert_eq!(first, canonical);
        assert_eq!(second, canonical);
        assert_eq!(ctx.stats.selects, 1);
        assert_eq!(ctx.stats.inserts, 0);
        drop(ctx);
        assert_eq!(school_count(&mut db).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_school_is_created_without_prompt() {
        let mut db = Database::in_memory().await.unwrap();
        let mut cache = SessionCache::new();
        // NeverConfirm would refuse any prompt
        let mut ctx = ImportContext::new(&mut cache, &NeverConfirm);

        let id = resolve_school(db.connection(), &mut ctx, "Miina Härma Gümnaasium")
            .await
            .unwrap();
        assert_eq!(ctx.stats.inserts, 1);
        drop(ctx);

        assert_eq!(cache.schools.get("Miina Härma Gümnaasium"), Some(id));
        assert_eq!(school_count(&mut db).await, 1);
    }

    #[tokio::test]
    async fn test_canonical_name_beats_alias_of_same_spelling() {
        let mut db = Database::in_memory().await.unwrap();
        sqlx::raw_sql(
            r#"
            INSERT INTO school (id, name) VALUES (1, 'Reaalkool'), (2, 'Tallinna Reaalkool');
            INSERT INTO school_alias (name, correct) VALUES ('Reaalkool', 2);
            "#,
        )
        .execute(db.connection())
        .await
        .unwrap();

        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &NeverConfirm);
        let id = resolve_school(db.connection(), &mut ctx, "Reaalkool").await.unwrap();
        assert_eq!(id, 1);
    }
}

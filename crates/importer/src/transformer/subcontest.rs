use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use storage::Table;
use tracing::{debug, info};

use super::contestant::{ChildRows, FieldRow, MentorRow, build_contestant};
use crate::canonical::Subcontest;
use crate::canonical::template::{self, subcontest_vars};
use crate::resolver::{LookupKey, QueryStats, create_row, resolve};
use crate::{ImportContext, ImporterError, Result};

/// Largest number of rows sent in one multi-row INSERT; keeps the bound
/// parameter count below SQLite's per-statement limit.
pub const BATCH_ROWS: usize = 5000;

/// What one subcontest import wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubcontestSummary {
    pub subcontest_id: i64,
    pub contestants: usize,
    pub fields: usize,
    pub mentors: usize,
}

pub async fn import_subcontest(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext<'_>,
    subcontest: &Subcontest,
    contest_id: i64,
) -> Result<SubcontestSummary> {
    let (min_class, max_class) = subcontest.class_range;
    let age_group_id = resolve(
        conn,
        ctx,
        LookupKey::new(Table::AgeGroup)
            .with("name", subcontest.class_range_name.as_str())
            .with("min_class", min_class)
            .with("max_class", max_class),
        true,
    )
    .await?;

    let sql = "SELECT id FROM subcontest WHERE contest_id = ? AND age_group_id = ?";
    debug!("Query: \"{}\" [{}, {}]", sql, contest_id, age_group_id);
    ctx.stats.selects += 1;
    let existing = sqlx::query_scalar::<_, i64>(sql)
        .bind(contest_id)
        .bind(age_group_id)
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_some() {
        return Err(ImporterError::DuplicateSubcontest {
            contest_id,
            age_group: subcontest.class_range_name.clone(),
        });
    }

    let name = template::render(
        &subcontest.name,
        &subcontest_vars(&subcontest.class_range_name),
    )?;
    let subcontest_id = create_row(
        conn,
        Table::Subcontest,
        &[
            ("contest_id", contest_id.into()),
            ("age_group_id", age_group_id.into()),
            ("name", name.as_str().into()),
            ("description", subcontest.description.as_str().into()),
        ],
        &mut ctx.stats,
    )
    .await?;

    let mut column_ids = Vec::with_capacity(subcontest.columns.len());
    for (seq_no, column) in (1i64..).zip(&subcontest.columns) {
        let column_id = create_row(
            conn,
            Table::SubcontestColumn,
            &[
                ("subcontest_id", subcontest_id.into()),
                ("name", column.as_str().into()),
                ("seq_no", seq_no.into()),
            ],
            &mut ctx.stats,
        )
        .await?;
        column_ids.push(column_id);
    }

    let mut pending = ChildRows::default();
    for contestant in &subcontest.contestants {
        let rows = build_contestant(conn, ctx, contestant, subcontest_id, &column_ids).await?;
        pending.append(rows);
    }

    insert_field_rows(conn, &pending.fields, &mut ctx.stats).await?;
    insert_mentor_rows(conn, &pending.mentors, &mut ctx.stats).await?;

    info!(
        "Subcontest '{}' added: {} contestants, {} fields, {} mentor links",
        name,
        subcontest.contestants.len(),
        pending.fields.len(),
        pending.mentors.len()
    );

    Ok(SubcontestSummary {
        subcontest_id,
        contestants: subcontest.contestants.len(),
        fields: pending.fields.len(),
        mentors: pending.mentors.len(),
    })
}

async fn insert_field_rows(
    conn: &mut SqliteConnection,
    rows: &[FieldRow],
    stats: &mut QueryStats,
) -> Result<()> {
    for chunk in rows.chunks(BATCH_ROWS) {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "INSERT INTO contestant_field (task_id, contestant_id, entry) ",
        );
        qb.push_values(chunk, |mut b, row| {
            b.push_bind(row.task_id)
                .push_bind(row.contestant_id)
                .push_bind(row.entry.clone());
        });

        debug!("Query (batch): \"{}\" {:?}", qb.sql(), chunk);
        stats.batch_statements += 1;
        qb.build().execute(&mut *conn).await?;
    }

    Ok(())
}

async fn insert_mentor_rows(
    conn: &mut SqliteConnection,
    rows: &[MentorRow],
    stats: &mut QueryStats,
) -> Result<()> {
    for chunk in rows.chunks(BATCH_ROWS) {
        let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO mentor (contestant_id, mentor_id) ");
        qb.push_values(chunk, |mut b, row| {
            b.push_bind(row.contestant_id).push_bind(row.mentor_id);
        });

        debug!("Query (batch): \"{}\" {:?}", qb.sql(), chunk);
        stats.batch_statements += 1;
        qb.build().execute(&mut *conn).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::Contestant;
    use crate::confirm::{AlwaysConfirm, NeverConfirm};
    use crate::resolver::SessionCache;
    use storage::Database;
    use storage::repository::{ContestRepository, StatsRepository};

    async fn seeded_contest(db: &mut Database) -> i64 {
        sqlx::raw_sql(
            r#"
            INSERT INTO type (id, name) VALUES (1, 'Lõppvoor');
            INSERT INTO subject (id, name) VALUES (1, 'Keemia');
            INSERT INTO contest (id, year, type_id, subject_id, name) VALUES (1, 2022, 1, 1, 'Keemia lõppvoor 2022');
            "#,
        )
        .execute(db.connection())
        .await
        .unwrap();
        1
    }

    fn contestant(name: &str, class: i32, fields: &[&str], mentors: &[&str]) -> Contestant {
        Contestant {
            name: name.to_string(),
            class_level: Some(class),
            instructors: mentors.iter().map(|m| m.to_string()).collect(),
            school: None,
            placement: Some(1),
            fields: fields.iter().map(|f| Some(f.to_string())).collect(),
        }
    }

    fn subcontest() -> Subcontest {
        Subcontest {
            name: "{group} klassid".to_string(),
            class_range: (8, 9),
            class_range_name: "põhikool".to_string(),
            columns: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            contestants: vec![
                contestant("Jaan Tamm", 9, &["5", "3", "8"], &[]),
                contestant("Mari Mets", 8, &["4", "4", "8"], &["Juhan Juhendaja"]),
            ],
            description: "Põhikooli arvestus".to_string(),
        }
    }

    #[tokio::test]
    async fn test_import_subcontest_writes_ordered_columns_and_batches() {
        let mut db = Database::in_memory().await.unwrap();
        let contest_id = seeded_contest(&mut db).await;
        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &AlwaysConfirm);

        let summary = import_subcontest(db.connection(), &mut ctx, &subcontest(), contest_id)
            .await
            .unwrap();
        assert_eq!(summary.contestants, 2);
        assert_eq!(summary.fields, 6);
        assert_eq!(summary.mentors, 1);
        // one statement per child table
        assert_eq!(ctx.stats.batch_statements, 2);
        drop(ctx);

        let mut repo = ContestRepository::new(db.connection());
        let subcontests = repo.subcontests(contest_id).await.unwrap();
        assert_eq!(subcontests.len(), 1);
        assert_eq!(subcontests[0].name, "põhikool klassid");
        assert_eq!(subcontests[0].description, "Põhikooli arvestus");

        let columns = repo.columns(summary.subcontest_id).await.unwrap();
        let seq: Vec<_> = columns.iter().map(|c| (c.name.as_str(), c.seq_no)).collect();
        assert_eq!(seq, vec![("1", 1), ("2", 2), ("3", 3)]);

        let results = repo.results(summary.subcontest_id).await.unwrap();
        let entries = repo.entries(results[1].contestant_id).await.unwrap();
        assert_eq!(entries[2], ("3".to_string(), Some("8".to_string())));
    }

    #[tokio::test]
    async fn test_duplicate_age_group_is_rejected() {
        let mut db = Database::in_memory().await.unwrap();
        let contest_id = seeded_contest(&mut db).await;
        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &AlwaysConfirm);

        import_subcontest(db.connection(), &mut ctx, &subcontest(), contest_id)
            .await
            .unwrap();
        let err = import_subcontest(db.connection(), &mut ctx, &subcontest(), contest_id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImporterError::DuplicateSubcontest { contest_id: 1, ref age_group } if age_group == "põhikool"
        ));
        drop(ctx);
        let count = StatsRepository::new(db.connection())
            .count(Table::Subcontest)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_refused_age_group_creates_nothing() {
        let mut db = Database::in_memory().await.unwrap();
        let contest_id = seeded_contest(&mut db).await;
        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &NeverConfirm);

        let err = import_subcontest(db.connection(), &mut ctx, &subcontest(), contest_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ImporterError::CreationRefused { table: Table::AgeGroup, .. }
        ));
        assert_eq!(ctx.stats.inserts, 0);
    }

    #[tokio::test]
    async fn test_no_contestants_means_no_batches() {
        let mut db = Database::in_memory().await.unwrap();
        let contest_id = seeded_contest(&mut db).await;
        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &AlwaysConfirm);

        let mut empty = subcontest();
        empty.contestants.clear();
        import_subcontest(db.connection(), &mut ctx, &empty, contest_id)
            .await
            .unwrap();
        assert_eq!(ctx.stats.batch_statements, 0);
    }

    #[tokio::test]
    async fn test_field_rows_above_batch_limit_are_split() {
        let mut db = Database::in_memory().await.unwrap();
        let contest_id = seeded_contest(&mut db).await;
        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &AlwaysConfirm);

        // three fields each, one more contestant than fits in one statement
        let contestants = BATCH_ROWS / 3 + 1;
        let mut large = subcontest();
        large.contestants = (0..contestants)
            .map(|i| contestant(&format!("Õpilane {}", i), 9, &["1", "2", "3"], &[]))
            .collect();

        let summary = import_subcontest(db.connection(), &mut ctx, &large, contest_id)
            .await
            .unwrap();
        let field_rows = contestants * 3;
        assert!(field_rows > BATCH_ROWS);
        assert_eq!(summary.fields, field_rows);
        assert_eq!(ctx.stats.batch_statements, field_rows.div_ceil(BATCH_ROWS));
        drop(ctx);

        let stored = StatsRepository::new(db.connection())
            .count(Table::ContestantField)
            .await
            .unwrap();
        assert_eq!(stored, field_rows as i64);
    }
}

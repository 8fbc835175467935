use sqlx::SqliteConnection;
use storage::Table;

use crate::canonical::Contestant;
use crate::resolver::{LookupKey, create_row, resolve, resolve_school};
use crate::{ImportContext, Result};

/// `(task_id, contestant_id, entry)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub task_id: i64,
    pub contestant_id: i64,
    pub entry: Option<String>,
}

/// `(contestant_id, mentor_id)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentorRow {
    pub contestant_id: i64,
    pub mentor_id: i64,
}

/// Child rows waiting for the batched insert at subcontest level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildRows {
    pub fields: Vec<FieldRow>,
    pub mentors: Vec<MentorRow>,
}

impl ChildRows {
    pub fn append(&mut self, mut other: ChildRows) {
        self.fields.append(&mut other.fields);
        self.mentors.append(&mut other.mentors);
    }
}

/// Create the contestant row and return its field and mentor rows.
///
/// The contestant row itself is inserted immediately since its id is needed
/// by the children; the children are only collected.
pub async fn build_contestant(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext<'_>,
    contestant: &Contestant,
    subcontest_id: i64,
    column_ids: &[i64],
) -> Result<ChildRows> {
    let age_group_id = match contestant.class_level {
        Some(class) => Some(
            resolve(
                conn,
                ctx,
                LookupKey::new(Table::AgeGroup)
                    .with("name", class.to_string())
                    .with("min_class", class)
                    .with("max_class", class),
                true,
            )
            .await?,
        ),
        None => None,
    };

    let person_id = resolve(
        conn,
        ctx,
        LookupKey::new(Table::Person).with("name", contestant.name.as_str()),
        false,
    )
    .await?;

    let school_id = match contestant.school.as_deref() {
        Some(school) if !school.is_empty() => Some(resolve_school(conn, ctx, school).await?),
        _ => None,
    };

    let placement = contestant
        .placement
        .map(|p| p.to_string())
        .unwrap_or_default();

    let contestant_id = create_row(
        conn,
        Table::Contestant,
        &[
            ("subcontest_id", subcontest_id.into()),
            ("person_id", person_id.into()),
            ("age_group_id", age_group_id.into()),
            ("school_id", school_id.into()),
            ("placement", placement.into()),
        ],
        &mut ctx.stats,
    )
    .await?;

    let fields = column_ids
        .iter()
        .zip(&contestant.fields)
        .map(|(task_id, entry)| FieldRow {
            task_id: *task_id,
            contestant_id,
            entry: entry.clone(),
        })
        .collect();

    let mut mentors = Vec::with_capacity(contestant.instructors.len());
    for instructor in &contestant.instructors {
        let mentor_id = resolve(
            conn,
            ctx,
            LookupKey::new(Table::Person).with("name", instructor.as_str()),
            false,
        )
        .await?;
        mentors.push(MentorRow {
            contestant_id,
            mentor_id,
        });
    }

    Ok(ChildRows { fields, mentors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AlwaysConfirm;
    use crate::resolver::SessionCache;
    use storage::Database;
    use storage::repository::StatsRepository;

    async fn seeded_subcontest(db: &mut Database) -> (i64, Vec<i64>) {
        sqlx::raw_sql(
            r#"
            INSERT INTO type (id, name) VALUES (1, 'Lahtine');
            INSERT INTO subject (id, name) VALUES (1, 'Informaatika');
            INSERT INTO age_group (id, name, min_class, max_class) VALUES (1, 'gümnaasium', 10, 12);
            INSERT INTO contest (id, year, type_id, subject_id, name) VALUES (1, 2024, 1, 1, 'x');
            INSERT INTO subcontest (id, contest_id, age_group_id, name) VALUES (1, 1, 1, 'gümnaasium');
            INSERT INTO subcontest_column (id, subcontest_id, name, seq_no)
                VALUES (1, 1, 'Ülesanne 1', 1), (2, 1, 'Ülesanne 2', 2), (3, 1, 'Kokku', 3);
            "#,
        )
        .execute(db.connection())
        .await
        .unwrap();
        (1, vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_builds_field_and_mentor_rows() {
        let mut db = Database::in_memory().await.unwrap();
        let (subcontest_id, columns) = seeded_subcontest(&mut db).await;
        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &AlwaysConfirm);

        let contestant = Contestant {
            name: "Mari Mets".to_string(),
            class_level: Some(11),
            instructors: vec!["Juhan Juhendaja".to_string(), "Juhan Juhendaja".to_string()],
            school: Some("Tallinna Reaalkool".to_string()),
            placement: Some(2),
            fields: vec![Some("7".to_string()), None, Some(String::new())],
        };

        let rows = build_contestant(db.connection(), &mut ctx, &contestant, subcontest_id, &columns)
            .await
            .unwrap();

        let contestant_id = rows.fields[0].contestant_id;
        assert_eq!(
            rows.fields,
            vec![
                FieldRow {
                    task_id: 1,
                    contestant_id,
                    entry: Some("7".to_string()),
                },
                FieldRow {
                    task_id: 2,
                    contestant_id,
                    entry: None,
                },
                FieldRow {
                    task_id: 3,
                    contestant_id,
                    entry: Some(String::new()),
                },
            ]
        );
        // listed twice, linked twice
        assert_eq!(rows.mentors.len(), 2);
        assert_eq!(rows.mentors[0], rows.mentors[1]);

        let (placement, age_group_id, school_id): (String, Option<i64>, Option<i64>) =
            sqlx::query_as("SELECT placement, age_group_id, school_id FROM contestant WHERE id = ?")
                .bind(contestant_id)
                .fetch_one(db.connection())
                .await
                .unwrap();
        assert_eq!(placement, "2");
        assert!(age_group_id.is_some());
        assert!(school_id.is_some());

        // children are only collected
        let fields = StatsRepository::new(db.connection())
            .count(Table::ContestantField)
            .await
            .unwrap();
        assert_eq!(fields, 0);
    }

    #[tokio::test]
    async fn test_optional_references_stay_null() {
        let mut db = Database::in_memory().await.unwrap();
        let (subcontest_id, columns) = seeded_subcontest(&mut db).await;
        let mut cache = SessionCache::new();
        let mut ctx = ImportContext::new(&mut cache, &AlwaysConfirm);

        let contestant = Contestant {
            name: "Jaan Tamm".to_string(),
            class_level: None,
            instructors: vec![],
            school: Some(String::new()),
            placement: None,
            fields: vec![Some("1".to_string())],
        };

        let rows = build_contestant(db.connection(), &mut ctx, &contestant, subcontest_id, &columns)
            .await
            .unwrap();
        assert_eq!(rows.fields.len(), 1);
        assert!(rows.mentors.is_empty());

        let (placement, age_group_id, school_id): (String, Option<i64>, Option<i64>) =
            sqlx::query_as("SELECT placement, age_group_id, school_id FROM contestant")
                .fetch_one(db.connection())
                .await
                .unwrap();
        assert_eq!(placement, "");
        assert_eq!(age_group_id, None);
        assert_eq!(school_id, None);
    }
}

use sqlx::SqliteConnection;

use crate::error::{Result, StorageError};
use crate::models::{Contest, ContestantResult, Subcontest, SubcontestColumn};

/// Read side of imported contests
pub struct ContestRepository<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> ContestRepository<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Find a contest by its identity: year, type name and subject name
    pub async fn find_by_identity(
        &mut self,
        year: i64,
        contest_type: &str,
        subject: &str,
    ) -> Result<Contest> {
        let contest = sqlx::query_as::<_, Contest>(
            r#"
            SELECT c.id, c.year, c.type_id, c.subject_id, c.name, c.created_at
            FROM contest c
            JOIN type t ON c.type_id = t.id
            JOIN subject s ON c.subject_id = s.id
            WHERE c.year = ? AND t.name = ? AND s.name = ?
            "#,
        )
        .bind(year)
        .bind(contest_type)
        .bind(subject)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(contest)
    }

    pub async fn subcontests(&mut self, contest_id: i64) -> Result<Vec<Subcontest>> {
        let subcontests = sqlx::query_as::<_, Subcontest>(
            r#"
            SELECT sc.id, sc.contest_id, sc.age_group_id, sc.name, sc.description
            FROM subcontest sc
            JOIN age_group ag ON sc.age_group_id = ag.id
            WHERE sc.contest_id = ?
            ORDER BY ag.min_class, ag.max_class, sc.id
            "#,
        )
        .bind(contest_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(subcontests)
    }

    /// Scored columns of a subcontest in sequence order
    pub async fn columns(&mut self, subcontest_id: i64) -> Result<Vec<SubcontestColumn>> {
        let columns = sqlx::query_as::<_, SubcontestColumn>(
            r#"
            SELECT id, subcontest_id, name, seq_no
            FROM subcontest_column
            WHERE subcontest_id = ?
            ORDER BY seq_no
            "#,
        )
        .bind(subcontest_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(columns)
    }

    /// Contestants of a subcontest, placed ones first in placement order
    pub async fn results(&mut self, subcontest_id: i64) -> Result<Vec<ContestantResult>> {
        let results = sqlx::query_as::<_, ContestantResult>(
            r#"
            SELECT
                c.id AS contestant_id,
                p.name AS person_name,
                s.name AS school_name,
                ag.min_class AS class_level,
                c.placement
            FROM contestant c
            JOIN person p ON c.person_id = p.id
            LEFT JOIN school s ON c.school_id = s.id
            LEFT JOIN age_group ag ON c.age_group_id = ag.id
            WHERE c.subcontest_id = ?
            ORDER BY c.placement = '', CAST(c.placement AS INTEGER), c.id
            "#,
        )
        .bind(subcontest_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(results)
    }

    /// Field entries of one contestant aligned with the subcontest's columns
    pub async fn entries(&mut self, contestant_id: i64) -> Result<Vec<(String, Option<String>)>> {
        let entries = sqlx::query_as::<_, (String, Option<String>)>(
            r#"
            SELECT sc.name, cf.entry
            FROM contestant_field cf
            JOIN subcontest_column sc ON cf.task_id = sc.id
            WHERE cf.contestant_id = ?
            ORDER BY sc.seq_no
            "#,
        )
        .bind(contestant_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(entries)
    }

    /// Names of the mentors linked to a contestant, in link order
    pub async fn mentors(&mut self, contestant_id: i64) -> Result<Vec<String>> {
        let mentors = sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.name
            FROM mentor m
            JOIN person p ON m.mentor_id = p.id
            WHERE m.contestant_id = ?
            ORDER BY m.id
            "#,
        )
        .bind(contestant_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(mentors)
    }
}

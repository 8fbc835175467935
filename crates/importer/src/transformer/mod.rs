mod contestant;
mod subcontest;

pub use contestant::{ChildRows, FieldRow, MentorRow, build_contestant};
pub use subcontest::{BATCH_ROWS, SubcontestSummary, import_subcontest};

use sqlx::SqliteConnection;
use storage::{Database, Table};
use tracing::{debug, error, info};

use crate::canonical::Contest;
use crate::canonical::template::{self, contest_vars};
use crate::confirm::Confirm;
use crate::resolver::{LookupKey, QueryStats, SessionCache, create_row, resolve};
use crate::{ImportContext, ImporterError, Result};

/// What one `import_contest` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Id of the contest row; after a dry run it no longer exists
    pub contest_id: i64,
    pub contest_reused: bool,
    pub subcontests: Vec<SubcontestSummary>,
    pub dry_run: bool,
    pub stats: QueryStats,
}

impl ImportReport {
    pub fn contestants(&self) -> usize {
        self.subcontests.iter().map(|s| s.contestants).sum()
    }

    pub fn fields(&self) -> usize {
        self.subcontests.iter().map(|s| s.fields).sum()
    }

    pub fn mentors(&self) -> usize {
        self.subcontests.iter().map(|s| s.mentors).sum()
    }
}

/// Owns the store connection, the session caches and the operator prompt,
/// and imports one contest per call as a single unit of work.
pub struct ContestImporter<C: Confirm> {
    db: Database,
    cache: SessionCache,
    confirm: C,
}

impl<C: Confirm> ContestImporter<C> {
    pub fn new(db: Database, confirm: C) -> Self {
        Self {
            db,
            cache: SessionCache::new(),
            confirm,
        }
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn database(&mut self) -> &mut Database {
        &mut self.db
    }

    pub fn into_database(self) -> Database {
        self.db
    }

    /// Import `contest` inside one transaction.
    ///
    /// Any failure rolls the transaction back, restores both caches to their
    /// state before the call and returns [`ImporterError::ImportAborted`]
    /// wrapping the cause. A dry run does all the work, then rolls back and
    /// restores the caches the same way, but reports success.
    pub async fn import_contest(
        &mut self,
        contest: &Contest,
        dry_run: bool,
    ) -> Result<ImportReport> {
        let snapshot = self.cache.snapshot();
        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| ImporterError::ImportAborted(Box::new(e.into())))?;

        let mut ctx = ImportContext::new(&mut self.cache, &self.confirm);
        let outcome = import_contest_rows(&mut tx, &mut ctx, contest).await;
        let stats = ctx.stats;

        let mut report = match outcome {
            Ok(report) => report,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback after failed import also failed: {}", rollback_err);
                }
                self.cache.restore(snapshot);
                error!(
                    error = ?e,
                    "Import of {} {} {} failed and was rolled back: {}",
                    contest.year, contest.contest_type, contest.subject, e
                );
                return Err(ImporterError::ImportAborted(Box::new(e)));
            }
        };
        report.stats = stats;
        report.dry_run = dry_run;

        let finished = if dry_run {
            tx.rollback().await
        } else {
            tx.commit().await
        };
        if let Err(e) = finished {
            self.cache.restore(snapshot);
            error!(error = ?e, "Finishing the import transaction failed: {}", e);
            return Err(ImporterError::ImportAborted(Box::new(e.into())));
        }

        if dry_run {
            self.cache.restore(snapshot);
            info!("Contest added (dry run)");
        } else {
            info!("Contest added");
        }
        debug!("Import statistics: {:?}", report.stats);

        Ok(report)
    }
}

async fn import_contest_rows(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext<'_>,
    contest: &Contest,
) -> Result<ImportReport> {
    let type_id = resolve(
        conn,
        ctx,
        LookupKey::new(Table::Type).with("name", contest.contest_type.as_str()),
        true,
    )
    .await?;
    let subject_id = resolve(
        conn,
        ctx,
        LookupKey::new(Table::Subject).with("name", contest.subject.as_str()),
        true,
    )
    .await?;

    let sql = "SELECT id, name FROM contest WHERE year = ? AND type_id = ? AND subject_id = ?";
    debug!(
        "Query: \"{}\" [{}, {}, {}]",
        sql, contest.year, type_id, subject_id
    );
    ctx.stats.selects += 1;
    let existing = sqlx::query_as::<_, (i64, String)>(sql)
        .bind(contest.year)
        .bind(type_id)
        .bind(subject_id)
        .fetch_optional(&mut *conn)
        .await?;

    let (contest_id, contest_reused) = match existing {
        Some((id, name)) => {
            let message = format!("This contest already exists! Use it?\n({}, {})", id, name);
            if !ctx.confirm.confirm(&message) {
                return Err(ImporterError::CreationRefused {
                    table: Table::Contest,
                    key: format!(
                        "year={}, type_id={}, subject_id={}",
                        contest.year, type_id, subject_id
                    ),
                });
            }
            info!("Reusing existing contest {} '{}'", id, name);
            (id, true)
        }
        None => {
            let name = template::render(&contest.name, &contest_vars(contest.year))?;
            let id = create_row(
                conn,
                Table::Contest,
                &[
                    ("year", contest.year.into()),
                    ("type_id", type_id.into()),
                    ("subject_id", subject_id.into()),
                    ("name", name.as_str().into()),
                ],
                &mut ctx.stats,
            )
            .await?;
            info!("Created contest {} '{}'", id, name);
            (id, false)
        }
    };

    let mut subcontests = Vec::with_capacity(contest.subcontests.len());
    for subcontest in &contest.subcontests {
        subcontests.push(import_subcontest(conn, ctx, subcontest, contest_id).await?);
    }

    Ok(ImportReport {
        contest_id,
        contest_reused,
        subcontests,
        ..Default::default()
    })
}

//! Find-or-create resolution of lookup rows.
//!
//! Every resolved id is cached in the session's [`SessionCache`] under its
//! [`LookupKey`], so one key costs at most one SELECT and one INSERT per
//! session.

mod cache;
mod key;
mod school;

pub use cache::{RowCache, SchoolCache, SessionCache};
pub use key::{Columns, KeyValue, LookupKey};
pub use school::resolve_school;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use storage::Table;
use tracing::debug;

use crate::{ImportContext, ImporterError, Result};

/// Statement counters for one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub selects: usize,
    pub inserts: usize,
    pub cache_hits: usize,
    pub batch_statements: usize,
}

/// Return the id of the row identified by `key`, creating it if absent.
///
/// When `confirm_create` is set the operator must agree before a new row is
/// inserted; a refusal fails with [`ImporterError::CreationRefused`] and
/// leaves the table untouched.
pub async fn resolve(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext<'_>,
    key: LookupKey,
    confirm_create: bool,
) -> Result<i64> {
    if let Some(id) = ctx.cache.rows.get(&key) {
        debug!("Using cached row for {} ({}): {}", key.table(), key, id);
        ctx.stats.cache_hits += 1;
        return Ok(id);
    }

    let id = match find_row(conn, &key, &mut ctx.stats).await? {
        Some(id) => id,
        None => {
            if confirm_create {
                let message = format!(
                    "Really insert new row into table {}?\n{}",
                    key.table(),
                    key
                );
                if !ctx.confirm.confirm(&message) {
                    return Err(ImporterError::CreationRefused {
                        table: key.table(),
                        key: key.to_string(),
                    });
                }
            }
            create_row(conn, key.table(), key.params(), &mut ctx.stats).await?
        }
    };

    ctx.cache.rows.insert(key, id);
    Ok(id)
}

async fn find_row(
    conn: &mut SqliteConnection,
    key: &LookupKey,
    stats: &mut QueryStats,
) -> Result<Option<i64>> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT id FROM ");
    qb.push(key.table().as_str()).push(" WHERE ");

    for (idx, (column, value)) in key.params().iter().enumerate() {
        if idx > 0 {
            qb.push(" AND ");
        }
        qb.push(*column);
        // `= NULL` never matches
        if value.is_null() {
            qb.push(" IS NULL");
        } else {
            qb.push(" = ");
            push_value(&mut qb, value);
        }
    }
    qb.push(" LIMIT 1");

    debug!("Query: \"{}\" [{}]", qb.sql(), key);
    stats.selects += 1;

    let id = qb
        .build_query_scalar::<i64>()
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

/// Insert one row and return its generated id.
pub async fn create_row(
    conn: &mut SqliteConnection,
    table: Table,
    columns: &[(&'static str, KeyValue)],
    stats: &mut QueryStats,
) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO ");
    qb.push(table.as_str()).push(" (");
    for (idx, (column, _)) in columns.iter().enumerate() {
        if idx > 0 {
            qb.push(", ");
        }
        qb.push(*column);
    }
    qb.push(") VALUES (");
    for (idx, (_, value)) in columns.iter().enumerate() {
        if idx > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, value);
    }
    qb.push(") RETURNING id");

    debug!("Query: \"{}\" {:?}", qb.sql(), columns);
    stats.inserts += 1;

    let id = qb
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &KeyValue) {
    match value {
        KeyValue::Null => qb.push_bind(None::<i64>),
        KeyValue::Int(v) => qb.push_bind(*v),
        KeyValue::Text(v) => qb.push_bind(v.clone()),
    };
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of one of the single-column lookup tables
/// (`type`, `subject`, `school`, `person`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NamedRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AgeGroup {
    pub id: i64,
    pub name: String,
    pub min_class: i64,
    pub max_class: i64,
}

/// Alternate spelling of a school, pointing at the canonical `school` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SchoolAlias {
    pub id: i64,
    pub name: String,
    pub correct: i64,
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contestant {
    pub id: i64,
    pub subcontest_id: i64,
    pub person_id: i64,
    pub age_group_id: Option<i64>,
    pub school_id: Option<i64>,
    /// Decimal placement, or empty when the contestant was unplaced.
    pub placement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContestantField {
    pub id: i64,
    pub task_id: i64,
    pub contestant_id: i64,
    pub entry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mentor {
    pub id: i64,
    pub contestant_id: i64,
    pub mentor_id: i64,
}

/// One contestant of a subcontest joined with its person and school.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContestantResult {
    pub contestant_id: i64,
    pub person_name: String,
    pub school_name: Option<String>,
    pub class_level: Option<i64>,
    pub placement: String,
}

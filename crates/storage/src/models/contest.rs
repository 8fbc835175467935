use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contest {
    pub id: i64,
    pub year: i64,
    pub type_id: i64,
    pub subject_id: i64,
    pub name: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subcontest {
    pub id: i64,
    pub contest_id: i64,
    pub age_group_id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubcontestColumn {
    pub id: i64,
    pub subcontest_id: i64,
    pub name: String,
    pub seq_no: i64,
}

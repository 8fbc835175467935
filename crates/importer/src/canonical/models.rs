use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

/// A fully-populated contest as handed over by the grid editor (or read from a
/// canonical JSON file). Identity for lookups is `(year, type, subject)`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Contest {
    #[validate(range(min = 1900, max = 2200))]
    pub year: i32,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub contest_type: String,
    /// Display name, may contain `{year}` placeholders
    #[validate(length(min = 1, message = "contest name is required"))]
    pub name: String,
    #[validate(nested)]
    pub subcontests: Vec<Subcontest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Subcontest {
    /// Display name, may contain `{group}` placeholders
    #[validate(length(min = 1, message = "subcontest name is required"))]
    pub name: String,
    #[validate(custom(function = "validate_class_range"))]
    pub class_range: (i32, i32),
    #[validate(length(min = 1, message = "class range name is required"))]
    pub class_range_name: String,
    pub columns: Vec<String>,
    #[validate(nested)]
    pub contestants: Vec<Contestant>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Contestant {
    #[validate(length(min = 1, message = "contestant name is required"))]
    pub name: String,
    #[serde(default, alias = "class", skip_serializing_if = "Option::is_none")]
    pub class_level: Option<i32>,
    #[serde(default)]
    pub instructors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<i32>,
    /// One entry per subcontest column; `None` is "no answer", distinct from `""`
    #[serde(default, deserialize_with = "deserialize_field_values")]
    pub fields: Vec<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub extracted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Csv,
    Manual,
}

fn validate_class_range(range: &(i32, i32)) -> Result<(), ValidationError> {
    if range.0 > range.1 {
        let mut err = ValidationError::new("class_range");
        err.message = Some(format!("min class {} exceeds max class {}", range.0, range.1).into());
        return Err(err);
    }
    Ok(())
}

/// Field cells arrive as whatever the spreadsheet produced; every non-null
/// scalar is kept in its textual form.
fn deserialize_field_values<'de, D>(deserializer: D) -> Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|value| match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => Ok(Some(s)),
            serde_json::Value::Number(n) => Ok(Some(n.to_string())),
            serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "unsupported field value: {}",
                other
            ))),
        })
        .collect()
}

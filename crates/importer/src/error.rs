use storage::Table;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Insertion canceled: creating a row in '{table}' for {key} was refused")]
    CreationRefused { table: Table, key: String },

    #[error("Duplicate subcontest: contest {contest_id} already has age group '{age_group}'")]
    DuplicateSubcontest { contest_id: i64, age_group: String },

    #[error("Database error: {0}")]
    StoreFailure(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Grid error: {0}")]
    Grid(String),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Import failed and was rolled back: {0}")]
    ImportAborted(#[source] Box<ImporterError>),
}

/// Coarse classification of an [`ImporterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CreationRefused,
    DuplicateSubcontest,
    StoreFailure,
    Input,
}

impl ImporterError {
    /// The error that started the failure, looking through `ImportAborted`.
    pub fn root_cause(&self) -> &ImporterError {
        match self {
            Self::ImportAborted(inner) => inner.root_cause(),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Self::CreationRefused { .. } => ErrorKind::CreationRefused,
            Self::DuplicateSubcontest { .. } => ErrorKind::DuplicateSubcontest,
            Self::StoreFailure(_) | Self::Storage(_) => ErrorKind::StoreFailure,
            _ => ErrorKind::Input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested_aborts() {
        let err = ImporterError::ImportAborted(Box::new(ImporterError::DuplicateSubcontest {
            contest_id: 3,
            age_group: "gümnaasium".to_string(),
        }));

        assert!(matches!(
            err.root_cause(),
            ImporterError::DuplicateSubcontest { contest_id: 3, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::DuplicateSubcontest);
    }

    #[test]
    fn test_kind_of_plain_errors() {
        let refused = ImporterError::CreationRefused {
            table: Table::Type,
            key: "name='Lahtine'".to_string(),
        };
        assert_eq!(refused.kind(), ErrorKind::CreationRefused);
        assert_eq!(
            ImporterError::Validation("x".into()).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            ImporterError::StoreFailure(sqlx::Error::RowNotFound).kind(),
            ErrorKind::StoreFailure
        );
    }
}

mod mapping;
mod placement;
mod reader;

pub use mapping::{CLASS_PLACEHOLDER, ColumnRole, GridMapping, GridTemplate, parse_class_range};
pub use placement::{clean_placement, generate_placements, parse_total};
pub use reader::Grid;

use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use crate::canonical::{Contest, SourceMetadata, SourceType};
use crate::{ContestSource, Result};

/// A contest typed into a spreadsheet and exported as CSV.
pub struct GridSource {
    path: PathBuf,
    mapping: GridMapping,
}

impl GridSource {
    pub fn new(path: impl Into<PathBuf>, mapping: GridMapping) -> Self {
        Self {
            path: path.into(),
            mapping,
        }
    }
}

#[async_trait::async_trait]
impl ContestSource for GridSource {
    async fn load(&self) -> Result<Contest> {
        let bytes = tokio::fs::read(&self.path).await?;
        let grid = Grid::from_reader(bytes.as_slice())?;
        info!(
            "Read {} rows x {} columns from {}",
            grid.rows.len(),
            grid.width(),
            self.path.display()
        );

        let mut contest = self.mapping.map(&grid)?;
        contest.source = Some(SourceMetadata {
            source_type: SourceType::Csv,
            extracted_at: Utc::now(),
            original_filename: self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        });

        Ok(contest)
    }

    fn name(&self) -> &'static str {
        "CSV grid"
    }
}

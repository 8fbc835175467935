use std::path::PathBuf;

use tracing::debug;

use crate::canonical::Contest;
use crate::{ContestSource, Result};

/// A contest stored in the canonical JSON format.
pub struct CanonicalFile {
    path: PathBuf,
}

impl CanonicalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(json: &str) -> Result<Contest> {
        Ok(serde_json::from_str(json)?)
    }
}

#[async_trait::async_trait]
impl ContestSource for CanonicalFile {
    async fn load(&self) -> Result<Contest> {
        debug!("Reading canonical contest from {}", self.path.display());
        let json = tokio::fs::read_to_string(&self.path).await?;
        Self::parse(&json)
    }

    fn name(&self) -> &'static str {
        "canonical JSON"
    }
}

use crate::Result;
use crate::canonical::Contest;
use crate::confirm::Confirm;
use crate::resolver::{QueryStats, SessionCache};

/// Mutable state threaded through one import: the session caches, the
/// operator prompt, and the statement counters.
pub struct ImportContext<'a> {
    pub cache: &'a mut SessionCache,
    pub confirm: &'a dyn Confirm,
    pub stats: QueryStats,
}

impl<'a> ImportContext<'a> {
    pub fn new(cache: &'a mut SessionCache, confirm: &'a dyn Confirm) -> Self {
        Self {
            cache,
            confirm,
            stats: QueryStats::default(),
        }
    }
}

/// Something that can produce a finalized contest for import.
#[async_trait::async_trait]
pub trait ContestSource: Send + Sync {
    async fn load(&self) -> Result<Contest>;

    fn name(&self) -> &'static str;
}

pub mod contest;
pub mod school;
pub mod stats;

pub use contest::ContestRepository;
pub use school::SchoolRepository;
pub use stats::{StatsRepository, TableCounts};

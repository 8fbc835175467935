mod canonical_file;
pub mod grid;

pub use canonical_file::CanonicalFile;
pub use grid::{GridMapping, GridSource, GridTemplate};

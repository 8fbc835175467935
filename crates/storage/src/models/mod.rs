mod contest;
mod contestant;
mod lookup;
mod table;

pub use contest::{Contest, Subcontest, SubcontestColumn};
pub use contestant::{Contestant, ContestantField, ContestantResult, Mentor};
pub use lookup::{AgeGroup, NamedRow, SchoolAlias};
pub use table::Table;

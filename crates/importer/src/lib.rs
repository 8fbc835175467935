pub mod canonical;
pub mod confirm;
pub mod error;
pub mod resolver;
pub mod sources;
pub mod traits;
pub mod transformer;

pub use canonical::{CanonicalValidator, Contest, Contestant, Subcontest};
pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm, TerminalConfirm};
pub use error::{ErrorKind, ImporterError, Result};
pub use sources::{CanonicalFile, GridSource};
pub use traits::{ContestSource, ImportContext};
pub use transformer::{ContestImporter, ImportReport};

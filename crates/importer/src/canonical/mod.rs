pub mod models;
pub mod template;
pub mod validator;

pub use models::{Contest, Contestant, SourceMetadata, SourceType, Subcontest};
pub use validator::{CanonicalValidator, ValidationReport};

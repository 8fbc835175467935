use std::fmt;

/// Every table of the contest schema.
///
/// Dynamic SQL only ever names tables through this enum, so identifiers
/// spliced into a statement are always one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Type,
    Subject,
    AgeGroup,
    School,
    SchoolAlias,
    Person,
    Contest,
    Subcontest,
    SubcontestColumn,
    Contestant,
    ContestantField,
    Mentor,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Subject => "subject",
            Self::AgeGroup => "age_group",
            Self::School => "school",
            Self::SchoolAlias => "school_alias",
            Self::Person => "person",
            Self::Contest => "contest",
            Self::Subcontest => "subcontest",
            Self::SubcontestColumn => "subcontest_column",
            Self::Contestant => "contestant",
            Self::ContestantField => "contestant_field",
            Self::Mentor => "mentor",
        }
    }

    pub fn all() -> &'static [Table] {
        &[
            Self::Type,
            Self::Subject,
            Self::AgeGroup,
            Self::School,
            Self::SchoolAlias,
            Self::Person,
            Self::Contest,
            Self::Subcontest,
            Self::SubcontestColumn,
            Self::Contestant,
            Self::ContestantField,
            Self::Mentor,
        ]
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_unique() {
        let mut names: Vec<_> = Table::all().iter().map(|t| t.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Table::all().len());
    }

    #[test]
    fn test_display_matches_identifier() {
        assert_eq!(Table::AgeGroup.to_string(), "age_group");
        assert_eq!(Table::Type.to_string(), "type");
    }
}

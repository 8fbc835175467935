use super::models::Contest;
use super::template::{self, contest_vars, subcontest_vars};
use crate::{ImporterError, Result};
use std::collections::HashSet;
use tracing::warn;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

pub struct CanonicalValidator;

impl CanonicalValidator {
    pub fn validate(contest: &Contest) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        if let Err(errors) = contest.validate() {
            flatten_errors("", &errors, &mut report.errors);
        }

        if let Err(e) = template::render(&contest.name, &contest_vars(contest.year)) {
            report.errors.push(format!("Contest name: {}", e));
        }

        if contest.subcontests.is_empty() {
            report
                .warnings
                .push("Contest has no subcontests".to_string());
        }

        let mut age_groups = HashSet::new();
        for subcontest in &contest.subcontests {
            let label = &subcontest.class_range_name;

            if let Err(e) = template::render(&subcontest.name, &subcontest_vars(label)) {
                report
                    .errors
                    .push(format!("Subcontest '{}' name: {}", subcontest.name, e));
            }

            let key = (label.clone(), subcontest.class_range);
            if !age_groups.insert(key) {
                report.errors.push(format!(
                    "Duplicate age group '{}' ({}-{}) within this contest",
                    label, subcontest.class_range.0, subcontest.class_range.1
                ));
            }

            let mut columns = HashSet::new();
            for column in &subcontest.columns {
                if !columns.insert(column) {
                    report.warnings.push(format!(
                        "Subcontest '{}' has duplicate column '{}'",
                        label, column
                    ));
                }
            }

            if subcontest.contestants.is_empty() {
                report
                    .warnings
                    .push(format!("Subcontest '{}' has no contestants", label));
            }

            for (idx, contestant) in subcontest.contestants.iter().enumerate() {
                let contestant_label = format!("{}. {}", idx + 1, contestant.name);

                if contestant.fields.len() != subcontest.columns.len() {
                    report.warnings.push(format!(
                        "Contestant '{}' in '{}' has {} field(s) for {} column(s); extra values are dropped",
                        contestant_label,
                        label,
                        contestant.fields.len(),
                        subcontest.columns.len()
                    ));
                }

                if contestant.instructors.iter().any(|i| i.trim().is_empty()) {
                    report.errors.push(format!(
                        "Contestant '{}' in '{}' has an empty instructor name",
                        contestant_label, label
                    ));
                }

                if contestant.placement.is_some_and(|p| p < 1) {
                    report.errors.push(format!(
                        "Contestant '{}' in '{}' has invalid placement {:?}",
                        contestant_label, label, contestant.placement
                    ));
                }
            }
        }

        if !report.errors.is_empty() {
            Err(ImporterError::Validation(format!(
                "Validation failed with {} error(s): {}",
                report.errors.len(),
                report.errors.join("; ")
            )))
        } else {
            Ok(report)
        }
    }
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| format!("{}: {}", path, e)));
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_errors(&format!("{}[{}]", path, idx), inner, out);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::models::{Contestant, Subcontest};

    fn contestant(name: &str, fields: &[&str]) -> Contestant {
        Contestant {
            name: name.to_string(),
            class_level: Some(7),
            instructors: vec![],
            school: None,
            placement: Some(1),
            fields: fields.iter().map(|f| Some(f.to_string())).collect(),
        }
    }

    fn contest() -> Contest {
        Contest {
            year: 2024,
            subject: "Matemaatika".to_string(),
            contest_type: "Lahtine".to_string(),
            name: "Lahtine võistlus {year}".to_string(),
            subcontests: vec![Subcontest {
                name: "{group}. klass".to_string(),
                class_range: (7, 7),
                class_range_name: "7".to_string(),
                columns: vec!["Task1".to_string(), "Task2".to_string()],
                contestants: vec![contestant("Jaan Tamm", &["5", "3"])],
                description: String::new(),
            }],
            source: None,
        }
    }

    #[test]
    fn test_valid_contest() {
        let report = CanonicalValidator::validate(&contest()).unwrap();
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_field_count_mismatch_is_a_warning() {
        let mut contest = contest();
        contest.subcontests[0].contestants[0].fields.pop();

        let report = CanonicalValidator::validate(&contest).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("1 field(s) for 2 column(s)"));
    }

    #[test]
    fn test_bad_template_fails() {
        let mut contest = contest();
        contest.name = "{season} {year}".to_string();

        let err = CanonicalValidator::validate(&contest).unwrap_err();
        assert!(matches!(err, ImporterError::Validation(msg) if msg.contains("season")));
    }

    #[test]
    fn test_repeated_age_group_fails() {
        let mut contest = contest();
        let copy = contest.subcontests[0].clone();
        contest.subcontests.push(copy);

        let err = CanonicalValidator::validate(&contest).unwrap_err();
        assert!(matches!(err, ImporterError::Validation(msg) if msg.contains("Duplicate age group")));
    }

    #[test]
    fn test_derive_rules_are_reported() {
        let mut contest = contest();
        contest.subject = String::new();
        contest.subcontests[0].contestants[0].name = String::new();

        let err = CanonicalValidator::validate(&contest).unwrap_err();
        let ImporterError::Validation(msg) = err else {
            panic!("expected a validation error");
        };
        assert!(msg.contains("subject"));
        assert!(msg.contains("contestant name is required"));
    }

    #[test]
    fn test_empty_subcontest_is_a_warning() {
        let mut contest = contest();
        contest.subcontests[0].contestants.clear();

        let report = CanonicalValidator::validate(&contest).unwrap();
        assert_eq!(report.warnings, vec!["Subcontest '7' has no contestants"]);
    }
}

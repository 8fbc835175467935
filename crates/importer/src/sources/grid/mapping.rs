use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::placement::{clean_placement, generate_placements, parse_total};
use super::reader::Grid;
use crate::canonical::{Contest, Contestant, Subcontest};
use crate::{ImporterError, Result};

/// Placeholder replaced by the class key when splitting by class.
pub const CLASS_PLACEHOLDER: &str = "$CLASS";

/// What a grid column holds. Columns without a role, and the total column,
/// become scored columns of the subcontest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Placement,
    Name,
    FirstName,
    LastName,
    Class,
    School,
    Instructors,
    Total,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Placement => "placement",
            Self::Name => "name",
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::Class => "class",
            Self::School => "school",
            Self::Instructors => "instructors",
            Self::Total => "total",
        };
        f.write_str(label)
    }
}

fn header_pattern(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

lazy_static! {
    // Checked in order against the start of the header; first match wins.
    static ref HEADER_ROLES: Vec<(Regex, ColumnRole)> = vec![
        (header_pattern(r"^(jrk|koht)\.?"), ColumnRole::Placement),
        (header_pattern(r"^.*eesnimi"), ColumnRole::FirstName),
        (header_pattern(r"^.*pere(konna)?nimi"), ColumnRole::LastName),
        (header_pattern(r"^(õpilane|(õpilase )?nimi)\.?"), ColumnRole::Name),
        (header_pattern(r"^kool\.?"), ColumnRole::School),
        (header_pattern(r"^kl(ass)?\.?"), ColumnRole::Class),
        (header_pattern(r"^.*(juhendajad?|õp(etaja)?).*"), ColumnRole::Instructors),
        (header_pattern(r"^.*kokku.*"), ColumnRole::Total),
    ];
    static ref NAME_SEPARATORS: Regex = Regex::new(r"[, ]+").unwrap();
    static ref INSTRUCTOR_SEPARATORS: Regex = Regex::new(r"[|,/]+").unwrap();
    static ref RANGE_SEPARATORS: Regex = Regex::new(r"[ ,]").unwrap();
}

impl ColumnRole {
    /// Guess the role of a column from its (Estonian) header text.
    pub fn infer(header: &str) -> Option<ColumnRole> {
        HEADER_ROLES
            .iter()
            .find(|(pattern, _)| pattern.is_match(header))
            .map(|(_, role)| *role)
    }
}

/// Contest-level values typed in by the operator. `subcontest_name`,
/// `class_range` and `description` may contain `$CLASS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTemplate {
    pub year: i32,
    pub subject: String,
    pub contest_type: String,
    /// May contain `{year}` placeholders
    pub name: String,
    /// May contain `{group}` placeholders
    pub subcontest_name: String,
    /// `label,min,max`, comma or space separated
    pub class_range: String,
    pub description: String,
}

/// How to turn a [`Grid`] into a canonical [`Contest`].
#[derive(Debug, Clone)]
pub struct GridMapping {
    template: GridTemplate,
    columns: HashMap<ColumnRole, String>,
    infer_columns: bool,
    split_by_class: bool,
    reverse_names: bool,
    generate_placements: bool,
}

impl GridMapping {
    pub fn new(template: GridTemplate) -> Self {
        Self {
            template,
            columns: HashMap::new(),
            infer_columns: true,
            split_by_class: false,
            reverse_names: false,
            generate_placements: false,
        }
    }

    /// Assign `role` to the column headed `header`.
    pub fn column(mut self, role: ColumnRole, header: impl Into<String>) -> Self {
        self.columns.insert(role, header.into());
        self
    }

    /// Guess roles of unassigned columns from their headers (on by default).
    pub fn infer_columns(mut self, yes: bool) -> Self {
        self.infer_columns = yes;
        self
    }

    pub fn split_by_class(mut self, yes: bool) -> Self {
        self.split_by_class = yes;
        self
    }

    /// Move the first word of a single name cell to the end.
    pub fn reverse_names(mut self, yes: bool) -> Self {
        self.reverse_names = yes;
        self
    }

    /// Derive placements from the total column instead of reading them.
    pub fn generate_placements(mut self, yes: bool) -> Self {
        self.generate_placements = yes;
        self
    }

    /// Resolve every role to a column index and check the combination.
    pub fn resolve_roles(&self, grid: &Grid) -> Result<HashMap<ColumnRole, usize>> {
        let mut roles = HashMap::new();
        for (role, header) in &self.columns {
            let idx = grid.column(header).ok_or_else(|| {
                ImporterError::Grid(format!("No column '{}' for role {}", header, role))
            })?;
            roles.insert(*role, idx);
        }

        if self.infer_columns {
            for (idx, header) in grid.header.iter().enumerate() {
                if roles.values().any(|assigned| *assigned == idx) {
                    continue;
                }
                if let Some(role) = ColumnRole::infer(header) {
                    if !roles.contains_key(&role) {
                        debug!("Column '{}' inferred as {}", header, role);
                        roles.insert(role, idx);
                    }
                }
            }
        }

        if self.generate_placements {
            if !roles.contains_key(&ColumnRole::Total) {
                return Err(ImporterError::Grid(
                    "Generating placements needs a total column".to_string(),
                ));
            }
        } else if !roles.contains_key(&ColumnRole::Placement) {
            return Err(ImporterError::Grid("Missing placement column".to_string()));
        }

        let has_name = roles.contains_key(&ColumnRole::Name);
        let has_first = roles.contains_key(&ColumnRole::FirstName);
        let has_last = roles.contains_key(&ColumnRole::LastName);
        if has_name && (has_first || has_last) {
            return Err(ImporterError::Grid("Extra name columns".to_string()));
        }
        if !has_name && !(has_first && has_last) {
            return Err(ImporterError::Grid("No name columns".to_string()));
        }

        if self.split_by_class && !roles.contains_key(&ColumnRole::Class) {
            return Err(ImporterError::Grid(
                "Need a class column to split by class".to_string(),
            ));
        }

        Ok(roles)
    }

    pub fn map(&self, grid: &Grid) -> Result<Contest> {
        let roles = self.resolve_roles(grid)?;

        let class_keys: Vec<Option<String>> = if self.split_by_class {
            let class_col = roles[&ColumnRole::Class];
            let mut keys: Vec<Option<String>> = Vec::new();
            for row in &grid.rows {
                let key = class_key(&row[class_col]);
                if !key.is_empty() && !keys.iter().any(|k| k.as_deref() == Some(key)) {
                    keys.push(Some(key.to_string()));
                }
            }
            keys
        } else {
            vec![None]
        };

        let subcontests = class_keys
            .iter()
            .map(|key| self.map_subcontest(grid, &roles, key.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Contest {
            year: self.template.year,
            subject: self.template.subject.clone(),
            contest_type: self.template.contest_type.clone(),
            name: self.template.name.clone(),
            subcontests,
            source: None,
        })
    }

    fn map_subcontest(
        &self,
        grid: &Grid,
        roles: &HashMap<ColumnRole, usize>,
        class: Option<&str>,
    ) -> Result<Subcontest> {
        let substitute = |text: &str| text.replace(CLASS_PLACEHOLDER, class.unwrap_or(""));
        let (label, min_class, max_class) = parse_class_range(&substitute(&self.template.class_range))?;

        let scored: Vec<usize> = (0..grid.width())
            .filter(|idx| match roles.iter().find(|(_, col)| *col == idx) {
                Some((role, _)) => *role == ColumnRole::Total,
                None => true,
            })
            .collect();

        let mut rows = Vec::new();
        for row in &grid.rows {
            let real_class = match roles.get(&ColumnRole::Class) {
                Some(col) => match real_class(&row[*col], class) {
                    Some(cell) => cell,
                    None => continue,
                },
                None => "",
            };
            rows.push((row, real_class));
        }

        let generated = if self.generate_placements {
            let total_col = roles[&ColumnRole::Total];
            let totals = rows
                .iter()
                .map(|(row, _)| parse_total(&row[total_col]))
                .collect::<Result<Vec<_>>>()?;
            Some(generate_placements(&totals))
        } else {
            None
        };

        let mut contestants = Vec::with_capacity(rows.len());
        for (idx, (row, real_class)) in rows.iter().enumerate() {
            let placement = match &generated {
                Some(placements) => Some(placements[idx]),
                None => clean_placement(&row[roles[&ColumnRole::Placement]])?,
            };

            let class_level = if real_class.is_empty() {
                None
            } else {
                Some(real_class.parse::<i32>().map_err(|_| {
                    ImporterError::Grid(format!("Invalid class '{}'", real_class))
                })?)
            };

            let name = self.contestant_name(row, roles);
            if name.is_empty() {
                warn!("Row {} of class {:?} has no contestant name", idx + 1, class);
            }

            contestants.push(Contestant {
                name,
                class_level,
                instructors: roles
                    .get(&ColumnRole::Instructors)
                    .map(|col| split_instructors(&row[*col]))
                    .unwrap_or_default(),
                school: roles
                    .get(&ColumnRole::School)
                    .map(|col| row[*col].clone())
                    .filter(|school| !school.is_empty()),
                placement,
                fields: scored.iter().map(|col| Some(row[*col].clone())).collect(),
            });
        }

        Ok(Subcontest {
            name: substitute(&self.template.subcontest_name),
            class_range: (min_class, max_class),
            class_range_name: label,
            columns: scored.iter().map(|col| grid.header[*col].clone()).collect(),
            contestants,
            description: substitute(&self.template.description),
        })
    }

    fn contestant_name(&self, row: &[String], roles: &HashMap<ColumnRole, usize>) -> String {
        let mut parts: Vec<&str> = match roles.get(&ColumnRole::Name) {
            Some(col) => NAME_SEPARATORS.split(&row[*col]).collect(),
            None => vec![
                row[roles[&ColumnRole::FirstName]].as_str(),
                row[roles[&ColumnRole::LastName]].as_str(),
            ],
        };
        parts = parts
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if self.reverse_names && roles.contains_key(&ColumnRole::Name) && !parts.is_empty() {
            let first = parts.remove(0);
            parts.push(first);
        }

        parts.join(" ")
    }
}

/// Age-group key of a class cell: `a` for both `a` and `a,b`.
fn class_key(cell: &str) -> &str {
    cell.split(',').next().unwrap_or("").trim()
}

/// The real class of a row within the subcontest for `key`, or `None` when
/// the row belongs to another class. Rows with a blank class belong to every
/// subcontest.
fn real_class<'a>(cell: &'a str, key: Option<&str>) -> Option<&'a str> {
    let cell = cell.trim();
    let Some(key) = key else {
        return Some(cell);
    };
    if cell.is_empty() || cell == key {
        return Some(cell);
    }
    cell.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix(','))
        .map(str::trim)
}

/// Parse `label,min,max` (comma or space separated).
pub fn parse_class_range(text: &str) -> Result<(String, i32, i32)> {
    let parts: Vec<&str> = RANGE_SEPARATORS.split(text.trim()).collect();
    let invalid = || ImporterError::Grid(format!("Invalid class range '{}'", text));

    let [label, min, max, ..] = parts.as_slice() else {
        return Err(invalid());
    };
    let min = min.trim().parse::<i32>().map_err(|_| invalid())?;
    let max = max.trim().parse::<i32>().map_err(|_| invalid())?;

    Ok((label.trim().to_string(), min, max))
}

fn split_instructors(cell: &str) -> Vec<String> {
    INSTRUCTOR_SEPARATORS
        .split(cell)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

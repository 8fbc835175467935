//! Placeholder substitution for contest and subcontest display names.
//!
//! A pattern is literal text with `{name}` placeholders. Only the variables
//! the caller passes in [`Vars`] can be referenced; integer variables also
//! accept a constant offset (`{year-1}`, `{year+1}`). `{{` and `}}` produce
//! literal braces. Nothing else is interpreted.

use std::collections::BTreeMap;

use crate::{ImporterError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Var {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct Vars {
    values: BTreeMap<&'static str, Var>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int(mut self, name: &'static str, value: i64) -> Self {
        self.values.insert(name, Var::Int(value));
        self
    }

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(name, Var::Text(value.into()));
        self
    }

    fn get(&self, name: &str) -> Option<&Var> {
        self.values.get(name)
    }

    fn names(&self) -> String {
        self.values.keys().copied().collect::<Vec<_>>().join(", ")
    }
}

/// Variables available in a contest name.
pub fn contest_vars(year: i32) -> Vars {
    Vars::new().int("year", i64::from(year))
}

/// Variables available in a subcontest name.
pub fn subcontest_vars(group: &str) -> Vars {
    Vars::new().text("group", group)
}

pub fn render(pattern: &str, vars: &Vars) -> Result<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut expr = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    expr.push(c);
                }
                if !closed {
                    return Err(ImporterError::Template(format!(
                        "unclosed '{{' at offset {} in \"{}\"",
                        pos, pattern
                    )));
                }
                out.push_str(&substitute(expr.trim(), vars, pattern)?);
            }
            '}' => {
                return Err(ImporterError::Template(format!(
                    "unmatched '}}' at offset {} in \"{}\"",
                    pos, pattern
                )));
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

fn substitute(expr: &str, vars: &Vars, pattern: &str) -> Result<String> {
    let (name, offset) = match expr.find(['+', '-']) {
        Some(idx) => {
            let sign: i64 = if expr[idx..].starts_with('-') { -1 } else { 1 };
            let invalid = || {
                ImporterError::Template(format!(
                    "invalid offset in placeholder {{{}}} of \"{}\"",
                    expr, pattern
                ))
            };
            let amount: i64 = expr[idx + 1..].trim().parse().map_err(|_| invalid())?;
            let offset = sign.checked_mul(amount).ok_or_else(invalid)?;
            (expr[..idx].trim(), Some(offset))
        }
        None => (expr, None),
    };

    let value = vars.get(name).ok_or_else(|| {
        ImporterError::Template(format!(
            "unknown placeholder {{{}}} in \"{}\" (available: {})",
            name,
            pattern,
            vars.names()
        ))
    })?;

    match (value, offset) {
        (Var::Int(v), Some(offset)) => v
            .checked_add(offset)
            .map(|shifted| shifted.to_string())
            .ok_or_else(|| {
                ImporterError::Template(format!(
                    "offset in placeholder {{{}}} of \"{}\" is out of range",
                    expr, pattern
                ))
            }),
        (Var::Int(v), None) => Ok(v.to_string()),
        (Var::Text(v), None) => Ok(v.clone()),
        (Var::Text(_), Some(_)) => Err(ImporterError::Template(format!(
            "placeholder {{{}}} is text and takes no offset",
            name
        ))),
    }
}

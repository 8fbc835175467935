use std::fmt;

use storage::Table;

/// A column value identifying a lookup row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Null,
    Int(i64),
    Text(String),
}

impl KeyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "'{}'", v),
        }
    }
}

/// Ordered column/value pairs, as used for both lookups and inserts.
pub type Columns = Vec<(&'static str, KeyValue)>;

/// Identity of a lookup row: the table plus the ordered column/value pairs
/// that select it. Two keys with the same pairs in a different order are
/// different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    table: Table,
    params: Columns,
}

impl LookupKey {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    pub fn with(mut self, column: &'static str, value: impl Into<KeyValue>) -> Self {
        self.params.push((column, value.into()));
        self
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn params(&self) -> &[(&'static str, KeyValue)] {
        &self.params
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (column, value)) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", column, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parameter_order_is_part_of_identity() {
        let a = LookupKey::new(Table::AgeGroup)
            .with("min_class", 10)
            .with("max_class", 12);
        let b = LookupKey::new(Table::AgeGroup)
            .with("max_class", 12)
            .with("min_class", 10);

        let keys: HashSet<_> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_display() {
        let key = LookupKey::new(Table::AgeGroup)
            .with("name", "gümnaasium")
            .with("min_class", 10)
            .with("max_class", None::<i64>);
        assert_eq!(
            key.to_string(),
            "name='gümnaasium', min_class=10, max_class=NULL"
        );
    }
}

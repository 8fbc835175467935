use std::collections::HashMap;

use super::key::LookupKey;

/// Ids of lookup rows already resolved in this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCache {
    rows: HashMap<LookupKey, i64>,
}

impl RowCache {
    pub fn get(&self, key: &LookupKey) -> Option<i64> {
        self.rows.get(key).copied()
    }

    pub fn insert(&mut self, key: LookupKey, id: i64) {
        self.rows.insert(key, id);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// School ids by the name they were looked up with (canonical or alias).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolCache {
    schools: HashMap<String, i64>,
}

impl SchoolCache {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.schools.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, id: i64) {
        self.schools.insert(name.into(), id);
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }
}

/// Both resolver caches of one import session.
///
/// Snapshots are plain copies; restoring swaps the copy back in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCache {
    pub rows: RowCache,
    pub schools: SchoolCache,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionCache {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: SessionCache) {
        *self = snapshot;
    }
}

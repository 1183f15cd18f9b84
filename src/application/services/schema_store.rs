use std::sync::{Arc, RwLock};

use crate::domain::entities::Schema;

struct Versioned {
    schema: Option<Arc<Schema>>,
    version: u64,
}

/// Shared, read-mostly holder for the single most recent schema snapshot.
/// Writers replace the whole snapshot; readers always observe a complete one.
/// The version token is strictly increasing and scopes cache keys.
pub struct SchemaStore {
    inner: RwLock<Versioned>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Versioned {
                schema: None,
                version: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> (Option<Arc<Schema>>, u64) {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        (guard.schema.clone(), guard.version)
    }

    pub fn current(&self) -> Option<Arc<Schema>> {
        self.snapshot().0
    }

    pub fn version(&self) -> u64 {
        self.snapshot().1
    }

    pub fn replace(&self, schema: Schema) -> (Arc<Schema>, u64) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let installed = Arc::new(schema);
        guard.schema = Some(installed.clone());
        guard.version += 1;
        (installed, guard.version)
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn empty_schema() -> Schema {
        Schema {
            tables: vec![],
            relationships: vec![],
            samples: BTreeMap::new(),
            vocabulary: vec![],
        }
    }

    #[test]
    fn starts_empty_at_version_zero() {
        let store = SchemaStore::new();
        let (schema, version) = store.snapshot();
        assert!(schema.is_none());
        assert_eq!(version, 0);
    }

    #[test]
    fn replace_bumps_version_monotonically() {
        let store = SchemaStore::new();
        let (_, v1) = store.replace(empty_schema());
        let (_, v2) = store.replace(empty_schema());
        assert_eq!(v1, 1);
        assert_eq!(v2, 2);
        assert_eq!(store.version(), 2);
        assert!(store.current().is_some());
    }
}

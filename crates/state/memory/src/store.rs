use async_trait::async_trait;
use dashmap::DashMap;

use firerole_state::error::StateError;
use firerole_state::key::RoleId;
use firerole_state::store::{RoleStore, StoredRole};

/// A single role record in the in-memory store.
#[derive(Debug, Clone)]
struct Entry {
    compiled: Vec<u8>,
    source: String,
}

/// In-memory [`RoleStore`] backed by a [`DashMap`].
///
/// This implementation is fully synchronous internally; the async trait
/// methods return immediately.
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    data: DashMap<RoleId, Entry>,
}

impl MemoryRoleStore {
    /// Create a new, empty in-memory role store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of role records currently held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the store holds no roles.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn get(&self, role: &RoleId) -> Result<Option<StoredRole>, StateError> {
        Ok(self.data.get(role).map(|entry| StoredRole {
            compiled: entry.compiled.clone(),
        }))
    }

    async fn set(&self, role: &RoleId, compiled: &[u8], source: &str) -> Result<(), StateError> {
        self.data
            .entry(role.clone())
            .and_modify(|entry| {
                compiled.clone_into(&mut entry.compiled);
                source.clone_into(&mut entry.source);
            })
            .or_insert_with(|| Entry {
                compiled: compiled.to_vec(),
                source: source.to_owned(),
            });

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<(RoleId, String)>, StateError> {
        let mut all: Vec<(RoleId, String)> = self
            .data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().source.clone()))
            .collect();
        // DashMap iteration order is unspecified; keep listings stable.
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use firerole_state::testing::run_store_conformance_tests;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryRoleStore::new();
        run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn list_all_is_sorted_by_role() {
        let store = MemoryRoleStore::new();
        for id in ["c", "a", "b"] {
            store.set(&RoleId::new(id), b"", "deny any").await.unwrap();
        }

        let ids: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn len_tracks_distinct_roles() {
        let store = MemoryRoleStore::new();
        assert!(store.is_empty());

        let role = RoleId::new("editors");
        store.set(&role, b"x", "allow any").await.unwrap();
        store.set(&role, b"y", "allow any").await.unwrap();
        assert_eq!(store.len(), 1);
    }
}

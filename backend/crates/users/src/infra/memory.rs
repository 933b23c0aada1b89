//! In-Memory Store Implementation

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::store::UserStore;
use crate::domain::user::UserDto;
use crate::error::UserResult;

/// Process-local user store
///
/// Clones share the same map. `list` returns users ordered by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<BTreeMap<String, UserDto>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl UserStore for MemoryUserStore {
    async fn get(&self, id: &str) -> UserResult<Option<UserDto>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn set(&self, id: &str, user: UserDto) -> UserResult<()> {
        self.users.write().await.insert(id.to_string(), user);
        Ok(())
    }

    async fn delete(&self, id: &str) -> UserResult<()> {
        self.users.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> UserResult<Vec<UserDto>> {
        Ok(self.users.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserDtoType;
    use serde_json::json;

    fn user(id: &str) -> UserDto {
        UserDtoType::new()
            .unwrap()
            .construct(json!({"id": id, "name": format!("user {id}"), "email": "u@example.com"}))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_set_delete() {
        let store = MemoryUserStore::new();
        assert!(store.get("1").await.unwrap().is_none());

        store.set("1", user("1")).await.unwrap();
        assert_eq!(store.get("1").await.unwrap().map(|u| u.id().to_string()), Some("1".into()));
        assert_eq!(store.len().await, 1);

        store.delete("1").await.unwrap();
        assert!(store.get("1").await.unwrap().is_none());
        assert!(store.is_empty().await);

        // deleting a missing id is not an error at the store level
        store.delete("1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_ordered_by_id() {
        let store = MemoryUserStore::new();
        for id in ["b", "c", "a"] {
            store.set(id, user(id)).await.unwrap();
        }
        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|u| u.id().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryUserStore::new();
        let other = store.clone();
        store.set("1", user("1")).await.unwrap();
        assert_eq!(other.len().await, 1);
    }
}

//! Ordered, duplicate-free lists of [`MediaRef`]s: the watchlist and favorites.
//!
//! Every mutation persists the full list. The write lock is held while the
//! value is queued, so the store sees mutations in the order they happened.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::MediaRef;
use crate::services::store::{PersistentStore, StorageKey};

#[derive(Clone)]
pub struct MediaList {
    key: StorageKey,
    items: Arc<RwLock<Vec<MediaRef>>>,
    store: PersistentStore,
}

impl MediaList {
    pub fn new(key: StorageKey, store: PersistentStore) -> Self {
        Self {
            key,
            items: Arc::new(RwLock::new(Vec::new())),
            store,
        }
    }

    pub fn watchlist(store: PersistentStore) -> Self {
        Self::new(StorageKey::Watchlist, store)
    }

    pub fn favorites(store: PersistentStore) -> Self {
        Self::new(StorageKey::Favorites, store)
    }

    /// Replace the in-memory list with the persisted one (empty if none)
    pub async fn load_from_cache(&self) -> usize {
        let mut loaded: Vec<MediaRef> = self.store.load(self.key).await.unwrap_or_default();

        // Older files may carry duplicates; keep the first occurrence
        let mut seen = std::collections::HashSet::new();
        loaded.retain(|item| seen.insert(*item));

        let count = loaded.len();
        *self.items.write().await = loaded;
        tracing::debug!("Loaded {} entries from {}", count, self.key);
        count
    }

    /// Append `item` unless already present. Returns whether it was added.
    pub async fn add(&self, item: MediaRef) -> bool {
        let mut items = self.items.write().await;
        if items.contains(&item) {
            return false;
        }
        items.push(item);
        self.store.persist(self.key, &*items);
        true
    }

    /// Remove `item` if present. Returns whether anything changed.
    pub async fn remove(&self, item: MediaRef) -> bool {
        let mut items = self.items.write().await;
        let Some(pos) = items.iter().position(|i| *i == item) else {
            return false;
        };
        items.remove(pos);
        self.store.persist(self.key, &*items);
        true
    }

    /// Add or remove `item`; returns whether it is in the list afterwards
    pub async fn toggle(&self, item: MediaRef) -> bool {
        let mut items = self.items.write().await;
        let present = match items.iter().position(|i| *i == item) {
            Some(pos) => {
                items.remove(pos);
                false
            }
            None => {
                items.push(item);
                true
            }
        };
        self.store.persist(self.key, &*items);
        present
    }

    pub async fn contains(&self, item: MediaRef) -> bool {
        self.items.read().await.contains(&item)
    }

    pub async fn items(&self) -> Vec<MediaRef> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Empty the in-memory list only
    pub async fn clear(&self) {
        self.items.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::{KeyValueStore, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, MediaList) {
        let backend = Arc::new(MemoryStore::new());
        let list = MediaList::watchlist(PersistentStore::new(backend.clone()));
        (backend, list)
    }

    async fn persisted(backend: &MemoryStore) -> Option<String> {
        backend.get(StorageKey::Watchlist).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_keeps_order_and_persists() {
        let (backend, list) = setup();

        assert!(list.add(MediaRef::vod(12)).await);
        assert!(list.add(MediaRef::series(3)).await);

        assert_eq!(list.items().await, vec![MediaRef::vod(12), MediaRef::series(3)]);
        list.store.flush().await;
        assert_eq!(
            persisted(&backend).await.as_deref(),
            Some(r#"[{"id":12,"type":"vod"},{"id":3,"type":"series"}]"#)
        );
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (_, list) = setup();

        assert!(list.add(MediaRef::vod(12)).await);
        assert!(!list.add(MediaRef::vod(12)).await);
        // Same id, other domain is a different entry
        assert!(list.add(MediaRef::series(12)).await);

        assert_eq!(list.len().await, 2);
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let (backend, list) = setup();

        assert!(!list.remove(MediaRef::vod(1)).await);
        list.store.flush().await;
        assert_eq!(persisted(&backend).await, None);

        list.add(MediaRef::vod(1)).await;
        list.add(MediaRef::vod(2)).await;
        assert!(list.remove(MediaRef::vod(1)).await);
        assert_eq!(list.items().await, vec![MediaRef::vod(2)]);
    }

    #[tokio::test]
    async fn test_toggle() {
        let (_, list) = setup();

        assert!(list.toggle(MediaRef::live(5)).await);
        assert!(list.contains(MediaRef::live(5)).await);
        assert!(!list.toggle(MediaRef::live(5)).await);
        assert!(list.is_empty().await);
    }

    #[tokio::test]
    async fn test_load_from_cache_dedupes() {
        let (backend, list) = setup();
        backend
            .set(
                StorageKey::Watchlist,
                r#"[{"id":1,"type":"vod"},{"id":2,"type":"series"},{"id":1,"type":"vod"}]"#.to_string(),
            )
            .await
            .unwrap();

        assert_eq!(list.load_from_cache().await, 2);
        assert_eq!(list.items().await, vec![MediaRef::vod(1), MediaRef::series(2)]);
    }

    #[tokio::test]
    async fn test_clear_is_memory_only() {
        let (backend, list) = setup();
        list.add(MediaRef::vod(7)).await;
        list.clear().await;

        assert!(list.is_empty().await);
        list.store.flush().await;
        assert!(persisted(&backend).await.is_some());
    }
}

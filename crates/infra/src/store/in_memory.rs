use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use taxibe_core::{CooperativeId, DomainError};

use super::{Mutation, Record, RecordStore, StoreError};

/// In-memory cooperative-isolated store for tests/dev.
///
/// `update` runs the mutation under the write lock, so concurrent seat
/// bookings on the same departure are serialized.
#[derive(Debug)]
pub struct InMemoryRecordStore<V: Record> {
    inner: RwLock<HashMap<(CooperativeId, V::Id), V>>,
}

impl<V: Record> InMemoryRecordStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Record> Default for InMemoryRecordStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V: Record> RecordStore<V> for InMemoryRecordStore<V> {
    async fn get(&self, cooperative_id: CooperativeId, id: &V::Id) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&(cooperative_id, id.clone())).cloned())
    }

    async fn insert(&self, value: V) -> Result<(), StoreError> {
        let key = (value.cooperative_id(), value.id().clone());
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if map.contains_key(&key) {
            return Err(DomainError::conflict(format!("{} {} already exists", V::KIND, key.1)).into());
        }
        map.insert(key, value);
        Ok(())
    }

    async fn upsert(&self, value: V) -> Result<(), StoreError> {
        let key = (value.cooperative_id(), value.id().clone());
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(key, value);
        Ok(())
    }

    async fn update<'a>(
        &'a self,
        cooperative_id: CooperativeId,
        id: &'a V::Id,
        mutation: Mutation<'a, V>,
    ) -> Result<V, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let current = map
            .get_mut(&(cooperative_id, id.clone()))
            .ok_or(DomainError::NotFound)?;

        // Mutate a copy so a rejected change leaves the stored record intact.
        let mut next = current.clone();
        mutation(&mut next)?;
        *current = next.clone();
        Ok(next)
    }

    async fn remove(&self, cooperative_id: CooperativeId, id: &V::Id) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(&(cooperative_id, id.clone())).is_some())
    }

    async fn list(&self, cooperative_id: CooperativeId) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .iter()
            .filter_map(|((c, _), v)| (*c == cooperative_id).then(|| v.clone()))
            .collect())
    }
}

//! Cooperative-isolated record storage.
//!
//! Every operation is scoped by `CooperativeId`; a record stored for one
//! cooperative is invisible to every other.

mod in_memory;
mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use taxibe_core::{CooperativeId, DomainError, DomainResult, Entity};

pub use in_memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;

/// Anything the store can persist.
pub trait Record:
    Entity<Id: Send + Sync + 'static> + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Record for T where
    T: Entity<Id: Send + Sync + 'static> + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The mutation (or a uniqueness/existence check) rejected the change.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn database(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Database { operation, source }
    }
}

/// In-place change applied atomically by [`RecordStore::update`].
///
/// Returning an error aborts the update and leaves the stored record as it was.
pub type Mutation<'a, V> = Box<dyn FnOnce(&mut V) -> DomainResult<()> + Send + 'a>;

#[async_trait]
pub trait RecordStore<V: Record>: Send + Sync {
    async fn get(&self, cooperative_id: CooperativeId, id: &V::Id) -> Result<Option<V>, StoreError>;

    /// Store a new record. Fails with `Conflict` if the id is taken.
    async fn insert(&self, value: V) -> Result<(), StoreError>;

    /// Store a record, replacing any existing one with the same id.
    async fn upsert(&self, value: V) -> Result<(), StoreError>;

    /// Atomic read-modify-write. Fails with `NotFound` if the record does not
    /// exist. Returns the record as stored after the mutation.
    async fn update<'a>(
        &'a self,
        cooperative_id: CooperativeId,
        id: &'a V::Id,
        mutation: Mutation<'a, V>,
    ) -> Result<V, StoreError>;

    /// Returns whether a record was removed.
    async fn remove(&self, cooperative_id: CooperativeId, id: &V::Id) -> Result<bool, StoreError>;

    /// All of a cooperative's records of this kind, in no particular order.
    async fn list(&self, cooperative_id: CooperativeId) -> Result<Vec<V>, StoreError>;
}

/// [`RecordStore::update`] for mutations that produce a value.
pub async fn update_with<V, S, R, F>(
    store: &S,
    cooperative_id: CooperativeId,
    id: &V::Id,
    f: F,
) -> Result<(V, R), StoreError>
where
    V: Record,
    S: RecordStore<V> + ?Sized,
    R: Send,
    F: FnOnce(&mut V) -> DomainResult<R> + Send,
{
    let mut out: Option<R> = None;
    let updated = {
        let slot = &mut out;
        store
            .update(
                cooperative_id,
                id,
                Box::new(move |v: &mut V| {
                    *slot = Some(f(v)?);
                    Ok(())
                }),
            )
            .await?
    };
    match out {
        Some(r) => Ok((updated, r)),
        None => Err(StoreError::Domain(DomainError::invariant("mutation was not applied"))),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde::{Deserialize, Serialize};
    use taxibe_core::{CooperativeId, Entity, RecordId};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Ticket {
        pub id: RecordId,
        pub cooperative_id: CooperativeId,
        pub seats: Vec<bool>,
    }

    impl Entity for Ticket {
        type Id = RecordId;
        const KIND: &'static str = "ticket";

        fn id(&self) -> &RecordId {
            &self.id
        }

        fn cooperative_id(&self) -> CooperativeId {
            self.cooperative_id
        }
    }

    pub fn ticket(cooperative_id: CooperativeId) -> Ticket {
        Ticket {
            id: RecordId::new(),
            cooperative_id,
            seats: vec![false; 4],
        }
    }
}

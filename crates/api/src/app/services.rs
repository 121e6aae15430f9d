use std::sync::Arc;

use anyhow::Context;

use taxibe_booking::{Client, Voiture};
use taxibe_caisse::{ClotureMensuelle, Depense, Tarif};
use taxibe_core::{CooperativeId, DomainError, RecordId};
use taxibe_infra::{InMemoryRecordStore, PostgresRecordStore, RecordStore, StoreError, db};

use crate::config::ApiConfig;

/// Store handles shared by every handler.
///
/// Each field is a cooperative-scoped store; which backend sits behind it is
/// decided once at start-up.
#[derive(Clone)]
pub struct AppServices {
    pub backend: &'static str,
    pub voitures: Arc<dyn RecordStore<Voiture>>,
    pub clients: Arc<dyn RecordStore<Client>>,
    pub depenses: Arc<dyn RecordStore<Depense>>,
    pub clotures: Arc<dyn RecordStore<ClotureMensuelle>>,
    pub tarifs: Arc<dyn RecordStore<Tarif>>,
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    match &config.database_url {
        Some(url) => build_persistent_services(url, config.db_max_connections).await,
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory stores");
            Ok(build_in_memory_services())
        }
    }
}

pub fn build_in_memory_services() -> AppServices {
    AppServices {
        backend: "memory",
        voitures: Arc::new(InMemoryRecordStore::<Voiture>::new()),
        clients: Arc::new(InMemoryRecordStore::<Client>::new()),
        depenses: Arc::new(InMemoryRecordStore::<Depense>::new()),
        clotures: Arc::new(InMemoryRecordStore::<ClotureMensuelle>::new()),
        tarifs: Arc::new(InMemoryRecordStore::<Tarif>::new()),
    }
}

async fn build_persistent_services(database_url: &str, max_connections: u32) -> anyhow::Result<AppServices> {
    let pool = db::connect(database_url, max_connections)
        .await
        .context("failed to connect to Postgres")?;
    db::ensure_schema(&pool)
        .await
        .context("failed to create database schema")?;

    tracing::info!(max_connections, "using Postgres stores");
    Ok(AppServices {
        backend: "postgres",
        voitures: Arc::new(PostgresRecordStore::<Voiture>::new(pool.clone())),
        clients: Arc::new(PostgresRecordStore::<Client>::new(pool.clone())),
        depenses: Arc::new(PostgresRecordStore::<Depense>::new(pool.clone())),
        clotures: Arc::new(PostgresRecordStore::<ClotureMensuelle>::new(pool.clone())),
        tarifs: Arc::new(PostgresRecordStore::<Tarif>::new(pool)),
    })
}

impl AppServices {
    /// Saved configuration, or the defaults until one is saved.
    pub async fn tarif(&self, cooperative_id: CooperativeId) -> Result<Tarif, StoreError> {
        Ok(self
            .tarifs
            .get(cooperative_id, &cooperative_id)
            .await?
            .unwrap_or_else(|| Tarif::default_for(cooperative_id)))
    }

    /// Client referenced from another request body; unknown ids are a field
    /// error on `field`.
    pub async fn referenced_client(
        &self,
        cooperative_id: CooperativeId,
        field: &str,
        id: RecordId,
    ) -> Result<Client, StoreError> {
        self.clients
            .get(cooperative_id, &id)
            .await?
            .ok_or_else(|| DomainError::field(field, "unknown client").into())
    }

    pub async fn voiture(&self, cooperative_id: CooperativeId, id: RecordId) -> Result<Option<Voiture>, StoreError> {
        self.voitures.get(cooperative_id, &id).await
    }

    pub async fn closures(&self, cooperative_id: CooperativeId) -> Result<Vec<ClotureMensuelle>, StoreError> {
        let mut closures = self.clotures.list(cooperative_id).await?;
        closures.sort_by_key(|c| c.periode());
        Ok(closures)
    }
}

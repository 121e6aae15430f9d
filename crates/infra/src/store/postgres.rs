use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use taxibe_core::{CooperativeId, DomainError};

use super::{Mutation, Record, RecordStore, StoreError};

/// Postgres-backed record store.
///
/// Records are JSONB documents in the shared `records` table, keyed by
/// `(cooperative_id, kind, id)` where `kind` is the entity's `KIND`. Every
/// query filters on `cooperative_id`.
///
/// `update` loads the row with `SELECT ... FOR UPDATE` inside a transaction,
/// so concurrent read-modify-writes of one record are serialized by the
/// database.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore<V> {
    pool: PgPool,
    _record: PhantomData<fn() -> V>,
}

impl<V> PostgresRecordStore<V> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

fn decode<V: Record>(body: serde_json::Value) -> Result<V, StoreError> {
    Ok(serde_json::from_value(body)?)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

#[async_trait]
impl<V: Record> RecordStore<V> for PostgresRecordStore<V> {
    #[instrument(skip_all, fields(kind = V::KIND, cooperative_id = %cooperative_id, id = %id), err)]
    async fn get(&self, cooperative_id: CooperativeId, id: &V::Id) -> Result<Option<V>, StoreError> {
        let body: Option<serde_json::Value> = sqlx::query_scalar(
            r#"
            SELECT body
            FROM records
            WHERE cooperative_id = $1 AND kind = $2 AND id = $3
            "#,
        )
        .bind(cooperative_id.as_uuid())
        .bind(V::KIND)
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database("get_record", e))?;

        body.map(decode).transpose()
    }

    #[instrument(skip_all, fields(kind = V::KIND, id = %value.id()), err)]
    async fn insert(&self, value: V) -> Result<(), StoreError> {
        let body = serde_json::to_value(&value)?;
        let result = sqlx::query(
            r#"
            INSERT INTO records (cooperative_id, kind, id, body)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(value.cooperative_id().as_uuid())
        .bind(V::KIND)
        .bind(value.id().to_string())
        .bind(body)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(DomainError::conflict(format!(
                "{} {} already exists",
                V::KIND,
                value.id()
            ))
            .into()),
            Err(e) => Err(StoreError::database("insert_record", e)),
        }
    }

    #[instrument(skip_all, fields(kind = V::KIND, id = %value.id()), err)]
    async fn upsert(&self, value: V) -> Result<(), StoreError> {
        let body = serde_json::to_value(&value)?;
        sqlx::query(
            r#"
            INSERT INTO records (cooperative_id, kind, id, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cooperative_id, kind, id)
            DO UPDATE SET
                body = EXCLUDED.body,
                updated_at = NOW()
            "#,
        )
        .bind(value.cooperative_id().as_uuid())
        .bind(V::KIND)
        .bind(value.id().to_string())
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("upsert_record", e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(kind = V::KIND, cooperative_id = %cooperative_id, id = %id), err)]
    async fn update<'a>(
        &'a self,
        cooperative_id: CooperativeId,
        id: &'a V::Id,
        mutation: Mutation<'a, V>,
    ) -> Result<V, StoreError> {
        let key = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::database("begin_transaction", e))?;

        let body: Option<serde_json::Value> = sqlx::query_scalar(
            r#"
            SELECT body
            FROM records
            WHERE cooperative_id = $1 AND kind = $2 AND id = $3
            FOR UPDATE
            "#,
        )
        .bind(cooperative_id.as_uuid())
        .bind(V::KIND)
        .bind(&key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StoreError::database("lock_record", e))?;

        // Returning early drops `tx`, which rolls back and releases the row lock.
        let mut record: V = decode(body.ok_or(DomainError::NotFound)?)?;
        mutation(&mut record)?;

        sqlx::query(
            r#"
            UPDATE records
            SET body = $4, updated_at = NOW()
            WHERE cooperative_id = $1 AND kind = $2 AND id = $3
            "#,
        )
        .bind(cooperative_id.as_uuid())
        .bind(V::KIND)
        .bind(&key)
        .bind(serde_json::to_value(&record)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::database("update_record", e))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::database("commit_transaction", e))?;
        Ok(record)
    }

    #[instrument(skip_all, fields(kind = V::KIND, cooperative_id = %cooperative_id, id = %id), err)]
    async fn remove(&self, cooperative_id: CooperativeId, id: &V::Id) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM records
            WHERE cooperative_id = $1 AND kind = $2 AND id = $3
            "#,
        )
        .bind(cooperative_id.as_uuid())
        .bind(V::KIND)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database("remove_record", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all, fields(kind = V::KIND, cooperative_id = %cooperative_id), err)]
    async fn list(&self, cooperative_id: CooperativeId) -> Result<Vec<V>, StoreError> {
        let bodies: Vec<serde_json::Value> = sqlx::query_scalar(
            r#"
            SELECT body
            FROM records
            WHERE cooperative_id = $1 AND kind = $2
            ORDER BY id ASC
            "#,
        )
        .bind(cooperative_id.as_uuid())
        .bind(V::KIND)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::database("list_records", e))?;

        bodies.into_iter().map(decode).collect()
    }
}

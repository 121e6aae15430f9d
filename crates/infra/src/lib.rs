//! Infrastructure layer: record persistence (in-memory and Postgres).

pub mod db;
pub mod store;

pub use store::{
    InMemoryRecordStore, Mutation, PostgresRecordStore, Record, RecordStore, StoreError, update_with,
};

use std::future::Future;

use thiserror::Error;

pub mod connection;
pub mod memory;

pub use connection::Connection;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value slots holding serialized question banks.
pub trait SlotStore: Send + Sync + 'static {
    fn read_slot(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn write_slot(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn remove_slot(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

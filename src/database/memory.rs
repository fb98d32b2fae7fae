use std::collections::HashMap;

use tokio::sync::Mutex;

use super::{SlotStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl SlotStore for MemoryStore {
    async fn read_slot(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.lock().await.get(key).cloned())
    }

    async fn write_slot(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots
            .lock()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove_slot(&self, key: &str) -> Result<(), StoreError> {
        self.slots.lock().await.remove(key);
        Ok(())
    }
}

use std::borrow::Cow;

use sqlx::postgres::PgPool;

use super::{SlotStore, StoreError};

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect<'a>(connection_string: Cow<'a, str>) -> Result<Self, StoreError> {
        let pool = PgPool::connect(&connection_string).await?;
        Ok(Self { pool })
    }

    pub async fn perform_migrations(&self) -> Result<(), StoreError> {
        log::debug!("Running migrations");
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl SlotStore for Connection {
    async fn read_slot(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_slots WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn write_slot(&self, key: &str, value: &str) -> Result<(), StoreError> {
        log::debug!("Writing slot {key} ({} bytes)", value.len());
        sqlx::query(
            "INSERT INTO kv_slots (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_slot(&self, key: &str) -> Result<(), StoreError> {
        log::debug!("Removing slot {key}");
        sqlx::query("DELETE FROM kv_slots WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

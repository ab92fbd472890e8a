use std::sync::Arc;

use serde_json::Value;
use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::Trigger;

pub struct TriggerRepository {
    storage: Arc<Storage>,
}

impl TriggerRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        item: &Trigger,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO triggers (user_id, sensor_id, event, event_params,
                                  actor_id, action, action_params, reading)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.user_id)
        .bind(item.sensor_id)
        .bind(&item.event)
        .bind(&item.event_params)
        .bind(item.actor_id)
        .bind(&item.action)
        .bind(&item.action_params)
        .bind(item.reading)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Trigger>, Error> {
        let trigger: Option<Trigger> = sqlx::query_as("SELECT * FROM triggers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(trigger)
    }

    pub async fn find_by_user_id(&self, user_id: i32) -> Result<Vec<Trigger>, Error> {
        let triggers: Vec<Trigger> = sqlx::query_as("SELECT * FROM triggers WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(triggers)
    }

    pub async fn find_by_sensor_id(&self, sensor_id: i32) -> Result<Vec<Trigger>, Error> {
        let triggers: Vec<Trigger> = sqlx::query_as("SELECT * FROM triggers WHERE sensor_id = $1")
            .bind(sensor_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(triggers)
    }

    pub async fn find_by_actor_id(&self, actor_id: i32) -> Result<Vec<Trigger>, Error> {
        let triggers: Vec<Trigger> = sqlx::query_as("SELECT * FROM triggers WHERE actor_id = $1")
            .bind(actor_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(triggers)
    }

    pub async fn find_all(&self) -> Result<Vec<Trigger>, Error> {
        let triggers: Vec<Trigger> = sqlx::query_as("SELECT * FROM triggers")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(triggers)
    }

    pub async fn update_rule(
        &self,
        id: i32,
        event: &str,
        event_params: &Value,
        action: &str,
        action_params: &Value,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE triggers
            SET event = $1, event_params = $2, action = $3, action_params = $4
            WHERE id = $5
            "#,
        )
        .bind(event)
        .bind(event_params)
        .bind(action)
        .bind(action_params)
        .bind(id)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    pub async fn update_reading(
        &self,
        id: i32,
        reading: Option<f64>,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE triggers SET reading = $1 WHERE id = $2")
            .bind(reading)
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn delete(
        &self,
        id: i32,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM triggers WHERE id = $1")
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}

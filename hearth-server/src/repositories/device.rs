use std::sync::Arc;

use serde_json::Value;
use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::Device;

pub struct DeviceRepository {
    storage: Arc<Storage>,
}

impl DeviceRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        item: &Device,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO devices (house_id, room_id, name, device_type, vendor,
                                 configuration, target, status, temperature_scale, locking_theme_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.house_id)
        .bind(item.room_id)
        .bind(&item.name)
        .bind(&item.device_type)
        .bind(&item.vendor)
        .bind(&item.configuration)
        .bind(&item.target)
        .bind(&item.status)
        .bind(&item.temperature_scale)
        .bind(item.locking_theme_id)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Device>, Error> {
        let device: Option<Device> = sqlx::query_as("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(device)
    }

    pub async fn find_by_house_and_name(
        &self,
        house_id: i32,
        name: &str,
    ) -> Result<Option<Device>, Error> {
        let device: Option<Device> =
            sqlx::query_as("SELECT * FROM devices WHERE house_id = $1 AND name = $2")
                .bind(house_id)
                .bind(name)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(device)
    }

    pub async fn find_by_house_id(&self, house_id: i32) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> = sqlx::query_as("SELECT * FROM devices WHERE house_id = $1")
            .bind(house_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(devices)
    }

    pub async fn find_by_room_id(&self, room_id: i32) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> = sqlx::query_as("SELECT * FROM devices WHERE room_id = $1")
            .bind(room_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(devices)
    }

    pub async fn find_all(&self) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> = sqlx::query_as("SELECT * FROM devices")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(devices)
    }

    pub async fn update_target(
        &self,
        id: i32,
        target: &Value,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET target = $1 WHERE id = $2")
            .bind(target)
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn update_status(
        &self,
        id: i32,
        status: &Value,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn update_room_id(
        &self,
        id: i32,
        room_id: Option<i32>,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET room_id = $1 WHERE id = $2")
            .bind(room_id)
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn update_locking_theme_id(
        &self,
        id: i32,
        locking_theme_id: Option<i32>,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET locking_theme_id = $1 WHERE id = $2")
            .bind(locking_theme_id)
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn update_temperature_scale(
        &self,
        id: i32,
        scale: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET temperature_scale = $1 WHERE id = $2")
            .bind(scale)
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
        sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}

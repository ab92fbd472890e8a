use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::Room;

pub struct RoomRepository {
    storage: Arc<Storage>,
}

impl RoomRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        item: &Room,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO rooms (house_id, name)
            VALUES ($1, $2)
            "#,
        )
        .bind(item.house_id)
        .bind(&item.name)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Room>, Error> {
        let room: Option<Room> = sqlx::query_as("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(room)
    }

    pub async fn find_by_house_id(&self, house_id: i32) -> Result<Vec<Room>, Error> {
        let rooms: Vec<Room> = sqlx::query_as("SELECT * FROM rooms WHERE house_id = $1")
            .bind(house_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(rooms)
    }

    pub async fn delete(
        &self,
        id: i32,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}

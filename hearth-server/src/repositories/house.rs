use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::House;

pub struct HouseRepository {
    storage: Arc<Storage>,
}

impl HouseRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        item: &House,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO houses (user_id, name, location)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(item.user_id)
        .bind(&item.name)
        .bind(&item.location)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<House>, Error> {
        let house: Option<House> = sqlx::query_as("SELECT * FROM houses WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(house)
    }

    pub async fn find_by_user_id(&self, user_id: i32) -> Result<Vec<House>, Error> {
        let houses: Vec<House> = sqlx::query_as("SELECT * FROM houses WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(houses)
    }

    pub async fn find_all(&self) -> Result<Vec<House>, Error> {
        let houses: Vec<House> = sqlx::query_as("SELECT * FROM houses")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(houses)
    }

    pub async fn update(
        &self,
        id: i32,
        item: &House,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE houses
            SET name = $1, location = $2
            WHERE id = $3
            "#,
        )
        .bind(&item.name)
        .bind(&item.location)
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
        sqlx::query("DELETE FROM houses WHERE id = $1")
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}

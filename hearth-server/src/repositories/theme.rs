use std::sync::Arc;

use serde_json::Value;
use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::Theme;

pub struct ThemeRepository {
    storage: Arc<Storage>,
}

impl ThemeRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        item: &Theme,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO themes (user_id, name, settings, active)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(item.user_id)
        .bind(&item.name)
        .bind(&item.settings)
        .bind(item.active)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Theme>, Error> {
        let theme: Option<Theme> = sqlx::query_as("SELECT * FROM themes WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(theme)
    }

    pub async fn find_by_user_id(&self, user_id: i32) -> Result<Vec<Theme>, Error> {
        let themes: Vec<Theme> = sqlx::query_as("SELECT * FROM themes WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(themes)
    }

    pub async fn find_all(&self) -> Result<Vec<Theme>, Error> {
        let themes: Vec<Theme> = sqlx::query_as("SELECT * FROM themes")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(themes)
    }

    pub async fn update_name(
        &self,
        id: i32,
        name: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE themes SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn update_settings(
        &self,
        id: i32,
        settings: &Value,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE themes SET settings = $1 WHERE id = $2")
            .bind(settings)
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn update_active(
        &self,
        id: i32,
        active: bool,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE themes SET active = $1 WHERE id = $2")
            .bind(active)
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
        sqlx::query("DELETE FROM themes WHERE id = $1")
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}

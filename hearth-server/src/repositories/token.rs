use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::Token;

pub struct TokenRepository {
    storage: Arc<Storage>,
}

impl TokenRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        item: &Token,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO tokens (user_id, token)
            VALUES ($1, $2)
            "#,
        )
        .bind(item.user_id)
        .bind(&item.token)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<Token>, Error> {
        let token: Option<Token> = sqlx::query_as("SELECT * FROM tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(token)
    }

    pub async fn find_by_user_id(&self, user_id: i32) -> Result<Vec<Token>, Error> {
        let tokens: Vec<Token> = sqlx::query_as("SELECT * FROM tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(tokens)
    }

    pub async fn delete_by_token(
        &self,
        token: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM tokens WHERE token = $1")
            .bind(token)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn delete_by_user_id(
        &self,
        user_id: i32,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}

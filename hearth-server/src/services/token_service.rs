use std::sync::Arc;

use uuid::Uuid;

use crate::configs::Storage;
use crate::errors::AuthError;
use crate::models::{House, Token};
use crate::repositories::{HouseRepository, TokenRepository, UserRepository};

/// Opaque session tokens stored server-side. A token proves identity only;
/// whether the identified user may touch a given house is a separate check.
pub struct TokenService {
    storage: Arc<Storage>,
    token_repository: Arc<TokenRepository>,
    user_repository: Arc<UserRepository>,
    house_repository: Arc<HouseRepository>,
}

impl TokenService {
    pub fn new(
        storage: Arc<Storage>,
        token_repository: Arc<TokenRepository>,
        user_repository: Arc<UserRepository>,
        house_repository: Arc<HouseRepository>,
    ) -> Self {
        Self {
            storage,
            token_repository,
            user_repository,
            house_repository,
        }
    }

    /// Mints a fresh random token for the user. Collisions are practically
    /// impossible but the unique column makes them loud, so retry once per
    /// loop if one ever happens.
    pub async fn generate_token(&self, user_id: i32) -> Result<Token, AuthError> {
        let _ = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        loop {
            let candidate = Uuid::new_v4().simple().to_string();
            if self
                .token_repository
                .find_by_token(&candidate)
                .await?
                .is_some()
            {
                continue;
            }

            let token = Token {
                id: 0,
                user_id,
                token: candidate,
            };

            let mut tx = self.storage.get_pool().begin().await?;
            let token_id = self.token_repository.create(&token, &mut tx).await?;
            tx.commit().await?;

            return Ok(Token {
                id: token_id,
                ..token
            });
        }
    }

    pub async fn invalidate_token(&self, token: &str) -> Result<(), AuthError> {
        let mut tx = self.storage.get_pool().begin().await?;
        self.token_repository.delete_by_token(token, &mut tx).await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn invalidate_user_tokens(&self, user_id: i32) -> Result<(), AuthError> {
        let mut tx = self.storage.get_pool().begin().await?;
        self.token_repository
            .delete_by_user_id(user_id, &mut tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn check_token_validity(&self, token: &str) -> Result<Token, AuthError> {
        self.token_repository
            .find_by_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// True when the token belongs to the house's owner or to an admin.
    /// Unknown tokens and foreign owners both come back as `false`; the
    /// distinction is only logged.
    pub async fn authenticate_user(&self, token: &str, house: &House) -> Result<bool, AuthError> {
        let Some(token) = self.token_repository.find_by_token(token).await? else {
            tracing::debug!("authentication refused: unknown token");
            return Ok(false);
        };
        let Some(user) = self.user_repository.find_by_id(token.user_id).await? else {
            tracing::debug!(user_id = token.user_id, "authentication refused: orphan token");
            return Ok(false);
        };

        if user.is_admin || house.user_id == user.id {
            Ok(true)
        } else {
            tracing::debug!(
                user_id = user.id,
                house_id = house.id,
                "authentication refused: not the owner"
            );
            Ok(false)
        }
    }

    pub async fn authenticate_user_by_house_id(
        &self,
        token: &str,
        house_id: i32,
    ) -> Result<bool, AuthError> {
        let Some(house) = self.house_repository.find_by_id(house_id).await? else {
            return Ok(false);
        };

        self.authenticate_user(token, &house).await
    }

    pub async fn authenticate_admin(&self, token: &str) -> Result<bool, AuthError> {
        let Some(token) = self.token_repository.find_by_token(token).await? else {
            return Ok(false);
        };
        let Some(user) = self.user_repository.find_by_id(token.user_id).await? else {
            return Ok(false);
        };

        Ok(user.is_admin)
    }
}

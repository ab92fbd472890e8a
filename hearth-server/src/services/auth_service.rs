use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::configs::Storage;
use crate::errors::AuthError;
use crate::models::User;
use crate::repositories::UserRepository;

/// Account registration and password checks. Passwords are stored as argon2
/// hashes, never in clear.
pub struct AuthService {
    storage: Arc<Storage>,
    user_repository: Arc<UserRepository>,
}

impl AuthService {
    pub fn new(storage: Arc<Storage>, user_repository: Arc<UserRepository>) -> Self {
        Self {
            storage,
            user_repository,
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| AuthError::Hash)?
            .to_string())
    }

    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        if self.user_repository.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }

        let user = User {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            password: self.hash_password(password)?,
            is_admin,
            faulty: false,
        };

        let mut tx = self.storage.get_pool().begin().await?;
        let user_id = self.user_repository.create(&user, &mut tx).await?;
        tx.commit().await?;

        self.get_user_by_id(user_id).await
    }

    pub async fn get_user_by_id(&self, user_id: i32) -> Result<User, AuthError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    pub async fn check_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let parsed = PasswordHash::new(&user.password).map_err(|_| AuthError::Hash)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(user)
    }

    pub async fn update_user_account(
        &self,
        user_id: i32,
        name: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let _ = self.get_user_by_id(user_id).await?;
        let hashed = self.hash_password(password)?;

        let mut tx = self.storage.get_pool().begin().await?;
        self.user_repository
            .update_account(user_id, name, &hashed, &mut tx)
            .await?;
        tx.commit().await?;

        self.get_user_by_id(user_id).await
    }
}

use std::sync::Arc;

use crate::errors::AuthError;
use crate::repositories::{DeviceRepository, RoomRepository, ThemeRepository, TriggerRepository};
use crate::services::TokenService;

/// Ownership checks for every addressable entity. Each check resolves the
/// entity up to its owning house (or user) and defers to the token service;
/// a missing entity is an authorization failure, not an error.
pub struct PermissionService {
    token_service: Arc<TokenService>,
    room_repository: Arc<RoomRepository>,
    device_repository: Arc<DeviceRepository>,
    theme_repository: Arc<ThemeRepository>,
    trigger_repository: Arc<TriggerRepository>,
}

impl PermissionService {
    pub fn new(
        token_service: Arc<TokenService>,
        room_repository: Arc<RoomRepository>,
        device_repository: Arc<DeviceRepository>,
        theme_repository: Arc<ThemeRepository>,
        trigger_repository: Arc<TriggerRepository>,
    ) -> Self {
        Self {
            token_service,
            room_repository,
            device_repository,
            theme_repository,
            trigger_repository,
        }
    }

    pub async fn validate_house_token(
        &self,
        token: &str,
        house_id: i32,
    ) -> Result<bool, AuthError> {
        self.token_service
            .authenticate_user_by_house_id(token, house_id)
            .await
    }

    pub async fn validate_room_token(&self, token: &str, room_id: i32) -> Result<bool, AuthError> {
        let Some(room) = self.room_repository.find_by_id(room_id).await? else {
            return Ok(false);
        };

        self.validate_house_token(token, room.house_id).await
    }

    pub async fn validate_device_token(
        &self,
        token: &str,
        device_id: i32,
    ) -> Result<bool, AuthError> {
        let Some(device) = self.device_repository.find_by_id(device_id).await? else {
            return Ok(false);
        };

        self.validate_house_token(token, device.house_id).await
    }

    /// Themes and triggers belong to users directly, not to houses, so the
    /// check compares owners instead of walking the house chain.
    pub async fn validate_theme_token(
        &self,
        token: &str,
        theme_id: i32,
    ) -> Result<bool, AuthError> {
        let Some(theme) = self.theme_repository.find_by_id(theme_id).await? else {
            return Ok(false);
        };

        self.validate_owner_token(token, theme.user_id).await
    }

    pub async fn validate_trigger_token(
        &self,
        token: &str,
        trigger_id: i32,
    ) -> Result<bool, AuthError> {
        let Some(trigger) = self.trigger_repository.find_by_id(trigger_id).await? else {
            return Ok(false);
        };

        self.validate_owner_token(token, trigger.user_id).await
    }

    pub async fn validate_user_token(&self, token: &str, user_id: i32) -> Result<bool, AuthError> {
        self.validate_owner_token(token, user_id).await
    }

    async fn validate_owner_token(&self, token: &str, owner_id: i32) -> Result<bool, AuthError> {
        if self.token_service.authenticate_admin(token).await? {
            return Ok(true);
        }
        let session = match self.token_service.check_token_validity(token).await {
            Ok(session) => session,
            Err(AuthError::InvalidToken) => return Ok(false),
            Err(error) => return Err(error),
        };

        Ok(session.user_id == owner_id)
    }
}

use std::sync::Arc;

use serde_json::Value;

use crate::configs::Storage;
use crate::errors::{DeviceError, ThemeError};
use crate::models::{DeviceSettingValue, Theme, ThemeSetting};
use crate::repositories::ThemeRepository;
use crate::services::DeviceService;

/// What happened to one device while a theme was (de)activated. `applied` is
/// false when the push was suppressed or failed; `detail` carries the failure
/// text when there was one.
#[derive(Debug)]
pub struct ThemeApplyOutcome {
    pub device_id: i32,
    pub applied: bool,
    pub detail: Option<String>,
}

/// Applies scene presets. Activation pushes each stored setting through the
/// device service, then claims the device; deactivation releases the claims.
/// One bad device never aborts the rest of the theme.
pub struct ThemeService {
    storage: Arc<Storage>,
    theme_repository: Arc<ThemeRepository>,
    device_service: Arc<DeviceService>,
}

impl ThemeService {
    pub fn new(
        storage: Arc<Storage>,
        theme_repository: Arc<ThemeRepository>,
        device_service: Arc<DeviceService>,
    ) -> Self {
        Self {
            storage,
            theme_repository,
            device_service,
        }
    }

    pub async fn get_theme_by_id(&self, theme_id: i32) -> Result<Theme, ThemeError> {
        self.theme_repository
            .find_by_id(theme_id)
            .await?
            .ok_or(ThemeError::ThemeNotFound)
    }

    pub async fn get_themes_for_user(&self, user_id: i32) -> Result<Vec<Theme>, ThemeError> {
        Ok(self.theme_repository.find_by_user_id(user_id).await?)
    }

    pub async fn add_theme(
        &self,
        user_id: i32,
        name: &str,
        settings: Value,
        activate: bool,
    ) -> Result<(Theme, Vec<ThemeApplyOutcome>), ThemeError> {
        let theme = Theme {
            id: 0,
            user_id,
            name: name.to_string(),
            settings,
            active: false,
        };
        // Malformed settings are rejected before anything is stored.
        theme.parsed_settings()?;

        let mut tx = self.storage.get_pool().begin().await?;
        let theme_id = self.theme_repository.create(&theme, &mut tx).await?;
        tx.commit().await?;

        if activate {
            self.change_theme_state(theme_id, true).await
        } else {
            Ok((self.get_theme_by_id(theme_id).await?, Vec::new()))
        }
    }

    /// Activates or deactivates a theme. Activation walks the stored settings
    /// in order: push the value, then claim the device for this theme even
    /// when the push was suppressed by another theme's lock, which transfers
    /// the claim. Deactivation releases every device the theme holds.
    pub async fn change_theme_state(
        &self,
        theme_id: i32,
        activate: bool,
    ) -> Result<(Theme, Vec<ThemeApplyOutcome>), ThemeError> {
        let theme = self.get_theme_by_id(theme_id).await?;
        let settings = theme.parsed_settings()?;

        let outcomes = if activate {
            let mut outcomes = Vec::with_capacity(settings.len());
            for pair in &settings {
                outcomes.push(self.apply_setting(theme_id, pair).await);
            }
            outcomes
        } else {
            let mut outcomes = Vec::with_capacity(settings.len());
            for pair in &settings {
                outcomes.push(self.release_device(theme_id, pair.device_id).await);
            }
            outcomes
        };

        let mut tx = self.storage.get_pool().begin().await?;
        self.theme_repository
            .update_active(theme_id, activate, &mut tx)
            .await?;
        tx.commit().await?;

        Ok((self.get_theme_by_id(theme_id).await?, outcomes))
    }

    async fn apply_setting(&self, theme_id: i32, pair: &ThemeSetting) -> ThemeApplyOutcome {
        let pushed = match pair.setting {
            DeviceSettingValue::Temperature { target_temperature } => {
                self.device_service
                    .set_target_temperature(pair.device_id, target_temperature)
                    .await
            }
            DeviceSettingValue::Power { power_state } => {
                self.device_service
                    .set_power_state(pair.device_id, power_state)
                    .await
            }
        };

        match pushed {
            Ok(applied) => {
                // The claim happens regardless of suppression, so an active
                // theme can be superseded by activating another one.
                match self
                    .device_service
                    .set_locking_theme_id(pair.device_id, Some(theme_id))
                    .await
                {
                    Ok(_) => ThemeApplyOutcome {
                        device_id: pair.device_id,
                        applied,
                        detail: None,
                    },
                    Err(error) => ThemeApplyOutcome {
                        device_id: pair.device_id,
                        applied: false,
                        detail: Some(error.to_string()),
                    },
                }
            }
            Err(error) => {
                tracing::warn!(
                    theme_id,
                    device_id = pair.device_id,
                    "theme setting not applied: {error}"
                );
                ThemeApplyOutcome {
                    device_id: pair.device_id,
                    applied: false,
                    detail: Some(error.to_string()),
                }
            }
        }
    }

    async fn release_device(&self, theme_id: i32, device_id: i32) -> ThemeApplyOutcome {
        let locked_by_this = match self.device_service.get_device_by_id(device_id).await {
            Ok(device) => device.locking_theme_id == Some(theme_id),
            Err(DeviceError::DeviceNotFound) => false,
            Err(error) => {
                return ThemeApplyOutcome {
                    device_id,
                    applied: false,
                    detail: Some(error.to_string()),
                };
            }
        };
        // Another theme may have taken the device in the meantime; its claim
        // is left alone.
        if !locked_by_this {
            return ThemeApplyOutcome {
                device_id,
                applied: false,
                detail: None,
            };
        }

        match self.device_service.set_locking_theme_id(device_id, None).await {
            Ok(_) => ThemeApplyOutcome {
                device_id,
                applied: true,
                detail: None,
            },
            Err(error) => ThemeApplyOutcome {
                device_id,
                applied: false,
                detail: Some(error.to_string()),
            },
        }
    }

    /// Renames a theme and replaces its settings. An active theme is
    /// released first and re-activated afterwards so the stored claims always
    /// match the stored settings.
    pub async fn edit_theme(
        &self,
        theme_id: i32,
        name: &str,
        settings: Value,
    ) -> Result<(Theme, Vec<ThemeApplyOutcome>), ThemeError> {
        let theme = self.get_theme_by_id(theme_id).await?;

        let replacement = Theme {
            settings: settings.clone(),
            ..theme.clone()
        };
        replacement.parsed_settings()?;

        let was_active = theme.active;
        if was_active {
            self.change_theme_state(theme_id, false).await?;
        }

        let mut tx = self.storage.get_pool().begin().await?;
        self.theme_repository.update_name(theme_id, name, &mut tx).await?;
        self.theme_repository
            .update_settings(theme_id, &settings, &mut tx)
            .await?;
        tx.commit().await?;

        if was_active {
            self.change_theme_state(theme_id, true).await
        } else {
            Ok((self.get_theme_by_id(theme_id).await?, Vec::new()))
        }
    }

    /// Appends one (device, setting) pair. If the theme is active the setting
    /// is pushed and the device claimed right away.
    pub async fn add_device_to_theme(
        &self,
        theme_id: i32,
        pair: ThemeSetting,
    ) -> Result<(Theme, Option<ThemeApplyOutcome>), ThemeError> {
        let theme = self.get_theme_by_id(theme_id).await?;
        let mut settings = theme.parsed_settings()?;
        settings.retain(|existing| existing.device_id != pair.device_id);
        settings.push(pair);

        let value = serde_json::to_value(&settings).map_err(|_| ThemeError::InvalidSetting)?;

        let mut tx = self.storage.get_pool().begin().await?;
        self.theme_repository
            .update_settings(theme_id, &value, &mut tx)
            .await?;
        tx.commit().await?;

        let outcome = if theme.active {
            let pair = settings.last().cloned();
            match pair {
                Some(pair) => Some(self.apply_setting(theme_id, &pair).await),
                None => None,
            }
        } else {
            None
        };

        Ok((self.get_theme_by_id(theme_id).await?, outcome))
    }

    /// Drops one device from a theme's settings. If the theme is active and
    /// holds the device, the claim is released too.
    pub async fn remove_device_from_theme(
        &self,
        theme_id: i32,
        device_id: i32,
    ) -> Result<Theme, ThemeError> {
        let theme = self.get_theme_by_id(theme_id).await?;
        let settings = theme.parsed_settings()?;

        let remaining: Vec<_> = settings
            .into_iter()
            .filter(|pair| pair.device_id != device_id)
            .collect();
        let value = serde_json::to_value(&remaining).map_err(|_| ThemeError::InvalidSetting)?;

        let mut tx = self.storage.get_pool().begin().await?;
        self.theme_repository
            .update_settings(theme_id, &value, &mut tx)
            .await?;
        tx.commit().await?;

        if theme.active {
            self.release_device(theme_id, device_id).await;
        }

        self.get_theme_by_id(theme_id).await
    }

    /// Deletes a theme, releasing its claims first when it is active.
    pub async fn remove_theme(&self, theme_id: i32) -> Result<(), ThemeError> {
        let theme = self.get_theme_by_id(theme_id).await?;
        if theme.active {
            self.change_theme_state(theme_id, false).await?;
        }

        let mut tx = self.storage.get_pool().begin().await?;
        self.theme_repository.delete(theme_id, &mut tx).await?;
        tx.commit().await?;

        Ok(())
    }
}

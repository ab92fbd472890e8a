use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Table;
use crate::errors::ThemeError;

/// A scene preset: an ordered list of (device, setting) pairs owned by one
/// user. While `active`, every referenced device carries this theme's id as
/// its locking theme.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Theme {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub settings: Value,
    pub active: bool,
}

/// The payload of one theme entry; exactly one of the two keys is present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceSettingValue {
    Temperature { target_temperature: f64 },
    Power { power_state: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSetting {
    pub device_id: i32,
    pub setting: DeviceSettingValue,
}

impl Theme {
    /// Order of the stored pairs is activation order.
    pub fn parsed_settings(&self) -> Result<Vec<ThemeSetting>, ThemeError> {
        serde_json::from_value(self.settings.clone()).map_err(|_| ThemeError::InvalidSetting)
    }
}

#[derive(Clone)]
pub struct ThemeTable;

impl Table for ThemeTable {
    fn name(&self) -> &'static str {
        "themes"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS themes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name VARCHAR(255) NOT NULL,
                settings JSON NOT NULL,
                active BOOLEAN NOT NULL DEFAULT FALSE,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS themes;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}

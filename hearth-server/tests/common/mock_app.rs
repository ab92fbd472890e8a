use std::sync::Arc;

use serde_json::json;

use hearth_server::app::{App, create_app_with_source};
use hearth_server::configs::settings::{Database, Logger, Poller, Settings, Vendor};
use hearth_server::models::{Device, DeviceKind, House, Room, User};
use hearth_server::services::vendor::mock::MockReadingSource;

pub struct MockApp {
    pub app: App,
    pub reading_source: Arc<MockReadingSource>,
}

impl MockApp {
    pub async fn new() -> Self {
        let settings = Arc::new(Settings {
            logger: Logger {
                level: String::from("debug"),
            },
            database: Database {
                migration_path: None,
                clean_start: true,
                url: String::from("sqlite::memory:"),
            },
            vendor: Vendor { timeout_secs: 1 },
            poller: Poller { interval_secs: 60 },
        });

        let reading_source = Arc::new(MockReadingSource::new());
        let app = create_app_with_source(&settings, reading_source.clone()).await;

        Self {
            app,
            reading_source,
        }
    }

    pub async fn create_test_user(&self) -> User {
        self.app
            .auth_service
            .register_user("Test User", "test@test.com", "test123!", false)
            .await
            .unwrap()
    }

    pub async fn create_test_admin(&self) -> User {
        self.app
            .auth_service
            .register_user("Test Admin", "admin@test.com", "admin123!", true)
            .await
            .unwrap()
    }

    pub async fn create_test_house(&self, user_id: i32) -> House {
        self.app
            .household_service
            .add_house(user_id, "Test House", "1 Sample Street")
            .await
            .unwrap()
    }

    pub async fn create_test_room(&self, house_id: i32) -> Room {
        self.app
            .household_service
            .add_room(house_id, "Test Room")
            .await
            .unwrap()
    }

    pub async fn create_test_device(
        &self,
        house_id: i32,
        name: &str,
        kind: DeviceKind,
    ) -> Device {
        self.app
            .device_service
            .add_device(
                house_id,
                None,
                name,
                kind,
                json!({}),
                json!({}),
                json!({"url": "http://device.local"}),
                "OWN",
            )
            .await
            .unwrap()
    }
}

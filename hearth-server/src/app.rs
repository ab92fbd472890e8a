use std::sync::Arc;

use crate::configs::{SchemaManager, Settings, Storage};
use crate::repositories::{
    DeviceRepository, HouseRepository, RoomRepository, ThemeRepository, TokenRepository,
    TriggerRepository, UserRepository,
};
use crate::services::vendor::{ReadingSource, VendorGateway};
use crate::services::{
    AuthService, DeviceService, HouseholdService, PermissionService, ThemeService, TokenService,
    TriggerService,
};

/// Fully wired service graph, shared by the poller loop and whatever surface
/// sits on top.
pub struct App {
    pub storage: Arc<Storage>,
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
    pub permission_service: Arc<PermissionService>,
    pub household_service: Arc<HouseholdService>,
    pub device_service: Arc<DeviceService>,
    pub theme_service: Arc<ThemeService>,
    pub trigger_service: Arc<TriggerService>,
}

pub async fn create_app(settings: &Arc<Settings>) -> App {
    let reading_source: Arc<dyn ReadingSource> =
        Arc::new(VendorGateway::new(settings.vendor.clone()).unwrap());

    create_app_with_source(settings, reading_source).await
}

pub async fn create_app_with_source(
    settings: &Arc<Settings>,
    reading_source: Arc<dyn ReadingSource>,
) -> App {
    let storage = Arc::new(
        Storage::new(settings.database.clone(), SchemaManager::default())
            .await
            .unwrap(),
    );

    let user_repository = Arc::new(UserRepository::new(storage.clone()));
    let token_repository = Arc::new(TokenRepository::new(storage.clone()));
    let house_repository = Arc::new(HouseRepository::new(storage.clone()));
    let room_repository = Arc::new(RoomRepository::new(storage.clone()));
    let device_repository = Arc::new(DeviceRepository::new(storage.clone()));
    let theme_repository = Arc::new(ThemeRepository::new(storage.clone()));
    let trigger_repository = Arc::new(TriggerRepository::new(storage.clone()));

    let auth_service = Arc::new(AuthService::new(storage.clone(), user_repository.clone()));
    let token_service = Arc::new(TokenService::new(
        storage.clone(),
        token_repository.clone(),
        user_repository.clone(),
        house_repository.clone(),
    ));
    let permission_service = Arc::new(PermissionService::new(
        token_service.clone(),
        room_repository.clone(),
        device_repository.clone(),
        theme_repository.clone(),
        trigger_repository.clone(),
    ));

    let device_service = Arc::new(DeviceService::new(
        storage.clone(),
        device_repository.clone(),
        house_repository.clone(),
        user_repository.clone(),
        theme_repository.clone(),
        trigger_repository.clone(),
        reading_source,
    ));
    let household_service = Arc::new(HouseholdService::new(
        storage.clone(),
        house_repository.clone(),
        room_repository.clone(),
        device_service.clone(),
    ));
    let theme_service = Arc::new(ThemeService::new(
        storage.clone(),
        theme_repository.clone(),
        device_service.clone(),
    ));
    let trigger_service = Arc::new(TriggerService::new(
        storage.clone(),
        trigger_repository.clone(),
        device_service.clone(),
    ));

    App {
        storage,
        auth_service,
        token_service,
        permission_service,
        household_service,
        device_service,
        theme_service,
        trigger_service,
    }
}

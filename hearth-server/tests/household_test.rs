use hearth_server::errors::{DeviceError, HouseError, RoomError};
use hearth_server::models::DeviceKind;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_house_names_are_unique_per_owner() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let other = mock_app.create_test_admin().await;

    mock_app.create_test_house(user.id).await;

    let duplicate = mock_app
        .app
        .household_service
        .add_house(user.id, "Test House", "3 Sample Street")
        .await;
    assert!(matches!(duplicate, Err(HouseError::DuplicateName)));

    // Another owner can reuse the name.
    mock_app
        .app
        .household_service
        .add_house(other.id, "Test House", "3 Sample Street")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_room_names_are_unique_per_house() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;

    mock_app.create_test_room(house.id).await;

    let duplicate = mock_app
        .app
        .household_service
        .add_room(house.id, "Test Room")
        .await;
    assert!(matches!(duplicate, Err(RoomError::DuplicateName)));
}

#[tokio::test]
async fn test_update_house_rejects_sibling_name() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let second = mock_app
        .app
        .household_service
        .add_house(user.id, "Summer House", "9 Shore Road")
        .await
        .unwrap();

    let clash = mock_app
        .app
        .household_service
        .update_house(second.id, "Test House", "9 Shore Road")
        .await;
    assert!(matches!(clash, Err(HouseError::DuplicateName)));

    // Keeping its own name is not a clash.
    let renamed = mock_app
        .app
        .household_service
        .update_house(house.id, "Test House", "1 New Street")
        .await
        .unwrap();
    assert_eq!(renamed.location, "1 New Street");
}

#[tokio::test]
async fn test_remove_room_unlinks_devices() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let room = mock_app.create_test_room(house.id).await;
    let device = mock_app
        .create_test_device(house.id, "Lamp", DeviceKind::LightSwitch)
        .await;

    mock_app
        .app
        .device_service
        .link_device_to_room(room.id, device.id)
        .await
        .unwrap();

    mock_app.app.household_service.remove_room(room.id).await.unwrap();

    let missing = mock_app.app.household_service.get_room_by_id(room.id).await;
    assert!(matches!(missing, Err(RoomError::RoomNotFound)));

    // The device survives, unassigned.
    let device = mock_app
        .app
        .device_service
        .get_device_by_id(device.id)
        .await
        .unwrap();
    assert_eq!(device.room_id, None);
}

#[tokio::test]
async fn test_remove_house_takes_rooms_and_devices_with_it() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let room = mock_app.create_test_room(house.id).await;
    let device = mock_app
        .create_test_device(house.id, "Lamp", DeviceKind::LightSwitch)
        .await;

    mock_app
        .app
        .household_service
        .remove_house(house.id)
        .await
        .unwrap();

    let missing_house = mock_app.app.household_service.get_house_by_id(house.id).await;
    assert!(matches!(missing_house, Err(HouseError::HouseNotFound)));

    let missing_room = mock_app.app.household_service.get_room_by_id(room.id).await;
    assert!(matches!(missing_room, Err(RoomError::RoomNotFound)));

    let missing_device = mock_app.app.device_service.get_device_by_id(device.id).await;
    assert!(matches!(missing_device, Err(DeviceError::DeviceNotFound)));
}

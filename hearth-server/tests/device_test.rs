use serde_json::json;

use hearth_server::errors::DeviceError;
use hearth_server::models::DeviceKind;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_add_device_applies_type_defaults() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;

    let thermostat = mock_app
        .create_test_device(house.id, "Therm1", DeviceKind::Thermostat)
        .await;
    assert_eq!(thermostat.target_temperature(), Some(25.0));
    assert_eq!(thermostat.locked_min_temperature(), Some(0.0));
    assert_eq!(thermostat.locked_max_temperature(), Some(50.0));
    assert_eq!(thermostat.last_temperature(), Some(0.0));
    assert_eq!(thermostat.temperature_scale.as_deref(), Some("C"));
    assert!(thermostat.last_read().is_some());

    let switch = mock_app
        .create_test_device(house.id, "Switch1", DeviceKind::LightSwitch)
        .await;
    assert_eq!(switch.power_state(), Some(0));

    let sensor = mock_app
        .create_test_device(house.id, "Motion1", DeviceKind::MotionSensor)
        .await;
    assert_eq!(sensor.sensor_data(), Some(0.0));
    assert_eq!(sensor.last_read(), Some(0.0));
}

#[tokio::test]
async fn test_device_names_are_unique_per_house() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let other_house = mock_app
        .app
        .household_service
        .add_house(user.id, "Other House", "2 Sample Street")
        .await
        .unwrap();

    mock_app
        .create_test_device(house.id, "Lamp", DeviceKind::LightSwitch)
        .await;

    let duplicate = mock_app
        .app
        .device_service
        .add_device(
            house.id,
            None,
            "Lamp",
            DeviceKind::LightSwitch,
            json!({}),
            json!({}),
            json!({"url": "http://device.local"}),
            "OWN",
        )
        .await;
    assert!(matches!(duplicate, Err(DeviceError::DuplicateName)));

    // Same name in another house is fine.
    mock_app
        .create_test_device(other_house.id, "Lamp", DeviceKind::LightSwitch)
        .await;
}

#[tokio::test]
async fn test_vendor_configuration_is_validated_at_creation() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;

    let result = mock_app
        .app
        .device_service
        .add_device(
            house.id,
            None,
            "Plug",
            DeviceKind::LightSwitch,
            json!({}),
            json!({}),
            json!({"username": "u", "password": "p"}),
            "energenie",
        )
        .await;

    assert!(matches!(
        result,
        Err(DeviceError::InvalidConfiguration("device_id"))
    ));
}

#[tokio::test]
async fn test_set_target_temperature_persists_and_respects_bounds() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let thermostat = mock_app
        .create_test_device(house.id, "Therm1", DeviceKind::Thermostat)
        .await;

    let applied = mock_app
        .app
        .device_service
        .set_target_temperature(thermostat.id, 18.5)
        .await
        .unwrap();
    assert!(applied);

    let reloaded = mock_app
        .app
        .device_service
        .get_device_by_id(thermostat.id)
        .await
        .unwrap();
    assert_eq!(reloaded.target_temperature(), Some(18.5));
    assert_eq!(reloaded.last_read(), Some(18.5));

    let out_of_range = mock_app
        .app
        .device_service
        .set_target_temperature(thermostat.id, 50.5)
        .await;
    assert!(matches!(out_of_range, Err(DeviceError::OutOfRange)));

    let wrong_type = mock_app
        .app
        .device_service
        .set_power_state(thermostat.id, 1)
        .await;
    assert!(matches!(wrong_type, Err(DeviceError::WrongDeviceType)));
}

#[tokio::test]
async fn test_theme_lock_suppresses_writes_but_not_validation() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let switch = mock_app
        .create_test_device(house.id, "Switch1", DeviceKind::LightSwitch)
        .await;

    let (theme, _) = mock_app
        .app
        .theme_service
        .add_theme(user.id, "Evening", json!([]), false)
        .await
        .unwrap();
    mock_app
        .app
        .device_service
        .set_locking_theme_id(switch.id, Some(theme.id))
        .await
        .unwrap();

    // Invalid values still error even though the device is locked.
    let invalid = mock_app.app.device_service.set_power_state(switch.id, 2).await;
    assert!(matches!(invalid, Err(DeviceError::InvalidValue)));

    // A valid value is swallowed without applying.
    let applied = mock_app
        .app
        .device_service
        .set_power_state(switch.id, 1)
        .await
        .unwrap();
    assert!(!applied);

    let reloaded = mock_app
        .app
        .device_service
        .get_device_by_id(switch.id)
        .await
        .unwrap();
    assert_eq!(reloaded.power_state(), Some(0));
}

#[tokio::test]
async fn test_change_temperature_scale_round_trip() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let thermostat = mock_app
        .create_test_device(house.id, "Therm1", DeviceKind::Thermostat)
        .await;

    let converted = mock_app
        .app
        .device_service
        .change_temperature_scale(thermostat.id)
        .await
        .unwrap();
    assert_eq!(converted.temperature_scale.as_deref(), Some("F"));
    assert_eq!(converted.target_temperature(), Some(77.0));
    assert_eq!(converted.locked_max_temperature(), Some(122.0));

    let reloaded = mock_app
        .app
        .device_service
        .get_device_by_id(thermostat.id)
        .await
        .unwrap();
    assert_eq!(reloaded.temperature_scale.as_deref(), Some("F"));
    assert_eq!(reloaded.target_temperature(), Some(77.0));

    let back = mock_app
        .app
        .device_service
        .change_temperature_scale(thermostat.id)
        .await
        .unwrap();
    assert_eq!(back.temperature_scale.as_deref(), Some("C"));
    assert!((back.target_temperature().unwrap() - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_faulty_scan_flags_user() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let sensor = mock_app
        .create_test_device(house.id, "Motion1", DeviceKind::MotionSensor)
        .await;

    let faulty = mock_app
        .app
        .device_service
        .get_faulty_devices_for_user(user.id)
        .await
        .unwrap();
    assert!(faulty.is_empty());

    // An implausible sensor reading marks the device faulty.
    mock_app.reading_source.set_value(sensor.id, 3.0);
    mock_app
        .app
        .device_service
        .update_device_reading(sensor.id)
        .await
        .unwrap();

    let faulty = mock_app
        .app
        .device_service
        .get_faulty_devices_for_user(user.id)
        .await
        .unwrap();
    assert_eq!(faulty.len(), 1);
    assert_eq!(faulty[0].id, sensor.id);

    let user = mock_app.app.auth_service.get_user_by_id(user.id).await.unwrap();
    assert!(user.faulty);
}

#[tokio::test]
async fn test_remove_device_cleans_themes_and_triggers() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    let house = mock_app.create_test_house(user.id).await;
    let sensor = mock_app
        .create_test_device(house.id, "Motion1", DeviceKind::MotionSensor)
        .await;
    let switch = mock_app
        .create_test_device(house.id, "Switch1", DeviceKind::LightSwitch)
        .await;

    let (theme, _) = mock_app
        .app
        .theme_service
        .add_theme(
            user.id,
            "Evening",
            json!([{"device_id": switch.id, "setting": {"power_state": 1}}]),
            false,
        )
        .await
        .unwrap();
    let trigger = mock_app
        .app
        .trigger_service
        .add_trigger(
            user.id,
            sensor.id,
            "motion_detected_start",
            json!({}),
            switch.id,
            "set_light_switch",
            json!({"power_state": 1}),
        )
        .await
        .unwrap();

    let report = mock_app
        .app
        .device_service
        .remove_device(switch.id)
        .await
        .unwrap();
    assert_eq!(report.device.id, switch.id);
    assert_eq!(report.themes, vec![theme.id]);
    assert_eq!(report.triggers, vec![trigger.id]);

    let gone = mock_app.app.device_service.get_device_by_id(switch.id).await;
    assert!(matches!(gone, Err(DeviceError::DeviceNotFound)));

    let theme = mock_app
        .app
        .theme_service
        .get_theme_by_id(theme.id)
        .await
        .unwrap();
    assert!(theme.parsed_settings().unwrap().is_empty());

    let triggers = mock_app
        .app
        .trigger_service
        .get_triggers_for_user(user.id)
        .await
        .unwrap();
    assert!(triggers.is_empty());
}

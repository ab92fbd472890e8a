use hearth_server::errors::AuthError;
use hearth_server::models::DeviceKind;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_register_and_check_password() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;
    assert!(!user.is_admin);

    let duplicate = mock_app
        .app
        .auth_service
        .register_user("Other", "test@test.com", "other123!", false)
        .await;
    assert!(matches!(duplicate, Err(AuthError::EmailExists)));

    let authenticated = mock_app
        .app
        .auth_service
        .check_password("test@test.com", "test123!")
        .await
        .unwrap();
    assert_eq!(authenticated.id, user.id);

    let wrong = mock_app
        .app
        .auth_service
        .check_password("test@test.com", "nope")
        .await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

    let unknown = mock_app
        .app
        .auth_service
        .check_password("ghost@test.com", "nope")
        .await;
    assert!(matches!(unknown, Err(AuthError::AccountNotFound)));
}

#[tokio::test]
async fn test_token_life_cycle() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;

    let token = mock_app.app.token_service.generate_token(user.id).await.unwrap();
    assert_eq!(token.token.len(), 32);

    let session = mock_app
        .app
        .token_service
        .check_token_validity(&token.token)
        .await
        .unwrap();
    assert_eq!(session.user_id, user.id);

    mock_app
        .app
        .token_service
        .invalidate_token(&token.token)
        .await
        .unwrap();
    let invalid = mock_app
        .app
        .token_service
        .check_token_validity(&token.token)
        .await;
    assert!(matches!(invalid, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn test_house_authentication_owner_and_admin_only() {
    let mock_app = MockApp::new().await;
    let owner = mock_app.create_test_user().await;
    let admin = mock_app.create_test_admin().await;
    let stranger = mock_app
        .app
        .auth_service
        .register_user("Stranger", "stranger@test.com", "stranger1!", false)
        .await
        .unwrap();
    let house = mock_app.create_test_house(owner.id).await;

    let owner_token = mock_app.app.token_service.generate_token(owner.id).await.unwrap();
    let admin_token = mock_app.app.token_service.generate_token(admin.id).await.unwrap();
    let stranger_token = mock_app
        .app
        .token_service
        .generate_token(stranger.id)
        .await
        .unwrap();

    let token_service = &mock_app.app.token_service;
    assert!(token_service
        .authenticate_user(&owner_token.token, &house)
        .await
        .unwrap());
    assert!(token_service
        .authenticate_user(&admin_token.token, &house)
        .await
        .unwrap());
    assert!(!token_service
        .authenticate_user(&stranger_token.token, &house)
        .await
        .unwrap());
    assert!(!token_service
        .authenticate_user("bogus-token", &house)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_permission_checks_walk_the_ownership_chain() {
    let mock_app = MockApp::new().await;
    let owner = mock_app.create_test_user().await;
    let stranger = mock_app.create_test_admin().await;
    let house = mock_app.create_test_house(owner.id).await;
    let room = mock_app.create_test_room(house.id).await;
    let device = mock_app
        .create_test_device(house.id, "Lamp", DeviceKind::LightSwitch)
        .await;

    let owner_token = mock_app.app.token_service.generate_token(owner.id).await.unwrap();

    let permissions = &mock_app.app.permission_service;
    assert!(permissions
        .validate_house_token(&owner_token.token, house.id)
        .await
        .unwrap());
    assert!(permissions
        .validate_room_token(&owner_token.token, room.id)
        .await
        .unwrap());
    assert!(permissions
        .validate_device_token(&owner_token.token, device.id)
        .await
        .unwrap());

    // Missing entities fail the check instead of erroring.
    assert!(!permissions
        .validate_device_token(&owner_token.token, 9999)
        .await
        .unwrap());

    // Admins pass everywhere.
    let admin_token = mock_app
        .app
        .token_service
        .generate_token(stranger.id)
        .await
        .unwrap();
    assert!(permissions
        .validate_device_token(&admin_token.token, device.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_invalidate_user_tokens_revokes_every_session() {
    let mock_app = MockApp::new().await;
    let user = mock_app.create_test_user().await;

    let first = mock_app.app.token_service.generate_token(user.id).await.unwrap();
    let second = mock_app.app.token_service.generate_token(user.id).await.unwrap();
    assert_ne!(first.token, second.token);

    mock_app
        .app
        .token_service
        .invalidate_user_tokens(user.id)
        .await
        .unwrap();

    assert!(mock_app
        .app
        .token_service
        .check_token_validity(&first.token)
        .await
        .is_err());
    assert!(mock_app
        .app
        .token_service
        .check_token_validity(&second.token)
        .await
        .is_err());
}

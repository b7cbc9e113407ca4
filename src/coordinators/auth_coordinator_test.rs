use std::sync::Arc;

use crate::app_data::AppData;
use crate::coordinators::{AuthCoordinator, LoginResponse};
use crate::errors::AdminError;
use crate::test::utils::{ctx_for, seed_role, seed_user, setup_test_app};
use crate::types::dto::auth::{ChangePasswordRequest, LoginRequest};
use crate::types::internal::{RequestContext, RoleStatus, User, UserStatus, UserUpdate};

async fn setup() -> (Arc<AppData>, AuthCoordinator, User) {
    let app = setup_test_app().await;
    let role = seed_role(&app, "member", 10).await;
    let user = seed_user(&app, "alice", "alice-pass", vec![role.id]).await;
    (app.clone(), AuthCoordinator::new(app), user)
}

fn login(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

fn change(old_password: &str, new_password: &str) -> ChangePasswordRequest {
    ChangePasswordRequest {
        old_password: old_password.to_string(),
        new_password: new_password.to_string(),
    }
}

#[tokio::test]
async fn test_login_success() {
    let (_app, auth, alice) = setup().await;

    let response = auth.login(&login("alice", "alice-pass")).await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.into_result().unwrap().id, alice.id);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (_app, auth, alice) = setup().await;

    let response = auth.login(&login("alice", "nope")).await.unwrap();

    match &response {
        LoginResponse::WrongPassword { user } => assert_eq!(user.id, alice.id),
        other => panic!("Expected WrongPassword, got {:?}", other),
    }
    assert!(matches!(response.into_result(), Err(AdminError::WrongPassword)));
}

#[tokio::test]
async fn test_login_unknown_user() {
    let (_app, auth, _) = setup().await;

    let result = auth.login(&login("ghost", "x")).await;

    assert!(matches!(result, Err(AdminError::UserNotFound(ref name)) if name == "ghost"));
}

#[tokio::test]
async fn test_login_disabled_user_with_correct_password() {
    let (app, auth, alice) = setup().await;
    app.user_store
        .update_fields(alice.id, UserUpdate {
            status: Some(UserStatus::Disabled),
            ..Default::default()
        })
        .await
        .unwrap();

    let result = auth.login(&login("alice", "alice-pass")).await;

    assert!(matches!(result, Err(AdminError::UserDisabled)));
}

#[tokio::test]
async fn test_login_all_roles_disabled() {
    let (app, auth, _) = setup().await;
    let off = app.role_store.create("retired", 4, RoleStatus::Disabled).await.unwrap();
    seed_user(&app, "bob", "bob-pass", vec![off.id]).await;
    seed_user(&app, "carol", "carol-pass", vec![]).await;

    let result = auth.login(&login("bob", "bob-pass")).await;
    assert!(matches!(result, Err(AdminError::AllRolesDisabled)));

    let result = auth.login(&login("carol", "carol-pass")).await;
    assert!(matches!(result, Err(AdminError::AllRolesDisabled)));
}

#[tokio::test]
async fn test_login_one_enabled_role_is_enough() {
    let (app, auth, _) = setup().await;
    let off = app.role_store.create("retired", 4, RoleStatus::Disabled).await.unwrap();
    let on = seed_role(&app, "guest", 20).await;
    seed_user(&app, "bob", "bob-pass", vec![off.id, on.id]).await;

    assert!(auth.login(&login("bob", "bob-pass")).await.unwrap().is_success());
}

#[tokio::test]
async fn test_get_current_user_and_by_id() {
    let (app, auth, alice) = setup().await;
    let ctx = ctx_for(&alice);

    let current = auth.get_current_user(&ctx).await.unwrap();
    assert_eq!(current.username, "alice");
    assert!(app.identity_cache.get("alice").is_some());

    let by_id = auth.get_user_by_id(&ctx, alice.id).await.unwrap();
    assert_eq!(by_id.id, alice.id);

    assert!(matches!(auth.get_user_by_id(&ctx, 999).await, Err(AdminError::NotFound(_))));
    assert!(matches!(
        auth.get_user_by_id(&RequestContext::for_system(), alice.id).await,
        Err(AdminError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_change_password_wrong_old_mutates_nothing() {
    let (app, auth, alice) = setup().await;
    let ctx = ctx_for(&alice);
    auth.get_current_user(&ctx).await.unwrap();
    let cached_before = app.identity_cache.get("alice").unwrap();

    let result = auth.change_password(&ctx, &change("wrong", "fresh-pass")).await;

    assert!(matches!(result, Err(AdminError::WrongOldPassword)));
    let stored = app.user_store.find_by_id(alice.id).await.unwrap();
    assert_eq!(stored.password_hash, "test-hash:alice-pass");
    assert_eq!(stored.updated_at, alice.updated_at);
    assert_eq!(app.identity_cache.get("alice").unwrap(), cached_before);
}

#[tokio::test]
async fn test_change_password_updates_store_and_cache() {
    let (app, auth, alice) = setup().await;
    let ctx = ctx_for(&alice);
    auth.get_current_user(&ctx).await.unwrap();

    auth.change_password(&ctx, &change("alice-pass", "fresh-pass")).await.unwrap();

    assert_eq!(
        app.identity_cache.get("alice").unwrap().password_hash,
        "test-hash:fresh-pass"
    );
    assert!(auth.login(&login("alice", "fresh-pass")).await.unwrap().is_success());
    assert!(!auth.login(&login("alice", "alice-pass")).await.unwrap().is_success());
}

#[tokio::test]
async fn test_change_password_reads_store_not_stale_cache() {
    let (app, auth, alice) = setup().await;
    let mut stale = alice.clone();
    stale.password_hash = "test-hash:stale-pass".to_string();
    app.identity_cache.put("alice", stale, None);

    let ctx = ctx_for(&alice);
    let result = auth.change_password(&ctx, &change("stale-pass", "fresh-pass")).await;
    assert!(matches!(result, Err(AdminError::WrongOldPassword)));

    auth.change_password(&ctx, &change("alice-pass", "fresh-pass")).await.unwrap();
    assert_eq!(
        app.identity_cache.get("alice").unwrap().password_hash,
        "test-hash:fresh-pass"
    );
}

#[tokio::test]
async fn test_by_id_fill_read_before_password_change_never_lands() {
    let (app, auth, alice) = setup().await;
    let ctx = ctx_for(&alice);

    // A by-id read takes its ticket, then reads, then is suspended
    let ticket = app.identity_cache.fill_ticket("alice");
    let stale = app.user_store.find_by_id(alice.id).await.unwrap();

    auth.change_password(&ctx, &change("alice-pass", "fresh-pass")).await.unwrap();

    assert!(!app.identity_cache.put_if_unchanged("alice", stale, ticket));
    assert_eq!(
        app.identity_cache.get("alice").unwrap().password_hash,
        "test-hash:fresh-pass"
    );
    assert_eq!(
        auth.get_current_user(&ctx).await.unwrap().password_hash,
        "test-hash:fresh-pass"
    );
}

#[tokio::test]
async fn test_refresh_reloads_instead_of_trusting_its_argument() {
    let (app, auth, alice) = setup().await;
    let ctx = ctx_for(&alice);
    let stale = app.user_store.find_by_id(alice.id).await.unwrap();

    auth.change_password(&ctx, &change("alice-pass", "fresh-pass")).await.unwrap();
    let refreshed = app.user_provider.refresh(stale).await;

    assert_eq!(refreshed.password_hash, "test-hash:fresh-pass");
    assert_eq!(
        app.identity_cache.get("alice").unwrap().password_hash,
        "test-hash:fresh-pass"
    );
}

#[tokio::test]
async fn test_get_user_by_id_after_password_change_sees_new_digest() {
    let (app, auth, alice) = setup().await;
    let ctx = ctx_for(&alice);
    auth.get_user_by_id(&ctx, alice.id).await.unwrap();

    auth.change_password(&ctx, &change("alice-pass", "fresh-pass")).await.unwrap();
    let by_id = auth.get_user_by_id(&ctx, alice.id).await.unwrap();

    assert_eq!(by_id.password_hash, "test-hash:fresh-pass");
    assert_eq!(app.identity_cache.get("alice").unwrap(), by_id);
}

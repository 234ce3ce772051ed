//! Integration tests for refresh, logout and session revocation.

mod helpers;

use chrono::{Duration, Utc};
use uuid::Uuid;

use authcenter_auth::JwtEncoder;
use authcenter_auth::service::VerifyTokenRequest;
use authcenter_core::ErrorKind;
use authcenter_database::repositories::RoleRepository;
use authcenter_entity::user::{RoleGrant, UserStatus};

use helpers::{PASSWORD, TestApp, test_config, username_login};

fn verify(app: &TestApp, token: &str) -> authcenter_auth::service::VerifyResult {
    app.service.verify_token(&VerifyTokenRequest {
        token: token.to_string(),
        ..VerifyTokenRequest::default()
    })
}

#[tokio::test]
async fn test_end_to_end_lifecycle() {
    let app = TestApp::new();
    let user = app.register("alice").await;

    let err = app
        .service
        .login(username_login("alice", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidCredentials);

    let first = app.login("alice").await;
    let claims = verify(&app, &first.access_token);
    assert!(claims.valid);
    assert_eq!(claims.user_id, Some(user.id));
    assert_eq!(claims.username.as_deref(), Some("alice"));
    assert_eq!(claims.roles, vec!["User".to_string()]);

    let second = app.service.refresh_token(&first.refresh_token).await.unwrap();
    assert_ne!(second.access_token, first.access_token);
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_eq!(second.user_id, user.id);

    app.service.logout(&second.access_token).await.unwrap();

    for token in [&first.refresh_token, &second.refresh_token] {
        let err = app.service.refresh_token(token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionInvalid);
    }
}

#[tokio::test]
async fn test_logout_leaves_other_principals_untouched() {
    let app = TestApp::new();
    app.register("alice").await;
    app.register("bob").await;

    let alice_laptop = app.login("alice").await;
    let alice_phone = app.login("alice").await;
    let bob = app.login("bob").await;

    app.service.logout(&alice_laptop.access_token).await.unwrap();

    for token in [&alice_laptop.refresh_token, &alice_phone.refresh_token] {
        let err = app.service.refresh_token(token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionInvalid);
    }
    app.service.refresh_token(&bob.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_logout_requires_access_token() {
    let app = TestApp::new();
    app.register("alice").await;
    let tokens = app.login("alice").await;

    let err = app.service.logout(&tokens.refresh_token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenInvalid);

    // Nothing was revoked.
    app.service.refresh_token(&tokens.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let app = TestApp::new();
    app.register("alice").await;
    let tokens = app.login("alice").await;

    let err = app
        .service
        .refresh_token(&tokens.access_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenInvalid);
}

#[tokio::test]
async fn test_expired_refresh_token_rejected() {
    let app = TestApp::new();
    let user = app.register("alice").await;

    let encoder = JwtEncoder::new(&app.config.auth);
    let issued_at = Utc::now() - Duration::hours(app.config.auth.jwt_refresh_ttl_hours as i64 + 1);
    let (token, _) = encoder
        .issue_refresh_token_at(user.id, issued_at)
        .unwrap();

    let err = app.service.refresh_token(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TokenExpired);
}

#[tokio::test]
async fn test_unknown_session_is_invalid() {
    let app = TestApp::new();
    let user = app.register("alice").await;

    // Correctly signed, but no session was ever stored under this JTI.
    let encoder = JwtEncoder::new(&app.config.auth);
    let (token, _) = encoder
        .issue_refresh_token_at(user.id, Utc::now())
        .unwrap();

    let err = app.service.refresh_token(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionInvalid);
}

#[tokio::test]
async fn test_refresh_recomputes_permission_snapshot() {
    let app = TestApp::new();
    let user = app.register("alice").await;
    let before = app.login("alice").await;

    let editor = app.roles.get_by_name("Editor").await.unwrap();
    app.users
        .grant_role(user.id, RoleGrant::system(editor.id, "Editor"))
        .await
        .unwrap();

    let after = app.service.refresh_token(&before.refresh_token).await.unwrap();

    let old = verify(&app, &before.access_token);
    let new = verify(&app, &after.access_token);
    assert_eq!(old.permissions.len(), 5);
    assert_eq!(new.permissions.len(), 11);
    assert_eq!(new.roles, vec!["User".to_string(), "Editor".to_string()]);
    assert!(!old.permissions.contains(&"knowledge:PUBLISH".to_string()));
    assert!(new.permissions.contains(&"knowledge:PUBLISH".to_string()));
}

#[tokio::test]
async fn test_expired_grant_drops_out_on_refresh() {
    let app = TestApp::new();
    let user = app.register("alice").await;

    let admin = app.roles.get_by_name("Admin").await.unwrap();
    let mut grant = RoleGrant::system(admin.id, "Admin");
    grant.expires_at = Some(Utc::now() - Duration::minutes(1));
    app.users.grant_role(user.id, grant).await.unwrap();

    let tokens = app.login("alice").await;
    let result = verify(&app, &tokens.access_token);
    assert_eq!(result.roles, vec!["User".to_string()]);
    assert!(!result.permissions.contains(&"user:MANAGE".to_string()));
}

#[tokio::test]
async fn test_refresh_after_principal_deleted() {
    let app = TestApp::new();
    let user = app.register("alice").await;
    let tokens = app.login("alice").await;

    assert!(app.users.delete(user.id).await);

    let err = app
        .service
        .refresh_token(&tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PrincipalNotFound);
}

#[tokio::test]
async fn test_refresh_after_principal_locked() {
    let app = TestApp::new();
    let user = app.register("alice").await;
    let tokens = app.login("alice").await;

    app.users.set_status(user.id, UserStatus::Inactive).await.unwrap();

    let err = app
        .service
        .refresh_token(&tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccountDisabled);
}

#[tokio::test]
async fn test_refresh_token_reusable_without_rotation() {
    let app = TestApp::new();
    app.register("alice").await;
    let tokens = app.login("alice").await;

    app.service.refresh_token(&tokens.refresh_token).await.unwrap();
    app.service.refresh_token(&tokens.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_rotation_rejects_replay() {
    let mut config = test_config();
    config.auth.rotate_refresh_tokens = true;
    let app = TestApp::with_config(config);
    app.register("alice").await;
    let tokens = app.login("alice").await;

    let next = app.service.refresh_token(&tokens.refresh_token).await.unwrap();
    let err = app
        .service
        .refresh_token(&tokens.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionInvalid);

    app.service.refresh_token(&next.refresh_token).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rotation_concurrent_refresh_single_winner() {
    let mut config = test_config();
    config.auth.rotate_refresh_tokens = true;
    let app = TestApp::with_config(config);
    app.register("alice").await;
    let tokens = app.login("alice").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = app.service.clone();
            let token = tokens.refresh_token.clone();
            tokio::spawn(async move { service.refresh_token(&token).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e.kind, ErrorKind::SessionInvalid),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_list_and_revoke_sessions() {
    let app = TestApp::new();
    app.register("alice").await;
    let first = app.login("alice").await;
    let second = app.login("alice").await;

    let sessions = app.service.list_sessions(&second.access_token).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].created_at >= sessions[1].created_at);

    let target = sessions[1].id;
    app.service.revoke_session(target).await.unwrap();

    let remaining = app.service.list_sessions(&first.access_token).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_ne!(remaining[0].id, target);

    let err = app.service.revoke_session(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionNotFound);
}

#[tokio::test]
async fn test_login_after_logout_opens_fresh_session() {
    let app = TestApp::new();
    app.register("alice").await;
    let tokens = app.login("alice").await;
    app.service.logout(&tokens.access_token).await.unwrap();

    let again = app
        .service
        .login(username_login("alice", PASSWORD))
        .await
        .unwrap();
    app.service.refresh_token(&again.refresh_token).await.unwrap();
}

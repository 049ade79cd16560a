use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{Value, json};

use gatehouse_core::api_types::ACCESS_TOKEN_COOKIE;
use gatehouse_core::store::{SeedOutcome, seed};

#[path = "support/mod.rs"]
mod support;

use support::{
    ADMIN_PASSWORD, bearer, build_test_server, login, memory_store, register, test_crypto,
};

#[tokio::test]
async fn register_then_login_roundtrip() -> Result<()> {
    let server = build_test_server().await?;

    register(&server, "alice", "Password#123").await;

    let response = server
        .post("/login")
        .json(&json!({"username": "alice", "password": "Password#123"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));

    let verify = server
        .get("/verify")
        .add_header("Authorization", bearer(body["access_token"].as_str().unwrap()))
        .await;
    verify.assert_status_ok();
    let identity: Value = verify.json();
    assert_eq!(identity["username"], "alice");
    assert_eq!(identity["roles"], json!(["user"]));

    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_credentials_indistinguishably() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "bob", "Password#123").await;

    let wrong_password = server
        .post("/login")
        .json(&json!({"username": "bob", "password": "nope"}))
        .await;
    wrong_password.assert_status(StatusCode::UNAUTHORIZED);

    let unknown_user = server
        .post("/login")
        .json(&json!({"username": "nobody", "password": "nope"}))
        .await;
    unknown_user.assert_status(StatusCode::UNAUTHORIZED);

    let wrong: Value = wrong_password.json();
    let unknown: Value = unknown_user.json();
    assert_eq!(wrong["error"]["message"], unknown["error"]["message"]);

    Ok(())
}

#[tokio::test]
async fn email_login_prefers_the_globally_unique_username() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "carol", "Password#123").await;

    let by_email = server
        .post("/login")
        .json(&json!({"username": "carol@example.com", "password": "Password#123"}))
        .await;
    by_email.assert_status_ok();

    // Usernames are globally unique, so the local part resolves the account
    // even when the domain half does not match anything.
    let odd_domain = server
        .post("/login")
        .json(&json!({"username": "carol@elsewhere.example", "password": "Password#123"}))
        .await;
    odd_domain.assert_status_ok();

    // The `email` key is an accepted alias for the identifier.
    let aliased = server
        .post("/login")
        .json(&json!({"email": "carol", "password": "Password#123"}))
        .await;
    aliased.assert_status_ok();

    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_is_single_use() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "dave", "Password#123").await;
    let (_, refresh_token) = login(&server, "dave", "Password#123").await;

    let first = server
        .post("/tokens/refresh")
        .json(&json!({"refresh_token": refresh_token}))
        .await;
    first.assert_status_ok();
    let rotated: Value = first.json();
    let next_refresh = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(next_refresh, refresh_token, "refresh must rotate the token");

    // The consumed token is gone; replaying it fails.
    let replay = server
        .post("/tokens/refresh")
        .json(&json!({"refresh_token": refresh_token}))
        .await;
    replay.assert_status(StatusCode::UNAUTHORIZED);

    // The rotated token is live and itself single-use.
    let second = server
        .post("/tokens/refresh")
        .json(&json!({"refresh_token": next_refresh}))
        .await;
    second.assert_status_ok();

    Ok(())
}

#[tokio::test]
async fn refreshed_access_token_verifies() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "erin", "Password#123").await;
    let (_, refresh_token) = login(&server, "erin", "Password#123").await;

    let response = server
        .post("/tokens/refresh")
        .json(&json!({"refresh_token": refresh_token}))
        .await;
    response.assert_status_ok();
    let pair: Value = response.json();

    let verify = server
        .get("/verify")
        .add_header("Authorization", bearer(pair["access_token"].as_str().unwrap()))
        .await;
    verify.assert_status_ok();
    let identity: Value = verify.json();
    assert_eq!(identity["username"], "erin");

    Ok(())
}

#[tokio::test]
async fn verify_without_a_token_is_unauthorized_with_a_challenge() -> Result<()> {
    let server = build_test_server().await?;

    let response = server.get("/verify").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header("www-authenticate"), "Bearer");

    let garbage = server
        .get("/verify")
        .add_header("Authorization", bearer("not-a-token"))
        .await;
    garbage.assert_status(StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn verify_falls_back_to_the_access_token_cookie() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "frank", "Password#123").await;
    let (access_token, _) = login(&server, "frank", "Password#123").await;

    let response = server
        .get("/verify")
        .add_header("Cookie", format!("{ACCESS_TOKEN_COOKIE}={access_token}"))
        .await;
    response.assert_status_ok();
    let identity: Value = response.json();
    assert_eq!(identity["username"], "frank");

    Ok(())
}

#[tokio::test]
async fn revoking_blocks_exactly_that_token() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "grace", "Password#123").await;
    let (first_access, _) = login(&server, "grace", "Password#123").await;
    let (second_access, _) = login(&server, "grace", "Password#123").await;

    // An empty body revokes the token the caller authenticated with.
    let revoke = server
        .post("/tokens/revoke")
        .add_header("Authorization", bearer(&first_access))
        .await;
    revoke.assert_status_ok();
    let receipt: Value = revoke.json();
    assert_eq!(receipt["status"], "revoked");
    assert!(receipt["jti"].as_str().is_some(), "access revocation echoes the jti");

    let revoked = server
        .get("/verify")
        .add_header("Authorization", bearer(&first_access))
        .await;
    revoked.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = revoked.json();
    assert_eq!(body["error"]["message"], "logged out");

    // The user's other session is untouched.
    let sibling = server
        .get("/verify")
        .add_header("Authorization", bearer(&second_access))
        .await;
    sibling.assert_status_ok();

    Ok(())
}

#[tokio::test]
async fn revocation_by_jti_is_idempotent() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "heidi", "Password#123").await;
    let (access_token, _) = login(&server, "heidi", "Password#123").await;

    let revoke = server
        .post("/tokens/revoke")
        .add_header("Authorization", bearer(&access_token))
        .await;
    revoke.assert_status_ok();
    let receipt: Value = revoke.json();
    let jti = receipt["jti"].as_str().unwrap().to_string();

    // Revoking the same id again succeeds; the caller needs a live token to
    // reach the endpoint, so authenticate with a fresh pair.
    let (fresh_access, _) = login(&server, "heidi", "Password#123").await;
    let again = server
        .post("/tokens/revoke")
        .add_header("Authorization", bearer(&fresh_access))
        .json(&json!({"jti": jti}))
        .await;
    again.assert_status_ok();
    let second: Value = again.json();
    assert_eq!(second["jti"].as_str().unwrap(), jti);

    let malformed = server
        .post("/tokens/revoke")
        .add_header("Authorization", bearer(&fresh_access))
        .json(&json!({"jti": "not-a-uuid"}))
        .await;
    malformed.assert_status(StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn revoking_a_refresh_token_kills_refresh_but_not_access() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "ivan", "Password#123").await;
    let (access_token, refresh_token) = login(&server, "ivan", "Password#123").await;

    let revoke = server
        .post("/tokens/revoke")
        .add_header("Authorization", bearer(&access_token))
        .json(&json!({"token": refresh_token}))
        .await;
    revoke.assert_status_ok();
    let receipt: Value = revoke.json();
    assert_eq!(receipt["status"], "revoked");
    assert!(receipt["jti"].is_null(), "refresh revocation has no jti to echo");

    let refresh = server
        .post("/tokens/refresh")
        .json(&json!({"refresh_token": refresh_token}))
        .await;
    refresh.assert_status(StatusCode::UNAUTHORIZED);

    // Revoking the refresh token does not invalidate the access token.
    let verify = server
        .get("/verify")
        .add_header("Authorization", bearer(&access_token))
        .await;
    verify.assert_status_ok();

    Ok(())
}

#[tokio::test]
async fn revoking_an_unrecognizable_token_is_a_bad_request() -> Result<()> {
    let server = build_test_server().await?;
    register(&server, "judy", "Password#123").await;
    let (access_token, _) = login(&server, "judy", "Password#123").await;

    let response = server
        .post("/tokens/revoke")
        .add_header("Authorization", bearer(&access_token))
        .json(&json!({"token": "neither-kind-of-token"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn registration_validates_its_input() -> Result<()> {
    let server = build_test_server().await?;

    let at_sign = server
        .post("/register")
        .json(&json!({
            "username": "eve@corp",
            "password": "Password#123",
            "domain": "example.com",
        }))
        .await;
    at_sign.assert_status(StatusCode::BAD_REQUEST);

    let empty_password = server
        .post("/register")
        .json(&json!({
            "username": "eve",
            "password": "",
            "domain": "example.com",
        }))
        .await;
    empty_password.assert_status(StatusCode::BAD_REQUEST);

    let unknown_domain = server
        .post("/register")
        .json(&json!({
            "username": "eve",
            "password": "Password#123",
            "domain": "nowhere.example",
        }))
        .await;
    unknown_domain.assert_status(StatusCode::NOT_FOUND);

    register(&server, "eve", "Password#123").await;
    let duplicate = server
        .post("/register")
        .json(&json!({
            "username": "eve",
            "password": "Other#456",
            "domain": "example.com",
        }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn the_full_session_lifecycle_holds_together() -> Result<()> {
    let server = build_test_server().await?;

    server
        .post("/register")
        .json(&json!({
            "username": "alice",
            "password": "Secret123",
            "domain": "example.com",
        }))
        .await
        .assert_status_ok();

    let issued = server
        .post("/login")
        .json(&json!({"username": "alice@example.com", "password": "Secret123"}))
        .await;
    issued.assert_status_ok();
    let pair: Value = issued.json();
    let login_refresh = pair["refresh_token"].as_str().unwrap().to_string();

    let first = server
        .post("/tokens/refresh")
        .json(&json!({"refresh_token": login_refresh}))
        .await;
    first.assert_status_ok();
    let first_pair: Value = first.json();
    let first_refresh = first_pair["refresh_token"].as_str().unwrap().to_string();

    let second = server
        .post("/tokens/refresh")
        .json(&json!({"refresh_token": first_refresh}))
        .await;
    second.assert_status_ok();
    let second_pair: Value = second.json();
    let final_access = second_pair["access_token"].as_str().unwrap().to_string();

    // The second rotation consumed the first one's token.
    server
        .post("/tokens/refresh")
        .json(&json!({"refresh_token": first_refresh}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let live = server
        .get("/verify")
        .add_header("Authorization", bearer(&final_access))
        .await;
    live.assert_status_ok();

    let revoke = server
        .post("/tokens/revoke")
        .add_header("Authorization", bearer(&final_access))
        .await;
    revoke.assert_status_ok();

    let dead = server
        .get("/verify")
        .add_header("Authorization", bearer(&final_access))
        .await;
    dead.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = dead.json();
    assert_eq!(body["error"]["message"], "logged out");

    Ok(())
}

#[tokio::test]
async fn health_is_public() -> Result<()> {
    let server = build_test_server().await?;

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn seeding_twice_changes_nothing() -> Result<()> {
    let store = memory_store();
    let crypto = test_crypto();

    let first = seed(&store, &crypto, "admin@example.com", ADMIN_PASSWORD).await?;
    assert!(matches!(first, SeedOutcome::Created));

    let second = seed(&store, &crypto, "admin@example.com", ADMIN_PASSWORD).await?;
    assert!(matches!(second, SeedOutcome::Existing));

    let admin = store
        .users
        .find_by_username("admin")
        .await?
        .expect("seeded admin");
    let roles = store.users.roles_of(admin.id).await?;
    assert_eq!(roles, vec!["admin".to_string(), "user".to_string()]);

    Ok(())
}

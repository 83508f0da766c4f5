mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::TestApp;
use taskdeck_api::database::IdentityStore;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new();

    let reply = app.send(Method::GET, "/health", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["status"], "ok");

    let root = app.send(Method::GET, "/", None, None).await?;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.data()["name"], "Taskdeck API");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let app = TestApp::new();

    let reply = app.send(Method::GET, "/api/workspaces", None, None).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["code"], "UNAUTHORIZED");

    let reply = app
        .send(Method::GET, "/api/auth/whoami", Some("not-a-jwt"), None)
        .await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn whoami_reports_the_caller() -> Result<()> {
    let app = TestApp::new();
    let ada = app.user("ada@example.com").await?;

    let reply = app.get("/api/auth/whoami", &ada).await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.data()["email"], "ada@example.com");
    assert_eq!(reply.data()["is_super_admin"], false);
    Ok(())
}

#[tokio::test]
async fn token_for_unknown_or_inactive_user_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let ghost = app.user("ghost@example.com").await?;

    // Same token, but the account no longer exists in this store
    let other = TestApp::new();
    let reply = other.get("/api/auth/whoami", &ghost).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let mut inactive = taskdeck_api::database::models::User::new("idle@example.com", "Idle");
    inactive.is_active = false;
    app.store.insert_user(&inactive).await?;
    let token = taskdeck_api::auth::generate_jwt(&taskdeck_api::auth::Claims::for_user(&inactive))?;
    let reply = app.send(Method::GET, "/api/auth/whoami", Some(&token), None).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

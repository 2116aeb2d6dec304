mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use uuid::Uuid;

use common::TestApp;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app.send(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_is_public() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app.send(Method::GET, "/", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn api_routes_require_a_bearer_token() -> Result<()> {
    let app = TestApp::new()?;

    for uri in ["/api/auth/whoami", "/api/configurations", "/api/data/reports"] {
        let (status, body) = app.send(Method::GET, uri, None, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn forged_tokens_are_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let (status, _) = app.send(Method::GET, "/api/auth/whoami", Some("not.a.jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn whoami_reports_store_user_scope() -> Result<()> {
    let app = TestApp::new()?;
    let (user_id, token) = app.login("user", "Acme", Some("S1")).await?;

    let (status, body) = app.get("/api/auth/whoami", &token).await?;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["user_id"], user_id.to_string());
    assert_eq!(data["company"], "Acme");
    assert_eq!(data["store"], "S1");
    assert_eq!(data["access_class"], "store_user");
    assert_eq!(data["scope"]["scope"], "store");
    Ok(())
}

#[tokio::test]
async fn whoami_normalizes_super_admin_spelling() -> Result<()> {
    let app = TestApp::new()?;
    let token = app.token_for(Uuid::new_v4(), " Super_Admin ", "Acme", None)?;

    let (status, body) = app.get("/api/auth/whoami", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["access_class"], "super_admin");
    assert_eq!(body["data"]["scope"]["scope"], "company");
    Ok(())
}

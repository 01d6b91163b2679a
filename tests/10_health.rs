mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_reports_unreachable_store() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::get(server.url("/api/health")).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["database"], "disconnected");
    assert!(body["uptime"].is_u64(), "uptime missing: {}", body);
    Ok(())
}

#[tokio::test]
async fn root_banner_is_served() -> Result<()> {
    let server = common::start_server().await?;

    let body = reqwest::get(server.url("/")).await?.json::<Value>().await?;
    assert_eq!(body["name"], "Campus Navigation API");
    assert_eq!(body["endpoints"]["paths"], "/api/paths");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_404() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::get(server.url("/api/teleporters")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

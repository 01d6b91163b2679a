mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::start_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/dashboard/overview")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = client.post(server.url("/api/paths")).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.delete(server.url("/api/buildings/00000000-0000-0000-0000-000000000001")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn forged_tokens_are_rejected() -> Result<()> {
    let server = common::start_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/api/notifications"))
        .bearer_auth("not.a.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Invalid or expired token");
    Ok(())
}

#[tokio::test]
async fn valid_token_needs_the_store_to_resolve_the_account() -> Result<()> {
    let server = common::start_server().await?;
    let token = common::token_for("admin", "00000000-0000-0000-0000-000000000001");

    let res = reqwest::Client::new()
        .get(server.url("/api/admins"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn sign_in_bodies_are_validated_before_lookup() -> Result<()> {
    let server = common::start_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/admins/login"))
        .json(&json!({ "email": "not-an-email", "password": "x" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["errors"]["email"].is_string(), "expected an email error: {}", body);

    let res = client
        .post(server.url("/api/users/login"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn registration_enforces_password_strength() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/admins/register"))
        .json(&json!({
            "firstName": "Thandi",
            "lastName": "Nkosi",
            "email": "thandi@campus.example",
            "password": "password"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["errors"]["password"].is_string(), "expected a password error: {}", body);
    Ok(())
}

#[tokio::test]
async fn reset_requires_a_strong_password() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/admins/reset-password/abc123"))
        .json(&json!({ "password": "short" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

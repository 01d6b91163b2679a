mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn building_list_falls_back_to_sample_data() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::get(server.url("/api/buildings?campus=Main%20Campus")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["pagination"]["totalItems"], 2);
    assert_eq!(body["data"][0]["code"], "MAB");
    Ok(())
}

#[tokio::test]
async fn reads_without_fallback_report_unavailable() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::get(server.url("/api/paths")).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_rejected() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::get(server.url("/api/buildings/12345")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Invalid building ID");

    let res = reqwest::get(server.url("/api/paths/not-a-path")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn nearby_validates_coordinates_and_limits() -> Result<()> {
    let server = common::start_server().await?;

    let res = reqwest::get(server.url("/api/buildings/nearby/95/30.98")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = reqwest::get(server.url("/api/paths/nearby/-25.43/30.98?radius=-5")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = reqwest::get(server.url("/api/buildings/nearby/-25.43/30.98?radius=100000000")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = reqwest::get(server.url("/api/paths/nearby/-25.43/30.98?limit=500")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert!(body["errors"]["limit"].is_string(), "expected a limit error: {}", body);
    Ok(())
}

#[tokio::test]
async fn query_vocabulary_is_checked() -> Result<()> {
    let server = common::start_server().await?;

    for path in [
        "/api/paths/types/teleport",
        "/api/buildings?type=castle",
        "/api/buildings?sortBy=password_hash",
        "/api/paths?status=vanished",
        "/api/buildings?page=0",
        "/api/buildings?page=30000000&limit=100",
    ] {
        let res = reqwest::get(server.url(path)).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", path);
    }
    Ok(())
}

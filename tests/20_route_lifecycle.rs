mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn available_routes_respect_the_window() -> Result<()> {
    let server = common::ensure_server().await?;

    let (status, body) = common::get(server, "/routes/available").await?;
    assert_eq!(status, StatusCode::OK);
    let ids = common::ids(&body["data"]["routes"]);
    assert!(ids.contains(&"listed".to_string()), "got {:?}", ids);
    assert!(!ids.contains(&"far-future".to_string()));
    assert!(!ids.contains(&"held-by-g4".to_string()));
    assert!(!ids.contains(&"shift-open".to_string()));

    let listed = body["data"]["routes"]
        .as_array()
        .and_then(|routes| routes.iter().find(|r| r["id"] == "listed"))
        .cloned()
        .unwrap_or_default();
    assert_eq!(listed["status"], "closed");
    assert_eq!(listed["materials"], json!(["metal"]));
    assert_eq!(listed["formatted_date"].as_str().map(str::len), Some(16));
    Ok(())
}

#[tokio::test]
async fn full_lifecycle() -> Result<()> {
    let server = common::ensure_server().await?;
    let route = json!({"user_id": "g1", "route_id": "lifecycle"});

    let (status, body) = common::post(server, "/routes/assign", route.clone()).await?;
    assert_eq!(status, StatusCode::NO_CONTENT, "{}", body);

    // re-submitting is harmless
    let (status, _) = common::post(server, "/routes/assign", route.clone()).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = common::post(server, "/routes/start", route.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    let started = &body["data"]["assigned_route"];
    assert_eq!(started["status"], "initiated");
    assert_eq!(started["picking_points"].as_array().map(Vec::len), Some(2));
    assert_eq!(started["picking_points"][0]["materials"], json!(["glass"]));

    let finish = |stop: &str| json!({"user_id": "g1", "route_id": "lifecycle", "picking_point_id": stop});

    let (status, body) = common::post(server, "/routes/finish-picking-point", finish("s1")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "initiated");
    assert_eq!(common::ids(&body["data"]["picking_points"]), vec!["s2"]);

    // finishing the same stop again reports the same progress
    let (status, body) = common::post(server, "/routes/finish-picking-point", finish("s1")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::ids(&body["data"]["picking_points"]), vec!["s2"]);

    let (status, body) = common::post(server, "/routes/finish-picking-point", finish("s2")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "finished");
    assert_eq!(body["data"]["picking_points"], json!([]));
    Ok(())
}

#[tokio::test]
async fn concurrent_assignment_has_one_winner() -> Result<()> {
    let server = common::ensure_server().await?;

    let attempts = ["g1", "g2", "g3"].map(|gatherer| {
        common::post(
            server,
            "/routes/assign",
            json!({"user_id": gatherer, "route_id": "contested"}),
        )
    });
    let results = futures::future::join_all(attempts).await;

    let mut winners = 0;
    for result in results {
        let (status, body) = result?;
        match status {
            StatusCode::NO_CONTENT => winners += 1,
            StatusCode::CONFLICT => assert_eq!(body["code"], "CONFLICT"),
            other => panic!("unexpected status {} with {}", other, body),
        }
    }
    assert_eq!(winners, 1);
    Ok(())
}

#[tokio::test]
async fn only_the_assigned_gatherer_works_the_route() -> Result<()> {
    let server = common::ensure_server().await?;

    let (status, _) = common::post(
        server,
        "/routes/assign",
        json!({"user_id": "g2", "route_id": "guarded"}),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = common::post(
        server,
        "/routes/finish-picking-point",
        json!({"user_id": "g1", "route_id": "guarded", "picking_point_id": "s3"}),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = common::post(server, "/routes/start", json!({"user_id": "u1", "route_id": "guarded"})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::post(
        server,
        "/routes/finish-picking-point",
        json!({"user_id": "g2", "route_id": "guarded", "picking_point_id": "nonexistent-id"}),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field_errors"]["picking_point_id"], "nonexistent-id");

    // the stop is still pending for its gatherer
    let (status, body) = common::post(
        server,
        "/routes/finish-picking-point",
        json!({"user_id": "g2", "route_id": "guarded", "picking_point_id": "s3"}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "finished");
    Ok(())
}

#[tokio::test]
async fn assigned_routes_per_gatherer() -> Result<()> {
    let server = common::ensure_server().await?;

    let (status, body) = common::get(server, "/gatherers/g4/routes").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::ids(&body["data"]["assigned_routes"]), vec!["held-by-g4"]);

    let (status, _) = common::get(server, "/gatherers/u1/routes").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::get(server, "/gatherers/nobody/routes").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_requests_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;

    let (status, body) = common::post(server, "/routes/assign", json!({"user_id": "g1"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "route_id cannot be empty");

    let (status, body) = common::post(server, "/routes/start", json!({"user_id": "g1", "route_id": "missing"})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "route not found");

    let response = reqwest::Client::new()
        .post(server.url("/routes/start"))
        .header("content-type", "application/json")
        .body("{")
        .send()
        .await?;
    let (status, body) = common::read(response).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

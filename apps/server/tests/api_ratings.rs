//! Ratings API tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestContext;

#[tokio::test]
async fn ratings_start_empty() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/decks/1/ratings").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["ratings"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn rating_round_trip() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .put("/api/cards/1/rating")
        .json(&json!({"deck_id": 1, "rating": "favorite"}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["rating"], "favorite");

    let response = server.get("/api/decks/1/ratings").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["ratings"]["1"], json!(["favorite"]));

    // An empty rating clears the entry.
    let response = server
        .put("/api/cards/1/rating")
        .json(&json!({"deck_id": 1, "rating": ""}))
        .await;
    response.assert_status_ok();

    let response = server.get("/api/decks/1/ratings").await;
    let body: serde_json::Value = response.json();
    assert!(body["ratings"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_rating_label_is_rejected() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .put("/api/cards/1/rating")
        .json(&json!({"deck_id": 1, "rating": "great"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn favorites_aggregate_across_packages() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/favorites").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["cards"].as_array().unwrap().is_empty());

    server
        .put("/api/cards/2/rating")
        .json(&json!({"deck_id": 1, "rating": "favorite"}))
        .await
        .assert_status_ok();

    let response = server.get("/api/favorites").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let cards = body["cards"].as_array().unwrap();

    // Card 2 is favorited in the sample package; the minimal package's deck
    // shares the deck id but its card ids don't match the favorite set.
    assert!(cards.iter().any(|card| card["id"] == 2 && card["type"] == "cloze"));
}

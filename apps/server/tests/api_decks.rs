//! Decks API tests.

mod common;

use axum::http::StatusCode;

use common::TestContext;

#[tokio::test]
async fn list_decks_reports_counts_and_current_package() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/decks").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["total_cards"], 3);
    assert_eq!(body["current_package"], "sample.apkg");

    let decks = body["decks"].as_array().unwrap();
    assert_eq!(decks.len(), 1);
    assert_eq!(decks[0]["deck_id"], 1);
    assert_eq!(decks[0]["name"], "Default");
    assert_eq!(decks[0]["card_count"], 3);
}

#[tokio::test]
async fn deck_detail_returns_rendered_cards() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/decks/1").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "Default");
    let cards = body["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 3);

    assert_eq!(cards[0]["type"], "basic");
    assert!(cards[0]["question"].as_str().unwrap().contains("2 + 2"));
    // The answer template starts from FrontSide.
    assert!(cards[0]["answer"].as_str().unwrap().contains("2 + 2"));
    assert!(cards[0]["answer"].as_str().unwrap().contains('4'));
}

#[tokio::test]
async fn unknown_deck_is_not_found() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/decks/99").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn health_endpoint_is_plain() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

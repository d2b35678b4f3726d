//! Cards API tests.

mod common;

use axum::http::StatusCode;

use common::TestContext;

#[tokio::test]
async fn card_list_carries_classification() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/cards").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let cards = body["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 3);

    let types: Vec<&str> = cards
        .iter()
        .map(|card| card["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["basic", "cloze", "image"]);
    assert!(cards.iter().all(|card| card["deck_name"] == "Default"));
}

#[tokio::test]
async fn cloze_card_payload_has_text_and_deletions() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/decks/1/cards/2").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["type"], "cloze");
    assert_eq!(body["text"], "{{c1::Heart}} pumps blood");

    let clozes = body["clozes"].as_array().unwrap();
    assert_eq!(clozes.len(), 1);
    assert_eq!(clozes[0]["num"], 1);
    assert_eq!(clozes[0]["content"], "Heart");

    let question = body["question"].as_str().unwrap();
    assert!(question.contains("cloze-hidden"));
    assert!(!question.contains("Heart"));

    let answer = body["answer"].as_str().unwrap();
    assert!(answer.contains("Heart"));
    assert!(!answer.contains("{{c1"));
    assert!(body["question_revealed"].as_str().unwrap().contains("Heart"));
}

#[tokio::test]
async fn image_card_payload_lists_served_sources() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/decks/1/cards/3").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["type"], "image");
    assert!(body["question"]
        .as_str()
        .unwrap()
        .contains(r#"src="/media/diagram.png""#));

    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0], "/media/diagram.png");
}

#[tokio::test]
async fn unknown_card_is_not_found() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/api/decks/1/cards/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

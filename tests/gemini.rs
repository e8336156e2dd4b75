use httpmock::prelude::*;
use serde_json::json;

use archigen::llm::{ContentRequest, GenerativeApi};
use archigen::{Config, GenerationClient, GenerationError, InlineImage, connect};

fn config(server: &MockServer) -> Config {
    Config {
        base_url: server.base_url(),
        retry_delay_ms: 10,
        ..Config::default()
    }
    .with_api_key("test-key")
}

fn text_body(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

#[tokio::test]
async fn text_request_hits_text_model() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.5-flash:generateContent")
                .header("x-goog-api-key", "test-key")
                .body_contains("\"systemInstruction\"")
                .body_contains("\"temperature\":0.3");
            then.status(200).json_body(text_body(
                "```svg\n<svg viewBox=\"0 0 10 10\"></svg>\n```",
            ));
        })
        .await;

    let client = GenerationClient::new(connect(&config(&server)).unwrap());
    let svg = client.generate_drawing("a hut").await.unwrap();
    assert_eq!(svg, "<svg viewBox=\"0 0 10 10\"></svg>");
    mock.assert_async().await;
}

#[tokio::test]
async fn image_parts_are_decoded() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.5-flash-image:generateContent")
                .body_contains("\"inlineData\"")
                .body_contains("\"mimeType\":\"image/jpeg\"")
                .body_contains("\"responseModalities\"");
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [
                    { "text": "edited" },
                    { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
                ] } }]
            }));
        })
        .await;

    let client = GenerationClient::new(connect(&config(&server)).unwrap());
    let out = client
        .edit_image(&InlineImage::new("image/jpeg", vec![9, 9]), "add a window")
        .await
        .unwrap();
    assert_eq!(out, InlineImage::png(vec![1, 2, 3]));
    mock.assert_async().await;
}

#[tokio::test]
async fn layout_request_carries_schema() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("\"responseMimeType\":\"application/json\"")
                .body_contains("\"responseSchema\"");
            then.status(200)
                .json_body(text_body(r#"{"items":[{"type":"CHAIR","x":1,"y":2}]}"#));
        })
        .await;

    let client = GenerationClient::new(connect(&config(&server)).unwrap());
    let items = client.generate_layout("a nook").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].scale_x, 1.0);
}

#[tokio::test]
async fn server_errors_are_retried_once() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(503)
                .json_body(json!({ "error": { "code": 503, "message": "overloaded" } }));
        })
        .await;

    let api = connect(&config(&server)).unwrap();
    let err = api.generate(&ContentRequest::text("hi")).await.unwrap_err();
    assert!(matches!(err, GenerationError::Api { status: 503, ref message } if message == "overloaded"));
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(400)
                .json_body(json!({ "error": { "code": 400, "message": "bad key" } }));
        })
        .await;

    let api = connect(&config(&server)).unwrap();
    let err = api.generate(&ContentRequest::text("hi")).await.unwrap_err();
    assert!(matches!(err, GenerationError::Api { status: 400, .. }));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn missing_image_is_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(text_body("I only speak text"));
        })
        .await;

    let client = GenerationClient::new(connect(&config(&server)).unwrap());
    let err = client
        .generate_styled_render("a loft", "Isometric View", &InlineImage::png(vec![0]))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::NoImageReturned { .. }));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200)
                .delay(std::time::Duration::from_millis(1500))
                .json_body(text_body("late"));
        })
        .await;

    let cfg = Config {
        request_timeout_secs: 1,
        max_retries: 0,
        ..config(&server)
    };
    let api = connect(&cfg).unwrap();
    let err = api.generate(&ContentRequest::text("hi")).await.unwrap_err();
    assert!(matches!(err, GenerationError::Timeout));
}

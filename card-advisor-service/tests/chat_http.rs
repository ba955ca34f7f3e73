//! HTTP-level tests for the chat endpoint, driven through the router with `oneshot`.

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, StatusCode, header},
};
use card_advisor_service::{AppState, build_router};
use card_flow::{
    Catalog, FlowController, FlowRunner, InMemorySessionStorage, NO_MATCH_REPLY, QUESTIONS,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ORIGIN: &str = "http://localhost:3000";

fn app() -> Router {
    let catalog = Catalog::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/cards.json"))
        .expect("sample catalog loads");
    let runner = FlowRunner::new(
        FlowController::new(catalog),
        Arc::new(InMemorySessionStorage::new()),
    );
    build_router(
        AppState::new(runner),
        &[HeaderValue::from_static(ORIGIN)],
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn chat(app: &Router, session_id: &str, message: &str) -> Value {
    let request = Request::post("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "session_id": session_id, "message": message }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
    body
}

async fn answer_all(app: &Router, session_id: &str, answers: [&str; 8]) -> Value {
    chat(app, session_id, "hello").await;
    let mut last = Value::Null;
    for answer in answers {
        last = chat(app, session_id, answer).await;
    }
    last
}

#[tokio::test]
async fn health_check_is_ok() {
    let app = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn first_message_returns_first_prompt() {
    let app = app();

    let body = chat(&app, "user-1", "hi there").await;

    assert_eq!(body["reply"], QUESTIONS[0].prompt);
    assert!(body["recommendations"].is_null());
    assert!(body.as_object().unwrap().contains_key("recommendations"));
}

#[tokio::test]
async fn invalid_preference_is_asked_again() {
    let app = app();
    chat(&app, "user-1", "hi").await;
    for answer in ["60k", "10", "20", "15", "5"] {
        chat(&app, "user-1", answer).await;
    }

    let body = chat(&app, "user-1", "points").await;
    assert_eq!(body["reply"], QUESTIONS[5].prompt);

    let body = chat(&app, "user-1", "Cashback").await;
    assert_eq!(body["reply"], QUESTIONS[6].prompt);
}

#[tokio::test]
async fn completed_flow_returns_top_three_cards() {
    let app = app();

    let body = answer_all(
        &app,
        "user-1",
        ["60k", "10", "20", "15", "5", "cashback", "no", "unknown"],
    )
    .await;

    assert!(body["reply"].is_null());
    let names: Vec<&str> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Flipkart Axis Bank", "HDFC Millennia", "Amazon Pay ICICI"]
    );
}

#[tokio::test]
async fn no_match_returns_apology_and_session_restarts() {
    let app = app();

    let body = answer_all(
        &app,
        "user-2",
        ["5000", "10", "20", "15", "5", "lounges", "yes", "650-700"],
    )
    .await;

    assert_eq!(body["reply"], NO_MATCH_REPLY);
    assert!(body["recommendations"].is_null());

    let (status, _) = send(
        &app,
        Request::get("/session/user-2").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = chat(&app, "user-2", "hello again").await;
    assert_eq!(body["reply"], QUESTIONS[0].prompt);
}

#[tokio::test]
async fn in_flight_session_can_be_inspected() {
    let app = app();
    chat(&app, "user-3", "hi").await;
    chat(&app, "user-3", "1.5 lakh").await;

    let (status, body) = send(
        &app,
        Request::get("/session/user-3").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_question"], 2);
    assert_eq!(body["answers"]["income"], "1.5 lakh");
    assert!(body["answers"]["credit_score"].is_null());
}

#[tokio::test]
async fn questions_are_listed_in_order() {
    let app = app();

    let (status, body) = send(&app, Request::get("/questions").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys.len(), 8);
    assert_eq!(keys[0], "income");
    assert_eq!(keys[7], "credit_score");
}

#[tokio::test]
async fn blank_session_id_is_an_ordinary_session() {
    let app = app();

    let body = chat(&app, "  ", "hi").await;
    assert_eq!(body["reply"], QUESTIONS[0].prompt);

    let body = chat(&app, "  ", "60k").await;
    assert_eq!(body["reply"], QUESTIONS[1].prompt);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin_only() {
    let app = app();
    let preflight = |origin: &str| {
        Request::options("/chat")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(preflight(ORIGIN)).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let response = app
        .oneshot(preflight("http://evil.example"))
        .await
        .unwrap();
    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

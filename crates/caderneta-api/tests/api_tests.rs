//! Integration tests for the Caderneta API.
//!
//! Each test builds its own router over in-memory catalog and ledger and
//! drives it with `oneshot` requests.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use caderneta_api::create_router;
use caderneta_api::error::ErrorBody;
use caderneta_api::handlers::{ConversationStateResponse, HealthResponse, ResetResponse};
use caderneta_api::state::AppState;
use caderneta_chat::{DialogueState, ResponseType, TurnOutcome, TurnResponse};
use caderneta_core::config::CadernetaConfig;
use caderneta_core::types::CatalogItem;
use caderneta_ledger::{InMemoryCatalog, InMemoryLedger};

// =============================================================================
// Helpers
// =============================================================================

fn item(id: &str, name: &str, price: &str, stock: i64) -> CatalogItem {
    CatalogItem {
        id: id.into(),
        name: name.into(),
        price: Decimal::from_str(price).unwrap(),
        stock_quantity: stock,
        category_label: "Bijuterias".into(),
    }
}

/// A router plus the ledger behind it, for asserting dispatches.
fn make_app_with(config: CadernetaConfig) -> (axum::Router, Arc<InMemoryLedger>) {
    let catalog = Arc::new(InMemoryCatalog::new(vec![
        item("b1", "Brinco Gota Prata", "35.00", 3),
        item("b2", "Brinco Coração Dourado", "42.00", 1),
        item("c1", "Colar Coração", "59.90", 2),
    ]));
    let ledger = Arc::new(InMemoryLedger::new());
    let state = AppState::new(config, catalog, ledger.clone());
    (create_router(state), ledger)
}

fn make_app() -> (axum::Router, Arc<InMemoryLedger>) {
    make_app_with(CadernetaConfig::default())
}

fn post_turn(conversation: &str, text: &str) -> Request<Body> {
    let body = serde_json::json!({ "text": text }).to_string();
    Request::post(format!("/conversations/{}/turns", conversation))
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

/// Send a turn and decode the turn response.
async fn turn(app: &axum::Router, conversation: &str, text: &str) -> TurnResponse {
    let resp = app
        .clone()
        .oneshot(post_turn(conversation, text))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let (app, _) = make_app();
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.chat_enabled);
    assert_eq!(health.active_conversations, 0);
}

// =============================================================================
// Turns
// =============================================================================

#[tokio::test]
async fn test_turn_wire_format() {
    let (app, _) = make_app();
    let resp = app
        .oneshot(post_turn("c1", "vendi um brinco"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["type"], "question");
    let matches = json["data"]["productMatches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["id"], "b1");
    assert_eq!(matches[0]["price"], "35.00");
    assert!(matches[0]["matchConfidence"].is_number());
    assert!(json.get("outcome").is_none());
}

#[tokio::test]
async fn test_confirm_flow_dispatches_to_ledger() {
    let (app, ledger) = make_app();

    let first = turn(&app, "c1", "gastei 50 reais no mercado").await;
    assert_eq!(first.kind, ResponseType::Question);
    assert_eq!(first.suggestions, vec!["sim", "não"]);
    assert!(ledger.is_empty());

    let second = turn(&app, "c1", "sim").await;
    assert_eq!(second.kind, ResponseType::Success);
    assert_eq!(second.outcome, Some(TurnOutcome::Executed));

    let entries = ledger.recorded();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].intent.category, "Compras");
}

#[tokio::test]
async fn test_fee_flow_over_http() {
    let (app, ledger) = make_app();

    let resp = turn(&app, "c1", "vendi um colar em 3x de 150 reais").await;
    assert_eq!(resp.data.unwrap().requires_fee_input, Some(true));

    let resp = turn(&app, "c1", "com taxa").await;
    assert_eq!(resp.data.unwrap().requires_fee_amount, Some(true));

    let resp = turn(&app, "c1", "2,5%").await;
    assert_eq!(resp.kind, ResponseType::Success);
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn test_conversations_are_isolated() {
    let (app, ledger) = make_app();
    turn(&app, "alice", "gastei 50 reais").await;

    let resp = turn(&app, "bob", "sim").await;
    assert_ne!(resp.kind, ResponseType::Success);
    assert!(ledger.is_empty());

    let resp = turn(&app, "alice", "sim").await;
    assert_eq!(resp.kind, ResponseType::Success);
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_conversational_error_is_200() {
    let (app, ledger) = make_app();
    ledger.set_unavailable(true);
    turn(&app, "c1", "gastei 50 reais").await;
    let resp = turn(&app, "c1", "sim").await;
    assert_eq!(resp.kind, ResponseType::Error);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_empty_text_is_bad_request() {
    let (app, _) = make_app();
    let resp = app.oneshot(post_turn("c1", "   ")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.error, "bad_request");
}

#[tokio::test]
async fn test_too_long_text_is_unprocessable() {
    let (app, _) = make_app();
    let text = "a".repeat(2001);
    let resp = app.oneshot(post_turn("c1", &text)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_disabled_chat_is_unavailable() {
    let mut config = CadernetaConfig::default();
    config.chat.enabled = false;
    let (app, _) = make_app_with(config);
    let resp = app.oneshot(post_turn("c1", "sim")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_invalid_conversation_id() {
    let (app, _) = make_app();
    let resp = app.oneshot(post_turn("a%20b", "sim")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _) = make_app();
    let req = Request::post("/conversations/c1/turns")
        .header("content-type", "application/json")
        .body(Body::from("{\"texto\": 1}"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
}

// =============================================================================
// Conversation state and reset
// =============================================================================

#[tokio::test]
async fn test_get_conversation_state() {
    let (app, _) = make_app();
    turn(&app, "c1", "gastei 50 reais").await;

    let resp = app
        .clone()
        .oneshot(Request::get("/conversations/c1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let state: ConversationStateResponse =
        serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(state.state, DialogueState::AwaitingConfirmation);

    let resp = app
        .oneshot(Request::get("/conversations/other").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let state: ConversationStateResponse =
        serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(state.state, DialogueState::Idle);
}

#[tokio::test]
async fn test_delete_conversation_resets() {
    let (app, ledger) = make_app();
    turn(&app, "c1", "gastei 50 reais").await;

    let delete = || {
        Request::delete("/conversations/c1")
            .body(Body::empty())
            .unwrap()
    };
    let resp = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let reset: ResetResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(reset.cleared);

    let resp = app.clone().oneshot(delete()).await.unwrap();
    let reset: ResetResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(!reset.cleared);

    // "sim" no longer confirms anything.
    let resp = turn(&app, "c1", "sim").await;
    assert_ne!(resp.kind, ResponseType::Success);
    assert!(ledger.is_empty());
}

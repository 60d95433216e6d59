//! HTTP surface tests driven through the router without a listener.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use mt5_gateway::{
    AppState, ConnectorConfig, GatewayConnector, MockReply, MockTerminal, create_router,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn terminal() -> MockTerminal {
    MockTerminal::with_handler(|request| match request["action"].as_str() {
        Some("ping") => MockReply::respond(json!({"data": "pong"})),
        Some("account_info") => MockReply::respond(json!({"data": {"balance": 10000.0}})),
        Some("symbol_info") => {
            MockReply::respond(json!({"data": {"name": request["symbol"], "digits": 2}}))
        }
        Some("get_positions") => MockReply::respond(json!({"data": [{"ticket": 11}]})),
        Some("close_position") => MockReply::Fail("connection reset".to_string()),
        _ => MockReply::respond(json!({"data": {"retcode": 10009, "request": request}})),
    })
}

fn app(terminal: &MockTerminal) -> (Router, Arc<GatewayConnector>) {
    let connector = Arc::new(GatewayConnector::new(
        ConnectorConfig::new("tcp://terminal:8222", Duration::from_secs(1)),
        Arc::new(terminal.clone()),
    ));
    let router = create_router(AppState::new(Arc::clone(&connector), "test"));
    (router, connector)
}

async fn call(
    router: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn call_json(
    router: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = call(router, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Probes
// =============================================================================

#[tokio::test]
async fn health_reports_degraded_when_disconnected() {
    let (router, _connector) = app(&terminal());

    let (status, body) = call_json(router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["version"], "test");
    assert_eq!(body["mt5"]["state"], "disconnected");
    assert_eq!(body["mt5"]["connected"], false);
    assert_eq!(body["mt5"]["endpoint"], "tcp://terminal:8222");
}

#[tokio::test]
async fn health_reports_healthy_when_connected() {
    let (router, connector) = app(&terminal());
    connector.connect().await.unwrap();

    let (status, body) = call_json(router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["mt5"]["connects"], 1);
}

#[tokio::test]
async fn liveness_and_readiness() {
    let (router, connector) = app(&terminal());

    let (status, body) = call(router.clone(), Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (status, body) = call(router.clone(), Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, b"NOT READY");

    connector.connect().await.unwrap();
    let (status, body) = call(router, Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"READY");
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn reads_degrade_when_disconnected() {
    let (router, _connector) = app(&terminal());

    let (status, body) =
        call_json(router.clone(), Method::GET, "/api/v1/trading/account", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());
    assert!(body["message"].is_string());

    let (status, body) = call_json(router, Method::GET, "/api/v1/trading/positions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"positions": []}));
}

#[tokio::test]
async fn reads_return_terminal_data() {
    let (router, connector) = app(&terminal());
    connector.connect().await.unwrap();

    let (_, body) =
        call_json(router.clone(), Method::GET, "/api/v1/trading/account", None).await;
    assert_eq!(body, json!({"data": {"balance": 10000.0}}));

    let uri = "/api/v1/trading/symbols/XAUUSD";
    let (_, body) = call_json(router.clone(), Method::GET, uri, None).await;
    assert_eq!(body, json!({"data": {"name": "XAUUSD", "digits": 2}}));

    let (_, body) =
        call_json(router.clone(), Method::GET, "/api/v1/trading/positions", None).await;
    assert_eq!(body, json!({"positions": [{"ticket": 11}]}));

    let (_, body) = call_json(router, Method::GET, "/api/v1/trading/status", None).await;
    assert_eq!(body["state"], "connected");
    assert_eq!(body["connected"], true);
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn place_order_requires_connection() {
    let (router, _connector) = app(&terminal());
    let order = json!({"symbol": "XAUUSD", "direction": "buy", "volume": "1.0"});

    let (status, body) =
        call_json(router, Method::POST, "/api/v1/trading/orders", Some(order)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "NOT_CONNECTED");
}

#[tokio::test]
async fn place_order_forwards_to_terminal() {
    let terminal = terminal();
    let (router, connector) = app(&terminal);
    connector.connect().await.unwrap();

    let order = json!({
        "symbol": "XAUUSD",
        "direction": "sell",
        "volume": "0.5",
        "stop_loss": "2100.5",
    });
    let (status, body) =
        call_json(router, Method::POST, "/api/v1/trading/orders", Some(order)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["retcode"], 10009);
    let sent = &body["data"]["request"];
    assert_eq!(sent["order_type"], "ORDER_TYPE_SELL");
    assert_eq!(sent["volume"].as_f64(), Some(0.5));
    assert_eq!(sent["stop_loss"].as_f64(), Some(2100.5));
    assert!(sent["take_profit"].is_null());
    assert_eq!(sent["comment"], "Revolution X");
}

#[tokio::test]
async fn close_position_transport_failure_is_bad_gateway() {
    let (router, connector) = app(&terminal());
    connector.connect().await.unwrap();

    let (status, body) = call_json(
        router,
        Method::POST,
        "/api/v1/trading/positions/42/close",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "TRANSPORT_ERROR");
    assert!(!connector.is_connected());
}

#[tokio::test]
async fn close_position_rejects_ticket_zero() {
    let terminal = terminal();
    let (router, connector) = app(&terminal);
    connector.connect().await.unwrap();

    let (status, _) = call(
        router,
        Method::POST,
        "/api/v1/trading/positions/0/close",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(terminal.actions(), vec!["ping"]);
    assert!(connector.is_connected());
}

#[tokio::test]
async fn manual_reconnect() {
    let terminal = terminal();
    let (router, connector) = app(&terminal);
    connector.connect().await.unwrap();

    let (status, body) =
        call_json(router.clone(), Method::POST, "/api/v1/trading/reconnect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);
    assert_eq!(terminal.opens(), 2);

    terminal.set_refuse_connections(true);
    let (status, body) =
        call_json(router, Method::POST, "/api/v1/trading/reconnect", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "TRANSPORT_ERROR");
}

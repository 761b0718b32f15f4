//! End-to-end HTTP tests against a canned axum responder.
//!
//! The responder answers `initialize` with JSON and a session id, accepts
//! notifications with 202, and streams `tools/list` back as SSE. A
//! `tools/call` of `boom` gets a 500 and one of `slow` answers late.

#![cfg(feature = "http")]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::post;
use mcpwire::capability::PROTOCOL_VERSION;
use mcpwire::codec;
use mcpwire::prelude::*;
use mcpwire::transport::http::{HttpTransport, MCP_SESSION_ID_HEADER};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::Instant;

const SESSION_ID: &str = "sess-e2e-1";
const SLOW_REPLY: Duration = Duration::from_millis(800);

#[derive(Clone, Default)]
struct Recorder {
    // (method, session id header) for every POST.
    seen: Arc<Mutex<Vec<(String, Option<String>)>>>,
    deleted: Arc<Mutex<bool>>,
}

async fn handle_post(State(recorder): State<Recorder>, headers: HeaderMap, body: String) -> HttpResponse {
    let message = match codec::decode(&body) {
        Ok(message) => message,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    let session = headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(method) = message.method() {
        recorder
            .seen
            .lock()
            .unwrap()
            .push((method.to_string(), session));
    }

    let request = match message {
        Message::Request(request) => request,
        Message::Notification(_) | Message::Response(_) => {
            return StatusCode::ACCEPTED.into_response();
        }
    };

    match request.method() {
        "initialize" => {
            let result = json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "canned-http", "version": "0.0.1"}
            });
            let body = codec::encode(&Response::success(request.id, result).into()).unwrap();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE.as_str(), "application/json"),
                    (MCP_SESSION_ID_HEADER, SESSION_ID),
                ],
                body,
            )
                .into_response()
        }
        "tools/list" => {
            let result = json!({"tools": [
                {"name": "remote-echo", "inputSchema": {"type": "object"}}
            ]});
            let frame = codec::encode(&Response::success(request.id, result).into()).unwrap();
            // A keep-alive comment first, then the response event.
            let body = format!(": keep-alive\n\nid: 7\nevent: message\ndata: {frame}\n\n");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/event-stream")],
                body,
            )
                .into_response()
        }
        "tools/call" => {
            let name = request.params.as_ref().and_then(|p| p["name"].as_str());
            match name {
                Some("boom") => {
                    return (StatusCode::INTERNAL_SERVER_ERROR, "tool backend down").into_response();
                }
                Some("slow") => tokio::time::sleep(SLOW_REPLY).await,
                _ => {}
            }
            let text = request.params.as_ref().map_or_else(String::new, |p| {
                p["arguments"]["text"].as_str().unwrap_or_default().to_string()
            });
            let result = json!({"content": [{"type": "text", "text": text}]});
            let body = codec::encode(&Response::success(request.id, result).into()).unwrap();
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        "ping" => {
            let body = codec::encode(&Response::success(request.id, json!({})).into()).unwrap();
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        other => {
            let error = mcpwire::JsonRpcError::method_not_found(other);
            let body = codec::encode(&Response::error(request.id, error).into()).unwrap();
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
    }
}

async fn handle_delete(State(recorder): State<Recorder>) -> StatusCode {
    *recorder.deleted.lock().unwrap() = true;
    StatusCode::OK
}

async fn spawn_responder() -> (SocketAddr, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/mcp", post(handle_post).delete(handle_delete))
        .with_state(recorder.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorder)
}

#[tokio::test]
async fn test_http_client_session() {
    let (addr, recorder) = spawn_responder().await;
    let transport = HttpTransport::connect(format!("http://{addr}/mcp")).unwrap();

    let client = ClientBuilder::new().connect(transport).await.unwrap();
    assert_eq!(client.server_info().unwrap().name, "canned-http");

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "remote-echo");

    let result = client
        .call_tool("remote-echo", json!({"text": "over http"}))
        .await
        .unwrap();
    assert_eq!(result.first_text(), Some("over http"));

    client.close().await;

    let seen = recorder.seen.lock().unwrap().clone();
    let methods: Vec<_> = seen.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(
        methods,
        vec!["initialize", "notifications/initialized", "tools/list", "tools/call"]
    );
    assert_eq!(seen[0].1, None);
    assert!(seen[1..].iter().all(|(_, sid)| sid.as_deref() == Some(SESSION_ID)));
    assert!(*recorder.deleted.lock().unwrap());
}

#[tokio::test]
async fn test_http_rejects_server_to_client_handlers() {
    let (addr, _recorder) = spawn_responder().await;
    let transport = HttpTransport::connect(format!("http://{addr}/mcp")).unwrap();

    let err = ClientBuilder::new()
        .sampling_handler(|_request, _ctx| async {
            Ok(CreateMessageResult::text("m", "never", StopReason::EndTurn))
        })
        .connect(transport)
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::Configuration { .. }));
}

#[tokio::test]
async fn test_http_unknown_method_is_a_remote_error() {
    let (addr, _recorder) = spawn_responder().await;
    let transport = HttpTransport::connect(format!("http://{addr}/mcp")).unwrap();
    let client = ClientBuilder::new().connect(transport).await.unwrap();

    let err = client
        .session()
        .request("completion/complete", Some(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.code(), mcpwire::error::codes::METHOD_NOT_FOUND);

    client.ping().await.unwrap();
    client.close().await;
}

#[tokio::test]
async fn test_http_error_status_fails_only_that_call() {
    let (addr, _recorder) = spawn_responder().await;
    let transport = HttpTransport::connect(format!("http://{addr}/mcp")).unwrap();
    let client = ClientBuilder::new().connect(transport).await.unwrap();

    let err = client.call_tool("boom", json!({})).await.unwrap_err();
    assert!(matches!(err, McpError::Transport(_)), "unexpected error: {err}");
    assert!(err.to_string().contains("500"), "{err}");

    assert!(client.is_connected());
    client.ping().await.unwrap();
    let result = client
        .call_tool("remote-echo", json!({"text": "after the 500"}))
        .await
        .unwrap();
    assert_eq!(result.first_text(), Some("after the 500"));
    client.close().await;
}

#[tokio::test]
async fn test_http_slow_reply_does_not_hold_up_other_calls() {
    let (addr, _recorder) = spawn_responder().await;
    let transport = HttpTransport::connect(format!("http://{addr}/mcp")).unwrap();
    let client = ClientBuilder::new().connect(transport).await.unwrap();

    let slow = client.call_tool("slow", json!({"text": "late"}));
    let quick = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let started = Instant::now();
        client.ping().await.unwrap();
        started.elapsed()
    };
    let (slow, ping_latency) = tokio::join!(slow, quick);

    assert!(
        ping_latency < SLOW_REPLY / 2,
        "ping waited {ping_latency:?} behind the slow call"
    );
    assert_eq!(slow.unwrap().first_text(), Some("late"));
    client.close().await;
}

//! Client API against a real server over the in-memory transport.

use std::collections::HashMap;
use std::time::Duration;

use mcpwire_client::{Client, ClientBuilder};
use mcpwire_core::capability::ServerFeature;
use mcpwire_core::error::McpError;
use mcpwire_core::capability::PROTOCOL_VERSION;
use mcpwire_core::protocol::{Message, Notification, Response};
use mcpwire_core::methods;
use mcpwire_core::types::{
    CreateMessageRequest, CreateMessageResult, GetPromptResult, Prompt, StopReason, Tool,
    ToolOutput,
};
use mcpwire_server::{Server, ServerBuilder};
use mcpwire_session::CallOptions;
use mcpwire_transport::{MemoryTransport, Transport};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;

fn server() -> ServerBuilder {
    ServerBuilder::new("fixture", "2.0.0")
        .instructions("Use echo to test.")
        .list_changed()
        .tool(Tool::new("echo").description("Echo text"), |args, _ctx| async move {
            Ok(ToolOutput::text(args["text"].as_str().unwrap_or_default()))
        })
        .tool(Tool::new("wait"), |_args, ctx| async move {
            ctx.cancelled().await;
            Ok(ToolOutput::text("cancelled"))
        })
        .tool(Tool::new("ask"), |_args, ctx| async move {
            let reply = ctx
                .create_message(CreateMessageRequest::simple(
                    "What is the capital of France?",
                    32,
                ))
                .await?;
            Ok(ToolOutput::text(reply.as_text().unwrap_or_default()))
        })
        .prompt(Prompt::new("greet").required_arg("name", "Who"), |args, _ctx| async move {
            Ok(GetPromptResult::user(format!("Hi {}", args["name"])))
        })
}

async fn connect(server: ServerBuilder, client: ClientBuilder) -> Result<(Server, Client), McpError> {
    let (client_end, server_end) = MemoryTransport::pair();
    let server = server.serve(server_end)?;
    let client = client.name("test-client").connect(client_end).await?;
    Ok((server, client))
}

#[tokio::test]
async fn test_handshake_details() {
    let (_server, client) = connect(server(), ClientBuilder::new()).await.unwrap();

    assert_eq!(client.server_info().unwrap().name, "fixture");
    assert_eq!(client.instructions(), Some("Use echo to test."));
    assert!(client.is_connected());

    let caps = client.server_capabilities().unwrap();
    assert!(caps.has_tools());
    assert!(caps.has_prompts());
    assert!(!caps.has_resources());
}

#[tokio::test]
async fn test_tools() {
    let (_server, client) = connect(server(), ClientBuilder::new()).await.unwrap();

    let names: Vec<_> = client
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["ask", "echo", "wait"]);

    let result = client.call_tool("echo", json!({"text": "hi"})).await.unwrap();
    assert_eq!(result.first_text(), Some("hi"));
}

#[tokio::test]
async fn test_undeclared_category_fails_locally() {
    let (_server, client) = connect(server(), ClientBuilder::new()).await.unwrap();

    let err = client.list_resources().await.unwrap_err();
    assert!(matches!(err, McpError::CapabilityNotSupported { .. }));
    let err = client.read_resource("mem://x").await.unwrap_err();
    assert!(matches!(err, McpError::CapabilityNotSupported { .. }));
}

#[tokio::test]
async fn test_prompts() {
    let (_server, client) = connect(server(), ClientBuilder::new()).await.unwrap();

    let prompts = client.list_prompts().await.unwrap();
    assert_eq!(prompts.len(), 1);

    let args = HashMap::from([("name".to_string(), "Grace".to_string())]);
    let rendered = client.get_prompt("greet", args).await.unwrap();
    assert_eq!(rendered.messages[0].content.as_text(), Some("Hi Grace"));
}

#[tokio::test]
async fn test_required_feature_missing() {
    let err = connect(server(), ClientBuilder::new().require(ServerFeature::Resources))
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::HandshakeFailed(_)));
}

#[tokio::test]
async fn test_sampling_handler_answers_server() {
    let client = ClientBuilder::new().sampling_handler(|request: CreateMessageRequest, _ctx| async move {
        assert_eq!(request.max_tokens, 32);
        Ok(CreateMessageResult::text("stub-model", "Paris", StopReason::EndTurn))
    });
    let (server, client) = connect(server(), client).await.unwrap();

    assert!(server.client_capabilities().unwrap().has_sampling());

    let result = client.call_tool("ask", json!({})).await.unwrap();
    assert_eq!(result.first_text(), Some("Paris"));
}

#[tokio::test]
async fn test_call_timeout_leaves_connection_usable() {
    let (_server, client) = connect(server(), ClientBuilder::new()).await.unwrap();

    let err = client
        .call_tool_with(
            "wait",
            json!({}),
            CallOptions::new().timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
    assert!(err.is_cancellation());

    client.ping().await.unwrap();
}

#[tokio::test]
async fn test_list_changed_observer() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = ClientBuilder::new().on_notification(
        methods::TOOLS_LIST_CHANGED,
        move |n: &Notification| {
            let _ = tx.send(n.method().to_string());
        },
    );
    let (server, _client) = connect(server(), client).await.unwrap();

    server.notify_tools_list_changed().await.unwrap();
    let method = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert_eq!(method.as_deref(), Some(methods::TOOLS_LIST_CHANGED));
}

#[tokio::test]
async fn test_dropping_client_closes_connection() {
    let (server, client) = connect(server(), ClientBuilder::new()).await.unwrap();
    drop(client);

    tokio::time::timeout(Duration::from_secs(5), server.closed())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_repeated_cursor_ends_listing() {
    let (client_end, peer) = MemoryTransport::pair();

    // A hand-driven server whose every tools/list page points at itself.
    let peer_task = tokio::spawn(async move {
        let mut pages = 0;
        while let Ok(Some(message)) = peer.recv().await {
            let Message::Request(request) = message else {
                continue;
            };
            let result = match request.method() {
                "initialize" => json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "looping", "version": "0.1.0"}
                }),
                "tools/list" => {
                    pages += 1;
                    json!({
                        "tools": [{"name": "t", "inputSchema": {"type": "object"}}],
                        "nextCursor": "again"
                    })
                }
                _ => json!({}),
            };
            if peer.send(Response::success(request.id, result).into()).await.is_err() {
                break;
            }
        }
        pages
    });

    let client = ClientBuilder::new().connect(client_end).await.unwrap();
    let err = client.list_tools().await.unwrap_err();
    assert!(err.to_string().contains("twice"), "{err}");
    assert!(client.is_connected());

    client.close().await;
    assert_eq!(peer_task.await.unwrap(), 2);
}

//! Server handle behavior against a plain client session.

use std::collections::HashMap;
use std::time::Duration;

use mcpwire_core::capability::Implementation;
use mcpwire_core::error::{McpError, codes};
use mcpwire_core::methods;
use mcpwire_core::protocol::Notification;
use mcpwire_core::types::{
    CallToolResult, GetPromptResult, Prompt, ReadResourceResult, Resource, ResourceContents, Tool,
    ToolOutput,
};
use mcpwire_server::{Server, ServerBuilder};
use mcpwire_session::{ClientIdentity, Registry, Session, SessionConfig};
use mcpwire_transport::MemoryTransport;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;

#[derive(serde::Deserialize, schemars::JsonSchema)]
struct AddArgs {
    a: i64,
    b: i64,
}

fn builder() -> ServerBuilder {
    ServerBuilder::new("fixture", "0.1.0")
        .typed_tool("add", "Add two integers", |args: AddArgs, _ctx| async move {
            Ok(ToolOutput::text((args.a + args.b).to_string()))
        })
        .tool(Tool::new("fail"), |_args, _ctx| async move {
            Err(McpError::internal("disk on fire"))
        })
        .resource(Resource::new("mem://readme", "readme"), |uri, _ctx| async move {
            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(uri, "hello")],
            })
        })
        .prompt(
            Prompt::new("greet").required_arg("name", "Who to greet"),
            |args: HashMap<String, String>, _ctx| async move {
                Ok(GetPromptResult::user(format!("Hello, {}!", args["name"])))
            },
        )
}

async fn connect(builder: ServerBuilder, client_registry: Registry) -> (Server, Session) {
    let (client_end, server_end) = MemoryTransport::pair();
    let server = builder.serve(server_end).unwrap();
    let client = Session::connect(
        client_end,
        ClientIdentity::new(Implementation::new("probe", "1.0.0")),
        client_registry,
        SessionConfig::default(),
    )
    .await
    .unwrap();
    (server, client)
}

#[tokio::test]
async fn test_typed_tool_and_tool_errors() {
    let (_server, client) = connect(builder(), Registry::new()).await;

    let sum: CallToolResult = client
        .call(methods::TOOLS_CALL, &json!({"name": "add", "arguments": {"a": 2, "b": 40}}))
        .await
        .unwrap();
    assert_eq!(sum.first_text(), Some("42"));

    let err = client
        .request(
            methods::TOOLS_CALL,
            Some(json!({"name": "add", "arguments": {"a": "two"}})),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::INVALID_PARAMS);

    let failed: CallToolResult = client
        .call(methods::TOOLS_CALL, &json!({"name": "fail"}))
        .await
        .unwrap();
    assert!(failed.is_error());
    assert!(failed.first_text().unwrap_or_default().contains("disk on fire"));
}

#[tokio::test]
async fn test_resources_and_prompts() {
    let (_server, client) = connect(builder(), Registry::new()).await;

    let read: ReadResourceResult = client
        .call(methods::RESOURCES_READ, &json!({"uri": "mem://readme"}))
        .await
        .unwrap();
    assert_eq!(read.contents[0].as_text(), Some("hello"));

    let err = client
        .request(methods::RESOURCES_READ, Some(json!({"uri": "mem://missing"})))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::RESOURCE_NOT_FOUND);

    let prompt: GetPromptResult = client
        .call(
            methods::PROMPTS_GET,
            &json!({"name": "greet", "arguments": {"name": "Ada"}}),
        )
        .await
        .unwrap();
    assert_eq!(prompt.messages[0].content.as_text(), Some("Hello, Ada!"));

    let err = client
        .request(methods::PROMPTS_GET, Some(json!({"name": "greet"})))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::INVALID_PARAMS);
}

#[tokio::test]
async fn test_server_sees_client_capabilities() {
    let (server, _client) = connect(builder(), Registry::new()).await;

    assert!(server.is_initialized());
    let caps = server.client_capabilities().unwrap();
    assert!(!caps.has_sampling());
    assert_eq!(server.client_request().unwrap().client_info.name, "probe");
}

#[tokio::test]
async fn test_list_changed_notifications() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut registry = Registry::new();
    registry.on_notification(methods::TOOLS_LIST_CHANGED, move |n: &Notification| {
        let _ = tx.send(n.method().to_string());
    });

    let (server, _client) = connect(builder().list_changed(), registry).await;
    server.notify_tools_list_changed().await.unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert_eq!(seen.as_deref(), Some(methods::TOOLS_LIST_CHANGED));
}

#[tokio::test]
async fn test_list_changed_requires_declaration() {
    let (server, _client) = connect(builder(), Registry::new()).await;
    let err = server.notify_prompts_list_changed().await.unwrap_err();
    assert!(matches!(err, McpError::CapabilityNotSupported { .. }));
}

#[tokio::test]
async fn test_close_ends_the_connection() {
    let (server, client) = connect(builder(), Registry::new()).await;

    server.close().await;
    tokio::time::timeout(Duration::from_secs(5), client.closed())
        .await
        .unwrap();
    assert!(client.ping().await.unwrap_err().is_connection_closed());
}

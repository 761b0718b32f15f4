//! Client and server wired through the facade over an in-memory transport.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;
use mcpwire::methods;
use mcpwire::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;

fn fixture() -> ServerBuilder {
    ServerBuilder::new("memory-fixture", "1.0.0")
        .tool(Tool::new("echo"), |args, ctx| async move {
            // Interleave replies so correlation is actually exercised.
            let delay = args["delay"].as_u64().unwrap_or_default();
            tokio::time::sleep(Duration::from_millis(delay)).await;
            ctx.progress(1.0, None, None).await?;
            Ok(ToolOutput::text(args["text"].as_str().unwrap_or_default()))
        })
        .resource(Resource::new("mem://a", "a"), |uri, _ctx| async move {
            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(uri, "alpha")],
            })
        })
        .prompt(Prompt::new("plain"), |_args, _ctx| async move {
            Ok(GetPromptResult::user("plain prompt"))
        })
}

async fn pair(client: ClientBuilder) -> (Server, Client) {
    let (client_end, server_end) = MemoryTransport::pair();
    let server = fixture().serve(server_end).unwrap();
    let client = client.connect(client_end).await.unwrap();
    (server, client)
}

#[tokio::test]
async fn test_concurrent_calls_resolve_to_their_own_results() {
    let (_server, client) = pair(ClientBuilder::new()).await;

    let calls = (0..16u64).map(|i| {
        let client = &client;
        async move {
            let text = format!("call-{i}");
            let result = client
                .call_tool("echo", json!({"text": text, "delay": (16 - i) * 3}))
                .await
                .unwrap();
            (text, result.first_text().map(str::to_string))
        }
    });

    for (sent, received) in join_all(calls).await {
        assert_eq!(received.as_deref(), Some(sent.as_str()));
    }
    assert_eq!(client.session().pending_calls(), 0);
}

#[tokio::test]
async fn test_every_feature_category() {
    let (_server, client) = pair(ClientBuilder::new()).await;

    assert_eq!(client.list_tools().await.unwrap().len(), 1);
    assert_eq!(client.list_resources().await.unwrap()[0].uri, "mem://a");
    assert_eq!(
        client.read_resource("mem://a").await.unwrap()[0].as_text(),
        Some("alpha")
    );
    assert_eq!(client.list_prompts().await.unwrap()[0].name, "plain");
    let prompt = client.get_prompt("plain", HashMap::new()).await.unwrap();
    assert_eq!(prompt.messages[0].content.as_text(), Some("plain prompt"));
}

#[tokio::test]
async fn test_progress_without_token_is_silent() {
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let client = ClientBuilder::new().on_notification(methods::PROGRESS, move |_n| {
        let _ = tx.send(());
    });
    let (_server, client) = pair(client).await;

    client
        .call_tool("echo", json!({"text": "quiet"}))
        .await
        .unwrap();
    client.ping().await.unwrap();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_server_close_fails_outstanding_client_calls() {
    let (server, client) = pair(ClientBuilder::new()).await;

    let slow = client.call_tool("echo", json!({"text": "late", "delay": 5_000}));
    let closer = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        server.close().await;
    };
    let (result, ()) = tokio::join!(slow, closer);

    assert!(result.unwrap_err().is_connection_closed());
    assert!(!client.is_connected());
}

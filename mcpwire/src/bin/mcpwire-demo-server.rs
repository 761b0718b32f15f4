//! A small stdio MCP server.
//!
//! Serves on stdin/stdout and logs to stderr. Used by the spawned-process
//! end-to-end tests and handy for poking at a client by hand.

use std::time::Duration;

use mcpwire::prelude::*;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema)]
struct AddArgs {
    /// First operand.
    a: f64,
    /// Second operand.
    b: f64,
}

#[derive(Deserialize, JsonSchema)]
struct SleepArgs {
    /// How long to sleep, in milliseconds.
    millis: u64,
}

#[tokio::main]
async fn main() -> Result<(), McpError> {
    mcpwire::logging::init(LogConfig::new("warn"))?;
    tracing::info!(pid = std::process::id(), "demo server starting");

    ServerBuilder::new("mcpwire-demo", env!("CARGO_PKG_VERSION"))
        .instructions("Call `echo` or `add`; `sleep` honours cancellation.")
        .tool(
            Tool::new("echo").description("Return the `text` argument"),
            |args, _ctx| async move {
                match args.get("text").and_then(serde_json::Value::as_str) {
                    Some(text) => Ok(ToolOutput::text(text)),
                    None => Ok(ToolOutput::error("missing `text`")),
                }
            },
        )
        .typed_tool("add", "Add two numbers", |args: AddArgs, _ctx| async move {
            Ok(ToolOutput::text((args.a + args.b).to_string()))
        })
        .typed_tool("sleep", "Sleep, then answer", |args: SleepArgs, ctx| async move {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_millis(args.millis)) => {
                    Ok(ToolOutput::text("awake"))
                }
                () = ctx.cancelled() => Err(McpError::internal("sleep cancelled")),
            }
        })
        .resource(
            Resource::new("demo://motd", "Message of the day").mime_type("text/plain"),
            |uri, _ctx| async move {
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(uri, "Keep stdout clean.")],
                })
            },
        )
        .prompt(
            Prompt::new("review").required_arg("language", "Language of the snippet"),
            |args, _ctx| async move {
                let language = args.get("language").map_or("code", String::as_str);
                Ok(GetPromptResult::user(format!(
                    "Review this {language} snippet for bugs."
                )))
            },
        )
        .build()?
        .run(StdioTransport::stdio())
        .await
}

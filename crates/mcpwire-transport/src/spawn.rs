//! Launching an MCP server as a child process.
//!
//! The child speaks newline-delimited JSON on its stdin/stdout; its stderr
//! is inherited so server logs show up in the parent's terminal.
//!
//! ```no_run
//! use mcpwire_transport::SpawnedTransport;
//!
//! # async fn example() -> Result<(), mcpwire_transport::TransportError> {
//! let transport = SpawnedTransport::builder("my-mcp-server")
//!     .arg("--verbose")
//!     .env("MCP_LOG_LEVEL", "debug")
//!     .working_dir("/path/to/server")
//!     .spawn()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::error::TransportError;
use crate::runtime::{AsyncMutex, TokioAsyncReadWrapper};
use crate::stdio::StdioTransport;
use crate::traits::{Transport, TransportMetadata};
use mcpwire_core::protocol::Message;
use futures::io::AsyncWrite;
use std::ffi::OsStr;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};
use std::time::Duration;

/// How long a child gets to exit on its own after its stdin closes.
const EXIT_GRACE: Duration = Duration::from_millis(500);

type ChildStdio = StdioTransport<TokioAsyncReadWrapper<tokio::process::ChildStdout>, ChildInput>;

/// The child's stdin. Closing it drops the pipe, which the child sees as EOF.
struct ChildInput(Option<tokio::process::ChildStdin>);

impl ChildInput {
    fn pipe(&mut self) -> io::Result<&mut tokio::process::ChildStdin> {
        self.0
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::BrokenPipe))
    }
}

impl AsyncWrite for ChildInput {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        use tokio::io::AsyncWrite as _;
        match self.pipe() {
            Ok(pipe) => Pin::new(pipe).poll_write(cx, buf),
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        use tokio::io::AsyncWrite as _;
        match self.0.as_mut() {
            Some(pipe) => Pin::new(pipe).poll_flush(cx),
            None => Poll::Ready(Ok(())),
        }
    }

    fn poll_close(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.0 = None;
        Poll::Ready(Ok(()))
    }
}

/// A transport connected to a spawned subprocess via stdio.
///
/// Closing the transport closes the child's stdin, gives it a moment to
/// exit, then kills it and reaps it. Dropping the transport kills the child.
pub struct SpawnedTransport {
    io: ChildStdio,
    child: AsyncMutex<tokio::process::Child>,
    command: String,
}

impl SpawnedTransport {
    /// Spawn a new MCP server process and connect to it.
    pub async fn spawn<S, I, A>(program: S, args: I) -> Result<Self, TransportError>
    where
        S: AsRef<OsStr>,
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        SpawnedTransportBuilder::new(program)
            .args(args)
            .spawn()
            .await
    }

    /// Create a builder for more advanced configuration.
    #[must_use]
    pub fn builder<S: AsRef<OsStr>>(program: S) -> SpawnedTransportBuilder {
        SpawnedTransportBuilder::new(program)
    }

    /// Get the process ID of the spawned child.
    ///
    /// Returns `None` if the process has already been reaped.
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.id()
    }

    /// The command line used to spawn the child.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Check if the child process is still running.
    pub async fn is_running(&self) -> bool {
        let mut child = self.child.lock().await;
        matches!(child.try_wait(), Ok(None))
    }

    /// Wait for the child process to exit.
    pub async fn wait(&self) -> Result<std::process::ExitStatus, TransportError> {
        let mut child = self.child.lock().await;
        child.wait().await.map_err(TransportError::from)
    }

    /// Kill the child process and reap it.
    pub async fn kill(&self) -> Result<(), TransportError> {
        let mut child = self.child.lock().await;
        child.kill().await.map_err(TransportError::from)
    }
}

impl Transport for SpawnedTransport {
    type Error = TransportError;

    async fn send(&self, msg: Message) -> Result<(), Self::Error> {
        self.io.send(msg).await
    }

    async fn recv(&self) -> Result<Option<Message>, Self::Error> {
        self.io.recv().await
    }

    async fn close(&self) -> Result<(), Self::Error> {
        if let Err(e) = self.io.close().await {
            tracing::debug!(error = %e, "flush before close failed");
        }
        // EOF on stdin is the polite way to ask a stdio server to exit.
        if let Err(e) = self.io.shutdown_writer().await {
            tracing::debug!(error = %e, "closing child stdin failed");
        }

        let mut child = self.child.lock().await;
        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(command = %self.command, %status, "child exited");
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                tracing::debug!(command = %self.command, "child ignored EOF, killing");
                child.kill().await.map_err(TransportError::from)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.io.is_connected()
    }

    fn metadata(&self) -> TransportMetadata {
        self.io.metadata()
    }
}

/// Builder for creating spawned transports with custom configuration.
#[derive(Debug)]
pub struct SpawnedTransportBuilder {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
    clear_env: bool,
}

impl SpawnedTransportBuilder {
    /// Create a new builder for the given program.
    #[must_use]
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: PathBuf::from(program.as_ref()),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
            clear_env: false,
        }
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    #[must_use]
    pub fn env<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.envs
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Set multiple environment variables.
    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.envs.extend(
            envs.into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
        );
        self
    }

    /// Set the working directory for the child process.
    #[must_use]
    pub fn working_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Start from an empty environment instead of inheriting the parent's.
    #[must_use]
    pub const fn clear_env(mut self) -> Self {
        self.clear_env = true;
        self
    }

    /// Spawn the process and create the transport.
    pub async fn spawn(self) -> Result<SpawnedTransport, TransportError> {
        let mut command = tokio::process::Command::new(&self.program);

        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if self.clear_env {
            command.env_clear();
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            TransportError::connection(format!(
                "Failed to spawn process '{}': {e}",
                self.program.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::protocol("Failed to capture child stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::protocol("Failed to capture child stdout"))?;

        let command_str = std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        let pid = child
            .id()
            .map_or_else(|| "unknown".to_string(), |id| id.to_string());
        tracing::debug!(command = %command_str, %pid, "spawned server process");

        let io = StdioTransport::with_streams(TokioAsyncReadWrapper(stdout), ChildInput(Some(stdin)))
            .with_metadata(
            TransportMetadata::new("spawned-stdio")
                .remote_addr(format!("pid:{pid}"))
                .local_addr("parent")
                .connected_now(),
            );

        Ok(SpawnedTransport {
            io,
            child: AsyncMutex::new(child),
            command: command_str,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpwire_core::protocol::{Notification, RequestId, Response};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_construction() {
        let builder = SpawnedTransportBuilder::new("echo")
            .arg("hello")
            .args(["world"])
            .env("TEST_VAR", "value")
            .working_dir("/tmp");

        assert_eq!(builder.program.to_string_lossy(), "echo");
        assert_eq!(builder.args, vec!["hello", "world"]);
        assert_eq!(
            builder.envs,
            vec![("TEST_VAR".to_string(), "value".to_string())]
        );
        assert_eq!(builder.current_dir, Some(PathBuf::from("/tmp")));
    }

    #[tokio::test]
    async fn test_spawn_nonexistent_program() {
        let result = SpawnedTransport::spawn("nonexistent-program-12345", &[] as &[&str]).await;
        assert!(matches!(result, Err(TransportError::Connection { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cat_echoes_frames_and_close_reaps() -> Result<(), TransportError> {
        let transport = SpawnedTransport::spawn("cat", &[] as &[&str]).await?;
        assert_eq!(transport.metadata().transport_type, "spawned-stdio");
        assert!(transport.is_running().await);

        let reply = Message::Response(Response::success(
            RequestId::Number(1),
            serde_json::json!({"ok": true}),
        ));
        transport.send(reply.clone()).await?;
        assert_eq!(transport.recv().await?, Some(reply));

        transport
            .send(Message::Notification(Notification::new("notifications/initialized")))
            .await?;
        assert!(transport.recv().await?.is_some());

        transport.close().await?;
        assert!(!transport.is_running().await);
        Ok(())
    }
}

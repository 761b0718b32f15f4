//! Log output for binaries built on mcpwire.
//!
//! Output always goes to stderr: a stdio server owns stdout for protocol
//! frames, and a stray log line there would corrupt the stream.

use mcpwire_core::error::McpError;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
///
/// `RUST_LOG`, when set, overrides [`filter`](Self::filter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset, e.g. `"mcpwire=debug"`.
    pub filter: String,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Plain-text logging with the given filter directive.
    #[must_use]
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            json: false,
        }
    }

    /// Switch to JSON output.
    #[must_use]
    pub const fn json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Install the global subscriber.
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already installed.
pub fn init(config: LogConfig) -> Result<(), McpError> {
    let filter = build_filter(std::env::var("RUST_LOG").ok(), &config.filter)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| McpError::configuration(format!("cannot install log subscriber: {e}")))
}

fn build_filter(env: Option<String>, fallback: &str) -> Result<EnvFilter, McpError> {
    let directives = match env.as_deref() {
        Some(env) if !env.trim().is_empty() => env,
        _ => fallback,
    };
    EnvFilter::try_new(directives)
        .map_err(|e| McpError::configuration(format!("invalid log filter '{directives}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_env_takes_priority() {
        let filter = build_filter(Some("mcpwire_session=trace".into()), "warn").unwrap();
        assert_eq!(filter.to_string(), "mcpwire_session=trace");
    }

    #[test]
    fn test_blank_env_falls_back() {
        let filter = build_filter(Some("  ".into()), "warn").unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_bad_directive_is_a_configuration_error() {
        let err = build_filter(None, "mcpwire=loud").unwrap_err();
        assert!(matches!(err, McpError::Configuration { .. }));
    }

    #[test]
    fn test_json_toggle() {
        let config = LogConfig::new("debug").json();
        assert!(config.json);
        assert_eq!(config.filter, "debug");
    }
}

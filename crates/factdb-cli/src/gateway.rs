//! Client construction and failure classification for the CLI.
//!
//! Every client failure is re-classified exactly once into a
//! [`CliError`], and every failure maps to the same process exit
//! status; no command invents its own exit codes.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use factdb_client::{Client, ClientError, ConnectionConfig};

/// CLI-level failure taxonomy.
#[derive(Debug)]
pub(crate) enum CliError {
    /// Bad argument count or value; never contacts the network.
    InvalidUsage(String),
    /// Malformed connection parameters.
    Config(String),
    /// The network was unreachable.
    Connection(String),
    /// A well-formed error response from the remote service.
    RemoteApi {
        /// HTTP status code of the error response.
        status: u16,
        /// Response body text.
        body: String,
    },
    /// Anything the taxonomy does not cover.
    Unspecified(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage(message.into())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn unspecified(error: impl Into<anyhow::Error>) -> Self {
        Self::Unspecified(error.into())
    }

    /// Exit status for this failure. The policy is uniform across all
    /// subcommands: every failure terminates with status 1.
    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidUsage(_)
            | Self::Config(_)
            | Self::Connection(_)
            | Self::RemoteApi { .. }
            | Self::Unspecified(_) => 1,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::InvalidUsage(message) | Self::Config(message) | Self::Connection(message) => {
                message.clone()
            }
            Self::RemoteApi { status, body } => {
                format!("{body} (last remote API response code {status})")
            }
            Self::Unspecified(error) => format!("{error:#}"),
        }
    }
}

/// Open a client connection from the resolved configuration overrides.
///
/// A malformed server URL is a configuration error; any other
/// construction-time failure stays unclassified.
pub(crate) fn open_client(overrides: ConnectionConfig) -> CliResult<Client> {
    debug!(?overrides, "initializing client connection with configuration overrides");
    Client::new(overrides).map_err(|err| match err {
        ClientError::InvalidUrl { .. } => CliError::config(err.to_string()),
        other => CliError::unspecified(other),
    })
}

pub(crate) async fn run_query(client: &Client, text: &str) -> CliResult<Value> {
    client.query(text).await.map_err(classify)
}

pub(crate) async fn fetch_status(client: &Client) -> CliResult<Map<String, Value>> {
    client.status().await.map_err(classify)
}

pub(crate) async fn run_export(
    client: &Client,
    destination: &Path,
    anonymization: &str,
) -> CliResult<()> {
    client
        .export(destination, anonymization)
        .await
        .map_err(classify)
}

pub(crate) async fn run_import(client: &Client, source: &Path) -> CliResult<()> {
    client.import(source).await.map_err(classify)
}

/// Re-classify a client failure into the CLI taxonomy.
fn classify(err: ClientError) -> CliError {
    match err {
        ClientError::Connection { .. } => CliError::Connection(err.to_string()),
        ClientError::Api { status, body } => CliError::RemoteApi { status, body },
        ClientError::InvalidUrl { .. } => CliError::config(err.to_string()),
        other => CliError::unspecified(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hermetic_overrides(urls: Vec<String>, dir: &tempfile::TempDir) -> ConnectionConfig {
        let config_path = dir.path().join("client.conf");
        std::fs::write(&config_path, "{}").expect("write empty config");
        ConnectionConfig {
            config_file: Some(config_path),
            server_urls: Some(urls),
            ..ConnectionConfig::default()
        }
    }

    #[test]
    fn malformed_url_is_a_configuration_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let overrides = hermetic_overrides(vec!["::nope::".to_string()], &dir);
        let err = open_client(overrides).expect_err("bad URL should fail");
        match err {
            CliError::Config(message) => {
                assert!(message.contains("the provided server url was invalid"));
            }
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn missing_explicit_config_file_is_unclassified() {
        let overrides = ConnectionConfig {
            config_file: Some("/nonexistent/factdb/client.conf".into()),
            server_urls: Some(vec!["http://127.0.0.1:8080".to_string()]),
            ..ConnectionConfig::default()
        };
        let err = open_client(overrides).expect_err("missing config should fail");
        assert!(matches!(err, CliError::Unspecified(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_classifies_as_connection_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        // Port 9 is discard; nothing listens there.
        let overrides = hermetic_overrides(vec!["http://127.0.0.1:9".to_string()], &dir);
        let client = open_client(overrides).expect("construct client");
        let err = run_query(&client, "nodes {}")
            .await
            .expect_err("unreachable endpoint should fail");
        assert!(matches!(err, CliError::Connection(_)));
    }

    #[test]
    fn every_failure_exits_with_status_one() {
        let failures = [
            CliError::usage("bad usage"),
            CliError::config("bad config"),
            CliError::Connection("unreachable".to_string()),
            CliError::RemoteApi {
                status: 500,
                body: "boom".to_string(),
            },
            CliError::unspecified(anyhow::anyhow!("anything else")),
        ];
        for failure in failures {
            assert_eq!(failure.exit_code(), 1);
        }
    }

    #[test]
    fn remote_api_message_carries_body_and_status() {
        let failure = CliError::RemoteApi {
            status: 503,
            body: "service unavailable".to_string(),
        };
        let message = failure.display_message();
        assert!(message.contains("service unavailable"));
        assert!(message.contains("503"));
    }
}

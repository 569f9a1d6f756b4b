//! The `query` command: submit one ad-hoc query and print the result.

use tracing::debug;

use factdb_client::ConnectionConfig;

use crate::cli::QueryArgs;
use crate::gateway::{self, CliResult};
use crate::output;

pub(crate) async fn handle_query(overrides: ConnectionConfig, args: &QueryArgs) -> CliResult<()> {
    debug!(query = %args.query, "running the query command");

    let client = gateway::open_client(overrides)?;
    let result = gateway::run_query(&client, &args.query).await?;
    output::render_json(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::CliError;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;

    fn overrides_for(server: &MockServer, dir: &tempfile::TempDir) -> ConnectionConfig {
        let config_path = dir.path().join("client.conf");
        std::fs::write(&config_path, "{}").expect("write empty config");
        ConnectionConfig {
            config_file: Some(config_path),
            server_urls: Some(vec![server.base_url()]),
            ..ConnectionConfig::default()
        }
    }

    #[tokio::test]
    async fn query_round_trips_through_the_service() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/fdb/query/v4")
                .json_body(json!({"query": "nodes {}"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{"certname": "agent-1"}]));
        });

        let dir = tempfile::tempdir().expect("create temp dir");
        let args = QueryArgs {
            query: "nodes {}".to_string(),
        };
        handle_query(overrides_for(&server, &dir), &args)
            .await
            .expect("query should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn ast_queries_are_submitted_structurally() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/fdb/query/v4")
                .json_body(json!({"query": ["from", "nodes"]}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([]));
        });

        let dir = tempfile::tempdir().expect("create temp dir");
        let args = QueryArgs {
            query: r#"["from", "nodes"]"#.to_string(),
        };
        handle_query(overrides_for(&server, &dir), &args)
            .await
            .expect("AST query should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn remote_error_responses_become_remote_api_failures() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/fdb/query/v4");
            then.status(400).body("malformed query");
        });

        let dir = tempfile::tempdir().expect("create temp dir");
        let args = QueryArgs {
            query: "bogus".to_string(),
        };
        let err = handle_query(overrides_for(&server, &dir), &args)
            .await
            .expect_err("remote error expected");
        match err {
            CliError::RemoteApi { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "malformed query");
            }
            other => panic!("expected RemoteApi, got {other:?}"),
        }
    }
}

//! Resolution of CLI flags into connection-configuration overrides.

use factdb_client::ConnectionConfig;

use crate::cli::Cli;

/// Map the global connection flags onto [`ConnectionConfig`].
///
/// Pure and one-to-one: a flag that was not supplied produces an absent
/// field, never an empty value, so the client's own defaulting
/// (config file, environment) is not pre-empted. The `--urls` value is
/// split on `,` as-is; URL syntax is validated by the client.
pub(crate) fn resolve_overrides(cli: &Cli) -> ConnectionConfig {
    ConnectionConfig {
        config_file: cli.config.clone(),
        server_urls: cli
            .urls
            .as_ref()
            .map(|csv| csv.split(',').map(str::to_string).collect()),
        cacert: cli.cacert.clone(),
        cert: cli.cert.clone(),
        key: cli.key.clone(),
        token_file: cli.token.clone(),
    }
}

//! Connection settings for the FactDB client.
//!
//! Settings are resolved from three layers, highest precedence first:
//! explicit overrides (CLI flags), the `FACTDB_SERVER_URLS` environment
//! variable, and the CLI config file. Anything still unset falls back to
//! the built-in default endpoint.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

/// Endpoint used when nothing configures one.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Environment variable holding a comma-separated endpoint list.
pub const SERVER_URLS_ENV: &str = "FACTDB_SERVER_URLS";

/// Explicit connection overrides, usually sourced from CLI flags.
///
/// Every field is optional; an absent field means "defer to the next
/// configuration layer", which is distinct from an explicit empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Path of the CLI config file to load instead of the default one.
    pub config_file: Option<PathBuf>,
    /// Server URLs, already split into individual entries.
    pub server_urls: Option<Vec<String>>,
    /// Path of the CA certificate bundle.
    pub cacert: Option<PathBuf>,
    /// Path of the client certificate.
    pub cert: Option<PathBuf>,
    /// Path of the client private key.
    pub key: Option<PathBuf>,
    /// Path of the file holding the auth token.
    pub token_file: Option<PathBuf>,
}

/// Fully resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) server_urls: Vec<String>,
    pub(crate) cacert: Option<PathBuf>,
    pub(crate) cert: Option<PathBuf>,
    pub(crate) key: Option<PathBuf>,
    pub(crate) token_file: Option<PathBuf>,
}

/// On-disk config file shape: `{"factdb": {...}}`.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    factdb: Option<FileSection>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSection {
    server_urls: Option<Vec<String>>,
    cacert: Option<PathBuf>,
    cert: Option<PathBuf>,
    key: Option<PathBuf>,
    #[serde(rename = "token-file")]
    token_file: Option<PathBuf>,
}

/// Resolve the effective settings for `overrides`, consulting the
/// process environment and the config file.
pub(crate) fn resolve(overrides: ConnectionConfig) -> ClientResult<Settings> {
    let env_urls = env::var(SERVER_URLS_ENV).ok();
    let section = load_section(overrides.config_file.as_ref())?;
    Ok(merge(overrides, env_urls, section))
}

/// Merge the three configuration layers. Pure, so the precedence rules
/// are testable without touching the environment or the filesystem.
fn merge(overrides: ConnectionConfig, env_urls: Option<String>, section: FileSection) -> Settings {
    let server_urls = overrides
        .server_urls
        .or_else(|| env_urls.map(|csv| split_urls(&csv)))
        .or(section.server_urls)
        .unwrap_or_else(|| vec![DEFAULT_SERVER_URL.to_string()]);

    Settings {
        server_urls,
        cacert: overrides.cacert.or(section.cacert),
        cert: overrides.cert.or(section.cert),
        key: overrides.key.or(section.key),
        token_file: overrides.token_file.or(section.token_file),
    }
}

/// Load the config file section. An explicitly requested file must
/// exist; the default file is optional.
fn load_section(explicit: Option<&PathBuf>) -> ClientResult<FileSection> {
    let (path, required) = match explicit {
        Some(path) => (path.clone(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(FileSection::default()),
        },
    };

    if !path.exists() {
        if required {
            return Err(ClientError::Config {
                detail: "file not found".to_string(),
                path,
            });
        }
        return Ok(FileSection::default());
    }

    let text = fs::read_to_string(&path).map_err(|err| ClientError::Config {
        detail: err.to_string(),
        path: path.clone(),
    })?;
    let parsed: FileConfig = serde_json::from_str(&text).map_err(|err| ClientError::Config {
        detail: err.to_string(),
        path,
    })?;
    Ok(parsed.factdb.unwrap_or_default())
}

/// Default config file location, `$HOME/.factdb/client.conf`.
fn default_config_path() -> Option<PathBuf> {
    let home = env::var_os("HOME")?;
    let mut path = PathBuf::from(home);
    path.push(".factdb");
    path.push("client.conf");
    Some(path)
}

fn split_urls(csv: &str) -> Vec<String> {
    csv.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_section(urls: &[&str]) -> FileSection {
        FileSection {
            server_urls: Some(urls.iter().map(ToString::to_string).collect()),
            cacert: Some(PathBuf::from("/etc/ssl/file-ca.pem")),
            cert: None,
            key: None,
            token_file: Some(PathBuf::from("/home/op/.factdb-token")),
        }
    }

    #[test]
    fn merge_prefers_overrides_over_everything() {
        let overrides = ConnectionConfig {
            server_urls: Some(vec!["https://a:8081".to_string()]),
            cacert: Some(PathBuf::from("/flag-ca.pem")),
            ..ConnectionConfig::default()
        };
        let settings = merge(
            overrides,
            Some("https://env:8081".to_string()),
            file_section(&["https://file:8081"]),
        );
        assert_eq!(settings.server_urls, vec!["https://a:8081"]);
        assert_eq!(settings.cacert, Some(PathBuf::from("/flag-ca.pem")));
    }

    #[test]
    fn merge_prefers_environment_over_file() {
        let settings = merge(
            ConnectionConfig::default(),
            Some("https://env-a:8081,https://env-b:8081".to_string()),
            file_section(&["https://file:8081"]),
        );
        assert_eq!(
            settings.server_urls,
            vec!["https://env-a:8081", "https://env-b:8081"]
        );
        // Non-URL fields still come from the file.
        assert_eq!(settings.cacert, Some(PathBuf::from("/etc/ssl/file-ca.pem")));
        assert_eq!(
            settings.token_file,
            Some(PathBuf::from("/home/op/.factdb-token"))
        );
    }

    #[test]
    fn merge_falls_back_to_default_endpoint() {
        let settings = merge(ConnectionConfig::default(), None, FileSection::default());
        assert_eq!(settings.server_urls, vec![DEFAULT_SERVER_URL]);
        assert_eq!(settings.cacert, None);
        assert_eq!(settings.token_file, None);
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let missing = PathBuf::from("/nonexistent/factdb/client.conf");
        let err = load_section(Some(&missing)).expect_err("missing explicit file should fail");
        assert!(matches!(err, ClientError::Config { .. }));
    }

    #[test]
    fn config_file_section_is_parsed() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("client.conf");
        fs::write(
            &path,
            r#"{
                "factdb": {
                    "server_urls": ["https://one:8081", "https://two:8081"],
                    "cacert": "/etc/ssl/ca.pem",
                    "token-file": "/home/op/.factdb-token"
                }
            }"#,
        )
        .expect("write config file");

        let section = load_section(Some(&path)).expect("config file should load");
        let settings = merge(ConnectionConfig::default(), None, section);
        assert_eq!(
            settings.server_urls,
            vec!["https://one:8081", "https://two:8081"]
        );
        assert_eq!(settings.cacert, Some(PathBuf::from("/etc/ssl/ca.pem")));
        assert_eq!(
            settings.token_file,
            Some(PathBuf::from("/home/op/.factdb-token"))
        );
    }

    #[test]
    fn malformed_config_file_is_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("client.conf");
        fs::write(&path, "not json").expect("write config file");

        let err = load_section(Some(&path)).expect_err("malformed file should fail");
        assert!(matches!(err, ClientError::Config { .. }));
    }

    #[test]
    fn environment_urls_are_split_without_trimming() {
        let settings = merge(
            ConnectionConfig::default(),
            Some(" https://a:8081 ,https://b:8081".to_string()),
            FileSection::default(),
        );
        assert_eq!(
            settings.server_urls,
            vec![" https://a:8081 ", "https://b:8081"]
        );
    }
}

//! The FactDB HTTP client and its wire operations.

use std::fs;
use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Method, RequestBuilder};
use serde_json::{Map, Value, json};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::config::{self, ConnectionConfig, Settings};
use crate::error::{ClientError, ClientResult};

/// Header carrying the auth token, when one is configured.
const AUTH_HEADER: &str = "X-Authentication";

const QUERY_ENDPOINT: &str = "/fdb/query/v4";
const STATUS_ENDPOINT: &str = "/status/v1/services";
const ARCHIVE_ENDPOINT: &str = "/fdb/admin/v1/archive";

/// A client bound to one or more FactDB endpoints.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    server_urls: Vec<Url>,
    token: Option<String>,
}

impl Client {
    /// Construct a client from explicit overrides, resolving the
    /// remaining settings from the environment and the config file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when a configured endpoint
    /// fails to parse, [`ClientError::Config`] when the config file is
    /// unusable, and [`ClientError::Build`] when the TLS material is
    /// rejected.
    pub fn new(overrides: ConnectionConfig) -> ClientResult<Self> {
        let settings = config::resolve(overrides)?;

        let server_urls = settings
            .server_urls
            .iter()
            .map(|raw| {
                Url::parse(raw).map_err(|source| ClientError::InvalidUrl {
                    url: raw.clone(),
                    source,
                })
            })
            .collect::<ClientResult<Vec<Url>>>()?;
        if server_urls.is_empty() {
            return Err(ClientError::NoEndpoints);
        }

        let token = read_token(&settings)?;
        let http = build_http_client(&settings)?;

        debug!(endpoints = server_urls.len(), "client connection prepared");
        Ok(Self {
            http,
            server_urls,
            token,
        })
    }

    /// Submit `text` to the query endpoint of the configured instances,
    /// returning the first successful response. A query starting with
    /// `[` is submitted as a parsed AST; anything else is submitted
    /// verbatim as a text query.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] when no endpoint is
    /// reachable and [`ClientError::Api`] for an error response.
    pub async fn query(&self, text: &str) -> ClientResult<Value> {
        let body = json!({ "query": parse_query_text(text) });

        let mut last_error = None;
        for base in &self.server_urls {
            let url = join_endpoint(base, QUERY_ENDPOINT)?;
            debug!(url = %url, "sending query request");
            match self
                .request(Method::POST, url)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => return read_json_response(response).await,
                Err(source) => last_error = Some(ClientError::Connection { source }),
            }
        }
        Err(last_error.unwrap_or(ClientError::NoEndpoints))
    }

    /// Fetch the status payload of every configured endpoint, keyed by
    /// the endpoint URL.
    ///
    /// # Errors
    ///
    /// Fails on the first unreachable endpoint or error response.
    pub async fn status(&self) -> ClientResult<Map<String, Value>> {
        let mut statuses = Map::new();
        for base in &self.server_urls {
            let url = join_endpoint(base, STATUS_ENDPOINT)?;
            debug!(url = %url, "sending status request");
            let response = self
                .request(Method::GET, url)
                .send()
                .await
                .map_err(|source| ClientError::Connection { source })?;
            let payload = read_json_response(response).await?;
            statuses.insert(endpoint_label(base), payload);
        }
        Ok(statuses)
    }

    /// Download an archive with the given anonymization profile to
    /// `path`. A partially written file is removed on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the destination cannot be
    /// written, plus the usual connection and API failures.
    pub async fn export(&self, path: &Path, anonymization: &str) -> ClientResult<()> {
        let base = self.server_urls.first().ok_or(ClientError::NoEndpoints)?;
        let mut url = join_endpoint(base, ARCHIVE_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("anonymization", anonymization);

        debug!(url = %url, "sending export request");
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|source| ClientError::Connection { source })?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        if let Err(err) = write_archive(response, path).await {
            let _ = tokio::fs::remove_file(path).await;
            return Err(err);
        }
        Ok(())
    }

    /// Upload the archive at `path` as a multipart request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the archive cannot be read,
    /// plus the usual connection and API failures.
    pub async fn import(&self, path: &Path) -> ClientResult<()> {
        let base = self.server_urls.first().ok_or(ClientError::NoEndpoints)?;
        let url = join_endpoint(base, ARCHIVE_ENDPOINT)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("archive")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("archive", part);

        debug!(url = %url, "sending import request");
        let response = self
            .request(Method::POST, url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ClientError::Connection { source })?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header(AUTH_HEADER, token);
        }
        builder
    }
}

/// A query that looks like a JSON AST is parsed and submitted
/// structurally; malformed AST text is submitted verbatim and rejected
/// by the server instead of locally.
fn parse_query_text(text: &str) -> Value {
    if text.trim_start().starts_with('[') {
        if let Ok(ast) = serde_json::from_str::<Value>(text) {
            return ast;
        }
    }
    Value::String(text.to_string())
}

fn join_endpoint(base: &Url, endpoint: &str) -> ClientResult<Url> {
    base.join(endpoint).map_err(|source| ClientError::InvalidUrl {
        url: base.to_string(),
        source,
    })
}

/// Key used for an endpoint in the status mapping: the URL without the
/// canonical trailing slash.
fn endpoint_label(base: &Url) -> String {
    base.as_str().trim_end_matches('/').to_string()
}

fn read_token(settings: &Settings) -> ClientResult<Option<String>> {
    let Some(path) = &settings.token_file else {
        return Ok(None);
    };
    let text = fs::read_to_string(path).map_err(|source| ClientError::Token {
        path: path.clone(),
        source,
    })?;
    Ok(Some(text.trim().to_string()))
}

fn build_http_client(settings: &Settings) -> ClientResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if let Some(cacert) = &settings.cacert {
        let pem = fs::read(cacert).map_err(|source| ClientError::Io {
            path: cacert.clone(),
            source,
        })?;
        let certificate =
            reqwest::Certificate::from_pem(&pem).map_err(|err| ClientError::Build {
                detail: format!("invalid CA certificate '{}': {err}", cacert.display()),
            })?;
        builder = builder.add_root_certificate(certificate);
    }

    if let (Some(cert), Some(key)) = (&settings.cert, &settings.key) {
        let mut pem = fs::read(cert).map_err(|source| ClientError::Io {
            path: cert.clone(),
            source,
        })?;
        pem.extend(fs::read(key).map_err(|source| ClientError::Io {
            path: key.clone(),
            source,
        })?);
        let identity = reqwest::Identity::from_pem(&pem).map_err(|err| ClientError::Build {
            detail: format!("invalid client certificate or key: {err}"),
        })?;
        builder = builder.identity(identity);
    }

    builder.build().map_err(|err| ClientError::Build {
        detail: err.to_string(),
    })
}

async fn read_json_response(response: reqwest::Response) -> ClientResult<Value> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    response
        .json::<Value>()
        .await
        .map_err(|source| ClientError::Decode { source })
}

async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::Api { status, body }
}

async fn write_archive(response: reqwest::Response, path: &Path) -> ClientResult<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|source| ClientError::Connection { source })?;
        file.write_all(&bytes)
            .await
            .map_err(|source| ClientError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    }
    file.flush().await.map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

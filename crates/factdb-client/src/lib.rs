#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! HTTP client for a FactDB service.
//!
//! Resolves connection settings from explicit overrides, the
//! `FACTDB_SERVER_URLS` environment variable, and the CLI config file,
//! then exposes the four wire operations the `factdb` binary needs:
//! `query`, `status`, `export`, and `import`.
//!
//! Layout:
//! - `config.rs`: `ConnectionConfig` overrides and settings resolution
//! - `client.rs`: the `Client` itself and its wire operations
//! - `error.rs`: `ClientError` and the crate result alias

pub mod client;
pub mod config;
pub mod error;

pub use client::Client;
pub use config::{ConnectionConfig, DEFAULT_SERVER_URL, SERVER_URLS_ENV};
pub use error::{ClientError, ClientResult};

//! The `db` command family: archive export/import and status checks.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde_json::Value;
use tracing::{debug, info};

use factdb_client::ConnectionConfig;

use crate::cli::{ExportArgs, ImportArgs};
use crate::gateway::{self, CliError, CliResult};
use crate::output;

/// Intensity of the scrubbing applied by the remote export operation.
/// Validated at parse time, before any network contact.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum AnonymizationProfile {
    #[default]
    None,
    Low,
    Moderate,
    Full,
}

impl AnonymizationProfile {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Full => "full",
        }
    }
}

pub(crate) async fn handle_status(overrides: ConnectionConfig) -> CliResult<()> {
    debug!("running the status command");

    let client = gateway::open_client(overrides)?;
    let statuses = gateway::fetch_status(&client).await?;
    output::render_json(&Value::Object(statuses))
}

pub(crate) async fn handle_export(overrides: ConnectionConfig, args: &ExportArgs) -> CliResult<()> {
    let destination = absolute_path(&args.path)?;
    info!(path = %destination.display(), "starting export");

    let client = gateway::open_client(overrides)?;
    gateway::run_export(&client, &destination, args.anonymization.as_str()).await
}

pub(crate) async fn handle_import(overrides: ConnectionConfig, args: &ImportArgs) -> CliResult<()> {
    let source = absolute_path(&args.path)?;
    info!(path = %source.display(), "starting import");

    let client = gateway::open_client(overrides)?;
    gateway::run_import(&client, &source).await
}

/// Archive paths are pinned to an absolute form up front, so nothing
/// later depends on the process working directory.
fn absolute_path(path: &Path) -> CliResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|err| CliError::usage(format!("invalid path '{}': {err}", path.display())))
}

//! Rendering helpers for CLI command output.

use serde_json::Value;

use crate::gateway::{CliError, CliResult};

/// Pretty-print a JSON payload to stdout. Data goes to stdout;
/// diagnostics stay on stderr.
pub(crate) fn render_json(value: &Value) -> CliResult<()> {
    let text = to_pretty(value)?;
    println!("{text}");
    Ok(())
}

fn to_pretty(value: &Value) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(CliError::unspecified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payloads_are_pretty_printed() {
        let text = to_pretty(&json!({"certname": "agent-1"})).expect("serialize");
        assert_eq!(text, "{\n  \"certname\": \"agent-1\"\n}");
    }
}

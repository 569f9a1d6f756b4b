//! Entrypoint for the `factdb` binary.

use std::process;

#[tokio::main]
async fn main() {
    process::exit(factdb_cli::run().await);
}

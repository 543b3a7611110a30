// This is the entry point of the command-line host.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Google OAuth2, Sheets, Drive)
// - `nodes/` = Host adapter (typed node outputs, command catalog)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the requested node and print its outputs as JSON on stdout

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use bimone_google_sheets::config::AppConfig;
use bimone_google_sheets::core::auth::AuthContext;
use bimone_google_sheets::core::sheets::SheetsService;
use bimone_google_sheets::infra::google_api::ApiTransport;
use bimone_google_sheets::infra::google_auth::GoogleAuth;
use bimone_google_sheets::infra::google_drive::GoogleDriveClient;
use bimone_google_sheets::infra::google_sheets::GoogleSheetsClient;
use bimone_google_sheets::nodes::commands::{self, Cli};
use bimone_google_sheets::nodes::SheetsNodes;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout only carries node outputs.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    tracing::debug!(
        "Using credentials at {}",
        config.credentials_path.display()
    );

    let auth: AuthContext = Arc::new(GoogleAuth::from_file(
        config.credentials_path.clone(),
        config.token_cache_path.clone(),
    ));
    let transport = Arc::new(
        ApiTransport::new(auth.clone(), &config.application_name)
            .context("Failed to create Google API transport")?,
    );

    let service = SheetsService::new(
        GoogleSheetsClient::new(transport.clone()),
        GoogleDriveClient::new(transport),
        auth,
    );
    let nodes = SheetsNodes::new(service);

    let output = commands::run(&nodes, cli.command)
        .await
        .context("Node failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize node output")?
    );
    Ok(())
}

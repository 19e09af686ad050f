//! `ado-worker` -- Azure DevOps project listing poller.
//!
//! Pulls the project list of one organization on a fixed interval and logs
//! the outcome. Exits with status 1 when the PAT or URL is misconfigured,
//! and with status 0 on SIGINT / SIGTERM.
//!
//! # Environment variables
//!
//! | Variable                               | Required | Default           | Description                          |
//! |----------------------------------------|----------|-------------------|--------------------------------------|
//! | `AZURE_DEVOPS_BASE_URL`                | yes      | --                | e.g. `https://dev.azure.com`         |
//! | `AZURE_DEVOPS_PAT`                     | yes      | --                | Personal access token                |
//! | `AZURE_DEVOPS_ORGANIZATION`            | no       | `ablcode`         | Organization to list projects for    |
//! | `AZURE_DEVOPS_REQUEST_TIMEOUT_SECONDS` | no       | `30`              | Per-request timeout                  |
//! | `POLLING_INTERVAL_SECONDS`             | no       | `60`              | Seconds between two pulls            |
//! | `ADO_SETTINGS_FILE`                    | no       | `appsettings.json`| JSON settings file, overridden by env|
//! | `LOG_FORMAT`                           | no       | `text`            | `json` for structured output         |
//! | `RUST_LOG`                             | no       | `ado_worker=info` | Tracing filter                       |
//!
//! Without `RUST_LOG`, the default level is taken from the settings file's
//! `Serilog:MinimumLevel` or `Logging:LogLevel:Default`, if present.

use ado_core::config::{Settings, SettingsFile};
use ado_worker::client::AzureDevOpsClient;
use ado_worker::poller::Poller;
use ado_worker::{shutdown, telemetry};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let file = SettingsFile::discover();
    let file_level = match &file {
        Ok(Some(file)) => file.log_level(),
        _ => None,
    };

    telemetry::init(telemetry::LogFormat::from_env(), file_level);

    let file = file.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid settings file");
        std::process::exit(1);
    });

    let settings = Settings::from_sources(file, |name| std::env::var(name).ok())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        });

    tracing::info!(
        base_url = %settings.base_url,
        organization = %settings.organization,
        polling_interval_secs = settings.polling_interval_secs,
        "Starting ado-worker",
    );

    let client = AzureDevOpsClient::new(&settings).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to create Azure DevOps client");
        std::process::exit(1);
    });

    let cancel = CancellationToken::new();
    let signal_handle = shutdown::spawn_listener(cancel.clone());

    let poller = Poller::new(client, settings.polling_interval());
    let result = poller.run(cancel.clone()).await;

    cancel.cancel();
    shutdown::join_listener(signal_handle).await;

    if let Err(e) = result {
        tracing::error!(error = %e, "Shutting down due to critical error.");
        std::process::exit(1);
    }

    tracing::info!("Graceful shutdown complete");
}

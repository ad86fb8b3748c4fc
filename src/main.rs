use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use odata_gateway::catalog::Catalog;
use odata_gateway::catalog::category::Category;
use odata_gateway::cli::Cli;
use odata_gateway::gateway::Gateway;
use odata_gateway::stdio::GatewayServer;
use odata_gateway::transport::HttpTransport;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle list-categories flag
    if cli.list_categories {
        println!("Available category filters:");
        for category in Category::concrete() {
            println!("  - {}", category.as_str());
        }
        println!("  - all");
        return Ok(());
    }

    // Load the catalog before anything else; a malformed catalog is the one
    // fatal configuration error.
    let catalog = Catalog::from_file(&cli.catalog)?;

    // Handle list-services flag (admin inspection, no transport needed)
    if cli.list_services {
        let dummy = Arc::new(HttpTransport::new(Default::default())?);
        let gateway = Gateway::new(catalog, dummy);
        println!("Catalog services:");
        for entry in gateway.catalog_listing() {
            let categories: Vec<&str> = entry.categories.iter().map(|c| c.as_str()).collect();
            println!(
                "  - {} ({}): {} entities [{}]",
                entry.id,
                entry.title,
                entry.entity_count,
                categories.join(", ")
            );
        }
        return Ok(());
    }

    let gateway_url = cli.gateway_url.clone().ok_or_else(|| {
        anyhow::anyhow!("--gateway-url (or ODATA_GATEWAY_URL) is required to serve")
    })?;

    let transport = Arc::new(HttpTransport::new(cli.transport_config(gateway_url))?);
    let gateway = Arc::new(Gateway::new(catalog, transport));

    log::info!("Starting stdio server");

    // Create cancellation token for graceful shutdown
    let shutdown_token = tokio_util::sync::CancellationToken::new();

    // Spawn cross-platform signal handler
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        wait_for_interrupt().await;
        log::debug!("Received interrupt signal, shutting down");
        signal_token.cancel();
    });

    let server = GatewayServer::new(gateway);
    tokio::select! {
        result = server.serve_stdio() => result?,
        () = shutdown_token.cancelled() => {
            log::info!("Shutdown requested, stopping stdio server");
        }
    }

    Ok(())
}

/// Wait for interrupt signal (cross-platform)
#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm_result = signal(SignalKind::terminate());
    let mut sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result.as_mut(), sigint_result.as_mut()) {
        (Ok(sigterm), Ok(sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
        }
        (Ok(sigterm), Err(_)) => {
            let _ = sigterm.recv().await;
        }
        (Err(_), Ok(sigint)) => {
            let _ = sigint.recv().await;
        }
        (Err(_), Err(_)) => {
            // If both fail, just wait forever (shouldn't happen)
            let () = std::future::pending().await;
        }
    }
}

/// Wait for interrupt signal (cross-platform)
#[cfg(windows)]
async fn wait_for_interrupt() {
    use tokio::signal::windows;

    match windows::ctrl_c() {
        Ok(mut ctrl_c) => {
            let _ = ctrl_c.recv().await;
        }
        Err(_) => {
            let () = std::future::pending().await;
        }
    }
}

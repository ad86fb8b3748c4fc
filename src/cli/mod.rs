use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::transport::HttpTransportConfig;

/// OData MCP gateway - progressive discovery over a service catalog
///
/// Exposes an arbitrarily large catalog of OData services through three
/// fixed MCP tools:
/// - `search_services`: find candidate services and entities
/// - `describe_entity`: fetch one entity's full schema
/// - `execute_entity_operation`: run a CRUD operation
#[derive(Parser, Debug)]
#[command(name = "odata-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the service catalog JSON file
    ///
    /// The file is produced by the metadata loader and holds every service
    /// with its resolved entity types, keys and capability flags.
    #[arg(long, value_name = "PATH", env = "ODATA_GATEWAY_CATALOG")]
    pub catalog: PathBuf,

    /// Base URL of the OData gateway endpoint
    ///
    /// Example: --gateway-url https://gw.example.com:44300
    #[arg(long, value_name = "URL", env = "ODATA_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Bearer token for the backing services
    ///
    /// One token per server instance: concurrent callers with different
    /// identities each run their own instance.
    #[arg(long, value_name = "TOKEN", env = "ODATA_GATEWAY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// HTTP request timeout in seconds (default: 30)
    /// Can also be set via `ODATA_GATEWAY_TIMEOUT_SECS` environment variable
    #[arg(
        long,
        value_name = "SECONDS",
        env = "ODATA_GATEWAY_TIMEOUT_SECS",
        default_value = "30"
    )]
    pub http_timeout: u64,

    /// List catalog services (id, title, entity count, categories) and exit
    #[arg(long)]
    pub list_services: bool,

    /// List available category filters and exit
    #[arg(long)]
    pub list_categories: bool,
}

impl Cli {
    /// Transport configuration for this instance's caller identity.
    pub fn transport_config(&self, gateway_url: String) -> HttpTransportConfig {
        HttpTransportConfig {
            base_url: gateway_url,
            token: self.token.clone(),
            timeout: Duration::from_secs(self.http_timeout),
        }
    }
}

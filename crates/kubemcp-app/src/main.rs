mod server;
mod sse;
mod tools;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use kubemcp_config::{AppConfig, Transport};
use kubemcp_core::{ConfigLocation, ConnectionManager, KubeClientFactory};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::server::ToolServer;
use crate::tools::ToolRegistry;

/// Kubernetes and OpenKruise tools over JSON-RPC, on stdio or SSE.
#[derive(Debug, Parser)]
#[command(name = "kubemcp", version, about)]
struct Cli {
    /// Configuration file, instead of the user config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Kubeconfig to use instead of $KUBECONFIG or ~/.kube/config
    #[arg(long, value_name = "FILE")]
    kubeconfig: Option<PathBuf>,

    /// tracing filter directive, e.g. `kubemcp_core=debug`
    #[arg(long, value_name = "FILTER")]
    log_filter: Option<String>,

    /// Transport: `stdio` or `sse`
    #[arg(long, value_name = "MODE")]
    mode: Option<Transport>,

    /// Listen address in sse mode, e.g. `:8686` or `127.0.0.1:8686`
    #[arg(long, value_name = "ADDR")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    init_logging(cli.log_filter.as_deref(), &config.logging.filter);

    let manager = ConnectionManager::new(KubeClientFactory).with_connect_timeout(config.connect_timeout());
    if let Some(path) = cli.kubeconfig.or_else(|| config.kubeconfig_path()) {
        match manager.set_location(ConfigLocation::Custom(path.clone())) {
            Ok(change) => info!(path = %path.display(), context = %change.context, "using kubeconfig"),
            Err(e) => warn!(path = %path.display(), error = %e, "kubeconfig not usable, keeping default location"),
        }
    }

    let registry = ToolRegistry::new(Arc::new(manager));
    let server = Arc::new(ToolServer::new(registry, config.server.name.clone()));

    match cli.mode.unwrap_or(config.server.mode) {
        Transport::Stdio => server.serve(tokio::io::stdin(), tokio::io::stdout()).await,
        Transport::Sse => {
            let address = cli.address.unwrap_or(config.server.address);
            sse::serve(server, &address).await
        }
    }
}

/// `--log-filter` wins over `RUST_LOG`, which wins over the config file.
fn init_logging(cli_filter: Option<&str>, config_filter: &str) {
    let filter = match cli_filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_filter)),
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_ansi(false).init();
}

//! Intercepting forwarding proxy binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intercept_proxy::buffer::BufferPools;
use intercept_proxy::config::{loader, ProxyConfig};
use intercept_proxy::handler::LogHandler;
use intercept_proxy::resolver::SystemResolver;
use intercept_proxy::{HttpServer, ProxyEngine};

#[derive(Parser, Debug)]
#[command(
    name = "intercept-proxy",
    about = "Transparent HTTP forwarding proxy with response inspection"
)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => loader::load_config(path)?,
        None => ProxyConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "intercept_proxy={}",
                    config.observability.log_level
                ))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        static_hosts = config.resolver.static_hosts.len(),
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => intercept_proxy::observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "failed to parse metrics address"
            ),
        }
    }

    let resolver = Arc::new(SystemResolver::new(config.resolver.static_hosts.clone()));
    let handler = Arc::new(LogHandler);
    let pools = Arc::new(BufferPools::new());
    let secure = config.listener.tls.is_some();
    let engine = Arc::new(ProxyEngine::new(resolver, handler, pools, secure)?);
    let server = HttpServer::new(engine);

    match &config.listener.tls {
        Some(tls) => {
            let addr = config.listener.bind_address.parse()?;
            server
                .run_tls(addr, Path::new(&tls.cert_path), Path::new(&tls.key_path))
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            server.run(listener).await?;
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}

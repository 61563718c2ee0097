use std::net::SocketAddr;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use error_common::{PharmacyError, Result};
use ibhayi_server::{create_app, IbhayiServer, ServerConfig};

/// Ibhayi Pharmacy HTTP Server
#[derive(Parser, Debug)]
#[command(name = "ibhayi-server")]
#[command(about = "Pharmacy management platform HTTP API server")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(args.verbose)?;

    info!("Starting Ibhayi Pharmacy HTTP server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env()
        .map_err(|e| PharmacyError::ConfigError(format!("Configuration error: {}", e)))?;

    let server = IbhayiServer::new(config)
        .await
        .map_err(|e| PharmacyError::ServerError(format!("Server initialization failed: {}", e)))?;

    let app = create_app(server);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PharmacyError::NetworkError(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server running on http://{}:{}", args.host, args.port);
    info!(
        "Health check available at: http://{}:{}/health",
        args.host, args.port
    );
    info!(
        "API v1 available at: http://{}:{}/api/v1",
        args.host, args.port
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| PharmacyError::ServerError(format!("HTTP server error: {}", e)))?;

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "ibhayi_server=debug,tower_http=debug,sqlx=info"
    } else {
        "ibhayi_server=info,tower_http=info,sqlx=warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| PharmacyError::ConfigError(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

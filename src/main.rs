//! LFS S3 Gateway - Git LFS batch endpoint backed by S3 presigned URLs

use clap::{Parser, Subcommand};
use lambda_runtime::{service_fn, LambdaEvent};
use lfs_s3_gateway::api::{Gateway, GatewayEvent};
use lfs_s3_gateway::config::Config;
use lfs_s3_gateway::server;
use lfs_s3_gateway::storage::S3Backend;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// LFS S3 Gateway - Git LFS authentication and presigned URL broker
#[derive(Parser, Debug)]
#[command(name = "lfs_s3_gateway")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve API Gateway events through the Lambda runtime (default)
    Lambda,

    /// Run a local HTTP server that emulates the API Gateway routes
    Serve {
        /// Listen address (overrides config)
        #[arg(short, long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Handle a single event from a JSON file ("-" for stdin) and print the response
    Invoke {
        #[arg(value_name = "FILE")]
        event: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Lambda);

    // Load configuration from file if specified, otherwise use default loading
    let mut config = if let Some(ref path) = cli.config {
        let mut config = Config::from_file(path)?;
        config
            .backend
            .fill_credentials_from(|key| std::env::var(key).ok());
        config
    } else {
        Config::load()
    };

    // Initialize tracing
    let log_level = if cli.verbose {
        "lfs_s3_gateway=trace,tower_http=trace".to_string()
    } else {
        config.log_level.clone()
    };
    let in_lambda = matches!(command, Command::Lambda);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        // CloudWatch shows escape codes verbatim
        .with(tracing_subscriber::fmt::layer().with_ansi(!in_lambda))
        .init();

    let backend = S3Backend::new(&config.backend)?;
    let gateway = Arc::new(Gateway::new(Arc::new(backend)));

    match command {
        Command::Lambda => run_lambda(gateway).await,
        Command::Serve { listen } => {
            if let Some(ref addr) = listen {
                config.listen_addr = addr.parse()?;
            }
            run_server(gateway, &config).await
        }
        Command::Invoke { event } => run_invoke(&gateway, &event).await,
    }
}

async fn run_lambda(gateway: Arc<Gateway>) -> Result<(), lambda_runtime::Error> {
    info!("Starting LFS S3 Gateway on the Lambda runtime");
    lambda_runtime::run(service_fn(move |event: LambdaEvent<GatewayEvent>| {
        let gateway = gateway.clone();
        async move {
            let (payload, context) = event.into_parts();
            let span = tracing::info_span!("invocation", request_id = %context.request_id);
            let response = gateway.handle(&payload).instrument(span).await?;
            Ok::<_, lambda_runtime::Error>(response)
        }
    }))
    .await
}

async fn run_server(gateway: Arc<Gateway>, config: &Config) -> Result<(), lambda_runtime::Error> {
    info!("Starting LFS S3 Gateway HTTP server");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Region: {}", config.backend.region);
    if let Some(ref ep) = config.backend.endpoint {
        info!("  Endpoint: {}", ep);
    }

    let app = server::router(gateway);
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("LFS S3 Gateway listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn run_invoke(gateway: &Gateway, path: &Path) -> Result<(), lambda_runtime::Error> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    let event: GatewayEvent = serde_json::from_str(&raw)?;

    let span = tracing::info_span!("invocation", request_id = %uuid::Uuid::new_v4());
    let response = gateway.handle(&event).instrument(span).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Handle shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

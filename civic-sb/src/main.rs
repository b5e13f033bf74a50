//! Suggestion box (civic-sb) - Main entry point
//!
//! Serves the suggestion box REST API. The `issue-token` subcommand prints
//! a signed bearer token for operators and exits.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use civic_common::api::{load_token_secret, Role};
use civic_common::config::{
    database_path, ensure_root_folder, resolve_root_folder, uploads_path, TomlConfig,
};
use civic_common::db::init_database;
use civic_sb::services::{JwtIdentityProvider, LocalBlobStore};
use civic_sb::{build_router, AppState};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for civic-sb
#[derive(Parser, Debug)]
#[command(name = "civic-sb")]
#[command(about = "Suggestion box service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "CIVIC_SB_PORT")]
    port: Option<u16>,

    /// Root folder holding the database and uploads
    #[arg(short, long, env = "CIVIC_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Bootstrap TOML config file
    #[arg(short, long, env = "CIVIC_SB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a signed bearer token
    IssueToken {
        /// Subject id carried in the token
        #[arg(long)]
        subject: String,

        /// user, staff, admin or superadmin
        #[arg(long, default_value = "user")]
        role: String,

        /// Lifetime in seconds
        #[arg(long, default_value_t = 86_400)]
        ttl_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load(args.config.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting civic suggestion box (civic-sb) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    ensure_root_folder(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let db_path = database_path(&root_folder);
    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("Database ready at {}", db_path.display());
            pool
        }
        Err(e) => {
            error!("Failed to open database {}: {}", db_path.display(), e);
            return Err(e.into());
        }
    };

    let secret = load_token_secret(&pool, config.auth.token_secret.as_deref())
        .await
        .context("Failed to load token secret")?;
    let identity = JwtIdentityProvider::new(secret, config.auth.issuer.clone());

    if let Some(Command::IssueToken {
        subject,
        role,
        ttl_secs,
    }) = args.command
    {
        let role: Role = role.parse()?;
        println!("{}", identity.issue(&subject, role, ttl_secs)?);
        return Ok(());
    }

    let uploads_dir = uploads_path(&root_folder);
    let state = AppState::new(
        pool,
        Arc::new(identity),
        Arc::new(LocalBlobStore::new(uploads_dir.clone())),
        config.uploads,
        uploads_dir,
    );
    let app = build_router(state);

    let port = args.port.unwrap_or_else(|| config.port());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("civic-sb listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

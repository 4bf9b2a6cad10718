//! Custodian: account lifecycle cleanup service.
//!
//! Sends time-windowed deletion warnings to accounts in their cancellation
//! grace period (exactly once per window, enforced by a persistent reminder
//! ledger) and permanently deletes accounts whose grace period has elapsed,
//! reconciling the external billing subscription first.

mod billing;
mod cleanup;
mod config;
mod db;
mod email;
mod models;
mod observability;
mod routes;

#[cfg(test)]
mod tests;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use tower_http::trace::TraceLayer;

use crate::{
    billing::{BillingClient, StripeClient},
    config::{DatabaseConfig, EngineConfig},
    db::DbPool,
    email::{HttpMailer, Mailer},
};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EngineConfig>,
    pub db: Arc<DbPool>,
    /// Transactional email transport; `None` when unconfigured, in which case
    /// the cleanup trigger fails closed.
    pub mailer: Option<Arc<dyn Mailer>>,
    /// Billing provider client; `None` when unconfigured.
    pub billing: Option<Arc<dyn BillingClient>>,
    /// Single-flight guard for the cleanup run.
    pub run_lock: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] db::DbError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AppState {
    pub async fn new(config: EngineConfig) -> Result<Self, AppError> {
        let db = DbPool::from_config(&config.database).await?;
        if let DatabaseConfig::Sqlite(cfg) = &config.database
            && cfg.run_migrations
        {
            db.run_migrations().await?;
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.server.outbound_timeout_secs))
            .build()?;

        let mailer = HttpMailer::from_config(http.clone(), &config.email)
            .map(|m| Arc::new(m) as Arc<dyn Mailer>);
        if mailer.is_none() {
            tracing::warn!("Email transport not configured; cleanup runs will be rejected");
        }
        let billing = StripeClient::from_config(http, &config.billing)
            .map(|c| Arc::new(c) as Arc<dyn BillingClient>);

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            mailer,
            billing,
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }
}

/// Assemble the router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness))
        .route(
            "/jobs/account-cleanup",
            post(routes::cleanup::trigger_cleanup),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Parser, Debug)]
#[command(version, about = "Custodian account lifecycle cleanup service", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file
    #[arg(short, long, global = true, default_value = "custodian.toml")]
    config: String,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Run database migrations and exit
    ///
    /// Useful for Kubernetes init containers or CI/CD pipelines.
    Migrate,
    /// Execute one cleanup run from the command line and print the JSON
    /// report, bypassing the HTTP trigger
    Run,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Migrate) => run_migrate(&args.config).await,
        Some(Command::Run) => run_once(&args.config).await,
        Some(Command::Serve) | None => run_server(&args.config).await,
    }
}

fn load_config(path: &str) -> EngineConfig {
    match EngineConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

async fn run_server(config_path: &str) {
    let config = load_config(config_path);
    observability::init_tracing(&config.observability.logging);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = match AppState::new(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize application state");
            std::process::exit(1);
        }
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn run_migrate(config_path: &str) {
    let config = load_config(config_path);
    observability::init_tracing(&config.observability.logging);

    let db = match DbPool::from_config(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };
    if let Err(e) = db.run_migrations().await {
        tracing::error!(error = %e, "Migration failed");
        std::process::exit(1);
    }
}

async fn run_once(config_path: &str) {
    let config = load_config(config_path);
    observability::init_tracing(&config.observability.logging);

    let state = match AppState::new(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize application state");
            std::process::exit(1);
        }
    };

    // Same fatal precondition as the HTTP trigger: a reminder phase that
    // cannot deliver must not waste the deletion phase's irreversible work.
    let Some(mailer) = state.mailer.clone() else {
        eprintln!("Error: email transport is not configured");
        std::process::exit(1);
    };

    let engine = cleanup::CleanupEngine::new(
        state.db.accounts(),
        state.db.reminders(),
        mailer,
        state.billing.clone(),
        state.config.cleanup.clone(),
    );
    let report = engine.run().await;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize run report: {}", e);
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

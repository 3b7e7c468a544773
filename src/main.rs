//! Taskcrew Backend Server
//!
//! A multi-tenant task-tracking backend: admins manage employees and assign
//! tasks, employees track the status of their own work.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use taskcrew::api::{self, AppState};
use taskcrew::auth::AuthKeys;
use taskcrew::cli::{Cli, Command};
use taskcrew::config::Config;
use taskcrew::db::Database;
use taskcrew::notify::build_notifier;
use taskcrew::seed;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let mut config = Config::load(cli.config.as_deref().map(std::path::Path::new))?;

    // Override settings from CLI arguments
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command {
        Some(Command::Seed) => {
            config.ensure_db_dir()?;
            let db = Database::open(&config.server.db_path)?;
            seed::run(&db)?;
        }
        Some(Command::Serve) | None => {
            run_server(config).await?;
        }
    }

    Ok(())
}

/// Run the HTTP server until shutdown.
async fn run_server(config: Config) -> Result<()> {
    config.ensure_db_dir()?;

    info!("Starting taskcrew server v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {:?}", config.server.db_path);

    let db = Database::open(&config.server.db_path)?;
    info!("Database initialized successfully");

    if config.auth.jwt_secret == "change-me" {
        tracing::warn!("Using the default JWT secret; set TASKCREW_JWT_SECRET in production");
    }

    let state = AppState {
        db,
        keys: Arc::new(AuthKeys::new(&config.auth.jwt_secret)),
        notifier: build_notifier(config.smtp.as_ref()),
        admin_registration_key: config.auth.admin_registration_key.clone(),
        frontend_url: config.server.frontend_url.clone(),
    };

    api::start_server(state, &config.server.bind, config.server.port).await
}

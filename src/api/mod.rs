//! HTTP server: shared state, router construction, and startup.

pub mod admin;
pub mod auth;
pub mod employee;

use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::AuthKeys;
use crate::db::Database;
use crate::notify::Notifier;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub keys: Arc<AuthKeys>,
    pub notifier: Arc<dyn Notifier>,
    /// Secret required by the public admin-registration endpoint.
    pub admin_registration_key: String,
    /// Base URL reset-password links point at.
    pub frontend_url: String,
}

/// Simple `{message}` response body used by deletion and migration replies.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Public routes
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/register/employee", post(auth::register_employee))
        .route("/auth/register/admin", post(auth::register_admin))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        // Employee routes (authenticated)
        .route("/employee/profile", get(employee::profile))
        .route("/employee/task/{task_id}", put(employee::update_task))
        // Admin routes (authenticated, admin role)
        .route(
            "/admin/employees",
            get(admin::list_employees).post(admin::create_employee),
        )
        .route(
            "/admin/employees/{employee_id}",
            axum::routing::delete(admin::delete_employee),
        )
        .route(
            "/admin/employees/{employee_id}/tasks",
            post(admin::assign_task),
        )
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/tasks", get(admin::list_all_tasks))
        .route(
            "/admin/tasks/{task_id}",
            put(admin::update_task_status).delete(admin::delete_task),
        )
        .route("/admin/migrate-tasks", post(admin::migrate_tasks))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wait for ctrl-c (or SIGTERM on unix) to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Bind and serve until a shutdown signal arrives.
pub async fn start_server(state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Server listening on http://{}", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub mod error;
pub mod handlers;

use std::any::Any;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{middleware, Json, Router};
use log::{error, info};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;

use crate::modules::accounts::service::AccountService;
use crate::modules::auth::{admin_only, protect};
use error::ErrorBody;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AccountService>,
}

impl AppState {
    pub fn new(service: AccountService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let account_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    // route_layer: the last layer added runs first, so `protect` resolves the
    // caller before `admin_only` looks at the role.
    let admin_routes = Router::new()
        .route("/add", post(handlers::add_student))
        .route("/review", post(handlers::review_student))
        .route("/update-status", post(handlers::update_student_status))
        .route_layer(middleware::from_fn(admin_only))
        .route_layer(middleware::from_fn_with_state(state.clone(), protect));

    let student_routes = Router::new()
        .route("/register", post(handlers::request_registration))
        .route(
            "/complete-registration",
            post(handlers::complete_registration),
        )
        .merge(admin_routes);

    Router::new()
        .nest("/api/account", account_routes)
        .nest("/api/students", student_routes)
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(internal_error_on_panic))
        .with_state(state)
}

/// A panicking handler still answers with the generic 500 body
fn internal_error_on_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: "Internal Server Error".to_string(),
        }),
    )
        .into_response()
}

/// Serve until Ctrl-C
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server listening on {}", addr);
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Health check endpoint (public)
//! - `/classes` → Per-class attendance sessions, history and analytics (authenticated users)

use crate::auth::guards::allow_authenticated;
use crate::routes::{classes::classes_routes, health::health_routes};
use crate::state::AppState;
use axum::{Router, middleware::from_fn};

pub mod classes;
pub mod common;
pub mod health;

/// Builds the router for all HTTP endpoints, with `AppState` as its state type.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/classes",
            classes_routes().route_layer(from_fn(allow_authenticated)),
        )
}

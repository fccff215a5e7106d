pub mod auth;
pub mod response;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    middleware::from_fn,
};
use tower_http::cors::CorsLayer;

use crate::{auth::middleware::log_request, routes::routes, state::AppState, ws::ws_routes};

/// The complete application: `/api` routes, `/ws` feeds, request logging and CORS.
pub fn app(app_state: AppState) -> Router {
    let cors = CorsLayer::very_permissive().expose_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes())
        .nest("/ws", ws_routes())
        .with_state(app_state)
        .layer(from_fn(log_request))
        .layer(cors)
}

use axum::{Router, middleware::from_fn};

use crate::{auth::guards::allow_authenticated, state::AppState, ws::attendance::ws_attendance_routes};

pub mod attendance;
pub mod core;

/// WebSocket routes under `/ws`. Every feed requires an authenticated caller;
/// browsers pass the token as `?token=`.
pub fn ws_routes() -> Router<AppState> {
    Router::new()
        .nest("/attendance", ws_attendance_routes())
        .route_layer(from_fn(allow_authenticated))
}

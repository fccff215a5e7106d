use crate::state::AppState;
use axum::Router;

pub mod attendance;

use attendance::attendance_routes;

/// Builds the `/classes` route group.
pub fn classes_routes() -> Router<AppState> {
    Router::new().nest("/{class_id}/attendance", attendance_routes())
}

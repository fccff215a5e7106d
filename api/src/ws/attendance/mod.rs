use axum::{Router, routing::get};

use crate::state::AppState;

pub mod handlers;
pub mod payload;
pub mod topics;

use handlers::attendance_class_ws_handler;

/// `/ws/attendance/classes/{class_id}`: live attendee feed of the class's running session.
pub fn ws_attendance_routes() -> Router<AppState> {
    Router::new().route("/classes/{class_id}", get(attendance_class_ws_handler))
}

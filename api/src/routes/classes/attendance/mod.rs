use axum::{
    Router,
    middleware::from_fn,
    routing::get,
};

use crate::auth::guards::allow_teacher;
use crate::state::AppState;

mod common;
mod get;
mod patch;
mod post;
mod put;

pub use common::{
    AttendanceStatusResponse, AttendeeResponse, AttendeesResponse, LocationReq, MarkAttendanceReq,
    MarkAttendanceResponse, EndSessionReq, StartSessionReq, StartSessionResponse,
};
pub use get::{get_analytics, get_attendees, get_history, get_status};
pub use patch::end_session;
pub use post::start_session;
pub use put::mark_attendance;

/// Routes under `/api/classes/{class_id}/attendance`.
///
/// - `GET /` → status of the current session for the caller
/// - `POST /` → start a session (class creator)
/// - `PUT /` → mark attendance (enrolled student)
/// - `PATCH /` → end a session (session creator)
/// - `GET /attendees` → live attendee list (class creator)
/// - `GET /history` → past sessions (class creator)
/// - `GET /analytics` → attendance aggregates (creator or enrolled student)
pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_status)
                .post(start_session)
                .put(mark_attendance)
                .patch(end_session),
        )
        .route("/attendees", get(get_attendees).route_layer(from_fn(allow_teacher)))
        .route("/history", get(get_history).route_layer(from_fn(allow_teacher)))
        .route("/analytics", get(get_analytics))
}

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use services::StartSession;
use validator::Validate;

use super::common::{DEFAULT_RADIUS_METERS, StartSessionReq, StartSessionResponse};
use crate::{
    auth::AuthUser,
    response::{ApiResponse, attendance_error},
    routes::common::format_validation_errors,
    state::AppState,
};

/// POST /api/classes/{class_id}/attendance
///
/// Start an attendance session for the class. Only the teacher who created
/// the class may start one, and only while no other session is active.
///
/// ### Request Body
/// ```json
/// {
///   "location": { "latitude": 12.9716, "longitude": 77.5946 },
///   "duration": 300,
///   "radius": 50
/// }
/// ```
/// `duration` is in seconds; `radius` is in meters and defaults to 100.
///
/// ### Responses
/// - `201 Created` with `{ "session_id", "end_time" }`
/// - `400 Bad Request` (invalid duration, radius or coordinates)
/// - `401 Unauthorized` (not a teacher)
/// - `403 Forbidden` (not the class creator)
/// - `404 Not Found` (class does not exist)
/// - `409 Conflict` (a session is already active)
pub async fn start_session(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<StartSessionReq>,
) -> (StatusCode, Json<ApiResponse<StartSessionResponse>>) {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&validation_errors))),
        );
    }

    let request = StartSession {
        location: req.location.into(),
        duration_seconds: req.duration,
        radius_meters: req.radius.unwrap_or(DEFAULT_RADIUS_METERS),
    };

    match state
        .manager()
        .start_session(&user.caller(), class_id, request, Utc::now())
        .await
    {
        Ok(started) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                StartSessionResponse::from(started),
                "Attendance session started",
            )),
        ),
        Err(e) => attendance_error(e),
    }
}

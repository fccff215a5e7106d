use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use validator::Validate;

use super::common::{MarkAttendanceReq, MarkAttendanceResponse};
use crate::{
    auth::AuthUser,
    response::{ApiResponse, attendance_error},
    routes::common::format_validation_errors,
    state::AppState,
};

/// PUT /api/classes/{class_id}/attendance
///
/// Mark the caller present in an active session, if they are within the
/// session's geofence.
///
/// ### Request Body
/// ```json
/// { "session_id": 7, "location": { "latitude": 12.9716, "longitude": 77.5946 } }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ "session_id", "student_id", "marked_at" }`
/// - `400 Bad Request` (invalid coordinates, or outside the geofence)
/// - `403 Forbidden` (not enrolled)
/// - `404 Not Found` (no such session in this class, or it is no longer active)
/// - `409 Conflict` (already marked)
pub async fn mark_attendance(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<MarkAttendanceReq>,
) -> (StatusCode, Json<ApiResponse<MarkAttendanceResponse>>) {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&validation_errors))),
        );
    }

    match state
        .manager()
        .mark_attendance(
            &user.caller(),
            class_id,
            req.session_id,
            req.location.into(),
            Utc::now(),
        )
        .await
    {
        Ok(attendee) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                MarkAttendanceResponse::from(attendee),
                "Attendance marked successfully",
            )),
        ),
        Err(e) => attendance_error(e),
    }
}

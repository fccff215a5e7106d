use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use services::history::{AttendanceAnalytics, AttendanceHistory};

use super::common::{AttendanceStatusResponse, AttendeesResponse, HistoryQuery, parse_bound};
use crate::{
    auth::AuthUser,
    response::{ApiResponse, attendance_error},
    state::AppState,
};

/// GET /api/classes/{class_id}/attendance
///
/// Polled by class members to learn whether a session is running and whether
/// they have already marked it.
///
/// ### Response
/// ```json
/// {
///   "success": true,
///   "data": { "active": true, "session_id": 7, "has_marked": false, "end_time": "..." },
///   "message": "Attendance status retrieved"
/// }
/// ```
/// `data` is `{ "active": false }` when no session is running.
pub async fn get_status(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<AttendanceStatusResponse>>) {
    match state
        .manager()
        .status(&user.caller(), class_id, Utc::now())
        .await
    {
        Ok(view) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttendanceStatusResponse::from(view),
                "Attendance status retrieved",
            )),
        ),
        Err(e) => attendance_error(e),
    }
}

/// GET /api/classes/{class_id}/attendance/attendees
///
/// Attendee list of the running session, in marking order. Class creator only.
pub async fn get_attendees(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<AttendeesResponse>>) {
    match state
        .manager()
        .attendees(&user.caller(), class_id, Utc::now())
        .await
    {
        Ok(Some(snapshot)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttendeesResponse::from(snapshot),
                "Attendees retrieved",
            )),
        ),
        Ok(None) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttendeesResponse::default(),
                "No active attendance session",
            )),
        ),
        Err(e) => attendance_error(e),
    }
}

/// GET /api/classes/{class_id}/attendance/history?from=&to=
///
/// Past and current sessions, newest first, each with every enrolled
/// student's attendance. `from` and `to` bound the session start time and
/// accept RFC 3339 timestamps or `YYYY-MM-DD` dates.
pub async fn get_history(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> (StatusCode, Json<ApiResponse<AttendanceHistory>>) {
    let (from, to) = match (
        optional_bound(query.from.as_deref(), false),
        optional_bound(query.to.as_deref(), true),
    ) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(raw), _) | (_, Err(raw)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Invalid date: {raw}"))),
            );
        }
    };

    match state
        .manager()
        .history(&user.caller(), class_id, from, to, Utc::now())
        .await
    {
        Ok(history) => (
            StatusCode::OK,
            Json(ApiResponse::success(history, "Attendance history retrieved")),
        ),
        Err(e) => attendance_error(e),
    }
}

/// An absent or empty bound is `None`; an unparsable one is returned as the error.
fn optional_bound(raw: Option<&str>, upper: bool) -> Result<Option<DateTime<Utc>>, &str> {
    match raw.filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(r) => parse_bound(r, upper).map(Some).ok_or(r),
    }
}

/// GET /api/classes/{class_id}/attendance/analytics
///
/// Class-wide averages and trend for the class creator; personal attendance
/// for an enrolled student.
pub async fn get_analytics(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<AttendanceAnalytics>>) {
    match state
        .manager()
        .analytics(&user.caller(), class_id, Utc::now())
        .await
    {
        Ok(analytics) => (
            StatusCode::OK,
            Json(ApiResponse::success(analytics, "Attendance analytics retrieved")),
        ),
        Err(e) => attendance_error(e),
    }
}

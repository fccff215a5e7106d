use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use super::common::EndSessionReq;
use crate::{
    auth::AuthUser,
    response::{ApiResponse, attendance_error},
    state::AppState,
};

/// PATCH /api/classes/{class_id}/attendance
///
/// End a session before its end time. Ending an already completed session
/// succeeds without changes.
///
/// ### Request Body
/// ```json
/// { "session_id": 7 }
/// ```
///
/// ### Responses
/// - `200 OK`
/// - `403 Forbidden` (not the teacher who started the session)
/// - `404 Not Found` (no such session in this class)
pub async fn end_session(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<EndSessionReq>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    match state
        .manager()
        .end_session(&user.caller(), class_id, req.session_id, Utc::now())
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Attendance session ended")),
        ),
        Err(e) => attendance_error(e),
    }
}

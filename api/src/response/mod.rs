use axum::{Json, http::StatusCode};
use serde::Serialize;
use services::AttendanceError;

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// This struct enforces a consistent response structure across all endpoints:
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// - `T` is the type of the `data` payload.
/// - `success` is a boolean indicating operation status.
/// - `message` provides a human-readable context string.
///
/// ## Example (success):
/// ```json
/// {
///   "success": true,
///   "data": { "session_id": 7, "end_time": "2025-03-01T10:05:00+00:00" },
///   "message": "Attendance session started"
/// }
/// ```
///
/// ## Example (error):
/// ```json
/// {
///   "success": false,
///   "data": null,
///   "message": "Class not found"
/// }
/// ```
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Constructs a success response with the given data and message.
    ///
    /// # Arguments
    /// - `data`: The result payload.
    /// - `message`: A descriptive message to accompany the success.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Constructs an error response with a message and default `data`.
    ///
    /// # Arguments
    /// - `message`: A description of the error.
    ///
    /// # Requires
    /// - `T` must implement `Default`, since error responses do not include useful data.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// HTTP status for an attendance error.
pub fn status_for(err: &AttendanceError) -> StatusCode {
    match err {
        AttendanceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AttendanceError::Forbidden(_) => StatusCode::FORBIDDEN,
        AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
        AttendanceError::Conflict | AttendanceError::AlreadyMarked => StatusCode::CONFLICT,
        AttendanceError::OutOfRange { .. } | AttendanceError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        AttendanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps an attendance error onto the standard error envelope.
///
/// Storage failures are logged and reported without their database detail.
pub fn attendance_error<T>(err: AttendanceError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let status = status_for(&err);
    let message = match &err {
        AttendanceError::Storage(e) => {
            tracing::error!(error = %e, "Attendance storage failure");
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };
    (status, Json(ApiResponse::error(message)))
}

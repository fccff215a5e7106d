use sea_orm::DbErr;

pub type AttendanceResult<T> = Result<T, AttendanceError>;

/// Errors returned by attendance operations.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("An attendance session is already active for this class")]
    Conflict,

    #[error("Attendance already marked for this session")]
    AlreadyMarked,

    #[error("You are {distance:.0} m from the class location (allowed radius {radius:.0} m)")]
    OutOfRange { distance: f64, radius: f64 },

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Storage(#[from] DbErr),
}

impl AttendanceError {
    pub fn no_active_session() -> Self {
        AttendanceError::NotFound("No active attendance session".into())
    }

    pub fn class_not_found() -> Self {
        AttendanceError::NotFound("Class not found".into())
    }

    pub fn session_not_found() -> Self {
        AttendanceError::NotFound("Attendance session not found".into())
    }
}

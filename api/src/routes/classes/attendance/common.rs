use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use services::manager::{AttendeeSnapshot, AttendeeView, SessionStatusView, StartedSession};
use services::{Location, store::Attendee};
use validator::Validate;

/// Default geofence radius in meters when a request leaves it out.
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct LocationReq {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,
}

impl From<LocationReq> for Location {
    fn from(l: LocationReq) -> Self {
        Location::new(l.latitude, l.longitude)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionReq {
    #[validate(nested)]
    pub location: LocationReq,
    /// Seconds the session stays open.
    #[validate(range(min = 1, message = "Duration must be a positive number of seconds"))]
    pub duration: i64,
    #[validate(range(exclusive_min = 0.0, message = "Radius must be a positive number of meters"))]
    pub radius: Option<f64>,
}

#[derive(Debug, Serialize, Default)]
pub struct StartSessionResponse {
    pub session_id: i64,
    pub end_time: String,
}

impl From<StartedSession> for StartSessionResponse {
    fn from(s: StartedSession) -> Self {
        Self {
            session_id: s.session_id,
            end_time: s.end_time.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct MarkAttendanceReq {
    pub session_id: i64,
    #[validate(nested)]
    pub location: LocationReq,
}

#[derive(Debug, Serialize, Default)]
pub struct MarkAttendanceResponse {
    pub session_id: i64,
    pub student_id: i64,
    pub marked_at: String,
}

impl From<Attendee> for MarkAttendanceResponse {
    fn from(a: Attendee) -> Self {
        Self {
            session_id: a.session_id,
            student_id: a.student_id,
            marked_at: a.marked_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EndSessionReq {
    pub session_id: i64,
}

#[derive(Debug, Serialize, Default)]
pub struct AttendanceStatusResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_marked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl From<SessionStatusView> for AttendanceStatusResponse {
    fn from(v: SessionStatusView) -> Self {
        Self {
            active: v.active,
            session_id: v.session_id,
            has_marked: v.has_marked,
            end_time: v.end_time.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AttendeeResponse {
    pub student_id: i64,
    pub name: String,
    pub college_id: String,
    pub marked_at: String,
}

impl From<AttendeeView> for AttendeeResponse {
    fn from(a: AttendeeView) -> Self {
        Self {
            student_id: a.student_id,
            name: a.name,
            college_id: a.college_id,
            marked_at: a.marked_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct AttendeesResponse {
    pub session_id: Option<i64>,
    pub end_time: Option<String>,
    pub attendees: Vec<AttendeeResponse>,
}

impl From<AttendeeSnapshot> for AttendeesResponse {
    fn from(s: AttendeeSnapshot) -> Self {
        Self {
            session_id: Some(s.session_id),
            end_time: Some(s.end_time.to_rfc3339()),
            attendees: s.attendees.into_iter().map(AttendeeResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
///
/// A plain date means the start of that day for a lower bound and its last
/// instant for an upper bound.
pub fn parse_bound(raw: &str, upper: bool) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = if upper {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)?
    };
    Some(date.and_time(time).and_utc())
}

//! Past sessions of a class and simple attendance aggregates.

use chrono::{DateTime, Utc};
use db::models::attendance_session::SessionStatus;
use serde::Serialize;
use std::collections::HashMap;

use crate::directory::StudentProfile;
use crate::error::{AttendanceError, AttendanceResult};
use crate::manager::{AttendanceSessionManager, AttendeeView, Caller};
use crate::store::AttendanceSession;

/// Attendance of one enrolled student in one session.
#[derive(Debug, Clone, Serialize)]
pub struct StudentAttendance {
    pub student_id: i64,
    pub name: String,
    pub college_id: String,
    pub attended: bool,
    pub marked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionHistory {
    pub session_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: SessionStatus,
    pub total_students: i32,
    pub attendees: Vec<AttendeeView>,
    pub enrolled_students: Vec<StudentAttendance>,
    pub attendance_percentage: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AttendanceHistory {
    pub total_sessions: usize,
    pub sessions: Vec<SessionHistory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub attendance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttendanceAnalytics {
    Class {
        average_attendance: u32,
        total_sessions: usize,
        attendance_history: Vec<TrendPoint>,
    },
    Student {
        attended_sessions: usize,
        total_sessions: usize,
        attendance_percentage: u32,
        attendance_history: Vec<TrendPoint>,
    },
}

impl Default for AttendanceAnalytics {
    /// A class with no sessions yet.
    fn default() -> Self {
        Self::Class {
            average_attendance: 0,
            total_sessions: 0,
            attendance_history: Vec::new(),
        }
    }
}

/// `part / whole` as a rounded percentage; `0` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

impl AttendanceSessionManager {
    /// Sessions of a class, newest first, for the class creator.
    pub async fn history(
        &self,
        caller: &Caller,
        class_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AttendanceResult<AttendanceHistory> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AttendanceError::Validation(
                    "`from` must not be after `to`".into(),
                ));
            }
        }
        self.ensure_creator(caller, class_id).await?;
        // Reports an overdue session as completed.
        self.open_session(class_id, now).await?;

        let sessions = self.store().list_sessions(class_id, from, to).await?;
        let enrolled = self.directory().active_students(class_id).await?;

        let mut out = Vec::with_capacity(sessions.len());
        for session in sessions {
            out.push(self.session_history(session, &enrolled).await?);
        }

        Ok(AttendanceHistory {
            total_sessions: out.len(),
            sessions: out,
        })
    }

    /// Class-wide aggregates for the creator, personal ones for an enrolled student.
    pub async fn analytics(
        &self,
        caller: &Caller,
        class_id: i64,
        now: DateTime<Utc>,
    ) -> AttendanceResult<AttendanceAnalytics> {
        let creator = self
            .directory()
            .class_creator(class_id)
            .await?
            .ok_or_else(AttendanceError::class_not_found)?;
        let is_creator = creator == caller.id;
        if !is_creator && !self.directory().is_active_student(class_id, caller.id).await? {
            return Err(AttendanceError::Forbidden(
                "You are not a member of this class".into(),
            ));
        }
        self.open_session(class_id, now).await?;

        // Oldest first for the trend line.
        let mut sessions = self.store().list_sessions(class_id, None, None).await?;
        sessions.reverse();

        if is_creator {
            let enrolled = self.directory().active_student_count(class_id).await? as usize;
            let mut history = Vec::with_capacity(sessions.len());
            for session in &sessions {
                let attendees = self.store().list_attendees(session.id).await?;
                history.push(TrendPoint {
                    date: session.start_time,
                    attendance: percentage(attendees.len(), enrolled),
                });
            }
            let average = if history.is_empty() {
                0
            } else {
                let sum: u32 = history.iter().map(|p| p.attendance).sum();
                (sum as f64 / history.len() as f64).round() as u32
            };
            return Ok(AttendanceAnalytics::Class {
                average_attendance: average,
                total_sessions: sessions.len(),
                attendance_history: history,
            });
        }

        let mut attended = 0;
        let mut history = Vec::with_capacity(sessions.len());
        for session in &sessions {
            let present = self.store().has_attendee(session.id, caller.id).await?;
            if present {
                attended += 1;
            }
            history.push(TrendPoint {
                date: session.start_time,
                attendance: if present { 100 } else { 0 },
            });
        }
        Ok(AttendanceAnalytics::Student {
            attended_sessions: attended,
            total_sessions: sessions.len(),
            attendance_percentage: percentage(attended, sessions.len()),
            attendance_history: history,
        })
    }

    async fn session_history(
        &self,
        session: AttendanceSession,
        enrolled: &[StudentProfile],
    ) -> AttendanceResult<SessionHistory> {
        let snapshot = self.snapshot(&session).await?;
        let marked: HashMap<i64, DateTime<Utc>> = snapshot
            .attendees
            .iter()
            .map(|a| (a.student_id, a.marked_at))
            .collect();

        let enrolled_students = enrolled
            .iter()
            .map(|s| StudentAttendance {
                student_id: s.id,
                name: s.name.clone(),
                college_id: s.college_id.clone(),
                attended: marked.contains_key(&s.id),
                marked_at: marked.get(&s.id).copied(),
            })
            .collect();

        let duration = session.duration();
        // Nearest whole minute.
        let duration_minutes = (duration.num_seconds() + 30).div_euclid(60);

        Ok(SessionHistory {
            session_id: session.id,
            start_time: session.start_time,
            end_time: session.end_time,
            duration_minutes,
            status: session.status,
            total_students: session.total_students,
            attendance_percentage: percentage(snapshot.attendees.len(), enrolled.len()),
            attendees: snapshot.attendees,
            enrolled_students,
        })
    }
}

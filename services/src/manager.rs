//! Attendance session lifecycle.
//!
//! A session is `active` from the moment it is started until a creator ends it
//! or its end time passes, then `completed` for good. Expiry is detected when
//! a session is read, and by the background sweeper.

use chrono::{DateTime, Duration, Utc};
use db::models::{attendance_session::SessionStatus, user::UserRole};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::directory::{ClassDirectory, SeaOrmClassDirectory};
use crate::error::{AttendanceError, AttendanceResult};
use crate::geo::Location;
use crate::store::{
    AppendOutcome, AttendanceSession, AttendanceStore, Attendee, InsertOutcome, NewSession,
    SeaOrmAttendanceStore,
};

/// The authenticated user making a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caller {
    pub id: i64,
    pub role: UserRole,
}

impl Caller {
    pub fn new(id: i64, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }
}

#[derive(Debug, Clone)]
pub struct StartSession {
    pub location: Location,
    pub duration_seconds: i64,
    pub radius_meters: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub session_id: i64,
    pub end_time: DateTime<Utc>,
}

/// What a class member sees while polling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatusView {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_marked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl SessionStatusView {
    fn inactive() -> Self {
        Self {
            active: false,
            session_id: None,
            has_marked: None,
            end_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendeeView {
    pub student_id: i64,
    pub name: String,
    pub college_id: String,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendeeSnapshot {
    pub session_id: i64,
    pub end_time: DateTime<Utc>,
    pub attendees: Vec<AttendeeView>,
}

impl From<&AttendanceSession> for Location {
    fn from(s: &AttendanceSession) -> Self {
        Location::new(s.latitude, s.longitude)
    }
}

#[derive(Clone)]
pub struct AttendanceSessionManager {
    store: Arc<dyn AttendanceStore>,
    directory: Arc<dyn ClassDirectory>,
}

impl AttendanceSessionManager {
    pub fn new(store: Arc<dyn AttendanceStore>, directory: Arc<dyn ClassDirectory>) -> Self {
        Self { store, directory }
    }

    /// Manager backed by the SeaORM store and directory.
    pub fn from_db(db: DatabaseConnection) -> Self {
        Self::new(
            Arc::new(SeaOrmAttendanceStore::new(db.clone())),
            Arc::new(SeaOrmClassDirectory::new(db)),
        )
    }

    pub fn store(&self) -> &Arc<dyn AttendanceStore> {
        &self.store
    }

    pub fn directory(&self) -> &Arc<dyn ClassDirectory> {
        &self.directory
    }

    /// Open a new session for `class_id`. Only the class creator may do so.
    pub async fn start_session(
        &self,
        caller: &Caller,
        class_id: i64,
        req: StartSession,
        now: DateTime<Utc>,
    ) -> AttendanceResult<StartedSession> {
        if !caller.is_teacher() {
            return Err(AttendanceError::Unauthorized(
                "Only teachers can start attendance sessions".into(),
            ));
        }
        self.ensure_creator(caller, class_id).await?;

        if req.duration_seconds <= 0 {
            return Err(AttendanceError::Validation(
                "Duration must be a positive number of seconds".into(),
            ));
        }
        if !req.radius_meters.is_finite() || req.radius_meters <= 0.0 {
            return Err(AttendanceError::Validation(
                "Radius must be a positive number of meters".into(),
            ));
        }
        if !req.location.is_valid() {
            return Err(AttendanceError::Validation("Invalid coordinates".into()));
        }
        let end_time = Duration::try_seconds(req.duration_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| AttendanceError::Validation("Duration is too long".into()))?;

        let total_students = self.directory.active_student_count(class_id).await?;

        let new = NewSession {
            class_id,
            creator_id: caller.id,
            start_time: now,
            end_time,
            location: req.location,
            radius: req.radius_meters,
            total_students: i32::try_from(total_students).unwrap_or(i32::MAX),
        };

        match self.store.insert_session_if_none_active(new).await? {
            InsertOutcome::Inserted(session) => {
                info!(
                    class_id,
                    session_id = session.id,
                    creator_id = caller.id,
                    radius = session.radius,
                    end_time = %session.end_time,
                    "Attendance session started"
                );
                Ok(StartedSession {
                    session_id: session.id,
                    end_time: session.end_time,
                })
            }
            InsertOutcome::ActiveExists => Err(AttendanceError::Conflict),
        }
    }

    /// Record the caller as present in `session_id`.
    pub async fn mark_attendance(
        &self,
        caller: &Caller,
        class_id: i64,
        session_id: i64,
        location: Location,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Attendee> {
        if !location.is_valid() {
            return Err(AttendanceError::Validation("Invalid coordinates".into()));
        }

        let session = self.session_in_class(class_id, session_id).await?;

        if !self.directory.is_active_student(class_id, caller.id).await? {
            return Err(AttendanceError::Forbidden(
                "You are not enrolled in this class".into(),
            ));
        }

        if !session.is_active() {
            return Err(AttendanceError::no_active_session());
        }
        if session.is_expired(now) {
            self.complete(&session, "expired").await?;
            return Err(AttendanceError::no_active_session());
        }

        if self.store.has_attendee(session.id, caller.id).await? {
            return Err(AttendanceError::AlreadyMarked);
        }

        let distance = location.distance_to(&Location::from(&session));
        if distance > session.radius {
            debug!(
                session_id,
                student_id = caller.id,
                distance,
                radius = session.radius,
                "Mark rejected outside geofence"
            );
            return Err(AttendanceError::OutOfRange {
                distance,
                radius: session.radius,
            });
        }

        match self
            .store
            .append_attendee_if_absent(session.id, caller.id, location, now)
            .await?
        {
            AppendOutcome::Appended(attendee) => {
                info!(session_id, student_id = caller.id, distance, "Attendance marked");
                Ok(attendee)
            }
            AppendOutcome::AlreadyPresent => Err(AttendanceError::AlreadyMarked),
            AppendOutcome::SessionNotActive => Err(AttendanceError::no_active_session()),
        }
    }

    /// Close a session early. Ending a completed session is a no-op.
    pub async fn end_session(
        &self,
        caller: &Caller,
        class_id: i64,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> AttendanceResult<()> {
        let session = self.session_in_class(class_id, session_id).await?;

        if session.creator_id != caller.id {
            return Err(AttendanceError::Forbidden(
                "Only the teacher who started this session can end it".into(),
            ));
        }

        if session.is_active() && self.store.update_status(session.id, SessionStatus::Completed).await? {
            info!(
                class_id,
                session_id,
                early = !session.is_expired(now),
                "Attendance session ended"
            );
        }
        Ok(())
    }

    /// Current session state for a class member.
    pub async fn status(
        &self,
        caller: &Caller,
        class_id: i64,
        now: DateTime<Utc>,
    ) -> AttendanceResult<SessionStatusView> {
        let creator = self
            .directory
            .class_creator(class_id)
            .await?
            .ok_or_else(AttendanceError::class_not_found)?;
        if creator != caller.id && !self.directory.is_active_student(class_id, caller.id).await? {
            return Err(AttendanceError::Forbidden(
                "You are not a member of this class".into(),
            ));
        }

        let Some(session) = self.open_session(class_id, now).await? else {
            return Ok(SessionStatusView::inactive());
        };

        let has_marked = self.store.has_attendee(session.id, caller.id).await?;
        Ok(SessionStatusView {
            active: true,
            session_id: Some(session.id),
            has_marked: Some(has_marked),
            end_time: Some(session.end_time),
        })
    }

    /// Attendee list of the class's open session, for the class creator.
    pub async fn attendees(
        &self,
        caller: &Caller,
        class_id: i64,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Option<AttendeeSnapshot>> {
        self.ensure_creator(caller, class_id).await?;

        match self.open_session(class_id, now).await? {
            Some(session) => Ok(Some(self.snapshot(&session).await?)),
            None => Ok(None),
        }
    }

    /// Complete every overdue active session.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> AttendanceResult<u64> {
        let expired = self.store.expire_due(now).await?;
        if expired > 0 {
            info!(expired, "Expired overdue attendance sessions");
        }
        Ok(expired)
    }

    /// Fails with `NotFound` for a missing class and `Forbidden` for anyone
    /// other than its creator.
    pub async fn ensure_creator(&self, caller: &Caller, class_id: i64) -> AttendanceResult<()> {
        let creator = self
            .directory
            .class_creator(class_id)
            .await?
            .ok_or_else(AttendanceError::class_not_found)?;
        if creator != caller.id {
            return Err(AttendanceError::Forbidden(
                "Only the class creator can do this".into(),
            ));
        }
        Ok(())
    }

    /// The class's active session, unless it is past its end time.
    ///
    /// An overdue session is completed on the way; a failure to write that is
    /// logged and the session still reads as closed.
    pub async fn open_session(
        &self,
        class_id: i64,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Option<AttendanceSession>> {
        let Some(session) = self.store.find_active_session(class_id).await? else {
            return Ok(None);
        };
        if session.is_expired(now) {
            if let Err(err) = self.complete(&session, "expired").await {
                warn!(class_id, session_id = session.id, error = %err, "Lazy expiry failed");
            }
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Attendees of `session` joined with their display identity, in marking order.
    pub async fn snapshot(&self, session: &AttendanceSession) -> AttendanceResult<AttendeeSnapshot> {
        let attendees = self.store.list_attendees(session.id).await?;
        let ids: Vec<i64> = attendees.iter().map(|a| a.student_id).collect();
        let mut profiles = self.directory.profiles(&ids).await?;

        let attendees = attendees
            .into_iter()
            .map(|a| {
                let profile = profiles.remove(&a.student_id);
                AttendeeView {
                    student_id: a.student_id,
                    name: profile.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
                    college_id: profile.map(|p| p.college_id).unwrap_or_default(),
                    marked_at: a.marked_at,
                }
            })
            .collect();

        Ok(AttendeeSnapshot {
            session_id: session.id,
            end_time: session.end_time,
            attendees,
        })
    }

    pub(crate) async fn complete(
        &self,
        session: &AttendanceSession,
        reason: &'static str,
    ) -> AttendanceResult<()> {
        if self.store.update_status(session.id, SessionStatus::Completed).await? {
            info!(
                class_id = session.class_id,
                session_id = session.id,
                reason,
                "Attendance session completed"
            );
        }
        Ok(())
    }

    async fn session_in_class(
        &self,
        class_id: i64,
        session_id: i64,
    ) -> AttendanceResult<AttendanceSession> {
        self.store
            .find_session(session_id)
            .await?
            .filter(|s| s.class_id == class_id)
            .ok_or_else(AttendanceError::session_not_found)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db::models::{attendance_session::SessionStatus, class, enrollment, user};
use db::test_utils::{setup_file_test_db, setup_test_db};
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use crate::geo::{EARTH_RADIUS_M, Location};
use crate::manager::{AttendanceSessionManager, Caller};
use crate::store::{
    AppendOutcome, AttendanceSession, AttendanceStore, Attendee, InsertOutcome, NewSession,
    SeaOrmAttendanceStore,
};

/// Bengaluru city centre.
pub const BLR: Location = Location {
    latitude: 12.9716,
    longitude: 77.5946,
};

/// `meters` due north of `from`.
pub fn point_north(from: Location, meters: f64) -> Location {
    Location::new(
        from.latitude + (meters / EARTH_RADIUS_M).to_degrees(),
        from.longitude,
    )
}

/// One teacher, one class, two enrolled students and one outsider.
pub struct Fixture {
    pub db: DatabaseConnection,
    pub teacher_id: i64,
    pub class_id: i64,
    pub students: Vec<i64>,
    pub outsider_id: i64,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::seed(setup_test_db().await).await
    }

    /// Same data in a database file behind a multi-connection pool.
    ///
    /// Keep the returned `TempDir` alive for as long as the fixture is used.
    pub async fn on_disk() -> (Self, TempDir) {
        let dir = TempDir::new().expect("failed to create tempdir");
        let db = setup_file_test_db(&dir.path().join("attendance.db")).await;
        (Self::seed(db).await, dir)
    }

    async fn seed(db: DatabaseConnection) -> Self {
        let teacher = user::Model::create(&db, "teacher", "teacher@test.com", "Teacher", "T-001", user::UserRole::Teacher)
            .await
            .unwrap();
        let class = class::Model::create(&db, "Surveying 101", teacher.id).await.unwrap();

        let mut students = Vec::new();
        for n in 1..=2 {
            let s = user::Model::create(
                &db,
                &format!("student{n}"),
                &format!("student{n}@test.com"),
                &format!("Student {n}"),
                &format!("S-00{n}"),
                user::UserRole::Student,
            )
            .await
            .unwrap();
            enrollment::Model::enroll(&db, class.id, s.id).await.unwrap();
            students.push(s.id);
        }

        let outsider = user::Model::create(&db, "outsider", "outsider@test.com", "Outsider", "S-999", user::UserRole::Student)
            .await
            .unwrap();

        Self {
            db,
            teacher_id: teacher.id,
            class_id: class.id,
            students,
            outsider_id: outsider.id,
        }
    }

    pub fn manager(&self) -> AttendanceSessionManager {
        AttendanceSessionManager::from_db(self.db.clone())
    }

    pub fn teacher(&self) -> Caller {
        Caller::new(self.teacher_id, user::UserRole::Teacher)
    }

    pub fn student(&self, i: usize) -> Caller {
        Caller::new(self.students[i], user::UserRole::Student)
    }

    /// A second teacher with no relation to the fixture class.
    pub async fn other_teacher(&self) -> Caller {
        let u = user::Model::create(&self.db, "other", "other@test.com", "Other", "T-002", user::UserRole::Teacher)
            .await
            .unwrap();
        Caller::new(u.id, user::UserRole::Teacher)
    }

    /// Another class owned by the fixture teacher.
    pub async fn another_class(&self) -> i64 {
        class::Model::create(&self.db, "Geodesy 201", self.teacher_id)
            .await
            .unwrap()
            .id
    }
}

/// Store that fails a set number of upcoming calls.
pub struct FlakyStore {
    inner: SeaOrmAttendanceStore,
    failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            inner: SeaOrmAttendanceStore::new(db),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn remaining_failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), DbErr> {
        let took = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match took {
            Ok(_) => Err(DbErr::Custom("injected failure".into())),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl AttendanceStore for FlakyStore {
    async fn insert_session_if_none_active(&self, new: NewSession) -> Result<InsertOutcome, DbErr> {
        self.check()?;
        self.inner.insert_session_if_none_active(new).await
    }

    async fn find_session(&self, session_id: i64) -> Result<Option<AttendanceSession>, DbErr> {
        self.check()?;
        self.inner.find_session(session_id).await
    }

    async fn find_active_session(&self, class_id: i64) -> Result<Option<AttendanceSession>, DbErr> {
        self.check()?;
        self.inner.find_active_session(class_id).await
    }

    async fn append_attendee_if_absent(
        &self,
        session_id: i64,
        student_id: i64,
        location: Location,
        now: DateTime<Utc>,
    ) -> Result<AppendOutcome, DbErr> {
        self.check()?;
        self.inner
            .append_attendee_if_absent(session_id, student_id, location, now)
            .await
    }

    async fn has_attendee(&self, session_id: i64, student_id: i64) -> Result<bool, DbErr> {
        self.check()?;
        self.inner.has_attendee(session_id, student_id).await
    }

    async fn update_status(&self, session_id: i64, status: SessionStatus) -> Result<bool, DbErr> {
        self.check()?;
        self.inner.update_status(session_id, status).await
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, DbErr> {
        self.check()?;
        self.inner.expire_due(now).await
    }

    async fn list_attendees(&self, session_id: i64) -> Result<Vec<Attendee>, DbErr> {
        self.check()?;
        self.inner.list_attendees(session_id).await
    }

    async fn list_sessions(
        &self,
        class_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AttendanceSession>, DbErr> {
        self.check()?;
        self.inner.list_sessions(class_id, from, to).await
    }
}

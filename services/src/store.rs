//! Persistence boundary for attendance sessions and their attendees.
//!
//! Every mutation that guards an invariant is a single conditional statement,
//! so concurrent requests cannot both pass a read-then-write check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db::models::{
    attendance_attendee::{self, Entity as AttendeeEntity},
    attendance_session::{self, Entity as SessionEntity, SessionStatus},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, SqlErr, TransactionTrait,
    ActiveValue::Set,
    sea_query::{Expr, Query},
};

use crate::geo::Location;

pub use db::models::attendance_attendee::Model as Attendee;
pub use db::models::attendance_session::Model as AttendanceSession;

/// Values for a session about to be opened.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub class_id: i64,
    pub creator_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Location,
    pub radius: f64,
    pub total_students: i32,
}

#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(AttendanceSession),
    /// Another session of the class is still active.
    ActiveExists,
}

#[derive(Debug)]
pub enum AppendOutcome {
    Appended(Attendee),
    AlreadyPresent,
    /// The session is completed or past its end time.
    SessionNotActive,
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Expire overdue active sessions of the class, then insert `new` unless an
    /// active one remains. Both steps commit together.
    async fn insert_session_if_none_active(&self, new: NewSession) -> Result<InsertOutcome, DbErr>;

    async fn find_session(&self, session_id: i64) -> Result<Option<AttendanceSession>, DbErr>;

    /// The stored active session of a class, overdue or not. Callers decide
    /// whether to expire it.
    async fn find_active_session(&self, class_id: i64) -> Result<Option<AttendanceSession>, DbErr>;

    /// Append a mark only if the session is active at `now` and the student is
    /// not yet present.
    async fn append_attendee_if_absent(
        &self,
        session_id: i64,
        student_id: i64,
        location: Location,
        now: DateTime<Utc>,
    ) -> Result<AppendOutcome, DbErr>;

    async fn has_attendee(&self, session_id: i64, student_id: i64) -> Result<bool, DbErr>;

    /// Move an active session to `status`. Returns `false` if it was not active.
    async fn update_status(&self, session_id: i64, status: SessionStatus) -> Result<bool, DbErr>;

    /// Complete every active session whose end time is at or before `now`.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, DbErr>;

    /// Attendees in marking order.
    async fn list_attendees(&self, session_id: i64) -> Result<Vec<Attendee>, DbErr>;

    /// Sessions of a class, newest first, optionally bounded on `start_time`.
    async fn list_sessions(
        &self,
        class_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AttendanceSession>, DbErr>;
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// `AttendanceStore` over the SeaORM entities.
#[derive(Clone)]
pub struct SeaOrmAttendanceStore {
    db: DatabaseConnection,
}

impl SeaOrmAttendanceStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttendanceStore for SeaOrmAttendanceStore {
    async fn insert_session_if_none_active(&self, new: NewSession) -> Result<InsertOutcome, DbErr> {
        let txn = self.db.begin().await?;

        SessionEntity::update_many()
            .col_expr(
                attendance_session::Column::Status,
                Expr::value(SessionStatus::Completed),
            )
            .filter(attendance_session::Column::ClassId.eq(new.class_id))
            .filter(attendance_session::Column::Status.eq(SessionStatus::Active))
            .filter(attendance_session::Column::EndTime.lte(new.start_time))
            .exec(&txn)
            .await?;

        let row = attendance_session::ActiveModel {
            class_id: Set(new.class_id),
            creator_id: Set(new.creator_id),
            start_time: Set(new.start_time),
            end_time: Set(new.end_time),
            latitude: Set(new.location.latitude),
            longitude: Set(new.location.longitude),
            radius: Set(new.radius),
            status: Set(SessionStatus::Active),
            total_students: Set(new.total_students),
            ..Default::default()
        };

        match row.insert(&txn).await {
            Ok(model) => {
                txn.commit().await?;
                Ok(InsertOutcome::Inserted(model))
            }
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                Ok(InsertOutcome::ActiveExists)
            }
            Err(err) => Err(err),
        }
    }

    async fn find_session(&self, session_id: i64) -> Result<Option<AttendanceSession>, DbErr> {
        SessionEntity::find_by_id(session_id).one(&self.db).await
    }

    async fn find_active_session(&self, class_id: i64) -> Result<Option<AttendanceSession>, DbErr> {
        SessionEntity::find()
            .filter(attendance_session::Column::ClassId.eq(class_id))
            .filter(attendance_session::Column::Status.eq(SessionStatus::Active))
            .one(&self.db)
            .await
    }

    async fn append_attendee_if_absent(
        &self,
        session_id: i64,
        student_id: i64,
        location: Location,
        now: DateTime<Utc>,
    ) -> Result<AppendOutcome, DbErr> {
        // INSERT ... SELECT: no row is produced unless the session is open.
        let open_session = Query::select()
            .column(attendance_session::Column::Id)
            .expr(Expr::value(student_id))
            .expr(Expr::value(location.latitude))
            .expr(Expr::value(location.longitude))
            .expr(Expr::value(now))
            .from(SessionEntity)
            .and_where(attendance_session::Column::Id.eq(session_id))
            .and_where(attendance_session::Column::Status.eq(SessionStatus::Active))
            .and_where(attendance_session::Column::EndTime.gt(now))
            .to_owned();

        let insert = Query::insert()
            .into_table(AttendeeEntity)
            .columns([
                attendance_attendee::Column::SessionId,
                attendance_attendee::Column::StudentId,
                attendance_attendee::Column::Latitude,
                attendance_attendee::Column::Longitude,
                attendance_attendee::Column::MarkedAt,
            ])
            .select_from(open_session)
            .map_err(|e| DbErr::Custom(e.to_string()))?
            .to_owned();

        let backend = self.db.get_database_backend();
        match self.db.execute(backend.build(&insert)).await {
            Ok(res) if res.rows_affected() == 0 => Ok(AppendOutcome::SessionNotActive),
            Ok(_) => AttendeeEntity::find()
                .filter(attendance_attendee::Column::SessionId.eq(session_id))
                .filter(attendance_attendee::Column::StudentId.eq(student_id))
                .one(&self.db)
                .await?
                .map(AppendOutcome::Appended)
                .ok_or_else(|| DbErr::RecordNotFound("Inserted attendee not found".into())),
            Err(err) if is_unique_violation(&err) => Ok(AppendOutcome::AlreadyPresent),
            Err(err) => Err(err),
        }
    }

    async fn has_attendee(&self, session_id: i64, student_id: i64) -> Result<bool, DbErr> {
        let found = AttendeeEntity::find()
            .filter(attendance_attendee::Column::SessionId.eq(session_id))
            .filter(attendance_attendee::Column::StudentId.eq(student_id))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn update_status(&self, session_id: i64, status: SessionStatus) -> Result<bool, DbErr> {
        // Only active sessions move; completed is terminal.
        let res = SessionEntity::update_many()
            .col_expr(attendance_session::Column::Status, Expr::value(status))
            .filter(attendance_session::Column::Id.eq(session_id))
            .filter(attendance_session::Column::Status.eq(SessionStatus::Active))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, DbErr> {
        let res = SessionEntity::update_many()
            .col_expr(
                attendance_session::Column::Status,
                Expr::value(SessionStatus::Completed),
            )
            .filter(attendance_session::Column::Status.eq(SessionStatus::Active))
            .filter(attendance_session::Column::EndTime.lte(now))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    async fn list_attendees(&self, session_id: i64) -> Result<Vec<Attendee>, DbErr> {
        AttendeeEntity::find()
            .filter(attendance_attendee::Column::SessionId.eq(session_id))
            .order_by_asc(attendance_attendee::Column::Id)
            .all(&self.db)
            .await
    }

    async fn list_sessions(
        &self,
        class_id: i64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AttendanceSession>, DbErr> {
        let mut query =
            SessionEntity::find().filter(attendance_session::Column::ClassId.eq(class_id));
        if let Some(from) = from {
            query = query.filter(attendance_session::Column::StartTime.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(attendance_session::Column::StartTime.lte(to));
        }
        query
            .order_by_desc(attendance_session::Column::StartTime)
            .order_by_desc(attendance_session::Column::Id)
            .all(&self.db)
            .await
    }
}

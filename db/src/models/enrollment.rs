use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};

/// Membership of a student in a class.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EnrollmentStatus {
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "dropped")]
    Dropped,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id",
        on_delete = "Cascade"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Enroll `student_id` in `class_id`, reactivating a dropped enrollment.
    pub async fn enroll(db: &DbConn, class_id: i64, student_id: i64) -> Result<(), DbErr> {
        Self::set_status(db, class_id, student_id, EnrollmentStatus::Active).await
    }

    pub async fn set_status(
        db: &DbConn,
        class_id: i64,
        student_id: i64,
        status: EnrollmentStatus,
    ) -> Result<(), DbErr> {
        let row = ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            status: Set(status),
            enrolled_at: Set(Utc::now()),
        };

        Entity::insert(row)
            .on_conflict(
                OnConflict::columns([Column::ClassId, Column::StudentId])
                    .update_column(Column::Status)
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    pub async fn is_active_student(
        db: &DbConn,
        class_id: i64,
        student_id: i64,
    ) -> Result<bool, DbErr> {
        let count = Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(EnrollmentStatus::Active))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// Ids of actively enrolled students, in enrollment order.
    pub async fn active_student_ids(db: &DbConn, class_id: i64) -> Result<Vec<i64>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::StudentId)
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Status.eq(EnrollmentStatus::Active))
            .order_by_asc(Column::EnrolledAt)
            .order_by_asc(Column::StudentId)
            .into_tuple::<i64>()
            .all(db)
            .await
    }
}

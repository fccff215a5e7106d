//! Read-only lookups of classes, enrollments and student identities.

use async_trait::async_trait;
use db::models::{class, enrollment, user};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use std::collections::HashMap;

/// Display identity of a student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    pub id: i64,
    pub name: String,
    pub college_id: String,
}

impl From<user::Model> for StudentProfile {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            college_id: u.college_id,
        }
    }
}

#[async_trait]
pub trait ClassDirectory: Send + Sync {
    /// Creator of the class, or `None` if it does not exist.
    async fn class_creator(&self, class_id: i64) -> Result<Option<i64>, DbErr>;

    async fn is_active_student(&self, class_id: i64, user_id: i64) -> Result<bool, DbErr>;

    async fn active_student_count(&self, class_id: i64) -> Result<u64, DbErr>;

    /// Actively enrolled students in enrollment order.
    async fn active_students(&self, class_id: i64) -> Result<Vec<StudentProfile>, DbErr>;

    /// Profiles keyed by user id. Unknown ids are left out.
    async fn profiles(&self, user_ids: &[i64]) -> Result<HashMap<i64, StudentProfile>, DbErr>;
}

#[derive(Clone)]
pub struct SeaOrmClassDirectory {
    db: DatabaseConnection,
}

impl SeaOrmClassDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClassDirectory for SeaOrmClassDirectory {
    async fn class_creator(&self, class_id: i64) -> Result<Option<i64>, DbErr> {
        class::Model::creator_of(&self.db, class_id).await
    }

    async fn is_active_student(&self, class_id: i64, user_id: i64) -> Result<bool, DbErr> {
        enrollment::Model::is_active_student(&self.db, class_id, user_id).await
    }

    async fn active_student_count(&self, class_id: i64) -> Result<u64, DbErr> {
        let ids = enrollment::Model::active_student_ids(&self.db, class_id).await?;
        Ok(ids.len() as u64)
    }

    async fn active_students(&self, class_id: i64) -> Result<Vec<StudentProfile>, DbErr> {
        let ids = enrollment::Model::active_student_ids(&self.db, class_id).await?;
        let mut by_id = self.profiles(&ids).await?;
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn profiles(&self, user_ids: &[i64]) -> Result<HashMap<i64, StudentProfile>, DbErr> {
        let users = user::Model::find_many(&self.db, user_ids).await?;
        Ok(users
            .into_iter()
            .map(|u| (u.id, StudentProfile::from(u)))
            .collect())
    }
}

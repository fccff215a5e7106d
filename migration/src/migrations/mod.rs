pub mod m202510010001_create_users;
pub mod m202510010002_create_classes;
pub mod m202510010003_create_enrollments;
pub mod m202510010004_create_attendance;

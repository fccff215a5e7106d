pub mod attendance_attendee;
pub mod attendance_session;
pub mod class;
pub mod enrollment;
pub mod user;

pub use attendance_attendee::Entity as AttendanceAttendee;
pub use attendance_session::Entity as AttendanceSession;
pub use class::Entity as Class;
pub use enrollment::Entity as Enrollment;
pub use user::Entity as User;

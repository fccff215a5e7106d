use serde::Serialize;
use services::{FeedEvent, manager::AttendeeSnapshot};

use super::topics::attendance_class_topic;
use crate::routes::classes::attendance::AttendeeResponse;
use crate::ws::core::event::Event;

/// Full attendee list of the running session, pushed on every poll.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSnapshot {
    pub class_id: i64,
    pub session_id: i64,
    pub end_time: String, // RFC3339
    pub count: usize,
    pub attendees: Vec<AttendeeResponse>,
}

impl Event for AttendanceSnapshot {
    const NAME: &'static str = "attendance.snapshot";
    fn topic_path(&self) -> String {
        attendance_class_topic(self.class_id)
    }
}

/// Last event of a feed; the server closes the socket right after it.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceCompleted {
    pub class_id: i64,
    pub session_id: Option<i64>,
}

impl Event for AttendanceCompleted {
    const NAME: &'static str = "attendance.completed";
    fn topic_path(&self) -> String {
        attendance_class_topic(self.class_id)
    }
}

impl AttendanceSnapshot {
    pub fn new(class_id: i64, snapshot: AttendeeSnapshot) -> Self {
        Self {
            class_id,
            session_id: snapshot.session_id,
            end_time: snapshot.end_time.to_rfc3339(),
            count: snapshot.attendees.len(),
            attendees: snapshot.attendees.into_iter().map(Into::into).collect(),
        }
    }
}

/// Envelope text for one feed event.
pub fn feed_frame(class_id: i64, event: FeedEvent) -> Option<String> {
    match event {
        FeedEvent::Snapshot(snapshot) => AttendanceSnapshot::new(class_id, snapshot).to_frame(),
        FeedEvent::Completed { session_id } => AttendanceCompleted {
            class_id,
            session_id,
        }
        .to_frame(),
    }
}

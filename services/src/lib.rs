//! Geofenced attendance sessions: lifecycle, marking, live feed and history.

pub mod directory;
pub mod error;
pub mod feed;
pub mod geo;
pub mod history;
pub mod manager;
pub mod store;
pub mod sweeper;

#[cfg(test)]
mod test_support;

pub use error::{AttendanceError, AttendanceResult};
pub use feed::{FeedEvent, FeedStream, LiveFeed};
pub use geo::{Location, distance};
pub use manager::{AttendanceSessionManager, Caller, StartSession};

use sea_orm::DatabaseConnection;
use services::{AttendanceSessionManager, LiveFeed};
use std::time::Duration;
use util::config;

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    manager: AttendanceSessionManager,
    feed: LiveFeed,
}

impl AppState {
    /// State with the feed polling every `FEED_POLL_SECONDS`.
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_poll_interval(db, Duration::from_secs(config::feed_poll_seconds()))
    }

    pub fn with_poll_interval(db: DatabaseConnection, poll_every: Duration) -> Self {
        let manager = AttendanceSessionManager::from_db(db.clone());
        let feed = LiveFeed::new(manager.clone(), poll_every);
        Self { db, manager, feed }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn manager(&self) -> &AttendanceSessionManager {
        &self.manager
    }

    pub fn feed(&self) -> &LiveFeed {
        &self.feed
    }
}

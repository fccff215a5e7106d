//! Live attendee feed for a class creator.
//!
//! The feed polls the store on a fixed interval and yields the full attendee
//! list each time. It follows the session that was active at the first
//! successful poll and ends with [`FeedEvent::Completed`] once that session is
//! over. Dropping the stream stops the polling.

use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::AttendanceResult;
use crate::manager::{AttendanceSessionManager, AttendeeSnapshot, Caller};

/// Events of one feed subscription. Ends after the first terminal event.
pub type FeedStream = Pin<Box<dyn Stream<Item = FeedEvent> + Send>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEvent {
    Snapshot(AttendeeSnapshot),
    /// Terminal. `session_id` is `None` when no session was active at subscribe time.
    Completed { session_id: Option<i64> },
}

impl FeedEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FeedEvent::Completed { .. })
    }
}

#[derive(Clone)]
pub struct LiveFeed {
    manager: AttendanceSessionManager,
    poll_every: Duration,
}

impl LiveFeed {
    pub fn new(manager: AttendanceSessionManager, poll_every: Duration) -> Self {
        Self {
            manager,
            poll_every,
        }
    }

    /// Subscribe the class creator to attendee snapshots of `class_id`.
    ///
    /// The first poll happens as soon as the stream is polled.
    pub async fn subscribe(
        &self,
        caller: &Caller,
        class_id: i64,
    ) -> AttendanceResult<FeedStream> {
        self.manager.ensure_creator(caller, class_id).await?;

        let mut interval = tokio::time::interval(self.poll_every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let state = FeedState {
            manager: self.manager.clone(),
            class_id,
            interval,
            session_id: None,
            finished: false,
        };

        Ok(futures::stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }
            loop {
                state.interval.tick().await;
                match state.poll().await {
                    Ok(event) => {
                        state.finished = event.is_terminal();
                        return Some((event, state));
                    }
                    Err(err) => {
                        warn!(class_id = state.class_id, error = %err, "Attendance feed poll failed");
                    }
                }
            }
        })
        .boxed())
    }
}

struct FeedState {
    manager: AttendanceSessionManager,
    class_id: i64,
    interval: Interval,
    /// Session the feed locked onto at its first successful poll.
    session_id: Option<i64>,
    finished: bool,
}

impl FeedState {
    async fn poll(&mut self) -> AttendanceResult<FeedEvent> {
        let now = Utc::now();
        let store = self.manager.store();

        let session = match self.session_id {
            None => store.find_active_session(self.class_id).await?,
            Some(id) => store.find_session(id).await?,
        };

        let Some(session) = session else {
            return Ok(FeedEvent::Completed {
                session_id: self.session_id,
            });
        };
        if !session.is_active() {
            return Ok(FeedEvent::Completed {
                session_id: Some(session.id),
            });
        }
        if session.is_expired(now) {
            self.manager.complete(&session, "expired").await?;
            return Ok(FeedEvent::Completed {
                session_id: Some(session.id),
            });
        }

        let snapshot = self.manager.snapshot(&session).await?;
        if self.session_id.is_none() {
            debug!(class_id = self.class_id, session_id = session.id, "Attendance feed attached");
            self.session_id = Some(session.id);
        }
        Ok(FeedEvent::Snapshot(snapshot))
    }
}

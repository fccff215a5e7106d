use axum::{
    Extension,
    extract::{Path, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use util::ws::{WsServerOptions, serve_stream};

use super::{payload::feed_frame, topics::attendance_class_topic};
use crate::{auth::AuthUser, response::attendance_error, state::AppState};

/// Upgrades the class creator to a live attendee feed.
///
/// Authorization happens before the upgrade, so a student or a stranger gets a
/// plain HTTP error instead of a socket. The server closes the socket after
/// sending `attendance.completed`.
pub async fn attendance_class_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> Response {
    let feed = match state.feed().subscribe(&user.caller(), class_id).await {
        Ok(feed) => feed,
        Err(e) => return attendance_error::<()>(e).into_response(),
    };

    let topic = attendance_class_topic(class_id);
    let frames = feed.filter_map(move |event| futures::future::ready(feed_frame(class_id, event)));

    tracing::info!(class_id, user_id = user.0.sub, "Attendance feed opened");
    ws.on_upgrade(move |socket| serve_stream(socket, topic, frames, WsServerOptions::default()))
}

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use bytes::Bytes;
use chrono::Utc;
use futures::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::{sync::mpsc, time};

pub struct WsServerOptions {
    pub ws_ping_sec: u64,
    pub enable_app_ping: bool,
}

impl Default for WsServerOptions {
    fn default() -> Self {
        Self {
            ws_ping_sec: 30,
            enable_app_ping: true,
        }
    }
}

/// Drive a server-push stream into a single WebSocket client.
///
/// Every item of `events` is sent as one text frame. The connection ends when
/// either side is done:
/// - the stream finishes: a normal close frame is sent to the client;
/// - the client closes or errors: the stream is dropped, releasing whatever
///   timers or resources it owns.
pub async fn serve_stream<S>(socket: WebSocket, topic: String, events: S, opts: WsServerOptions)
where
    S: Stream<Item = String> + Send + 'static,
{
    let (mut sink, mut socket_rx) = socket.split();

    // Outbound queue and writer task
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let closing = matches!(frame, Message::Close(_));
            if sink.send(frame).await.is_err() || closing {
                break;
            }
        }
    });

    // S→C: forward stream items
    let mut forward_task = {
        let out_tx = out_tx.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            let mut events = Box::pin(events);
            while let Some(text) = events.next().await {
                if out_tx.send(Message::Text(text.into())).await.is_err() {
                    tracing::info!("Client disconnected while sending to '{topic}'");
                    return;
                }
            }
            let _ = out_tx
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::NORMAL,
                    reason: "stream completed".into(),
                })))
                .await;
        })
    };

    // WS-level periodic ping
    let ping_task = {
        let out_tx = out_tx.clone();
        let every = std::time::Duration::from_secs(opts.ws_ping_sec.max(1));
        tokio::spawn(async move {
            loop {
                time::sleep(every).await;
                if out_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        })
    };

    // C→S: app-level pings, WS pings and close detection
    let mut receive_task = {
        let out_tx = out_tx.clone();
        let topic = topic.clone();
        let enable_app_ping = opts.enable_app_ping;
        tokio::spawn(async move {
            while let Some(Ok(msg)) = socket_rx.next().await {
                match msg {
                    Message::Text(text) => {
                        if enable_app_ping && is_app_ping(text.as_str()) {
                            let pong = serde_json::json!({
                                "event": "pong",
                                "topic": topic,
                                "payload": {},
                                "ts": Utc::now().to_rfc3339(),
                            });
                            let _ = out_tx.send(Message::Text(pong.to_string().into())).await;
                        } else {
                            tracing::debug!("Ignoring client text on '{topic}'");
                        }
                    }
                    Message::Ping(payload) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Message::Pong(_) | Message::Binary(_) => {}
                    Message::Close(_) => break,
                }
            }
        })
    };

    drop(out_tx);

    tokio::select! {
        _ = &mut forward_task => {}
        _ = &mut receive_task => {}
    }
    forward_task.abort();
    receive_task.abort();
    ping_task.abort();

    // All senders are gone once the tasks above are dropped, so the writer drains and exits.
    let _ = writer_task.await;
    tracing::info!("WS session ended for topic '{topic}'");
}

fn is_app_ping(raw: &str) -> bool {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(Value::String(t)) = map.get("type") {
            return t == "ping";
        }
    }
    false
}

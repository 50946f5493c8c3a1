//! WebSocket upgrade handler for store change feeds

use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    Sink, SinkExt, StreamExt,
};
use serde::Serialize;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tracing::{debug, error, info, warn};

use crate::records::{Record, RecordStore, StoreEvent};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Work the reader hands to the writer task
#[derive(Debug)]
enum Command {
    Pong { t: u64 },
    Resync,
}

/// One step of the writer loop
enum Step<R> {
    Event(Result<StoreEvent<R>, RecvError>),
    Command(Option<Command>),
}

/// WebSocket upgrade handler
pub async fn feed_handler<R: Record>(
    ws: WebSocketUpgrade,
    State(store): State<Arc<RecordStore<R>>>,
) -> Response {
    info!(kind = R::KIND, "Change feed upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, store))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket<R: Record>(socket: WebSocket, store: Arc<RecordStore<R>>) {
    let (ws_sink, ws_stream) = socket.split();

    run_session(store.clone(), ws_sink, ws_stream).await;

    info!(
        kind = R::KIND,
        subscribers = store.subscriber_count(),
        "Change feed closed"
    );
}

/// Run the feed with read/write split. The subscription lives exactly as long as the session.
async fn run_session<R: Record>(
    store: Arc<RecordStore<R>>,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
) {
    let (records, events) = store.snapshot_and_subscribe();
    if let Err(e) = send_msg(&mut ws_sink, &ServerMsg::Snapshot { records }).await {
        error!(kind = R::KIND, error = %e, "Failed to send initial snapshot");
        return;
    }

    let rate_limiter = ConnectionRateLimiter::new();
    let (command_tx, command_rx) = mpsc::channel::<Command>(16);

    let mut writer_handle = tokio::spawn(write_feed(store, ws_sink, events, command_rx));
    let mut writer_finished = false;

    // Reader loop: WebSocket -> writer commands, until either side goes away
    loop {
        let result = tokio::select! {
            _ = &mut writer_handle => {
                debug!(kind = R::KIND, "Writer task ended");
                writer_finished = true;
                break;
            }
            next = ws_stream.next() => match next {
                Some(result) => result,
                None => break,
            },
        };

        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_message() {
                    warn!(kind = R::KIND, "Rate limited feed message");
                    continue;
                }

                let command = match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(ClientMsg::Ping { t }) => Command::Pong { t },
                    Ok(ClientMsg::Resync) => Command::Resync,
                    Err(e) => {
                        warn!(kind = R::KIND, error = %e, "Failed to parse client message");
                        continue;
                    }
                };

                if command_tx.send(command).await.is_err() {
                    debug!(kind = R::KIND, "Writer task gone");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(kind = R::KIND, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!(kind = R::KIND, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(kind = R::KIND, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Wait for the writer to drop its receiver so the subscription is gone on return
    if !writer_finished {
        writer_handle.abort();
        let _ = writer_handle.await;
    }
}

/// Writer loop: store events and command replies -> sink.
///
/// Store events win over commands when both are ready. On lag, or when the
/// client asks, the subscription is replaced by a fresh snapshot-plus-subscribe
/// so nothing is applied twice.
async fn write_feed<R, S>(
    store: Arc<RecordStore<R>>,
    mut sink: S,
    mut events: broadcast::Receiver<StoreEvent<R>>,
    mut commands: mpsc::Receiver<Command>,
) where
    R: Record,
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    loop {
        let step = tokio::select! {
            biased;
            event = events.recv() => Step::Event(event),
            command = commands.recv() => Step::Command(command),
        };

        let msg = match step {
            Step::Event(Ok(event)) => ServerMsg::from(event),
            Step::Event(Err(RecvError::Lagged(n))) => {
                warn!(kind = R::KIND, lagged_count = n, "Feed lagged, resending snapshot");
                let (records, fresh) = store.snapshot_and_subscribe();
                events = fresh;
                ServerMsg::Snapshot { records }
            }
            Step::Event(Err(RecvError::Closed)) => {
                debug!(kind = R::KIND, "Store event channel closed");
                break;
            }
            Step::Command(Some(Command::Pong { t })) => ServerMsg::Pong {
                t,
                server_time: unix_millis(),
            },
            Step::Command(Some(Command::Resync)) => {
                let (records, fresh) = store.snapshot_and_subscribe();
                events = fresh;
                ServerMsg::Snapshot { records }
            }
            Step::Command(None) => break,
        };

        if let Err(e) = send_msg(&mut sink, &msg).await {
            debug!(kind = R::KIND, error = %e, "Failed to send feed message");
            break;
        }
    }
}

/// Send a message over WebSocket
async fn send_msg<S, T>(sink: &mut S, msg: &T) -> Result<(), String>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    T: Serialize,
{
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

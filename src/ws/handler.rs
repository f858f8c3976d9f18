//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{BattleSession, PlayerInput};
use crate::util::rate_limit::PlayerRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Every connection gets its own battle session.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    // Send welcome message
    let welcome = ServerMsg::Welcome {
        session_id,
        server_time: unix_millis(),
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(session_id = %session_id, error = %e, "Failed to send welcome");
        return;
    }

    // Spawn the authoritative session task for this connection
    let seed = rand::random::<u64>();
    let (session, handle) = BattleSession::new(session_id, seed, state.progression.clone());
    let input_tx = handle.input_tx.clone();
    let snapshot_rx = handle.snapshot_tx.subscribe();

    state.sessions.insert(handle);
    tokio::spawn(session.run());

    run_connection(session_id, ws_sink, ws_stream, input_tx, snapshot_rx).await;

    // Cleanup on disconnect
    state.sessions.remove(&session_id);

    info!(session_id = %session_id, "WebSocket connection closed");
}

/// Run the WebSocket connection with read/write split
async fn run_connection(
    session_id: Uuid,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    input_tx: mpsc::Sender<PlayerInput>,
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = PlayerRateLimiter::new();

    // Spawn writer task: session broadcast -> WebSocket
    let writer_session_id = session_id;
    let writer_handle = tokio::spawn(async move {
        loop {
            match snapshot_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(session_id = %writer_session_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        session_id = %writer_session_id,
                        lagged_count = n,
                        "Client lagged, skipping {} messages", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(session_id = %writer_session_id, "Session channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> session task
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(session_id = %session_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => {
                        let input = PlayerInput {
                            msg: client_msg,
                            received_at: unix_millis(),
                        };

                        if input_tx.send(input).await.is_err() {
                            debug!(session_id = %session_id, "Input channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        // Malformed or unknown input is ignored, never fatal
                        warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(session_id = %session_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(session_id = %session_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Signal disconnect to the session task
    let _ = input_tx
        .send(PlayerInput {
            msg: ClientMsg::Leave,
            received_at: unix_millis(),
        })
        .await;

    // Abort writer task
    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

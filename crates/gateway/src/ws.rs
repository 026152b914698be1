//! WebSocket upgrade and the per-connection read/write pumps.
//!
//! Frame classification and routing decisions live in `courtrelay_hub`
//! (transport-agnostic); this module owns the actual socket.

use crate::SharedState;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use courtrelay_core::RelayClock;
use courtrelay_hub::{
    decide_inbound, InboundDecision, Peer, PeerKind, AUTH_FAILED_FRAME, AUTH_SUCCESS_FRAME,
    NOT_AUTHORIZED_FRAME,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;

const READ_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const WRITE_DEADLINE: Duration = Duration::from_secs(10);
const PING_INTERVAL: Duration = Duration::from_secs(30);
const MAX_FRAME_BYTES: usize = 64 * 1024;

#[derive(Deserialize)]
pub struct WsQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let kind = PeerKind::from_query_type(query.kind.as_deref());
    ws.max_message_size(MAX_FRAME_BYTES)
        .on_upgrade(move |socket| handle_connection(socket, state, kind))
}

fn new_peer_id(kind: PeerKind, clock: &dyn RelayClock) -> String {
    let label = match kind {
        PeerKind::Controller => "controller",
        PeerKind::Browser => "browser",
    };
    format!("{label}-{}", clock.now_utc().timestamp_nanos_opt().unwrap_or_default())
}

async fn handle_connection(socket: WebSocket, state: SharedState, kind: PeerKind) {
    let id = new_peer_id(kind, state.clock.as_ref());
    let authorized = state.config.ws_password.is_empty();
    let (peer, mut outbound_rx) = Peer::new(id.clone(), kind, authorized);

    state.hub.register(peer.clone()).await;

    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer = tokio::spawn(async move {
        let mut ping_tick = tokio::time::interval(PING_INTERVAL);
        ping_tick.tick().await; // first tick fires immediately; skip it

        loop {
            tokio::select! {
                _ = ping_tick.tick() => {
                    let sent = tokio::time::timeout(
                        WRITE_DEADLINE,
                        ws_tx.send(WsMessage::Ping(Vec::new().into())),
                    )
                    .await;
                    if !matches!(sent, Ok(Ok(()))) {
                        break;
                    }
                }
                frame = outbound_rx.recv() => {
                    match frame {
                        Some(text) => {
                            let sent = tokio::time::timeout(
                                WRITE_DEADLINE,
                                ws_tx.send(WsMessage::Text(text.into())),
                            )
                            .await;
                            if !matches!(sent, Ok(Ok(()))) {
                                break;
                            }
                        }
                        None => {
                            let _ = ws_tx.send(WsMessage::Close(None)).await;
                            break;
                        }
                    }
                }
            }
        }
    });

    loop {
        let incoming = tokio::time::timeout(READ_IDLE_TIMEOUT, ws_rx.next()).await;
        let message = match incoming {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(_))) | Ok(None) | Err(_) => break,
        };

        match message {
            WsMessage::Text(text) => {
                let decision = decide_inbound(&text, peer.is_authorized(), &state.config.ws_password);
                match decision {
                    InboundDecision::AuthSuccess => {
                        peer.set_authorized(true);
                        peer.try_send(AUTH_SUCCESS_FRAME.to_string());
                    }
                    InboundDecision::AuthFailed => {
                        peer.try_send(AUTH_FAILED_FRAME.to_string());
                    }
                    InboundDecision::Rejected => {
                        peer.try_send(NOT_AUTHORIZED_FRAME.to_string());
                    }
                    InboundDecision::Route(frame) => match peer.kind {
                        PeerKind::Controller => state.hub.route_from_controller(frame).await,
                        PeerKind::Browser => state.hub.route_from_browser(frame).await,
                    },
                    InboundDecision::Drop => {
                        tracing::debug!(id = %peer.id, "dropped undecodable WS frame");
                    }
                }
            }
            WsMessage::Close(_) => break,
            _ => {} // binary / ping / pong: no routing meaning in this protocol
        }
    }

    state.hub.unregister(id).await;
    drop(peer);
    let _ = writer.await;
}

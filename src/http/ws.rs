use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::AppState;
use crate::auth::Capability;
use crate::domain::Identity;
use crate::error::ApiError;
use crate::notify::{Event, SessionId};

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(upgrade))
}

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Frames a client may send.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    JoinAdmin,
    WatchOrder {
        #[serde(rename = "orderId")]
        order_id: String,
    },
}

/// Anonymous connections are accepted; a supplied token must be valid.
async fn upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let identity = match params.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => Some(state.gate.authorize(Some(token), Capability::Authenticated).await?),
        None => None,
    };
    Ok(ws.on_upgrade(move |socket| session(socket, state, identity)))
}

fn error_event(message: impl Into<String>) -> Event {
    Event::new("error", json!({ "message": message.into() }))
}

#[instrument(skip_all, fields(user_id = identity.as_ref().map(|i| i.user_id.as_str())))]
async fn session(socket: WebSocket, state: AppState, identity: Option<Identity>) {
    let subscription = match state.notifier.connect(identity.clone()).await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(error = %e, "Could not register session");
            return;
        }
    };
    let session = subscription.session;
    let mut events = subscription.events;
    info!(session, "WebSocket session opened");

    let (mut sink, mut stream) = socket.split();
    // Direct replies to this session, such as rejected joins.
    let (reply_tx, mut replies) = mpsc::channel::<Event>(8);

    let writer = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(event) = events.recv() => event,
                Some(event) = replies.recv() => event,
                else => break,
            };
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Could not encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                if let Err(e) = handle_frame(&state, session, identity.as_ref(), &text).await {
                    debug!(error = %e, "Frame rejected");
                    if reply_tx.send(error_event(e.to_string())).await.is_err() {
                        break;
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.notifier.leave(session).await;
    writer.abort();
    info!(session, "WebSocket session closed");
}

async fn handle_frame(
    state: &AppState,
    session: SessionId,
    identity: Option<&Identity>,
    text: &str,
) -> Result<(), ApiError> {
    let frame: ClientFrame =
        serde_json::from_str(text).map_err(|e| ApiError::Validation(format!("Unrecognised frame: {e}")))?;
    match frame {
        ClientFrame::JoinAdmin => state.notifier.join_admin(session).await?,
        ClientFrame::WatchOrder { order_id } => {
            let identity =
                identity.ok_or_else(|| ApiError::Authentication("Authentication required".to_string()))?;
            // Watching requires the same access as reading the order.
            state.orders.get_order_record(identity, order_id.clone()).await?;
            state.notifier.watch_order(session, order_id).await?;
        }
    }
    Ok(())
}

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::Response,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::state::AppState;
use crate::model::cardreader;

#[derive(Debug, Deserialize)]
pub struct CardReaderQuery {
    /// Event routing key; every message of this connection is matched
    /// against it.
    key: String,
}

/// Card-reader endpoint: the reader sends one JSON document per message and
/// receives the ingestion response. Problems come back as an `error` field,
/// never as a closed connection.
pub async fn cardreader_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<CardReaderQuery>,
) -> Response {
    ws.on_upgrade(move |socket| handle_cardreader(socket, state, query.key))
}

async fn handle_cardreader(mut socket: WebSocket, state: AppState, key: String) {
    info!(key = %key, "card reader connected");
    while let Some(incoming) = socket.recv().await {
        let message = match incoming {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        let response = process_message(&state, &key, &message).await;
        let payload = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize card reader response");
                continue;
            }
        };
        if socket.send(WsMessage::text(payload)).await.is_err() {
            break;
        }
    }
    info!(key = %key, "card reader disconnected");
}

pub(crate) async fn process_message(
    state: &AppState,
    key: &str,
    raw: &str,
) -> serde_json::Value {
    let message = match cardreader::parse_cardreader_message(raw) {
        Ok(message) => message,
        Err(e) => return json!({ "error": e.to_string() }),
    };
    match cardreader::store_cardreader_result(&state.db, &state.cache, key, &message).await {
        Ok((_, event, response)) => {
            state.notifier.update_event(&event);
            serde_json::to_value(&response)
                .unwrap_or_else(|_| json!({ "error": "serialization failed" }))
        }
        Err(e) => json!({ "error": e.to_string() }),
    }
}

/// Observer endpoint: streams an event document whenever that event's data
/// changed.
pub async fn updates_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_updates(socket, state))
}

async fn handle_updates(mut socket: WebSocket, state: AppState) {
    info!("update observer connected");
    let mut rx = state.notifier.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => {
                let payload = match serde_json::to_string(event.as_ref()) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize event update");
                        continue;
                    }
                };
                if socket.send(WsMessage::text(payload)).await.is_err() {
                    info!("update observer disconnected");
                    break;
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "update observer lagging");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

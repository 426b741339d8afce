//! Single WebSocket endpoint (§4.11). Each connection gets its own
//! filtered async subscription on the event bus — one reader task, one
//! writer task, same shape as every other consumer of
//! `EventBus::subscribe_async_filtered`. Reconnect is the client's job;
//! there's no missed-event replay.

use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use quaero_core::{AuthId, AuthSnapshot, Cookie, Event};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

const CLIENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    kinds: Option<String>,
}

pub async fn upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let wanted: Option<HashSet<String>> = query
        .kinds
        .map(|csv| csv.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect());

    ws.on_upgrade(move |socket| handle_socket(socket, state, wanted))
}

async fn handle_socket(socket: WebSocket, state: AppState, wanted: Option<HashSet<String>>) {
    let filter: Option<Box<dyn Fn(&Event) -> bool + Send + Sync>> = wanted.map(|kinds| {
        let filter: Box<dyn Fn(&Event) -> bool + Send + Sync> =
            Box::new(move |event: &Event| kinds.contains(event.kind()));
        filter
    });
    let subscription = state.bus.subscribe_async_filtered(CLIENT_QUEUE_CAPACITY, filter);

    let (mut sender, mut receiver) = socket.split();

    let writer = tokio::spawn(async move {
        loop {
            let event = subscription.recv().await;
            let frame = json!({ "type": event.kind(), "payload": event });
            let Ok(text) = serde_json::to_string(&frame) else { continue };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        if let Message::Text(text) = message {
            handle_inbound_frame(&state, &text).await;
        }
    }

    writer.abort();
}

#[derive(Debug, Deserialize)]
struct InboundFrame {
    #[serde(rename = "type")]
    kind: String,
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AuthPayload {
    #[serde(default)]
    auth_id: Option<String>,
    #[serde(default)]
    cookies: Vec<Cookie>,
    #[serde(default)]
    tokens: std::collections::HashMap<String, String>,
    base_url: String,
    #[serde(default)]
    user_agent: String,
}

/// Handles the extension's `{"type":"auth","payload":{...}}` frame by
/// forwarding it to the auth store as a wholesale-replace snapshot.
/// Unrecognised frame types are logged and dropped — the gateway has no
/// other inbound message kind yet.
async fn handle_inbound_frame(state: &AppState, text: &str) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(error = %err, "dropping unparseable websocket frame");
            return;
        }
    };

    if frame.kind != "auth" {
        tracing::warn!(kind = %frame.kind, "dropping unrecognised websocket frame type");
        return;
    }

    let payload: AuthPayload = match serde_json::from_value(frame.payload) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, "dropping malformed auth frame");
            return;
        }
    };

    let id = match payload.auth_id {
        Some(id) => AuthId::new(id),
        None => AuthId::generate(&quaero_core::UuidIdGen),
    };

    let snapshot = AuthSnapshot {
        id,
        cookies: payload.cookies,
        tokens: payload.tokens,
        base_url: payload.base_url,
        user_agent: payload.user_agent,
        updated_at: Utc::now(),
    };

    if let Err(err) = state.storage.auth.save(snapshot) {
        tracing::warn!(error = %err, "failed to save auth snapshot from websocket frame");
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;

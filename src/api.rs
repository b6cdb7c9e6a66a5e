use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::identity::{InvalidWebhookUrl, PhoneNumber, WebhookSet, WebhookUrl};
use crate::participant::{ControlConnection, PendingParticipant};
use crate::protocol::RegisterRequest;
use crate::registry::{RegistryError, SessionRegistry};
use crate::transport::{Frame, FrameSource};
use crate::ws::{WsAudio, WsSink, WsSource};

/// Browser-facing routes.
pub fn public_router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/ws", get(browser_socket))
        .with_state(registry)
        .layer(TraceLayer::new_for_http())
}

/// Routes for the phone side. Not meant to be reachable from the internet.
pub fn private_router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/ws-audio", get(audio_socket))
        .with_state(registry)
        .layer(TraceLayer::new_for_http())
}

async fn browser_socket(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(registry): State<Arc<SessionRegistry>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| admit_browser(registry, socket, addr))
}

async fn admit_browser(registry: Arc<SessionRegistry>, socket: WebSocket, addr: SocketAddr) {
    tracing::info!(%addr, "accepted client web socket");
    let (sink, stream) = socket.split();
    tokio::spawn(drain(addr, WsSource::new(stream)));

    let participant = PendingParticipant::new(ControlConnection::new(addr.to_string(), Box::new(WsSink::new(sink))));
    if let Ok(code) = registry.admit(participant).await {
        tracing::info!(%addr, code = code.0, "waiting for client to call in");
    }
}

/// Reads and discards whatever the browser sends so close handshakes complete.
async fn drain(addr: SocketAddr, mut source: WsSource) {
    while let Some(frame) = source.next_frame().await {
        match frame {
            Ok(Frame::Close) => break,
            Ok(frame) => tracing::debug!(%addr, msg_type = frame.kind(), "ignoring message from client"),
            Err(e) => {
                tracing::debug!(%addr, error = %e, "client web socket read failed");
                break;
            }
        }
    }
    tracing::debug!(%addr, "client web socket closed");
}

async fn register(
    State(registry): State<Arc<SessionRegistry>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "rejected registration");
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    let phone_number = request.client_phone_number.as_str().trim();
    if phone_number.is_empty() {
        return (StatusCode::BAD_REQUEST, "clientPhoneNumber is empty").into_response();
    }
    let webhooks = match webhook_set(&request) {
        Ok(webhooks) => webhooks,
        Err(e) => {
            tracing::warn!(error = %e, "rejected registration");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let code = request.verification_code;
    match registry.verify(code, PhoneNumber::new(phone_number), webhooks).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e @ RegistryError::CodeNotFound(_)) => {
            tracing::info!(code = code.0, "registration for unknown code");
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e @ RegistryError::MatcherClosed) => {
            tracing::warn!(code = code.0, error = %e, "registration while shutting down");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}

fn webhook_set(request: &RegisterRequest) -> Result<WebhookSet, InvalidWebhookUrl> {
    Ok(WebhookSet {
        select_digit: WebhookUrl::parse(&request.select_digit_url)?,
        heartbeat: WebhookUrl::parse(&request.heartbeat_url)?,
        game_start: WebhookUrl::parse(&request.game_start_url)?,
        game_done: WebhookUrl::parse(&request.game_done_url)?,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioQuery {
    phone_number: Option<String>,
}

async fn audio_socket(
    State(registry): State<Arc<SessionRegistry>>,
    Query(query): Query<AudioQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let phone_number = query.phone_number.as_deref().map(str::trim).unwrap_or_default();
    if phone_number.is_empty() {
        return (StatusCode::BAD_REQUEST, "phoneNumber query parameter is required").into_response();
    }
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let phone_number = PhoneNumber::new(phone_number);
    ws.on_upgrade(move |socket| async move {
        tracing::info!(phone_number = %phone_number, "accepted audio web socket");
        registry.register_audio_connection(phone_number, Box::new(WsAudio::new(socket)));
    })
}

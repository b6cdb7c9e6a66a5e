use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;

use crate::identity::{WebhookSet, WebhookUrl};
use crate::protocol::DigitResponse;

pub fn webhook_set(base: &str) -> WebhookSet {
    let url = |path: &str| WebhookUrl::parse(&format!("{base}{path}")).unwrap();
    WebhookSet {
        select_digit: url("/digit"),
        heartbeat: url("/heartbeat"),
        game_start: url("/start"),
        game_done: url("/done"),
    }
}

#[derive(Clone, Default)]
struct StubState {
    digits: Arc<Mutex<VecDeque<i64>>>,
    hits: Arc<Mutex<Vec<String>>>,
}

/// Local phone-side webhook server. Every player draws from one shared digit
/// sequence, so the board fills the same way whoever moves first. Once the
/// sequence is exhausted the digit webhook answers 500.
pub struct WebhookStub {
    addr: SocketAddr,
    state: StubState,
}

impl WebhookStub {
    pub async fn start(digits: Vec<i64>) -> Self {
        let state = StubState {
            digits: Arc::new(Mutex::new(digits.into())),
            hits: Arc::default(),
        };
        let app = Router::new()
            .route("/:player/digit", get(digit))
            .route("/:player/start", get(|s: State<StubState>, p: Path<String>| record(s, p, "start")))
            .route("/:player/done", get(|s: State<StubState>, p: Path<String>| record(s, p, "done")))
            .route("/:player/heartbeat", get(|s: State<StubState>, p: Path<String>| record(s, p, "heartbeat")))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn webhooks(&self, player: &str) -> WebhookSet {
        webhook_set(&format!("http://{}/{}", self.addr, player))
    }

    /// Recorded notification hits such as `"a/start"` or `"b/done"`.
    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn remaining_digits(&self) -> usize {
        self.state.digits.lock().unwrap().len()
    }
}

async fn digit(
    State(state): State<StubState>,
    Path(player): Path<String>,
) -> Result<Json<DigitResponse>, StatusCode> {
    state.hits.lock().unwrap().push(format!("{player}/digit"));
    let next = state.digits.lock().unwrap().pop_front();
    next.map(|digit| Json(DigitResponse { digit }))
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn record(State(state): State<StubState>, Path(player): Path<String>, event: &'static str) {
    state.hits.lock().unwrap().push(format!("{player}/{event}"));
}

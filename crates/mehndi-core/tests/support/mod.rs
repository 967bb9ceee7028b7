// tests/support/mod.rs
#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use mehndi_core::CatalogConfig;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// One scripted reply for a sheet.
#[derive(Debug, Clone)]
pub struct SheetReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl SheetReply {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Default)]
struct MockSheetState {
    replies: Arc<Mutex<HashMap<String, VecDeque<SheetReply>>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

async fn sheet_handler(
    State(state): State<MockSheetState>,
    Path(sheet): Path<String>,
) -> Response {
    *state.hits.lock().unwrap().entry(sheet.clone()).or_insert(0) += 1;

    let next = {
        let mut replies = state.replies.lock().unwrap();
        replies.get_mut(&sheet).and_then(|queue| queue.pop_front())
    };

    match next {
        Some(reply) => {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            let status =
                StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            log::debug!("Mock sheet server answering {} with {}", sheet, status);
            (status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response()
        }
        None => {
            log::error!("Mock sheet server ran out of replies for '{}'", sheet);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

pub struct MockSheetServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    state: MockSheetState,
}

impl MockSheetServer {
    pub async fn start() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let state = MockSheetState::default();
        let app = Router::new()
            .route("/sheets/{sheet}", get(sheet_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock sheet server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| log::error!("Mock sheet server error: {}", e));
        });

        Self {
            addr,
            shutdown_tx,
            state,
        }
    }

    /// Queue `reply` for the next request to `/sheets/{sheet}`.
    pub fn enqueue(&self, sheet: &str, reply: SheetReply) {
        self.state
            .replies
            .lock()
            .unwrap()
            .entry(sheet.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn url(&self, sheet: &str) -> String {
        format!("http://{}/sheets/{}", self.addr, sheet)
    }

    pub fn hits(&self, sheet: &str) -> usize {
        self.state.hits.lock().unwrap().get(sheet).copied().unwrap_or(0)
    }

    /// Config pointing both catalog kinds at this server.
    pub fn config(&self) -> CatalogConfig {
        let mut config = CatalogConfig::new(self.url("images"), self.url("services"));
        config.http.timeout_seconds = 5;
        config.assets.base_url = "https://cdn.example.com/mehndi/".to_string();
        config
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock sheet server already stopped");
        }
    }
}

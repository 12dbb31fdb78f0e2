//! HTTP transport using server-sent events.
//!
//! `GET /sse` opens a session. Its first event (`endpoint`) carries the URL
//! the client posts JSON-RPC frames to; every response is delivered back on
//! the stream as a `message` event. A session ends when its stream is dropped.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::Router;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::server::{JsonRpcResponse, ToolServer};

pub const SSE_PATH: &str = "/sse";
pub const MESSAGE_PATH: &str = "/message";

type Outbox = mpsc::UnboundedSender<JsonRpcResponse>;

/// Open SSE sessions keyed by session id.
#[derive(Default)]
pub struct Sessions {
    open: Mutex<HashMap<String, Outbox>>,
}

impl Sessions {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Outbox>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, id: String, outbox: Outbox) {
        self.lock().insert(id, outbox);
    }

    fn get(&self, id: &str) -> Option<Outbox> {
        self.lock().get(id).cloned()
    }

    fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    /// Drops every outbox so the open streams end.
    fn close_all(&self) {
        self.lock().clear();
    }
}

/// Removes its session once the event stream holding it is dropped.
struct SessionGuard {
    id: String,
    sessions: Arc<Sessions>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        debug!(session = %self.id, "SSE session closed");
    }
}

#[derive(Clone)]
struct SseState {
    server: Arc<ToolServer>,
    sessions: Arc<Sessions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageQuery {
    session_id: String,
}

pub fn router(server: Arc<ToolServer>, sessions: Arc<Sessions>) -> Router {
    Router::new()
        .route(SSE_PATH, get(open_stream))
        .route(MESSAGE_PATH, post(post_message))
        .with_state(SseState { server, sessions })
}

/// A Go-style `:8686` listens on every interface.
pub fn bind_address(address: &str) -> String {
    match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => address.to_string(),
    }
}

/// Serves until ctrl-c, then closes the open streams.
pub async fn serve(server: Arc<ToolServer>, address: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_address(address)).await?;
    info!(address = %listener.local_addr()?, "listening for SSE clients");

    let sessions = Arc::new(Sessions::default());
    let app = router(server, Arc::clone(&sessions));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "could not listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!(sessions = sessions.len(), "shutting down");
            sessions.close_all();
        })
        .await?;
    Ok(())
}

async fn open_stream(State(state): State<SseState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4().to_string();
    let (outbox, inbox) = mpsc::unbounded_channel();
    state.sessions.insert(id.clone(), outbox);
    info!(session = %id, "SSE client connected");

    let endpoint = Event::default().event("endpoint").data(format!("{MESSAGE_PATH}?sessionId={id}"));
    let guard = SessionGuard { id, sessions: state.sessions };

    let messages = stream::unfold((inbox, guard), |(mut inbox, guard)| async move {
        let response = inbox.recv().await?;
        Some((Ok::<_, Infallible>(message_event(&response)), (inbox, guard)))
    });

    Sse::new(stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(messages))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

fn message_event(response: &JsonRpcResponse) -> Event {
    match serde_json::to_string(response) {
        Ok(json) => Event::default().event("message").data(json),
        Err(e) => {
            warn!(error = %e, "unserializable response");
            Event::default().comment("unserializable response")
        }
    }
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> StatusCode {
    let Some(outbox) = state.sessions.get(&query.session_id) else {
        warn!(session = %query.session_id, "message for unknown session");
        return StatusCode::NOT_FOUND;
    };

    let server = state.server;
    tokio::spawn(async move {
        if let Some(response) = server.handle_line(&body).await {
            let _ = outbox.send(response);
        }
    });
    StatusCode::ACCEPTED
}

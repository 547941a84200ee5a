//! Server-sent events transport
//!
//! `GET /sse` opens a session and announces where to post messages in an
//! `endpoint` event. JSON-RPC posted to `/sse/message?sessionId=<id>` is
//! acknowledged with 202 and its response is pushed down the stream as a
//! `message` event.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::mcp::rpc::json_rpc_error;
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

pub const SSE_PATH: &str = "/sse";
pub const SSE_MESSAGE_PATH: &str = "/sse/message";

const SESSION_BUFFER: usize = 32;

/// Open SSE sessions keyed by session id.
#[derive(Clone, Default)]
pub struct SseSessions {
    inner: Arc<Mutex<HashMap<String, mpsc::Sender<Value>>>>,
}

impl SseSessions {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, mpsc::Sender<Value>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self) -> (String, mpsc::Receiver<Value>) {
        let (sender, receiver) = mpsc::channel(SESSION_BUFFER);
        let session_id = Uuid::new_v4().simple().to_string();
        self.lock().insert(session_id.clone(), sender);
        (session_id, receiver)
    }

    pub fn sender(&self, session_id: &str) -> Option<mpsc::Sender<Value>> {
        self.lock().get(session_id).cloned()
    }

    pub fn close(&self, session_id: &str) {
        if self.lock().remove(session_id).is_some() {
            info!(session_id, "sse session closed");
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }
}

/// Removes the session once the client's event stream is dropped.
struct SessionGuard {
    sessions: SseSessions,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.close(&self.session_id);
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

pub async fn sse_connect(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let (session_id, receiver) = state.sse_sessions.open();
    info!(session_id = %session_id, "sse session opened");

    let endpoint = format!("{SSE_MESSAGE_PATH}?sessionId={session_id}");
    let guard = SessionGuard {
        sessions: state.sse_sessions.clone(),
        session_id,
    };

    let announce = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    });
    let messages = ReceiverStream::new(receiver).map(move |message| {
        let _session = &guard;
        Ok::<_, Infallible>(Event::default().event("message").data(message.to_string()))
    });

    Sse::new(announce.chain(messages))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

pub async fn sse_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(sender) = state.sse_sessions.sender(&query.session_id) else {
        return (StatusCode::NOT_FOUND, "unknown sse session").into_response();
    };

    let response = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => handle_json_rpc_payload(&state, payload).await,
        Err(_) => Some(json_rpc_error(None, -32700, "Parse error")),
    };

    if let Some(response) = response {
        if sender.send(response).await.is_err() {
            warn!(session_id = %query.session_id, "sse client went away before the response");
            state.sse_sessions.close(&query.session_id);
            return (StatusCode::GONE, "sse session closed").into_response();
        }
    }

    StatusCode::ACCEPTED.into_response()
}

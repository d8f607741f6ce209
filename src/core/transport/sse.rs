//! SSE transport implementation.
//!
//! Each client opens a long-lived event stream (`GET /sse`) and posts its
//! JSON-RPC messages to `POST /messages?sessionId=<id>`. The first event on
//! the stream announces that message endpoint; replies are pushed back over
//! the same stream as `message` events.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderName, Method, StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, KeepAliveStream, Sse},
    },
    routing::{get, post},
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use super::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use super::session::{SessionGuard, SessionRouter};
use super::{SseConfig, TransportError, TransportResult};
use crate::core::McpServer;

/// Header carrying the session id on the event stream response.
pub const SESSION_HEADER: HeaderName = HeaderName::from_static("mcp-session-id");

const MAX_BODY_BYTES: usize = 1024 * 1024;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Body returned when a message names no open session.
const UNKNOWN_SESSION_BODY: &str = "No transport found for sessionId";

/// SSE transport handler.
pub struct SseTransport {
    config: SseConfig,
}

/// Shared state for the SSE handlers.
#[derive(Clone)]
struct AppState {
    server: McpServer,
    sessions: Arc<SessionRouter>,
    sse_path: Arc<str>,
    message_path: Arc<str>,
}

impl SseTransport {
    /// Create a new SSE transport.
    pub fn new(config: SseConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the SSE transport until the listener fails.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let sessions = Arc::new(SessionRouter::new());
        let app = build_router(&self.config, server, sessions);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - MCP SSE server listening on {} (CORS {})",
            addr, cors_status
        );
        info!("  → Stream:   GET {}", self.config.sse_path);
        info!("  → Messages: POST {}?sessionId=<id>", self.config.message_path);
        info!("  → Health:   GET /healthz");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the HTTP router for the SSE transport.
pub fn build_router(config: &SseConfig, server: McpServer, sessions: Arc<SessionRouter>) -> Router {
    let state = AppState {
        server,
        sessions,
        sse_path: Arc::from(config.sse_path.as_str()),
        message_path: Arc::from(config.message_path.as_str()),
    };

    let mut app = Router::new()
        .route(&config.sse_path, get(handle_sse))
        .route(&config.message_path, post(handle_message))
        .route("/healthz", get(health_check))
        .route("/", get(root_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    if config.enable_cors {
        app = app.layer(cors_layer());
    }

    app.layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, SESSION_HEADER])
        .expose_headers([SESSION_HEADER])
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "SSE",
        "endpoints": {
            "sse": &*state.sse_path,
            "messages": &*state.message_path,
            "health": "/healthz"
        },
        "protocol": "JSON-RPC 2.0",
        "activeSessions": state.sessions.len()
    }))
}

/// Liveness probe.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Open an event stream and register its session.
///
/// The session lives exactly as long as the stream: when the client goes
/// away the body is dropped and the guard removes the session.
async fn handle_sse(State(state): State<AppState>) -> impl IntoResponse {
    let (session, outbound) = state.sessions.open(state.server.clone());
    let session_id = session.id().to_string();
    let endpoint = format!("{}?sessionId={}", state.message_path, session_id);
    let guard = SessionGuard::new(state.sessions.clone(), session_id.clone());

    let announce = stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    });
    let replies = stream::unfold((outbound, guard), |(mut outbound, guard)| async move {
        let response = outbound.recv().await?;
        Some((Ok::<_, Infallible>(message_event(&response)), (outbound, guard)))
    });

    (
        [(SESSION_HEADER, session_id)],
        event_stream(announce.chain(replies)),
    )
}

fn event_stream<S>(events: S) -> Sse<KeepAliveStream<S>>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

fn message_event(response: &JsonRpcResponse) -> Event {
    match Event::default().event("message").json_data(response) {
        Ok(event) => event,
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            Event::default().comment("serialization failed")
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,
}

/// Route one client message to its session.
#[instrument(skip_all, fields(session_id, method = %request.method))]
async fn handle_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    let session_id = query.session_id.unwrap_or_default();
    tracing::Span::current().record("session_id", session_id.as_str());

    let session = match state.sessions.get(&session_id) {
        Ok(session) => session,
        Err(e) => {
            warn!("Rejecting message: {}", e);
            return (StatusCode::BAD_REQUEST, UNKNOWN_SESSION_BODY).into_response();
        }
    };

    // Acknowledge once the message holds its session turn; the reply follows
    // on the event stream.
    match session.accept(request).await {
        Ok(_) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(TransportError::SessionNotFound(_)) => {
            warn!("Session closed while handling message");
            (StatusCode::BAD_REQUEST, UNKNOWN_SESSION_BODY).into_response()
        }
        Err(e) => {
            error!("Failed to handle message: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

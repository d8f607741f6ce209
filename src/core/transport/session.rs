//! Session routing for the SSE transport.
//!
//! Every open event stream owns one [`Session`]: a generated id, the sender
//! half of its push channel and a JSON-RPC handler. POSTs name their session
//! by id and are handed to that session's handler; replies travel back over
//! the session's event stream. The table is the only shared mutable state in
//! the transport.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::jsonrpc::{JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse};
use super::{TransportError, TransportResult};
use crate::core::McpServer;
use crate::core::server::INSTRUCTIONS;
use crate::domains::tools::ToolError;

/// Protocol version used when the client asks for one we do not know.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Protocol versions this server can speak over SSE.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Responses buffered per session before handlers wait on the client.
const OUTBOUND_CAPACITY: usize = 32;

/// Owns the id → session table.
#[derive(Default)]
pub struct SessionRouter {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return it with the receiving end of its push channel.
    pub fn open(&self, server: McpServer) -> (Arc<Session>, mpsc::Receiver<JsonRpcResponse>) {
        let id = Uuid::new_v4().to_string();
        let (outbound, inbound) = mpsc::channel(OUTBOUND_CAPACITY);
        let session = Arc::new(Session {
            id: id.clone(),
            connected_at: Utc::now(),
            handler: Arc::new(Mutex::new(SessionHandler::new(id.clone(), server, outbound))),
        });

        let active = {
            let mut sessions = self.write();
            sessions.insert(id.clone(), session.clone());
            sessions.len()
        };
        info!(session_id = %id, active, "Session opened");

        (session, inbound)
    }

    /// Look up a live session.
    pub fn get(&self, id: &str) -> TransportResult<Arc<Session>> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| TransportError::session_not_found(id))
    }

    /// Remove a session. Returns whether it was present.
    pub fn close(&self, id: &str) -> bool {
        let removed = self.write().remove(id);
        match removed {
            Some(session) => {
                let seconds = (Utc::now() - session.connected_at).num_seconds();
                info!(session_id = %id, connected_secs = seconds, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Whether a session with this id is open.
    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Closes its session when dropped, i.e. when the event stream goes away.
pub struct SessionGuard {
    router: Arc<SessionRouter>,
    id: String,
}

impl SessionGuard {
    pub fn new(router: Arc<SessionRouter>, id: impl Into<String>) -> Self {
        Self {
            router,
            id: id.into(),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.router.close(&self.id) {
            debug!(session_id = %self.id, "Session already closed");
        }
    }
}

/// One open push connection.
pub struct Session {
    id: String,
    connected_at: DateTime<Utc>,
    handler: Arc<Mutex<SessionHandler>>,
}

impl Session {
    /// Session id as given to the client.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the push connection was opened.
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Handle one inbound message; any reply is pushed over the event stream.
    ///
    /// Messages of one session are processed one at a time.
    pub async fn handle(&self, request: JsonRpcRequest) -> TransportResult<()> {
        let mut handler = self.handler.lock().await;
        handler.handle(request).await
    }

    /// Take this session's turn for `request` and process it in the background.
    ///
    /// Returns as soon as the request holds the session lock, so callers can
    /// acknowledge early. Turns are granted in arrival order and replies are
    /// pushed in that same order.
    pub async fn accept(
        &self,
        request: JsonRpcRequest,
    ) -> TransportResult<JoinHandle<TransportResult<()>>> {
        let mut handler = self.handler.clone().lock_owned().await;
        if handler.outbound.is_closed() {
            return Err(TransportError::session_not_found(&self.id));
        }

        Ok(tokio::spawn(async move {
            let result = handler.handle(request).await;
            if let Err(e) = &result {
                warn!(session_id = %handler.session_id, "Dropping reply: {}", e);
            }
            result
        }))
    }
}

/// Per-session JSON-RPC handler.
struct SessionHandler {
    session_id: String,
    server: McpServer,
    outbound: mpsc::Sender<JsonRpcResponse>,
    initialized: bool,
    protocol_version: Option<String>,
}

impl SessionHandler {
    fn new(session_id: String, server: McpServer, outbound: mpsc::Sender<JsonRpcResponse>) -> Self {
        Self {
            session_id,
            server,
            outbound,
            initialized: false,
            protocol_version: None,
        }
    }

    #[instrument(skip_all, fields(session_id = %self.session_id, method = %request.method))]
    async fn handle(&mut self, request: JsonRpcRequest) -> TransportResult<()> {
        let expects_response = !request.is_notification();
        let response = self.process(request).await;

        match response.filter(|_| expects_response) {
            Some(response) => self
                .outbound
                .send(response)
                .await
                .map_err(|_| TransportError::session_not_found(&self.session_id)),
            None => Ok(()),
        }
    }

    async fn process(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::invalid_request(request.id));
        }

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request)),
            "ping" => Some(JsonRpcResponse::success(request.id, serde_json::json!({}))),
            "tools/list" => Some(self.handle_tools_list(request)),
            "tools/call" => Some(self.handle_tools_call(request).await),
            method if method.starts_with("notifications/") => {
                self.handle_notification(&request);
                None
            }
            _ => {
                warn!("Unknown method: {}", request.method);
                Some(JsonRpcResponse::method_not_found(request.id))
            }
        }
    }

    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let requested = request
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str());
        let version = requested
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(PROTOCOL_VERSION)
            .to_string();
        info!(requested = ?requested, negotiated = %version, "Processing initialize request");

        self.protocol_version = Some(version.clone());

        let result = serde_json::json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.server.name(),
                "version": self.server.version()
            },
            "instructions": INSTRUCTIONS
        });

        JsonRpcResponse::success(request.id, result)
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools = self.server.list_tools();
        JsonRpcResponse::success(request.id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params = match request.params {
            Some(p) => p,
            None => return JsonRpcResponse::invalid_params(request.id, "Missing params"),
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => return JsonRpcResponse::invalid_params(request.id, "Missing tool name"),
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::json!({}));

        info!(tool = %name, "Processing tools/call request");
        match self.server.call_tool(&name, arguments).await {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(e @ (ToolError::InvalidArguments(_) | ToolError::NotFound(_))) => {
                JsonRpcResponse::invalid_params(request.id, e.to_string())
            }
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        }
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                info!(
                    protocol_version = ?self.protocol_version,
                    "Client sent initialized notification"
                );
                self.initialized = true;
            }
            _ => {
                debug!("Received notification: {}", request.method);
            }
        }
    }
}

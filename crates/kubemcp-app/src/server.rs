use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::tools::ToolRegistry;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(result), error: None }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message: message.into() }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Newline-delimited JSON-RPC over a reader/writer pair. Each request runs on
/// its own task, so a slow cluster call never blocks the next frame.
pub struct ToolServer {
    registry: ToolRegistry,
    name: String,
    version: String,
}

impl ToolServer {
    pub fn new(registry: ToolRegistry, name: impl Into<String>) -> Self {
        Self { registry, name: name.into(), version: env!("CARGO_PKG_VERSION").to_string() }
    }

    /// Handles one frame. `None` for notifications, which get no reply.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match parse_request(line) {
            Ok(request) => self.handle_request(request).await,
            Err(response) => Some(response),
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "handling request");

        let Some(id) = request.id else {
            match request.method.as_str() {
                "notifications/initialized" | "initialized" => debug!("client initialized"),
                "notifications/cancelled" => {}
                other => debug!(method = other, "ignoring notification"),
            }
            return None;
        };
        let id = Some(id);

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": self.registry.list_tools() })),
            "tools/call" => self.call_tool(id, request.params).await,
            other => {
                warn!(method = other, "unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };
        Some(response)
    }

    fn initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!(server = %self.name, "client connected");
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": { "name": self.name, "version": self.version },
            }),
        )
    }

    async fn call_tool(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}")),
        };
        if !self.registry.has_tool(&params.name) {
            return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {}", params.name));
        }

        let result = self.registry.call_tool(&params.name, params.arguments).await;
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Unserializable result: {e}")),
        }
    }

    /// Serves until `reader` reaches EOF, then waits for in-flight requests.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut lines = BufReader::new(reader).lines();

        info!(server = %self.name, "listening on stdio");
        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.spawn_frame(line, &tx),
                    None => break,
                },
                Some(response) = rx.recv() => write_response(&mut writer, &response).await?,
            }
        }

        drop(tx);
        while let Some(response) = rx.recv().await {
            write_response(&mut writer, &response).await?;
        }
        info!("stdin closed, shutting down");
        Ok(())
    }

    fn spawn_frame(self: &Arc<Self>, line: String, tx: &mpsc::UnboundedSender<JsonRpcResponse>) {
        if line.trim().is_empty() {
            return;
        }
        let server = Arc::clone(self);
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = server.handle_line(&line).await {
                let _ = tx.send(response);
            }
        });
    }
}

fn parse_request(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}")))?;
    let id = value.get("id").cloned().filter(|id| !id.is_null());
    serde_json::from_value(value)
        .map_err(|e| JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {e}")))
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> anyhow::Result<()> {
    let mut frame = serde_json::to_vec(response)?;
    frame.push(b'\n');
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests;

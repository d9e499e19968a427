//! Stdio Transport
//!
//! Reads newline-delimited JSON-RPC messages and writes one response line
//! per request. Notifications are consumed silently. Stdout carries only
//! protocol traffic; diagnostics go to the logger.

use log::{debug, info, warn};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, ToolCallParams, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
use super::tools::{tool_definitions, ToolName, ToolRouter};
use crate::{PROTOCOL_VERSION, SERVER_NAME, VERSION};

/// Serves the workflow tools over a line-oriented stream.
#[derive(Debug, Default)]
pub struct StdioServer {
    router: ToolRouter,
}

impl StdioServer {
    pub fn new(router: ToolRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Serves stdin/stdout until the client closes stdin.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serves `reader`/`writer` until end of input.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("{} listening on stdio", SERVER_NAME);
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if let Some(response) = self.handle_line(&line) {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handles one raw message. Returns the serialized response, if any.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => {
                warn!("Discarding unparseable message: {}", e);
                Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
            Ok(value) => match serde_json::from_value::<JsonRpcRequest>(value.clone()) {
                Ok(request) => self.handle_request(request),
                Err(e) => Some(JsonRpcResponse::error(
                    value.get("id").cloned(),
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                )),
            },
        }?;

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to serialize response: {}", e);
                let fallback = json!({
                    "jsonrpc": "2.0",
                    "id": response.id,
                    "error": {"code": INTERNAL_ERROR, "message": "Internal error"},
                });
                Some(fallback.to_string())
            }
        }
    }

    /// Dispatches a request. Notifications never produce a response.
    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Received method: {}", request.method);

        if request.is_notification() {
            if !request.method.starts_with("notifications/") {
                debug!("Ignoring notification for method {}", request.method);
            }
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => match serde_json::to_value(tool_definitions()) {
                Ok(tools) => JsonRpcResponse::success(id, json!({ "tools": tools })),
                Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
            },
            "tools/call" => self.call_tool(id, request.params),
            other => {
                warn!("Unknown method: {}", other);
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        };

        Some(response)
    }

    fn call_tool(&mut self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
            }
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let tool: ToolName = match params.name.parse() {
            Ok(tool) => tool,
            Err(message) => return JsonRpcResponse::error(id, INVALID_PARAMS, message),
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let result = self.router.call(tool, &arguments);

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {"tools": {"listChanged": false}},
        "serverInfo": {"name": SERVER_NAME, "version": VERSION},
    })
}

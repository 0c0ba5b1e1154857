//! Stdio transport.
//!
//! Newline-delimited JSON-RPC 2.0 over stdin/stdout. Stdout carries the
//! protocol exclusively; everything else the process has to say goes to
//! stderr through the logging layer. Notifications are processed but never
//! answered.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::protocol::{
    error_codes, CallToolParams, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    JSONRPC_VERSION,
};
use crate::registry::ToolRegistry;

pub struct BridgeServer {
    registry: Arc<ToolRegistry>,
}

impl BridgeServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Serve until stdin closes.
    pub async fn run(&self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        let mut stdout = tokio::io::stdout();

        info!("serving MCP over stdio");
        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(trimmed).await {
                match serde_json::to_string(&response) {
                    Ok(serialized) => {
                        stdout.write_all(serialized.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;
                    }
                    Err(err) => {
                        error!(error = %err, "failed to serialize response");
                    }
                }
            }
        }
        info!("stdin closed; shutting down");
        Ok(())
    }

    /// Handle one frame. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "unparseable frame");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    "failed to parse JSON-RPC message",
                ));
            }
        };

        let is_notification = request.id.is_none();
        if request.jsonrpc != JSONRPC_VERSION {
            if is_notification {
                return None;
            }
            return Some(JsonRpcResponse::failure(
                request.id.unwrap_or(Value::Null),
                error_codes::INVALID_REQUEST,
                "unsupported JSON-RPC version",
            ));
        }

        debug!(method = %request.method, notification = is_notification, "frame received");
        let outcome = self.dispatch(&request).await;
        if is_notification {
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::failure(id, code, message),
        })
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> Result<Value, (i64, String)> {
        match request.method.as_str() {
            "initialize" => to_result(InitializeResult::current()),
            "ping" => Ok(json!({})),
            "notifications/initialized" | "notifications/cancelled" => Ok(Value::Null),
            "tools/list" => Ok(json!({ "tools": self.registry.descriptors() })),
            "tools/call" => {
                let params: CallToolParams =
                    serde_json::from_value(request.params.clone().unwrap_or(Value::Null)).map_err(
                        |err| {
                            (
                                error_codes::INVALID_PARAMS,
                                format!("invalid tools/call params: {err}"),
                            )
                        },
                    )?;
                let tool = self
                    .registry
                    .get(&params.name)
                    .map_err(|err| (error_codes::INVALID_PARAMS, err.to_string()))?;
                let response = tool.execute(params.arguments).await;
                to_result(response)
            }
            other => Err((
                error_codes::METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        }
    }
}

fn to_result<T: serde::Serialize>(value: T) -> Result<Value, (i64, String)> {
    serde_json::to_value(value)
        .map_err(|err| (error_codes::INTERNAL_ERROR, format!("serialization failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> BridgeServer {
        BridgeServer::new(Arc::new(ToolRegistry::new()))
    }

    #[tokio::test]
    async fn malformed_json_yields_parse_error() {
        let response = server().handle_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn unknown_method_yields_method_not_found() {
        let response = server()
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn notifications_are_not_answered() {
        let response = server()
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());

        // Even unknown notifications stay silent.
        let response = server()
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/unknown"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server_info() {
        let response = server()
            .handle_line(r#"{"jsonrpc":"2.0","id":7,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], crate::protocol::MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], crate::protocol::SERVER_NAME);
        assert_eq!(response.id, json!(7));
    }

    #[tokio::test]
    async fn tools_list_is_empty_for_an_empty_registry() {
        let response = server()
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.result.unwrap()["tools"], json!([]));
    }

    #[tokio::test]
    async fn calling_an_unknown_tool_is_invalid_params() {
        let response = server()
            .handle_line(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope"}}"#,
            )
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, error_codes::INVALID_PARAMS);
        assert!(error.message.contains("nope"));
    }

    #[tokio::test]
    async fn wrong_jsonrpc_version_is_rejected() {
        let response = server()
            .handle_line(r#"{"jsonrpc":"1.0","id":4,"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_REQUEST);
    }
}

//! Line-delimited JSON-RPC 2.0 over stdio, speaking the MCP tool methods.

use mailbridge_core::{Dispatcher, InboundSession, OutboundSession, Reporter};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::tools;

/// Protocol revision offered when the client does not ask for one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn failure(id: Value, error: &RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": error.code, "message": error.message },
    })
}

fn initialize_result(params: &Value) -> Value {
    let version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);

    json!({
        "protocolVersion": version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

/// Answers requests with a [`Dispatcher`].
pub struct Server<O, I, R> {
    dispatcher: Dispatcher<O, I, R>,
}

impl<O, I, R> Server<O, I, R>
where
    O: OutboundSession,
    I: InboundSession,
    R: Reporter,
{
    /// Wraps a dispatcher.
    pub const fn new(dispatcher: Dispatcher<O, I, R>) -> Self {
        Self { dispatcher }
    }

    /// Reads requests until `reader` is exhausted, writing one response line per request.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub async fn serve<Rd, W>(&self, reader: Rd, mut writer: W) -> std::io::Result<()>
    where
        Rd: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(line).await {
                writer.write_all(response.to_string().as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("input closed");
        Ok(())
    }

    /// Handles one message; notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!("unparsable request: {err}");
                let error = RpcError::new(PARSE_ERROR, format!("Parse error: {err}"));
                return Some(failure(Value::Null, &error));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(err) => {
                let error = RpcError::new(INVALID_REQUEST, format!("Invalid request: {err}"));
                return Some(failure(id, &error));
            }
        };

        let Some(id) = request.id else {
            debug!(method = %request.method, "notification");
            return None;
        };

        debug!(method = %request.method, "request");
        Some(match self.handle(&request.method, request.params).await {
            Ok(result) => success(id, result),
            Err(error) => failure(id, &error),
        })
    }

    async fn handle(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize_result(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::catalogue() })),
            "tools/call" => self.call_tool(params).await,
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let params: CallParams = serde_json::from_value(params)
            .map_err(|err| RpcError::new(INVALID_PARAMS, format!("Invalid params: {err}")))?;
        let output = self
            .dispatcher
            .call(&params.name, params.arguments)
            .await
            .map_err(|err| RpcError::new(INVALID_PARAMS, err.to_string()))?;

        Ok(tools::render(output))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use mailbridge_core::{
        FetchFailure, InboundConfig, OutboundConfig, OutgoingMessage, ProfileStore, SendFailure,
        TracingReporter,
    };

    struct AcceptAll;

    impl OutboundSession for AcceptAll {
        async fn send(&self, _: &OutboundConfig, _: &OutgoingMessage) -> Result<(), SendFailure> {
            Ok(())
        }
    }

    struct Mailbox(Vec<String>);

    impl InboundSession for Mailbox {
        async fn fetch_latest(
            &self,
            _: &InboundConfig,
            count: usize,
        ) -> Result<Vec<String>, FetchFailure> {
            let skip = self.0.len().saturating_sub(count);
            Ok(self.0[skip..].to_vec())
        }
    }

    async fn server(messages: &[&str]) -> Server<AcceptAll, Mailbox, TracingReporter> {
        let store = ProfileStore::in_memory().await.unwrap();
        let inbox = Mailbox(messages.iter().map(ToString::to_string).collect());
        Server::new(Dispatcher::new(store, AcceptAll, inbox))
    }

    fn call(id: u64, tool: &str, arguments: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": tool, "arguments": arguments },
        })
        .to_string()
    }

    fn work_profile() -> Value {
        json!({
            "name": "work",
            "outbound_host": "smtp.example.com",
            "outbound_port": 587,
            "outbound_user": "me@example.com",
            "outbound_password": "secret",
            "outbound_security": "starttls",
            "inbound_host": "imap.example.com",
            "inbound_user": "me@example.com",
            "inbound_password": "secret",
            "inbound_security": "tls",
        })
    }

    #[tokio::test]
    async fn test_initialize_echoes_version() {
        let server = server(&[]).await;
        let line = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{}}}"#;

        let response = server.handle_line(line).await.unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(response["result"]["serverInfo"]["name"], "mailbridge");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_initialize_default_version() {
        let server = server(&[]).await;
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":"a","method":"initialize"}"#)
            .await
            .unwrap();
        assert_eq!(response["id"], "a");
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let server = server(&[]).await;
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let server = server(&[]).await;
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();
        assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server(&[]).await;
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(
            response["error"]["message"],
            "Method not found: resources/list"
        );
    }

    #[tokio::test]
    async fn test_parse_error() {
        let server = server(&[]).await;
        let response = server.handle_line("{not json").await.unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);
        assert!(response["id"].is_null());
    }

    #[tokio::test]
    async fn test_request_without_method() {
        let server = server(&[]).await;
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":9}"#)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
        assert_eq!(response["id"], 9);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let server = server(&[]).await;
        let response = server
            .handle_line(&call(4, "delete_everything", json!({})))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert_eq!(
            response["error"]["message"],
            "Unknown tool: delete_everything"
        );
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid_params() {
        let server = server(&[]).await;
        let response = server
            .handle_line(&call(5, "send_email", json!({ "name": "work" })))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_add_missing_field_is_tool_failure() {
        let server = server(&[]).await;
        let mut profile = work_profile();
        profile.as_object_mut().unwrap().remove("outbound_host");

        let response = server
            .handle_line(&call(6, "add_email_config", profile))
            .await
            .unwrap();
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Can't add email configuration."
        );

        let listed = server
            .handle_line(&call(7, "list_email_configs", Value::Null))
            .await
            .unwrap();
        assert_eq!(listed["result"]["content"][0]["text"], "[]");
    }

    #[tokio::test]
    async fn test_update_bad_security_is_tool_failure() {
        let server = server(&[]).await;
        server
            .handle_line(&call(1, "add_email_config", work_profile()))
            .await
            .unwrap();

        let response = server
            .handle_line(&call(
                2,
                "update_email_config",
                json!({ "name": "work", "outbound_security": "bogus" }),
            ))
            .await
            .unwrap();
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Can't update email 'work' configuration."
        );
    }

    #[tokio::test]
    async fn test_update_without_name_is_invalid_params() {
        let server = server(&[]).await;
        let response = server
            .handle_line(&call(3, "update_email_config", json!({ "outbound_port": 25 })))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let server = server(&[]).await;

        let added = server
            .handle_line(&call(1, "add_email_config", work_profile()))
            .await
            .unwrap();
        assert_eq!(added["result"]["isError"], false);
        assert_eq!(
            added["result"]["content"][0]["text"],
            "Email configuration 'work' added successfully."
        );

        let listed = server
            .handle_line(&call(2, "list_email_configs", Value::Null))
            .await
            .unwrap();
        assert_eq!(listed["result"]["content"][0]["text"], r#"["work"]"#);
    }

    #[tokio::test]
    async fn test_tool_failure_sets_is_error() {
        let server = server(&[]).await;
        let response = server
            .handle_line(&call(1, "read_email", json!({ "name": "nope" })))
            .await
            .unwrap();
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Email configuration 'nope' not found."
        );
    }

    #[tokio::test]
    async fn test_read_returns_latest_five() {
        let server = server(&["m1", "m2", "m3", "m4", "m5", "m6"]).await;
        server
            .handle_line(&call(1, "add_email_config", work_profile()))
            .await
            .unwrap();

        let response = server
            .handle_line(&call(2, "read_email", json!({ "name": "work" })))
            .await
            .unwrap();
        let texts: Vec<&str> = response["result"]["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, ["m2", "m3", "m4", "m5", "m6"]);
    }

    #[tokio::test]
    async fn test_serve_writes_one_line_per_request() {
        let server = server(&[]).await;
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut output = Vec::new();

        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));
        assert_eq!(lines[1]["id"], 2);
    }
}

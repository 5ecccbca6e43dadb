//! Per-message request handling.
//!
//! Every framed line goes through the same steps: JSON parsing, envelope
//! validation, routing on `method`, and finally translation of any failure into
//! a JSON-RPC error object. That translation happens in `respond` and nowhere
//! else.
//!
//! Handling is split in two. [`Dispatcher::prepare`] does everything that needs
//! no tool and answers on the spot; only a valid `tools/call` is left as a
//! [`ToolCall`] for [`Dispatcher::run_call`].

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::ToolService;
use crate::protocol::{
    CallToolResult, InitializeResult, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId, ServerCapabilities, ServerInfo,
    ToolsCapability,
};

/// Notification sent by the client once the handshake is complete.
pub const INITIALIZED_NOTIFICATION: &str = "notifications/initialized";

const CALL_TOOL: &str = "tools/call";

/// Failure raised while handling a routed request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Detected while validating or routing; carries its own code.
    #[error(transparent)]
    Protocol(#[from] JsonRpcError),
    /// Raised by a tool or while encoding its output.
    #[error("{0}")]
    Execution(String),
}

impl From<serde_json::Error> for DispatchError {
    fn from(error: serde_json::Error) -> Self {
        Self::Execution(error.to_string())
    }
}

impl DispatchError {
    /// The JSON-RPC error sent on the wire.
    #[must_use]
    pub fn into_rpc(self) -> JsonRpcError {
        match self {
            Self::Protocol(error) => error,
            Self::Execution(message) => JsonRpcError::internal_error(message),
        }
    }
}

/// A validated `tools/call` request waiting to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Id to answer with.
    pub id: RequestId,
    /// Requested tool.
    pub name: String,
    /// Tool arguments; `{}` when the request had none.
    pub arguments: Value,
}

/// What is left to do for a message after [`Dispatcher::prepare`].
#[derive(Debug, Clone)]
pub enum Step {
    /// Fully handled. `None` means nothing is sent back.
    Done(Option<JsonRpcResponse>),
    /// A tool call still to be run.
    Call(ToolCall),
}

/// Stateless request dispatcher over a fixed tool catalogue.
#[derive(Debug)]
pub struct Dispatcher<T> {
    tools: T,
    info: ServerInfo,
}

impl<T: ToolService> Dispatcher<T> {
    /// Create a dispatcher serving `tools` under the given identity.
    pub const fn new(tools: T, info: ServerInfo) -> Self {
        Self { tools, info }
    }

    /// The served tool catalogue.
    pub const fn tools(&self) -> &T {
        &self.tools
    }

    /// The identity reported by `initialize`.
    pub const fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Handle one framed line to completion.
    ///
    /// Returns `None` when the message is a notification.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        self.finish(self.prepare_line(line)).await
    }

    /// Handle a request whose envelope is already valid.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        self.finish(self.prepare(request)).await
    }

    /// Parse one framed line and handle it as far as possible without a tool.
    pub fn prepare_line(&self, line: &str) -> Step {
        match parse_request(line) {
            Ok(request) => self.prepare(request),
            Err((id, error)) => {
                debug!("Rejecting message: {}", error);
                Step::Done(Some(JsonRpcResponse::error(id, error)))
            }
        }
    }

    /// Handle a valid request as far as possible without a tool.
    pub fn prepare(&self, request: JsonRpcRequest) -> Step {
        if request.method == INITIALIZED_NOTIFICATION {
            debug!("Client initialized");
            return Step::Done(None);
        }
        if request.is_notification() && request.method.starts_with("notifications/") {
            debug!("Ignoring notification: {}", request.method);
            return Step::Done(None);
        }

        let id = request.response_id();
        debug!("Handling request: {}", request.method);

        let result = match request.method.as_str() {
            "initialize" => self.initialize(),
            "tools/list" => self.list_tools(),
            CALL_TOOL => match tool_call(request.params) {
                Ok((name, arguments)) => {
                    return Step::Call(ToolCall {
                        id,
                        name,
                        arguments,
                    });
                }
                Err(error) => Err(error),
            },
            method => Err(JsonRpcError::method_not_found(method).into()),
        };
        Step::Done(Some(respond(id, &request.method, result)))
    }

    /// Run a prepared tool call and build its response.
    pub async fn run_call(&self, call: ToolCall) -> JsonRpcResponse {
        let result = self.call_tool(&call.name, call.arguments).await;
        respond(call.id, CALL_TOOL, result)
    }

    async fn finish(&self, step: Step) -> Option<JsonRpcResponse> {
        match step {
            Step::Done(response) => response,
            Step::Call(call) => Some(self.run_call(call).await),
        }
    }

    /// Handle initialize request. The payload never depends on the request.
    fn initialize(&self) -> Result<Value, DispatchError> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.info.clone(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle tools/list request.
    fn list_tools(&self) -> Result<Value, DispatchError> {
        let result = ListToolsResult {
            tools: self.tools.definitions(),
        };
        Ok(serde_json::to_value(result)?)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, DispatchError> {
        let output = self
            .tools
            .call(name, arguments)
            .await
            .map_err(|e| DispatchError::Execution(e.to_string()))?;

        let result = CallToolResult::pretty_json(&output)?;
        Ok(serde_json::to_value(result)?)
    }
}

/// Pull the tool name and arguments out of `tools/call` params.
fn tool_call(params: Option<Value>) -> Result<(String, Value), DispatchError> {
    let mut params = match params {
        Some(Value::Object(params)) => params,
        _ => Map::new(),
    };

    let name = match params.remove("name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => {
            return Err(JsonRpcError::invalid_params("Invalid params: name is required").into());
        }
    };
    let arguments = match params.remove("arguments") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(arguments) => arguments,
    };
    Ok((name, arguments))
}

fn respond(id: RequestId, method: &str, result: Result<Value, DispatchError>) -> JsonRpcResponse {
    match result {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => {
            let error = error.into_rpc();
            debug!("Request {} failed: {}", method, error);
            JsonRpcResponse::error(id, error)
        }
    }
}

/// Parse and validate one line. On failure, returns the id to answer with.
fn parse_request(line: &str) -> Result<JsonRpcRequest, (RequestId, JsonRpcError)> {
    let value: Value = serde_json::from_str(line)
        .map_err(|_| (RequestId::Null, JsonRpcError::parse_error()))?;

    let Value::Object(mut object) = value else {
        return Err((RequestId::Null, JsonRpcError::invalid_request()));
    };

    let id = match object.remove("id") {
        None => None,
        Some(raw) => match RequestId::try_from(raw) {
            Ok(id) => Some(id),
            Err(_) => return Err((RequestId::Null, JsonRpcError::invalid_request())),
        },
    };

    let method = match object.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => {
            return Err((
                id.unwrap_or(RequestId::Null),
                JsonRpcError::invalid_request(),
            ));
        }
    };

    let jsonrpc = match object.remove("jsonrpc") {
        Some(Value::String(version)) => version,
        _ => JSONRPC_VERSION.to_string(),
    };

    Ok(JsonRpcRequest {
        jsonrpc,
        id,
        method,
        params: object.remove("params"),
    })
}

//! MCP server loop over a line transport.

use std::sync::Arc;

use executor_core::{Executor, Task};
use futures_lite::future;
use tracing::{debug, info, warn};

use super::{Dispatcher, Step, ToolService};
use crate::protocol::{JsonRpcError, JsonRpcResponse, McpError, RequestId, ServerInfo};
use crate::transport::{Frame, MessageSink, MessageSource};

/// MCP server that exposes a tool catalogue to a single client.
///
/// Messages that need no tool are answered as soon as they are read. Each tool
/// call runs on its own task, so a slow call never holds up the messages behind
/// it. Responses are written by the serving task alone, in completion order.
///
/// # Example
///
/// ```ignore
/// use executor_core::tokio::TokioGlobal;
/// use solaredge_mcp_rpc::{McpServer, ServerInfo};
/// use solaredge_mcp_rpc::transport::{LineFramer, stdio};
///
/// let server = McpServer::new(tools, ServerInfo::new("my-server", "1.0.0"), TokioGlobal);
/// let (reader, writer) = stdio(LineFramer::default());
/// server.serve(reader, writer).await?;
/// ```
pub struct McpServer<T, E> {
    dispatcher: Arc<Dispatcher<T>>,
    executor: E,
}

impl<T, E> std::fmt::Debug for McpServer<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer").finish_non_exhaustive()
    }
}

enum Event {
    Outgoing(Option<JsonRpcResponse>),
    Incoming(Option<Frame>),
}

impl<T: ToolService, E: Executor> McpServer<T, E> {
    /// Create a server for `tools`, spawning request handlers on `executor`.
    pub fn new(tools: T, info: ServerInfo, executor: E) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(tools, info)),
            executor,
        }
    }

    /// The dispatcher shared by every request task.
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Serve until the input stream ends.
    ///
    /// On end of input, responses that are already queued are written and the
    /// call returns. Every message other than a tool call has been answered by
    /// then. Tool calls still running are abandoned and their responses
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from `source` or writing to `sink` fails.
    pub async fn serve<S, K>(&self, mut source: S, mut sink: K) -> Result<(), McpError>
    where
        S: MessageSource,
        K: MessageSink,
    {
        info!("MCP server starting: {}", self.dispatcher.info().name);

        let (tx, rx) = async_channel::unbounded::<JsonRpcResponse>();

        loop {
            // Queued output goes first so a busy input never starves it.
            let event = future::or(async { Ok(Event::Outgoing(rx.recv().await.ok())) }, async {
                source.recv().await.map(Event::Incoming)
            })
            .await?;

            match event {
                Event::Outgoing(Some(response)) => write(&mut sink, &response).await?,
                Event::Outgoing(None) => break,
                Event::Incoming(Some(Ok(line))) => match self.dispatcher.prepare_line(&line) {
                    Step::Done(Some(response)) => write(&mut sink, &response).await?,
                    Step::Done(None) => {}
                    Step::Call(call) => {
                        let dispatcher = Arc::clone(&self.dispatcher);
                        let tx = tx.clone();
                        self.executor
                            .spawn(async move {
                                let response = dispatcher.run_call(call).await;
                                if tx.send(response).await.is_err() {
                                    debug!("Output closed, dropping response");
                                }
                            })
                            .detach();
                    }
                },
                Event::Incoming(Some(Err(error))) => {
                    warn!("Rejecting input line: {}", error);
                    let response =
                        JsonRpcResponse::error(RequestId::Null, JsonRpcError::parse_error());
                    write(&mut sink, &response).await?;
                }
                Event::Incoming(None) => {
                    debug!("Input closed");
                    break;
                }
            }
        }

        drop(tx);
        while let Ok(response) = rx.try_recv() {
            write(&mut sink, &response).await?;
        }

        info!("MCP server stopped");
        Ok(())
    }
}

async fn write<K: MessageSink>(sink: &mut K, response: &JsonRpcResponse) -> Result<(), McpError> {
    sink.send(response)
        .await
        .inspect_err(|error| warn!("Failed to write response: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ErrorCode, InputSchema, ToolDescriptor};
    use crate::transport::{FrameError, Result as TransportResult};
    use executor_core::tokio::TokioGlobal;
    use serde_json::{Value, json};
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    struct SleepyTools {
        definitions: Vec<ToolDescriptor>,
    }

    impl SleepyTools {
        fn new() -> Self {
            Self {
                definitions: vec![
                    ToolDescriptor::new("echo", "Echo", InputSchema::object()),
                    ToolDescriptor::new("sleep", "Sleep for `ms` milliseconds", InputSchema::object()),
                ],
            }
        }
    }

    impl ToolService for SleepyTools {
        type Error = TestError;

        fn definitions(&self) -> &[ToolDescriptor] {
            &self.definitions
        }

        async fn call(&self, name: &str, arguments: Value) -> Result<Value, TestError> {
            match name {
                "echo" => Ok(arguments),
                "sleep" => {
                    let ms = arguments["ms"].as_u64().unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(json!({"slept": ms}))
                }
                other => Err(TestError(format!("Unknown tool: {other}"))),
            }
        }
    }

    struct ScriptedSource(async_channel::Receiver<Frame>);

    impl MessageSource for ScriptedSource {
        async fn recv(&mut self) -> TransportResult<Option<Frame>> {
            Ok(self.0.recv().await.ok())
        }
    }

    struct ChannelSink(async_channel::Sender<JsonRpcResponse>);

    impl MessageSink for ChannelSink {
        async fn send(&mut self, response: &JsonRpcResponse) -> TransportResult<()> {
            self.0.send(response.clone()).await.map_err(|_| {
                McpError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "test output closed",
                ))
            })
        }
    }

    fn server() -> McpServer<SleepyTools, TokioGlobal> {
        McpServer::new(
            SleepyTools::new(),
            ServerInfo::new("test-server", "0.0.1"),
            TokioGlobal,
        )
    }

    fn call(id: i64, name: &str, arguments: Value) -> Frame {
        Ok(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        })
        .to_string())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn slow_calls_do_not_block_later_messages() {
        let (input, lines) = async_channel::unbounded();
        let (output, responses) = async_channel::unbounded();
        let server = server();

        let client = async move {
            input.send(call(1, "sleep", json!({"ms": 300}))).await.unwrap();
            input.send(call(2, "echo", json!({"x": 1}))).await.unwrap();
            let first = responses.recv().await.unwrap();
            let second = responses.recv().await.unwrap();
            drop(input);
            (first, second)
        };

        let (served, (first, second)) = tokio::time::timeout(
            Duration::from_secs(5),
            future::zip(
                server.serve(ScriptedSource(lines), ChannelSink(output)),
                client,
            ),
        )
        .await
        .unwrap();

        served.unwrap();
        assert_eq!(first.id, 2_i64.into());
        assert_eq!(second.id, 1_i64.into());
        assert_eq!(
            second.result.unwrap()["content"][0]["text"],
            "{\n  \"slept\": 300\n}"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn notifications_produce_no_output() {
        let (input, lines) = async_channel::unbounded();
        let (output, responses) = async_channel::unbounded();
        let server = server();

        let client = async move {
            input
                .send(Ok(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string()))
                .await
                .unwrap();
            input
                .send(Ok(r#"{"jsonrpc":"2.0","id":5,"method":"tools/list"}"#.to_string()))
                .await
                .unwrap();
            let response = responses.recv().await.unwrap();
            drop(input);
            response
        };

        let (served, response) = tokio::time::timeout(
            Duration::from_secs(5),
            future::zip(
                server.serve(ScriptedSource(lines), ChannelSink(output)),
                client,
            ),
        )
        .await
        .unwrap();

        served.unwrap();
        assert_eq!(response.id, 5_i64.into());
        assert_eq!(response.result.unwrap()["tools"].as_array().unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreadable_lines_get_a_parse_error() {
        let (input, lines) = async_channel::unbounded();
        let (output, responses) = async_channel::unbounded();
        let server = server();

        let client = async move {
            input
                .send(Err(FrameError::LineTooLong { len: 100, limit: 10 }))
                .await
                .unwrap();
            input.send(Err(FrameError::InvalidUtf8)).await.unwrap();
            let first = responses.recv().await.unwrap();
            let second = responses.recv().await.unwrap();
            drop(input);
            [first, second]
        };

        let (served, received) = tokio::time::timeout(
            Duration::from_secs(5),
            future::zip(
                server.serve(ScriptedSource(lines), ChannelSink(output)),
                client,
            ),
        )
        .await
        .unwrap();

        served.unwrap();
        for response in received {
            assert_eq!(response.id, RequestId::Null);
            assert_eq!(response.error.unwrap().code, ErrorCode::PARSE_ERROR);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn end_of_input_does_not_wait_for_running_calls() {
        let (input, lines) = async_channel::unbounded();
        let (output, responses) = async_channel::unbounded();
        let server = server();

        input
            .send(call(1, "sleep", json!({"ms": 60_000})))
            .await
            .unwrap();
        drop(input);

        tokio::time::timeout(
            Duration::from_secs(5),
            server.serve(ScriptedSource(lines), ChannelSink(output)),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(responses.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn input_closed_right_away_still_answers_handshake_and_listing() {
        let (input, lines) = async_channel::unbounded();
        let (output, responses) = async_channel::unbounded();
        let server = server();

        input
            .send(Ok(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#.to_string()))
            .await
            .unwrap();
        input
            .send(Ok(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#.to_string()))
            .await
            .unwrap();
        input
            .send(Ok(r#"{"jsonrpc":"2.0","id":3,"method":"bogus"}"#.to_string()))
            .await
            .unwrap();
        drop(input);

        tokio::time::timeout(
            Duration::from_secs(5),
            server.serve(ScriptedSource(lines), ChannelSink(output)),
        )
        .await
        .unwrap()
        .unwrap();

        let received: Vec<JsonRpcResponse> = std::iter::from_fn(|| responses.try_recv().ok()).collect();
        assert_eq!(received.len(), 3);
        assert_eq!(received[0].id, 1_i64.into());
        assert_eq!(
            received[0].result.as_ref().unwrap()["serverInfo"]["name"],
            "test-server"
        );
        assert_eq!(received[1].id, 2_i64.into());
        assert_eq!(
            received[1].result.as_ref().unwrap()["tools"].as_array().unwrap().len(),
            2
        );
        assert_eq!(received[2].error.as_ref().unwrap().code, ErrorCode::METHOD_NOT_FOUND);
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread")]
    async fn serves_over_a_byte_pipe() {
        use crate::transport::{LineFramer, LineReader, LineWriter};
        use async_io::Async;
        use futures_lite::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use std::os::unix::net::UnixStream;

        let (mut client_in, server_in) = Async::<UnixStream>::pair().unwrap();
        let (server_out, client_out) = Async::<UnixStream>::pair().unwrap();
        let server = server();

        let client = async move {
            let mut client_out = BufReader::new(client_out);

            // One request split across two writes.
            client_in
                .write_all(br#"{"jsonrpc":"2.0","id":"a","meth"#)
                .await
                .unwrap();
            client_in.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            client_in
                .write_all(b"od\":\"initialize\"}\n{broken\n")
                .await
                .unwrap();
            client_in.flush().await.unwrap();

            let mut lines = Vec::new();
            for _ in 0..2 {
                let mut line = String::new();
                client_out.read_line(&mut line).await.unwrap();
                lines.push(serde_json::from_str::<Value>(&line).unwrap());
            }
            drop(client_in);
            lines
        };

        let (served, lines) = tokio::time::timeout(
            Duration::from_secs(5),
            future::zip(
                server.serve(
                    LineReader::new(server_in, LineFramer::default()),
                    LineWriter::new(server_out),
                ),
                client,
            ),
        )
        .await
        .unwrap();

        served.unwrap();
        let initialize = lines.iter().find(|line| line["id"] == "a").unwrap();
        assert_eq!(initialize["result"]["serverInfo"]["name"], "test-server");
        let parse_error = lines.iter().find(|line| line["id"].is_null()).unwrap();
        assert_eq!(parse_error["error"]["code"], -32700);
    }
}

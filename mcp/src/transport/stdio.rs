//! Standard I/O transport for MCP.
//!
//! This transport uses stdin/stdout for communication, which is the standard
//! method for MCP servers that run as subprocesses (e.g., Claude Desktop integration).
//! The reader and writer halves are generic so any async byte stream can stand
//! in for the process pipes.

use std::io::{Read, Write};
use std::os::fd::AsFd;

use async_io::{Async, IoSafe};
use blocking::Unblock;
use futures_lite::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::framer::{Frame, LineFramer};
use super::traits::{MessageSink, MessageSource, Result};
use crate::protocol::JsonRpcResponse;

/// Size of a single read from the underlying stream.
const READ_CHUNK: usize = 8 * 1024;

/// Reading half: framed lines from an async byte stream.
pub struct LineReader<R> {
    reader: R,
    framer: LineFramer,
    chunk: Box<[u8]>,
    eof: bool,
}

impl<R> std::fmt::Debug for LineReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineReader")
            .field("framer", &self.framer)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin + Send> LineReader<R> {
    /// Wrap a stream, framing lines with the given framer.
    pub fn new(reader: R, framer: LineFramer) -> Self {
        Self {
            reader,
            framer,
            chunk: vec![0; READ_CHUNK].into_boxed_slice(),
            eof: false,
        }
    }
}

impl<R: AsyncRead + Unpin + Send> MessageSource for LineReader<R> {
    async fn recv(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.framer.next_frame() {
                if let Ok(line) = &frame {
                    debug!("MCP RX: {}", line);
                }
                return Ok(Some(frame));
            }
            if self.eof {
                return Ok(None);
            }

            // The only await point; a pending read consumes nothing.
            let read = self.reader.read(&mut self.chunk).await?;
            if read == 0 {
                self.eof = true;
                let dropped = self.framer.finish();
                if dropped > 0 {
                    debug!("Discarding {dropped} unterminated bytes at end of input");
                }
                return Ok(None);
            }
            self.framer.push(&self.chunk[..read]);
        }
    }
}

/// Writing half: one JSON document per line.
pub struct LineWriter<W> {
    writer: W,
}

impl<W> std::fmt::Debug for LineWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineWriter").finish_non_exhaustive()
    }
}

impl<W: AsyncWrite + Unpin + Send> LineWriter<W> {
    /// Wrap a stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin + Send> MessageSink for LineWriter<W> {
    async fn send(&mut self, response: &JsonRpcResponse) -> Result<()> {
        let mut json = serde_json::to_vec(response)?;
        debug!("MCP TX: {}", String::from_utf8_lossy(&json));
        json.push(b'\n');

        self.writer.write_all(&json).await?;
        self.writer.flush().await?;

        Ok(())
    }
}

/// Reader over the process's standard input.
pub type StdinReader = LineReader<Box<dyn AsyncRead + Unpin + Send>>;

/// Writer over the process's standard output.
pub type StdoutWriter = LineWriter<Box<dyn AsyncWrite + Unpin + Send>>;

/// Open stdin and stdout as an async transport pair.
///
/// Handles the reactor cannot poll, such as a regular file redirected to
/// stdin, are served from a blocking thread pool instead.
#[must_use]
pub fn stdio(framer: LineFramer) -> (StdinReader, StdoutWriter) {
    (
        LineReader::new(async_reader(std::io::stdin), framer),
        LineWriter::new(async_writer(std::io::stdout)),
    )
}

fn async_reader<R>(open: impl Fn() -> R) -> Box<dyn AsyncRead + Unpin + Send>
where
    R: Read + AsFd + IoSafe + Send + 'static,
{
    match Async::new(open()) {
        Ok(io) => Box::new(io),
        Err(error) => {
            debug!("Input is not pollable ({error}), reading on a blocking thread");
            Box::new(Unblock::new(open()))
        }
    }
}

fn async_writer<W>(open: impl Fn() -> W) -> Box<dyn AsyncWrite + Unpin + Send>
where
    W: Write + AsFd + IoSafe + Send + 'static,
{
    match Async::new(open()) {
        Ok(io) => Box::new(io),
        Err(error) => {
            debug!("Output is not pollable ({error}), writing on a blocking thread");
            Box::new(Unblock::new(open()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{JsonRpcError, RequestId};
    use crate::transport::FrameError;
    use futures_lite::future::block_on;
    use futures_lite::io::Cursor;

    #[test]
    fn reads_lines_until_end_of_input() {
        block_on(async {
            let input = Cursor::new(b"{\"a\":1}\n\n{\"b\":2}\n{\"c\":".to_vec());
            let mut reader = LineReader::new(input, LineFramer::default());

            assert_eq!(reader.recv().await.unwrap(), Some(Ok("{\"a\":1}".to_string())));
            assert_eq!(reader.recv().await.unwrap(), Some(Ok("{\"b\":2}".to_string())));
            assert_eq!(reader.recv().await.unwrap(), None);
            assert_eq!(reader.recv().await.unwrap(), None);
        });
    }

    #[test]
    fn surfaces_oversized_lines_as_frames() {
        block_on(async {
            let input = Cursor::new(b"xxxxxxxxxxxx\n{}\n".to_vec());
            let mut reader = LineReader::new(input, LineFramer::new(4));

            assert_eq!(
                reader.recv().await.unwrap(),
                Some(Err(FrameError::LineTooLong { len: 12, limit: 4 }))
            );
            assert_eq!(reader.recv().await.unwrap(), Some(Ok("{}".to_string())));
        });
    }

    #[test]
    fn writes_one_line_per_response() {
        block_on(async {
            let mut writer = LineWriter::new(Vec::new());
            writer
                .send(&JsonRpcResponse::error(
                    RequestId::Null,
                    JsonRpcError::parse_error(),
                ))
                .await
                .unwrap();
            writer
                .send(&JsonRpcResponse::success(1_i64.into(), serde_json::json!({})))
                .await
                .unwrap();

            let written = String::from_utf8(writer.into_inner()).unwrap();
            assert_eq!(
                written,
                concat!(
                    "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32700,\"message\":\"Parse error\"}}\n",
                    "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n"
                )
            );
        });
    }

    #[test]
    fn regular_files_are_read_through_the_blocking_pool() {
        let path = std::env::temp_dir().join(format!("solaredge-mcp-stdin-{}.jsonl", std::process::id()));
        std::fs::write(&path, b"{\"id\":1}\n{\"id\":2}\n").unwrap();

        let open = || std::fs::File::open(&path).unwrap();
        let lines = block_on(async {
            let mut reader = LineReader::new(async_reader(open), LineFramer::default());
            let mut lines = Vec::new();
            while let Some(frame) = reader.recv().await.unwrap() {
                lines.push(frame.unwrap());
            }
            lines
        });
        std::fs::remove_file(&path).unwrap();

        assert_eq!(lines, ["{\"id\":1}", "{\"id\":2}"]);
    }
}

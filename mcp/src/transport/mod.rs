//! Transport layer for MCP communication.
//!
//! This module turns byte streams into framed JSON-RPC lines and writes
//! responses back, one JSON document per line.

mod framer;
mod stdio;
mod traits;

pub use framer::{DEFAULT_MAX_LINE_BYTES, Frame, FrameError, LineFramer};
pub use stdio::{LineReader, LineWriter, StdinReader, StdoutWriter, stdio};
pub use traits::{MessageSink, MessageSource, Result};

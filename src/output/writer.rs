//! Message sinks
//!
//! Provides the JSON-lines writer used on stdout and an in-memory sink.

use super::types::Message;
use crate::error::Result;
use std::io::Write;

/// Destination for emitted messages
pub trait MessageSink: Send {
    /// Write one message
    fn emit(&mut self, message: Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes one JSON object per line
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Create a writer over any output
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Number of messages written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Recover the underlying output
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> MessageSink for JsonLinesWriter<W> {
    fn emit(&mut self, message: Message) -> Result<()> {
        serde_json::to_writer(&mut self.out, &message)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

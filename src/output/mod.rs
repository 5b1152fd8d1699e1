//! Output module
//!
//! Singer messages and the sinks they are written to.
//!
//! # Overview
//!
//! Every message is a JSON object tagged with `type`:
//! - `SCHEMA` - stream schema, key properties and bookmark properties
//! - `RECORD` - one record of a stream
//! - `STATE` - the full bookmark document
//!
//! Only messages go to stdout; logs are written to stderr.

mod types;
mod writer;

pub use types::Message;
pub use writer::{JsonLinesWriter, MessageSink};

//! Response decoder module
//!
//! Turns a page body into the list of records it carries.

mod decoders;
mod types;

pub use decoders::JsonDecoder;
pub use types::RecordDecoder;

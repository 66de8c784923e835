//! Drive schemas over fragmented byte streams.
//!
//! This crate performs no I/O. A [Decoder] buffers inbound fragments of any size and emits every
//! complete value they contain, keeping partial input until the rest of it arrives. An [Encoder]
//! turns outbound values into the bytes to send. Both are meant to sit between a transport and
//! the application, one of each per stream direction.
//!
//! # Example
//!
//! ```
//! use wireform_codec::{schema, types::*, Record, Value};
//! use wireform_stream::{Decoder, Encoder};
//!
//! let schema = schema! {
//!     "id" => uint16be(),
//!     "body" => buffer(uint8()),
//! }
//! .unwrap();
//!
//! let message = Value::Record(Record::from([
//!     ("id", Value::Int(7)),
//!     ("body", Value::from(&b"ping"[..])),
//! ]));
//!
//! let mut encoder = Encoder::new(schema.clone());
//! let bytes = encoder.encode(&message).unwrap();
//! assert_eq!(bytes.len(), 7);
//!
//! let mut decoder = Decoder::new(schema);
//! assert!(decoder.feed(bytes.slice(..3)).unwrap().is_empty());
//! assert_eq!(decoder.buffered(), 3);
//! assert_eq!(decoder.feed(bytes.slice(3..)).unwrap(), vec![message]);
//! assert_eq!(decoder.buffered(), 0);
//! ```

mod decoder;
pub use decoder::Decoder;
mod encoder;
pub use encoder::Encoder;

use thiserror::Error;

/// Errors that can occur when driving a stream.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("codec error: {0}")]
    Codec(#[from] wireform_codec::Error),
    #[error("decode made no progress")]
    Stalled,
}

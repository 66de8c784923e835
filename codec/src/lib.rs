//! Encode and decode binary layouts described by composable schemas.
//!
//! # Overview
//!
//! A [Schema] describes a binary layout: either a single [Codec] or an ordered list of named
//! fields. The same schema drives three operations:
//! - [encode]: write a [Value] as bytes
//! - [decode]: read a [Value] back from bytes
//! - [encoding_length]: compute the encoded size of a [Value] without writing it
//!
//! Input is meant to arrive in fragments of any size. Bytes are buffered in a [ChunkList] without
//! copying, and decoding runs through a [Transaction] that only removes bytes from the list once
//! [Transaction::commit] is called. If a decode runs out of input it fails with
//! [Error::NotEnoughData], the transaction is dropped, and the same decode can be retried after
//! appending more bytes.
//!
//! # Codecs
//!
//! - Numbers: signed and unsigned integers of 8 to 48 bits and IEEE-754 floats, in big- and
//!   little-endian byte order (e.g. [types::uint32be])
//! - [types::boolean]: a number read as `true` when nonzero
//! - [types::buffer] and [types::string]: byte strings whose length is fixed, prefixed,
//!   computed from earlier fields, or zero-terminated (see [Size])
//! - [types::array]: items counted either by number or by total encoded bytes
//! - [types::reserved]: padding written as zeros and dropped on decode
//! - [types::when] and [types::select]: fields whose presence depends on earlier fields
//!
//! # Example
//!
//! ```
//! use wireform_codec::{decode, encode, schema, types::*, Condition, Record, Size, Value};
//!
//! let schema = schema! {
//!     "kind" => uint8(),
//!     "len" => uint16be(),
//!     "name" => string(Size::field("len"), Default::default()),
//!     "port" => when(Condition::field_eq("kind", 2), uint16be()),
//! }
//! .unwrap();
//!
//! let value = Value::Record(Record::from([
//!     ("kind", Value::Int(2)),
//!     ("len", Value::Int(4)),
//!     ("name", Value::from("host")),
//!     ("port", Value::Int(8080)),
//! ]));
//!
//! let (list, written) = encode(&value, &schema).unwrap();
//! assert_eq!(written, 9);
//! assert_eq!(list.slice(..), &b"\x02\x00\x04host\x1f\x90"[..]);
//!
//! let (decoded, read) = decode(list.slice(..), &schema).unwrap();
//! assert_eq!(decoded, value);
//! assert_eq!(read, 9);
//! ```
//!
//! # Fragmented input
//!
//! ```
//! use wireform_codec::{decode_from, types::cstring, ChunkList, Schema, Transaction, Value};
//!
//! let schema = Schema::from(cstring());
//! let mut list = ChunkList::new();
//!
//! list.append(&b"hello, "[..]);
//! let mut tx = Transaction::new(&mut list);
//! assert!(decode_from(&mut tx, &schema).unwrap_err().is_not_enough_data());
//! drop(tx);
//! assert_eq!(list.len(), 7);
//!
//! list.append(&b"world!\0"[..]);
//! let mut tx = Transaction::new(&mut list);
//! let (value, read) = decode_from(&mut tx, &schema).unwrap();
//! tx.commit().unwrap();
//! assert_eq!(value, Value::from("hello, world!"));
//! assert_eq!(read, 14);
//! assert!(list.is_empty());
//! ```

pub mod chunk;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod number;
pub mod schema;
pub mod transaction;
pub mod types;
pub mod value;

// Re-export main types and traits
pub use chunk::{ChunkList, Reader};
pub use codec::{Codec, Condition, Encoding, Size, SizeFn, SizeKind};
pub use config::{Config, RangeCfg};
pub use context::Context;
pub use error::Error;
pub use number::{Endian, Format, Number, MAX_INT_WIDTH};
pub use schema::{
    decode, decode_cfg, decode_from, decode_from_cfg, encode, encode_into, encoding_length, Schema,
};
pub use transaction::Transaction;
pub use value::{Record, Value};

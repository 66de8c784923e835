//! Built-in codecs and combinators.
//!
//! Every codec is built by a constructor function (`uint32be()`, `string(..)`, `array(..)`, ...)
//! and converts into a [crate::Schema] with `into()`.

pub mod array;
pub mod buffer;
pub mod conditional;
pub mod primitives;

pub use array::{array, padding, reserved, ArrayCodec, ReservedCodec};
pub use buffer::{buffer, cstring, string, BufferCodec, StringCodec};
pub use conditional::{select, when, SelectCodec, WhenCodec};
pub use primitives::*;

//! Core codec trait and the parameters shared by the built-in codecs

use crate::{types::primitives::NumberCodec, ChunkList, Context, Error, Number, Transaction, Value};
use std::{fmt, sync::Arc};

/// A unit that encodes, decodes and sizes one kind of [Value].
///
/// Codecs are leaves of a [crate::Schema]. Combinators (arrays, conditionals, reserved fields) are
/// codecs that hold other schemas and walk them with the same [Context].
pub trait Codec: Send + Sync {
    /// Appends the encoding of `value` to `sink`.
    ///
    /// Returns the number of bytes written, which must equal [Codec::encoding_length].
    fn encode<'a>(
        &'a self,
        value: &'a Value,
        sink: &mut ChunkList,
        ctx: &mut Context<'a>,
    ) -> Result<usize, Error>;

    /// Reads one value from `tx`.
    ///
    /// Returns the value (or `None` if the field must be omitted from the enclosing record) and
    /// the number of bytes read. On [Error::NotEnoughData], the caller discards the transaction.
    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error>;

    /// Returns the number of bytes [Codec::encode] would write for `value`, without writing.
    fn encoding_length<'a>(&'a self, value: &'a Value, ctx: &mut Context<'a>)
        -> Result<usize, Error>;

    /// The value written in place of padding.
    fn zero(&self) -> Value {
        Value::Int(0)
    }

    /// The encoded length of every value, if constant.
    fn fixed_size(&self) -> Option<usize> {
        None
    }

    /// Returns true if [Codec::decode] yields no value in `ctx`.
    ///
    /// Such a field still reads and writes its bytes but never carries the field's value.
    fn skips(&self, _ctx: &Context<'_>) -> bool {
        false
    }
}

/// A size callback: computes a size from the traversal state.
pub type SizeFn = Arc<dyn Fn(&Context<'_>) -> Option<Value> + Send + Sync>;

/// How the length of a buffer, string or array is determined.
#[derive(Clone)]
pub enum Size {
    /// A constant.
    Fixed(usize),
    /// Written immediately before the payload as a number.
    Prefixed(Number),
    /// Computed from the traversal state (usually a sibling field decoded earlier).
    Dynamic(SizeFn),
    /// The payload runs until the first zero byte. Only valid for buffers and strings.
    Terminated,
}

impl Size {
    /// A size computed by `f`.
    pub fn dynamic(f: impl Fn(&Context<'_>) -> Option<Value> + Send + Sync + 'static) -> Self {
        Size::Dynamic(Arc::new(f))
    }

    /// A size read from the field `name` of the current record.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::dynamic(move |ctx| ctx.get(&name).cloned())
    }

    /// Resolves a size before decoding a payload, reading a prefix if there is one.
    ///
    /// Returns `None` for [Size::Terminated], and the number of prefix bytes read.
    pub(crate) fn decode(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &Context<'_>,
    ) -> Result<(Option<usize>, usize), Error> {
        let (size, read) = match self {
            Size::Fixed(n) => (*n, 0),
            Size::Prefixed(number) => (to_size(Some(tx.read_number(*number)?))?, number.width()),
            Size::Dynamic(f) => (to_size(f(ctx))?, 0),
            Size::Terminated => return Ok((None, 0)),
        };
        Ok((Some(ctx.config().check(size)?), read))
    }

    /// Checks `len` against the declared size before encoding a payload of that length.
    ///
    /// Writes the prefix if there is one and returns the number of bytes written.
    pub(crate) fn encode(
        &self,
        len: usize,
        sink: &mut ChunkList,
        ctx: &Context<'_>,
    ) -> Result<usize, Error> {
        self.check(len, ctx)?;
        match self {
            Size::Prefixed(number) => sink.write_number(*number, &size_value(len)?),
            _ => Ok(0),
        }
    }

    /// Checks `len` against the declared size, returning the bytes taken by the size itself.
    pub(crate) fn check(&self, len: usize, ctx: &Context<'_>) -> Result<usize, Error> {
        match self {
            Size::Fixed(n) => expect(*n, len).map(|_| 0),
            Size::Prefixed(number) => {
                number.check(&size_value(len)?)?;
                Ok(number.width())
            }
            Size::Dynamic(f) => expect(to_size(f(ctx))?, len).map(|_| 0),
            Size::Terminated => Ok(0),
        }
    }
}

impl From<usize> for Size {
    fn from(n: usize) -> Self {
        Size::Fixed(n)
    }
}

impl From<Number> for Size {
    fn from(number: Number) -> Self {
        Size::Prefixed(number)
    }
}

impl From<NumberCodec> for Size {
    fn from(codec: NumberCodec) -> Self {
        Size::Prefixed(codec.number())
    }
}

impl fmt::Debug for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Fixed(n) => f.debug_tuple("Fixed").field(n).finish(),
            Size::Prefixed(number) => f.debug_tuple("Prefixed").field(number).finish(),
            Size::Dynamic(_) => f.write_str("Dynamic"),
            Size::Terminated => f.write_str("Terminated"),
        }
    }
}

/// Converts a resolved size to `usize`.
pub(crate) fn to_size(value: Option<Value>) -> Result<usize, Error> {
    match value {
        Some(value) => value.as_size().ok_or_else(|| Error::TypeMismatch {
            expected: "size",
            found: format!("{value:?}"),
        }),
        None => Err(Error::TypeMismatch {
            expected: "size",
            found: "nothing".to_owned(),
        }),
    }
}

fn size_value(len: usize) -> Result<Value, Error> {
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| Error::InvalidValue("size", format!("{len} is too large")))
}

fn expect(expected: usize, found: usize) -> Result<(), Error> {
    if expected != found {
        return Err(Error::SizeMismatch { expected, found });
    }
    Ok(())
}

/// What the size of an array counts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SizeKind {
    /// The number of items.
    #[default]
    Count,
    /// The number of encoded bytes of all items together.
    Bytes,
}

/// Predicate deciding whether a conditional field is present.
#[derive(Clone)]
pub enum Condition {
    Const(bool),
    Fn(Arc<dyn Fn(&Context<'_>) -> bool + Send + Sync>),
}

impl Condition {
    pub fn new(f: impl Fn(&Context<'_>) -> bool + Send + Sync + 'static) -> Self {
        Condition::Fn(Arc::new(f))
    }

    /// Holds when the field `name` of the current record is truthy.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |ctx| ctx.get(&name).is_some_and(Value::is_truthy))
    }

    /// Holds when the field `name` of the current record equals `value`.
    pub fn field_eq(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        Self::new(move |ctx| ctx.get(&name) == Some(&value))
    }

    pub fn eval(&self, ctx: &Context<'_>) -> bool {
        match self {
            Condition::Const(b) => *b,
            Condition::Fn(f) => f(ctx),
        }
    }
}

impl From<bool> for Condition {
    fn from(b: bool) -> Self {
        Condition::Const(b)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Const(b) => f.debug_tuple("Const").field(b).finish(),
            Condition::Fn(_) => f.write_str("Fn"),
        }
    }
}

/// Character encoding of a string codec.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Encoding {
    /// 7-bit ASCII. The high bit is ignored on decode; encode keeps the low byte of each char.
    #[default]
    Ascii,
    /// ISO-8859-1: one byte per char.
    Latin1,
    /// Strict UTF-8.
    Utf8,
    /// UTF-16, little-endian.
    Utf16Le,
}

impl Encoding {
    /// Decodes `bytes` into a string.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, Error> {
        match self {
            Encoding::Ascii => Ok(bytes.iter().map(|&b| char::from(b & 0x7F)).collect()),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| Error::InvalidData("utf8", e.to_string())),
            Encoding::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(Error::InvalidData(
                        "utf16le",
                        format!("odd byte length {}", bytes.len()),
                    ));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|e| Error::InvalidData("utf16le", e.to_string()))
            }
        }
    }

    /// Encodes `s` into bytes.
    pub fn encode(&self, s: &str) -> Vec<u8> {
        match self {
            Encoding::Ascii | Encoding::Latin1 => s.chars().map(|c| c as u32 as u8).collect(),
            Encoding::Utf8 => s.as_bytes().to_vec(),
            Encoding::Utf16Le => s.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }

    /// The number of bytes [Encoding::encode] produces for `s`.
    pub fn byte_len(&self, s: &str) -> usize {
        match self {
            Encoding::Ascii | Encoding::Latin1 => s.chars().count(),
            Encoding::Utf8 => s.len(),
            Encoding::Utf16Le => s.encode_utf16().count() * 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Record};
    use std::borrow::Cow;
    use test_case::test_case;

    #[test_case(Encoding::Ascii, "hello", b"hello"; "ascii")]
    #[test_case(Encoding::Latin1, "caf\u{e9}", b"caf\xe9"; "latin1")]
    #[test_case(Encoding::Utf8, "caf\u{e9}", b"caf\xc3\xa9"; "utf8")]
    #[test_case(Encoding::Utf16Le, "hi", b"h\0i\0"; "utf16le")]
    fn test_encoding(encoding: Encoding, s: &str, bytes: &[u8]) {
        assert_eq!(encoding.encode(s), bytes);
        assert_eq!(encoding.byte_len(s), bytes.len());
        assert_eq!(encoding.decode(bytes).unwrap(), s);
    }

    #[test]
    fn test_ascii_masks_high_bit() {
        assert_eq!(Encoding::Ascii.decode(&[0xE8, 0x69]).unwrap(), "hi");
    }

    #[test]
    fn test_invalid_encodings() {
        assert!(matches!(
            Encoding::Utf8.decode(&[0xFF, 0xFE]),
            Err(Error::InvalidData("utf8", _))
        ));
        assert!(matches!(
            Encoding::Utf16Le.decode(&[0x68]),
            Err(Error::InvalidData("utf16le", _))
        ));
    }

    #[test]
    fn test_size_check() {
        let ctx = Context::new(Config::default());
        assert_eq!(Size::Fixed(3).check(3, &ctx), Ok(0));
        assert_eq!(
            Size::Fixed(3).check(4, &ctx),
            Err(Error::SizeMismatch {
                expected: 3,
                found: 4
            })
        );
        assert_eq!(Size::Prefixed(Number::U16_BE).check(300, &ctx), Ok(2));
        assert!(matches!(
            Size::Prefixed(Number::U8).check(300, &ctx),
            Err(Error::InvalidValue(..))
        ));
        assert_eq!(Size::Terminated.check(100, &ctx), Ok(0));
    }

    #[test]
    fn test_dynamic_size() {
        let record = Record::from([("len", Value::Int(2)), ("name", Value::from("x"))]);
        let mut ctx = Context::new(Config::default());
        ctx.push(Cow::Borrowed(&record));

        assert_eq!(Size::field("len").check(2, &ctx), Ok(0));
        assert!(matches!(
            Size::field("name").check(2, &ctx),
            Err(Error::TypeMismatch {
                expected: "size",
                ..
            })
        ));
        assert!(matches!(
            Size::field("missing").check(2, &ctx),
            Err(Error::TypeMismatch {
                expected: "size",
                ..
            })
        ));
    }

    #[test]
    fn test_conditions() {
        let record = Record::from([("flag", Value::Int(1)), ("kind", Value::Int(7))]);
        let mut ctx = Context::new(Config::default());
        assert!(!Condition::field("flag").eval(&ctx));

        ctx.push(Cow::Borrowed(&record));
        assert!(Condition::from(true).eval(&ctx));
        assert!(!Condition::from(false).eval(&ctx));
        assert!(Condition::field("flag").eval(&ctx));
        assert!(Condition::field_eq("kind", 7u8).eval(&ctx));
        assert!(!Condition::field_eq("kind", 8u8).eval(&ctx));
        assert!(Condition::new(|ctx| ctx.depth() == 1).eval(&ctx));
    }
}

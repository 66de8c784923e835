//! Codecs for raw byte buffers and strings.
//!
//! Both share the four [Size] strategies: a fixed length, a numeric length prefix, a length
//! computed from the traversal state, or a zero terminator.

use crate::{ChunkList, Codec, Context, Encoding, Error, Number, Size, Transaction, Value};
use bytes::Bytes;

/// Rejects a terminated payload that contains its own terminator.
fn check_terminated(size: &Size, payload: &[u8]) -> Result<(), Error> {
    if matches!(size, Size::Terminated) && payload.contains(&0) {
        return Err(Error::InvalidValue(
            "terminated payload",
            "contains a zero byte".into(),
        ));
    }
    Ok(())
}

/// Writes the size (if any), `payload` and terminator (if any).
fn encode_payload(
    size: &Size,
    payload: Bytes,
    sink: &mut ChunkList,
    ctx: &Context<'_>,
) -> Result<usize, Error> {
    check_terminated(size, &payload)?;
    let mut bytes = size.encode(payload.len(), sink, ctx)?;
    bytes += sink.write_buffer(payload);
    if matches!(size, Size::Terminated) {
        bytes += sink.write_number(Number::U8, &Value::Int(0))?;
    }
    Ok(bytes)
}

/// Reads the size (if any), payload and terminator (if any).
fn decode_payload(
    size: &Size,
    tx: &mut Transaction<'_>,
    ctx: &Context<'_>,
) -> Result<(Bytes, usize), Error> {
    let (len, prefix) = size.decode(tx, ctx)?;
    if let Some(len) = len {
        let payload = tx.read_buffer(len)?;
        return Ok((payload, prefix + len));
    }

    let Some(len) = tx.index_of(0, 0) else {
        return Err(Error::NotEnoughData {
            requested: tx.len() + 1,
            available: tx.len(),
        });
    };
    ctx.config().check(len)?;
    let mut payload = tx.read_buffer(len + 1)?;
    payload.truncate(len);
    Ok((payload, len + 1))
}

/// Length of an encoded payload of `len` bytes.
fn payload_length(size: &Size, len: usize, ctx: &Context<'_>) -> Result<usize, Error> {
    if let Size::Fixed(n) = size {
        return Ok(*n);
    }
    let overhead = size.check(len, ctx)?;
    let terminator = matches!(size, Size::Terminated) as usize;
    Ok(overhead + len + terminator)
}

/// A codec for [Value::Bytes].
#[derive(Clone, Debug)]
pub struct BufferCodec {
    size: Size,
}

/// A byte buffer whose length is given by `size`.
pub fn buffer(size: impl Into<Size>) -> BufferCodec {
    BufferCodec { size: size.into() }
}

fn expect_bytes(value: &Value) -> Result<&Bytes, Error> {
    value.as_bytes().ok_or_else(|| Error::TypeMismatch {
        expected: "bytes",
        found: value.kind().to_owned(),
    })
}

impl Codec for BufferCodec {
    fn encode<'a>(
        &'a self,
        value: &'a Value,
        sink: &mut ChunkList,
        ctx: &mut Context<'a>,
    ) -> Result<usize, Error> {
        let payload = expect_bytes(value)?.clone();
        encode_payload(&self.size, payload, sink, ctx)
    }

    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error> {
        let (payload, bytes) = decode_payload(&self.size, tx, ctx)?;
        Ok((Some(Value::Bytes(payload)), bytes))
    }

    fn encoding_length<'a>(&'a self, value: &'a Value, ctx: &mut Context<'a>) -> Result<usize, Error> {
        let payload = expect_bytes(value)?;
        check_terminated(&self.size, payload)?;
        payload_length(&self.size, payload.len(), ctx)
    }

    fn zero(&self) -> Value {
        match self.size {
            Size::Fixed(n) => Value::Bytes(Bytes::from(vec![0; n])),
            _ => Value::Bytes(Bytes::new()),
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        match self.size {
            Size::Fixed(n) => Some(n),
            _ => None,
        }
    }
}

/// A codec for [Value::String].
#[derive(Clone, Debug)]
pub struct StringCodec {
    size: Size,
    encoding: Encoding,
}

/// A string whose encoded length in bytes is given by `size`.
pub fn string(size: impl Into<Size>, encoding: Encoding) -> StringCodec {
    StringCodec {
        size: size.into(),
        encoding,
    }
}

/// A zero-terminated ASCII string.
pub fn cstring() -> StringCodec {
    string(Size::Terminated, Encoding::Ascii)
}

fn expect_str(value: &Value) -> Result<&str, Error> {
    value.as_str().ok_or_else(|| Error::TypeMismatch {
        expected: "string",
        found: value.kind().to_owned(),
    })
}

impl Codec for StringCodec {
    fn encode<'a>(
        &'a self,
        value: &'a Value,
        sink: &mut ChunkList,
        ctx: &mut Context<'a>,
    ) -> Result<usize, Error> {
        let payload = self.encoding.encode(expect_str(value)?);
        encode_payload(&self.size, Bytes::from(payload), sink, ctx)
    }

    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error> {
        let (payload, bytes) = decode_payload(&self.size, tx, ctx)?;
        let s = self.encoding.decode(&payload)?;
        Ok((Some(Value::String(s)), bytes))
    }

    fn encoding_length<'a>(&'a self, value: &'a Value, ctx: &mut Context<'a>) -> Result<usize, Error> {
        let s = expect_str(value)?;
        if matches!(self.size, Size::Terminated) {
            check_terminated(&self.size, &self.encoding.encode(s))?;
        }
        payload_length(&self.size, self.encoding.byte_len(s), ctx)
    }

    fn zero(&self) -> Value {
        let len = match (&self.size, self.encoding) {
            (Size::Fixed(n), Encoding::Utf16Le) => n / 2,
            (Size::Fixed(n), _) => *n,
            _ => 0,
        };
        Value::String("\0".repeat(len))
    }

    fn fixed_size(&self) -> Option<usize> {
        match self.size {
            Size::Fixed(n) => Some(n),
            _ => None,
        }
    }
}

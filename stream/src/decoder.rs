use crate::Error;
use bytes::Bytes;
use tracing::{debug, trace};
use wireform_codec::{decode_from_cfg, ChunkList, Config, Schema, Transaction, Value};

/// Decodes a sequence of values from fragmented input.
///
/// Inbound fragments are appended to a [ChunkList] without copying. Each decode attempt runs in
/// its own [Transaction], so input is only consumed once a whole value has been read.
pub struct Decoder {
    schema: Schema,
    config: Config,
    buffer: ChunkList,
}

impl Decoder {
    /// Creates a decoder for values of `schema` with the default [Config].
    pub fn new(schema: Schema) -> Self {
        Self::with_config(schema, Config::default())
    }

    /// Creates a decoder that rejects any size outside of `config`.
    pub fn with_config(schema: Schema, config: Config) -> Self {
        Self {
            schema,
            config,
            buffer: ChunkList::new(),
        }
    }

    /// Appends `fragment` without decoding anything.
    pub fn push(&mut self, fragment: impl Into<Bytes>) {
        let fragment = fragment.into();
        trace!(len = fragment.len(), buffered = self.buffer.len(), "appending fragment");
        self.buffer.append(fragment);
    }

    /// Appends `fragment` and returns every value that is now complete, in order.
    ///
    /// Trailing bytes of an incomplete value are kept for the next call. Any error other than
    /// running out of input is fatal: the bytes of the failing value are left untouched, but
    /// the stream can no longer be resynchronized. Values completed earlier in the same call
    /// are dropped with the error; use [Decoder::push] and [Decoder::next_value] to keep them.
    pub fn feed(&mut self, fragment: impl Into<Bytes>) -> Result<Vec<Value>, Error> {
        self.push(fragment);

        let mut values = Vec::new();
        while let Some(value) = self.next_value()? {
            values.push(value);
        }
        Ok(values)
    }

    /// Decodes the next value from buffered input, if it is complete.
    pub fn next_value(&mut self) -> Result<Option<Value>, Error> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let mut tx = Transaction::new(&mut self.buffer);
        let (value, read) = match decode_from_cfg(&mut tx, &self.schema, &self.config) {
            Ok(decoded) => decoded,
            Err(err) if err.is_not_enough_data() => {
                trace!(?err, "waiting for more data");
                return Ok(None);
            }
            Err(err) => {
                debug!(?err, "failed to decode value");
                return Err(err.into());
            }
        };

        // A value that reads nothing would be emitted forever
        if read == 0 {
            debug!(buffered = tx.len(), "decode made no progress");
            return Err(Error::Stalled);
        }
        tx.commit()?;
        debug!(read, buffered = self.buffer.len(), "decoded value");
        Ok(Some(value))
    }

    /// Number of bytes received but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireform_codec::{
        types::{cstring, uint16be, uint8, when},
        Error as CodecError,
    };

    #[test]
    fn test_byte_at_a_time() {
        let mut decoder = Decoder::new(Schema::from(uint16be()));
        let mut values = Vec::new();
        for byte in [0x00, 0x01, 0x00, 0x02, 0x00] {
            values.extend(decoder.feed(vec![byte]).unwrap());
        }
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(decoder.buffered(), 1);
    }

    #[test]
    fn test_many_values_in_one_fragment() {
        let mut decoder = Decoder::new(Schema::from(cstring()));
        let values = decoder.feed(&b"a\0bc\0d"[..]).unwrap();
        assert_eq!(values, vec![Value::from("a"), Value::from("bc")]);
        assert_eq!(decoder.buffered(), 1);
        assert_eq!(decoder.next_value(), Ok(None));
    }

    #[test]
    fn test_empty_fragment() {
        let mut decoder = Decoder::new(Schema::from(uint8()));
        assert_eq!(decoder.feed(Bytes::new()), Ok(Vec::new()));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_stalled() {
        let mut decoder = Decoder::new(Schema::from(when(false, uint8())));
        assert_eq!(decoder.feed(vec![1]), Err(Error::Stalled));
        assert_eq!(decoder.buffered(), 1);
    }

    #[test]
    fn test_fatal_error_keeps_input() {
        let schema = wireform_codec::schema! {
            "len" => uint8(),
            "name" => wireform_codec::types::string(
                wireform_codec::Size::field("len"),
                wireform_codec::Encoding::Utf8,
            ),
        }
        .unwrap();
        let mut decoder = Decoder::new(schema);
        let err = decoder.feed(vec![2, 0xC3, 0x28]).unwrap_err();
        assert!(matches!(
            err,
            Error::Codec(CodecError::InvalidData("utf8", _))
        ));
        assert_eq!(decoder.buffered(), 3);
    }
}

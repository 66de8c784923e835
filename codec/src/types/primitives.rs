//! Codecs for fixed-width numbers and booleans.
//!
//! Integers of 8 to 48 bits are available signed and unsigned, and every multi-byte format comes
//! in a big-endian (`be`) and a little-endian (`le`) flavor. Each codec always occupies exactly
//! [Number::width] bytes.

use crate::{ChunkList, Codec, Context, Endian, Error, Number, Transaction, Value};
use paste::paste;

/// A codec for one [Number] format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NumberCodec(Number);

impl NumberCodec {
    pub const fn new(number: Number) -> Self {
        Self(number)
    }

    pub const fn number(&self) -> Number {
        self.0
    }
}

impl From<NumberCodec> for Number {
    fn from(codec: NumberCodec) -> Self {
        codec.0
    }
}

impl Codec for NumberCodec {
    fn encode<'a>(
        &'a self,
        value: &'a Value,
        sink: &mut ChunkList,
        _: &mut Context<'a>,
    ) -> Result<usize, Error> {
        sink.write_number(self.0, value)
    }

    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        _: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error> {
        let value = tx.read_number(self.0)?;
        Ok((Some(value), self.0.width()))
    }

    fn encoding_length<'a>(&'a self, value: &'a Value, _: &mut Context<'a>) -> Result<usize, Error> {
        self.0.check(value)?;
        Ok(self.0.width())
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.0.width())
    }
}

macro_rules! number_codecs {
    ($($bits:literal),*) => {
        paste! {
            $(
                #[doc = concat!("Signed ", $bits, "-bit integer, big-endian.")]
                pub const fn [<int $bits be>]() -> NumberCodec {
                    NumberCodec(Number::[<I $bits _BE>])
                }

                #[doc = concat!("Signed ", $bits, "-bit integer, little-endian.")]
                pub const fn [<int $bits le>]() -> NumberCodec {
                    NumberCodec(Number::[<I $bits _LE>])
                }

                #[doc = concat!("Unsigned ", $bits, "-bit integer, big-endian.")]
                pub const fn [<uint $bits be>]() -> NumberCodec {
                    NumberCodec(Number::[<U $bits _BE>])
                }

                #[doc = concat!("Unsigned ", $bits, "-bit integer, little-endian.")]
                pub const fn [<uint $bits le>]() -> NumberCodec {
                    NumberCodec(Number::[<U $bits _LE>])
                }
            )*
        }
    };
}

number_codecs!(16, 24, 32, 40, 48);

/// Signed 8-bit integer.
pub const fn int8() -> NumberCodec {
    NumberCodec(Number::I8)
}

/// Unsigned 8-bit integer.
pub const fn uint8() -> NumberCodec {
    NumberCodec(Number::U8)
}

/// IEEE-754 single precision, big-endian.
pub const fn floatbe() -> NumberCodec {
    NumberCodec(Number::F32_BE)
}

/// IEEE-754 single precision, little-endian.
pub const fn floatle() -> NumberCodec {
    NumberCodec(Number::F32_LE)
}

/// IEEE-754 double precision, big-endian.
pub const fn doublebe() -> NumberCodec {
    NumberCodec(Number::F64_BE)
}

/// IEEE-754 double precision, little-endian.
pub const fn doublele() -> NumberCodec {
    NumberCodec(Number::F64_LE)
}

/// An integer of any width between 1 and 6 bytes.
pub fn int(width: usize, signed: bool, endian: Endian) -> Result<NumberCodec, Error> {
    Number::int(width, signed, endian).map(NumberCodec)
}

/// A boolean stored as a number: `1`/`0` on encode, any nonzero value is `true` on decode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BoolCodec {
    number: Number,
}

/// A boolean stored in the format of `codec`.
pub fn boolean(codec: impl Into<Number>) -> BoolCodec {
    BoolCodec {
        number: codec.into(),
    }
}

impl BoolCodec {
    fn as_int(value: &Value) -> Result<Value, Error> {
        match value {
            Value::Bool(b) => Ok(Value::Int(*b as i64)),
            other => Err(Error::TypeMismatch {
                expected: "bool",
                found: other.kind().to_owned(),
            }),
        }
    }
}

impl Codec for BoolCodec {
    fn encode<'a>(
        &'a self,
        value: &'a Value,
        sink: &mut ChunkList,
        _: &mut Context<'a>,
    ) -> Result<usize, Error> {
        sink.write_number(self.number, &Self::as_int(value)?)
    }

    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        _: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error> {
        let value = tx.read_number(self.number)?;
        Ok((Some(Value::Bool(value.is_truthy())), self.number.width()))
    }

    fn encoding_length<'a>(&'a self, value: &'a Value, _: &mut Context<'a>) -> Result<usize, Error> {
        Self::as_int(value)?;
        Ok(self.number.width())
    }

    fn zero(&self) -> Value {
        Value::Bool(false)
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.number.width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, encode, encoding_length, Schema};
    use bytes::Bytes;

    fn round_trip(schema: impl Into<Schema>, value: Value, expected: &[u8]) {
        let schema = schema.into();
        let (list, written) = encode(&value, &schema).unwrap();
        assert_eq!(list.slice(..), expected);
        assert_eq!(written, expected.len());
        assert_eq!(encoding_length(&value, &schema), Ok(expected.len()));
        assert_eq!(schema.fixed_size(), Some(expected.len()));

        let (decoded, read) = decode(Bytes::copy_from_slice(expected), &schema).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(read, expected.len());
    }

    macro_rules! test_int_codecs {
        ($($bits:literal),*) => {
            paste! {
                $(
                    #[test]
                    fn [<test_int $bits>]() {
                        let width = $bits / 8;
                        let max = (1i64 << $bits) - 1;
                        let mut be = vec![0xFF; width];
                        be[width - 1] = 0xFE;
                        let mut le = be.clone();
                        le.reverse();

                        round_trip([<uint $bits be>](), Value::Int(max - 1), &be);
                        round_trip([<uint $bits le>](), Value::Int(max - 1), &le);
                        round_trip([<int $bits be>](), Value::Int(-2), &be);
                        round_trip([<int $bits le>](), Value::Int(-2), &le);
                    }
                )*
            }
        };
    }

    test_int_codecs!(16, 24, 32, 40, 48);

    #[test]
    fn test_int8() {
        round_trip(uint8(), Value::Int(254), &[0xFE]);
        round_trip(int8(), Value::Int(-2), &[0xFE]);
        round_trip(int8(), Value::Int(127), &[0x7F]);
    }

    #[test]
    fn test_uint32be_conformity() {
        round_trip(uint32be(), Value::Int(4294967294), &[0xFF, 0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn test_floats() {
        round_trip(floatbe(), Value::Float(1.5), &[0x3F, 0xC0, 0x00, 0x00]);
        round_trip(floatle(), Value::Float(1.5), &[0x00, 0x00, 0xC0, 0x3F]);
        round_trip(
            doublebe(),
            Value::Float(-2.0),
            &[0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        );
        round_trip(
            doublele(),
            Value::Float(-2.0),
            &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0],
        );
    }

    #[test]
    fn test_custom_int() {
        let codec = int(3, false, Endian::Little).unwrap();
        assert_eq!(codec, uint24le());
        round_trip(codec, Value::Int(0x010203), &[0x03, 0x02, 0x01]);
        assert!(int(8, false, Endian::Big).is_err());
    }

    #[test]
    fn test_out_of_range() {
        let schema = Schema::from(uint16be());
        assert!(matches!(
            encode(&Value::Int(65536), &schema),
            Err(Error::InvalidValue(..))
        ));
        assert!(matches!(
            encoding_length(&Value::Int(-1), &schema),
            Err(Error::InvalidValue(..))
        ));
        assert!(matches!(
            encode(&Value::from("1"), &schema),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_not_enough_data() {
        let schema = Schema::from(uint32le());
        assert_eq!(
            decode(Bytes::from_static(&[1, 2, 3]), &schema),
            Err(Error::NotEnoughData {
                requested: 4,
                available: 3
            })
        );
    }

    #[test]
    fn test_bool() {
        round_trip(boolean(uint8()), Value::Bool(true), &[0x01]);
        round_trip(boolean(uint16le()), Value::Bool(false), &[0x00, 0x00]);

        // Any nonzero value decodes as true
        let schema = Schema::from(boolean(uint8()));
        assert_eq!(
            decode(Bytes::from_static(&[0x2A]), &schema),
            Ok((Value::Bool(true), 1))
        );
        assert!(matches!(
            encode(&Value::Int(1), &schema),
            Err(Error::TypeMismatch {
                expected: "bool",
                ..
            })
        ));
    }
}

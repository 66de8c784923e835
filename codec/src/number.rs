//! Fixed-width numeric formats shared by the chunk list, transactions and number codecs.
//!
//! A [Number] names one wire format: an integer of 1 to 6 bytes (signed or unsigned) or an
//! IEEE-754 float/double, in big- or little-endian byte order. Integers are two's complement and
//! always surface as [Value::Int]; floats surface as [Value::Float].

use crate::{Error, Value};
use bytes::{Buf, BufMut};

/// Widest supported integer in bytes. Wider values would not round-trip through [Value::Int]
/// for every unsigned input.
pub const MAX_INT_WIDTH: usize = 6;

/// Byte order of a multi-byte number.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Endian {
    Big,
    Little,
}

/// Layout of a number, independent of byte order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Format {
    Int { width: usize, signed: bool },
    Float,
    Double,
}

/// A fixed-width number format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Number {
    format: Format,
    endian: Endian,
}

macro_rules! number_consts {
    ($($name:ident => $format:expr, $endian:expr;)*) => {
        impl Number {
            $(
                pub const $name: Number = Number { format: $format, endian: $endian };
            )*
        }
    };
}

const fn int(width: usize, signed: bool) -> Format {
    Format::Int { width, signed }
}

number_consts! {
    I8 => int(1, true), Endian::Big;
    U8 => int(1, false), Endian::Big;
    I16_BE => int(2, true), Endian::Big;
    U16_BE => int(2, false), Endian::Big;
    I16_LE => int(2, true), Endian::Little;
    U16_LE => int(2, false), Endian::Little;
    I24_BE => int(3, true), Endian::Big;
    U24_BE => int(3, false), Endian::Big;
    I24_LE => int(3, true), Endian::Little;
    U24_LE => int(3, false), Endian::Little;
    I32_BE => int(4, true), Endian::Big;
    U32_BE => int(4, false), Endian::Big;
    I32_LE => int(4, true), Endian::Little;
    U32_LE => int(4, false), Endian::Little;
    I40_BE => int(5, true), Endian::Big;
    U40_BE => int(5, false), Endian::Big;
    I40_LE => int(5, true), Endian::Little;
    U40_LE => int(5, false), Endian::Little;
    I48_BE => int(6, true), Endian::Big;
    U48_BE => int(6, false), Endian::Big;
    I48_LE => int(6, true), Endian::Little;
    U48_LE => int(6, false), Endian::Little;
    F32_BE => Format::Float, Endian::Big;
    F32_LE => Format::Float, Endian::Little;
    F64_BE => Format::Double, Endian::Big;
    F64_LE => Format::Double, Endian::Little;
}

impl Number {
    /// An integer format of `width` bytes.
    pub fn int(width: usize, signed: bool, endian: Endian) -> Result<Self, Error> {
        if width == 0 || width > MAX_INT_WIDTH {
            return Err(Error::InvalidSchema(format!(
                "integer width must be between 1 and {MAX_INT_WIDTH} bytes, got {width}"
            )));
        }
        Ok(Self {
            format: int(width, signed),
            endian,
        })
    }

    pub const fn format(&self) -> Format {
        self.format
    }

    pub const fn endian(&self) -> Endian {
        self.endian
    }

    /// The number of bytes occupied on the wire.
    pub const fn width(&self) -> usize {
        match self.format {
            Format::Int { width, .. } => width,
            Format::Float => 4,
            Format::Double => 8,
        }
    }

    /// The inclusive range of integers representable by this format.
    pub fn int_range(&self) -> Option<(i64, i64)> {
        let Format::Int { width, signed } = self.format else {
            return None;
        };
        let bits = (width * 8) as u32;
        if signed {
            let half = 1i64 << (bits - 1);
            Some((-half, half - 1))
        } else {
            Some((0, (1i64 << bits) - 1))
        }
    }

    /// Reads one number from `buf`.
    ///
    /// The caller must ensure at least [Number::width] bytes remain; [Buf] panics otherwise.
    pub fn read(&self, buf: &mut impl Buf) -> Value {
        match (self.format, self.endian) {
            (Format::Int { width, signed }, endian) => {
                let raw = match endian {
                    Endian::Big => buf.get_uint(width),
                    Endian::Little => buf.get_uint_le(width),
                };
                if signed {
                    Value::Int(sign_extend(raw, width))
                } else {
                    Value::Int(raw as i64)
                }
            }
            (Format::Float, Endian::Big) => Value::Float(buf.get_f32() as f64),
            (Format::Float, Endian::Little) => Value::Float(buf.get_f32_le() as f64),
            (Format::Double, Endian::Big) => Value::Float(buf.get_f64()),
            (Format::Double, Endian::Little) => Value::Float(buf.get_f64_le()),
        }
    }

    /// Checks that `value` can be written in this format.
    pub fn check(&self, value: &Value) -> Result<(), Error> {
        match self.format {
            Format::Int { .. } => {
                let v = value.as_int().ok_or_else(|| Error::TypeMismatch {
                    expected: "int",
                    found: value.kind().to_owned(),
                })?;
                let (min, max) = self.int_range().unwrap_or((i64::MIN, i64::MAX));
                if v < min || v > max {
                    return Err(Error::InvalidValue(
                        "number",
                        format!("{v} does not fit in [{min}, {max}]"),
                    ));
                }
                Ok(())
            }
            Format::Float | Format::Double => match value.as_float() {
                Some(_) => Ok(()),
                None => Err(Error::TypeMismatch {
                    expected: "float",
                    found: value.kind().to_owned(),
                }),
            },
        }
    }

    /// Writes `value` to `buf` in this format.
    pub fn write(&self, value: &Value, buf: &mut impl BufMut) -> Result<(), Error> {
        self.check(value)?;
        match (self.format, self.endian) {
            (Format::Int { width, .. }, endian) => {
                // Range was checked above, so the low `width` bytes carry the whole value.
                let raw = value.as_int().unwrap_or_default() as u64;
                match endian {
                    Endian::Big => buf.put_uint(raw, width),
                    Endian::Little => buf.put_uint_le(raw, width),
                }
            }
            (Format::Float, endian) => {
                let v = value.as_float().unwrap_or_default() as f32;
                match endian {
                    Endian::Big => buf.put_f32(v),
                    Endian::Little => buf.put_f32_le(v),
                }
            }
            (Format::Double, endian) => {
                let v = value.as_float().unwrap_or_default();
                match endian {
                    Endian::Big => buf.put_f64(v),
                    Endian::Little => buf.put_f64_le(v),
                }
            }
        }
        Ok(())
    }
}

fn sign_extend(raw: u64, width: usize) -> i64 {
    let shift = 64 - (width as u32) * 8;
    ((raw << shift) as i64) >> shift
}

/// Returns an error if `buf` holds fewer than `len` bytes.
#[inline]
pub(crate) fn at_least(buf: &impl Buf, len: usize) -> Result<(), Error> {
    let available = buf.remaining();
    if available < len {
        return Err(Error::NotEnoughData {
            requested: len,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use test_case::test_case;

    fn write(number: Number, value: impl Into<Value>) -> Vec<u8> {
        let mut buf = BytesMut::new();
        number.write(&value.into(), &mut buf).unwrap();
        buf.to_vec()
    }

    #[test_case(Number::U32_BE, 4294967294, &[0xFF, 0xFF, 0xFF, 0xFE]; "u32 be")]
    #[test_case(Number::U32_LE, 0x01020304, &[0x04, 0x03, 0x02, 0x01]; "u32 le")]
    #[test_case(Number::I16_BE, -2, &[0xFF, 0xFE]; "i16 be")]
    #[test_case(Number::I24_LE, -1, &[0xFF, 0xFF, 0xFF]; "i24 le")]
    #[test_case(Number::U24_BE, 0x010203, &[0x01, 0x02, 0x03]; "u24 be")]
    #[test_case(Number::I40_BE, -0x0102030405, &[0xFE, 0xFD, 0xFC, 0xFB, 0xFB]; "i40 be")]
    #[test_case(Number::U48_LE, 0x010203040506, &[0x06, 0x05, 0x04, 0x03, 0x02, 0x01]; "u48 le")]
    fn test_int_conformity(number: Number, value: i64, expected: &[u8]) {
        let encoded = write(number, value);
        assert_eq!(encoded, expected);
        assert_eq!(encoded.len(), number.width());
        assert_eq!(number.read(&mut &encoded[..]), Value::Int(value));
    }

    #[test]
    fn test_float_conformity() {
        assert_eq!(write(Number::F32_BE, 1.0f32), [0x3F, 0x80, 0x00, 0x00]);
        assert_eq!(write(Number::F32_LE, 1.0f32), [0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(
            write(Number::F64_BE, -1.0f64),
            [0xBF, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Number::F64_LE.read(&mut &(2.5f64).to_le_bytes()[..]),
            Value::Float(2.5)
        );

        // Integers widen into float formats
        assert_eq!(write(Number::F32_BE, 1i64), [0x3F, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn test_int_range() {
        assert_eq!(Number::U8.int_range(), Some((0, 255)));
        assert_eq!(Number::I8.int_range(), Some((-128, 127)));
        assert_eq!(Number::U48_BE.int_range(), Some((0, (1 << 48) - 1)));
        assert_eq!(Number::F32_BE.int_range(), None);
    }

    #[test]
    fn test_out_of_range() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Number::U8.write(&Value::Int(256), &mut buf),
            Err(Error::InvalidValue(..))
        ));
        assert!(matches!(
            Number::U16_BE.write(&Value::Int(-1), &mut buf),
            Err(Error::InvalidValue(..))
        ));
        assert!(matches!(
            Number::I8.write(&Value::from("1"), &mut buf),
            Err(Error::TypeMismatch { expected: "int", .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_custom_width() {
        let number = Number::int(3, true, Endian::Big).unwrap();
        assert_eq!(number, Number::I24_BE);
        assert!(matches!(
            Number::int(7, false, Endian::Big),
            Err(Error::InvalidSchema(_))
        ));
        assert!(Number::int(0, false, Endian::Big).is_err());
    }

    #[test]
    fn test_at_least() {
        let buf = &[1u8, 2][..];
        assert!(at_least(&buf, 2).is_ok());
        assert_eq!(
            at_least(&buf, 3),
            Err(Error::NotEnoughData {
                requested: 3,
                available: 2
            })
        );
    }
}

//! Dynamic values produced by decoding and consumed by encoding.

use bytes::Bytes;

/// A value described by a schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// The absence of a value (e.g. a `select` with no matching arm).
    #[default]
    Null,
    Bool(bool),
    /// Any integer up to 48 bits wide, signed or not.
    Int(i64),
    Float(f64),
    Bytes(Bytes),
    String(String),
    Array(Vec<Value>),
    Record(Record),
}

pub(crate) static NULL: Value = Value::Null;

/// The largest float whose integer part is exact.
const MAX_EXACT_FLOAT: f64 = (1u64 << 53) as f64;

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Interprets the value as a size: a non-negative integer, or a float holding one.
    pub fn as_size(&self) -> Option<usize> {
        match self {
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 => {
                (*f <= MAX_EXACT_FLOAT).then(|| *f as usize)
            }
            _ => self.as_int().and_then(|i| usize::try_from(i).ok()),
        }
    }

    /// Truthiness: nonzero numbers, `true`, and any non-null container are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Bytes(_) | Value::Array(_) | Value::Record(_) => true,
        }
    }
}

macro_rules! impl_from_int {
    ($($type:ty),*) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Value::Int(v as i64)
                }
            }
        )*
    };
}
impl_from_int!(u8, u16, u32, i8, i16, i32, i64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<&'static [u8]> for Value {
    fn from(v: &'static [u8]) -> Self {
        Value::Bytes(Bytes::from_static(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

/// Fields of a record, kept in insertion order.
///
/// Decoding inserts fields in schema order, so iteration order matches the wire layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets `name` to `value`, returning the previous value if the field existed.
    ///
    /// A replaced field keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(key, _)| key == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Record {
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_size() {
        assert_eq!(Value::Int(3).as_size(), Some(3));
        assert_eq!(Value::Int(-1).as_size(), None);
        assert_eq!(Value::Float(3.0).as_size(), Some(3));
        assert_eq!(Value::Float(0.0).as_size(), Some(0));
        assert_eq!(Value::Float(2.5).as_size(), None);
        assert_eq!(Value::Float(-1.0).as_size(), None);
        assert_eq!(Value::Float(f64::NAN).as_size(), None);
        assert_eq!(Value::Float(f64::INFINITY).as_size(), None);
        assert_eq!(Value::from("3").as_size(), None);
    }

    #[test]
    fn test_record_insertion_order() {
        let mut record = Record::new();
        record.insert("b", 2u8);
        record.insert("a", 1u8);
        record.insert("c", 3u8);
        assert_eq!(record.keys().collect::<Vec<_>>(), ["b", "a", "c"]);

        // Replacing keeps the position
        assert_eq!(record.insert("a", 10u8), Some(Value::Int(1)));
        assert_eq!(record.keys().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert_eq!(record.get("a"), Some(&Value::Int(10)));

        assert_eq!(record.remove("b"), Some(Value::Int(2)));
        assert!(!record.contains("b"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(4294967294u32), Value::Int(4294967294));
        assert_eq!(Value::from(-1i8), Value::Int(-1));
        assert_eq!(Value::from("hi"), Value::String("hi".into()));
        assert_eq!(
            Value::from(vec![1u8, 2u8]),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(Value::Int(7).as_size(), Some(7));
        assert_eq!(Value::Int(-7).as_size(), None);
        assert_eq!(Value::Float(7.0).as_size(), None);
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-3).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Float(f64::NAN).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }
}

//! Schemas and the recursive walkers that drive codecs.

use crate::{value::NULL, ChunkList, Codec, Config, Context, Error, Record, Transaction, Value};
use bytes::Bytes;
use std::{borrow::Cow, fmt, sync::Arc};

/// A description of a binary layout.
///
/// A schema is either a single codec or an ordered list of named fields, each of which is itself a
/// schema. Field order is the wire order and the order in which fields become visible to later
/// fields through the [Context].
#[derive(Clone)]
pub enum Schema {
    Leaf(Arc<dyn Codec>),
    Group(Vec<(String, Schema)>),
}

impl Schema {
    /// Creates a record schema from `(name, schema)` pairs.
    ///
    /// Fails if a name is empty or appears twice.
    pub fn record<K: Into<String>>(
        fields: impl IntoIterator<Item = (K, Schema)>,
    ) -> Result<Self, Error> {
        let mut out: Vec<(String, Schema)> = Vec::new();
        for (name, schema) in fields {
            let name = name.into();
            if name.is_empty() {
                return Err(Error::InvalidSchema("empty field name".into()));
            }
            if out.iter().any(|(existing, _)| *existing == name) {
                return Err(Error::InvalidSchema(format!("duplicate field `{name}`")));
            }
            out.push((name, schema));
        }
        Ok(Schema::Group(out))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Schema::Leaf(_))
    }

    /// Field names of a record schema, in wire order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        let fields: &[(String, Schema)] = match self {
            Schema::Group(fields) => fields,
            Schema::Leaf(_) => &[],
        };
        fields.iter().map(|(name, _)| name.as_str())
    }

    /// The encoded length of every value, if constant.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Schema::Leaf(codec) => codec.fixed_size(),
            Schema::Group(fields) => fields
                .iter()
                .try_fold(0usize, |total, (_, field)| total.checked_add(field.fixed_size()?)),
        }
    }

    /// Returns true if decoding this schema in `ctx` yields no value.
    pub fn skips(&self, ctx: &Context<'_>) -> bool {
        match self {
            Schema::Leaf(codec) => codec.skips(ctx),
            Schema::Group(_) => false,
        }
    }

    /// The value written when this schema is used as padding.
    pub fn zero(&self) -> Value {
        match self {
            Schema::Leaf(codec) => codec.zero(),
            Schema::Group(fields) => Value::Record(
                fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.zero()))
                    .collect(),
            ),
        }
    }
}

impl<C: Codec + 'static> From<C> for Schema {
    fn from(codec: C) -> Self {
        Schema::Leaf(Arc::new(codec))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Leaf(_) => f.write_str("Leaf(..)"),
            Schema::Group(fields) => f.debug_map().entries(fields.iter().map(|(k, v)| (k, v))).finish(),
        }
    }
}

/// Builds a record [Schema] from `"name" => codec` pairs.
///
/// ```
/// use wireform_codec::{schema, types::*, Size};
///
/// let header = schema! {
///     "len" => uint8(),
///     "payload" => buffer(Size::field("len")),
/// }
/// .unwrap();
/// assert_eq!(header.fields().collect::<Vec<_>>(), ["len", "payload"]);
/// ```
#[macro_export]
macro_rules! schema {
    ($($name:expr => $field:expr),* $(,)?) => {
        $crate::Schema::record([$(($name, $crate::Schema::from($field))),*])
    };
}

fn as_record<'a>(value: &'a Value) -> Result<&'a Record, Error> {
    value.as_record().ok_or_else(|| {
        Error::InvalidSchema(format!(
            "record schema applied to a {} value",
            value.kind()
        ))
    })
}

/// Encodes `value` with `schema`, returning the bytes written.
pub(crate) fn encode_node<'a>(
    schema: &'a Schema,
    value: &'a Value,
    sink: &mut ChunkList,
    ctx: &mut Context<'a>,
) -> Result<usize, Error> {
    match schema {
        Schema::Leaf(codec) => {
            let bytes = codec.encode(value, sink, ctx)?;
            ctx.add_bytes(bytes);
            Ok(bytes)
        }
        Schema::Group(fields) => {
            let record = as_record(value)?;
            ctx.push(Cow::Borrowed(record));
            let result = fields.iter().try_fold(0, |total, (name, field)| -> Result<usize, Error> {
                let value = record.get(name).unwrap_or(&NULL);
                Ok(total + encode_node(field, value, sink, ctx)?)
            });
            ctx.pop();
            result
        }
    }
}

/// Decodes one value with `schema`, returning `None` if it must be omitted.
pub(crate) fn decode_node(
    schema: &Schema,
    tx: &mut Transaction<'_>,
    ctx: &mut Context<'_>,
) -> Result<(Option<Value>, usize), Error> {
    match schema {
        Schema::Leaf(codec) => {
            let (value, bytes) = codec.decode(tx, ctx)?;
            ctx.add_bytes(bytes);
            Ok((value, bytes))
        }
        Schema::Group(fields) => {
            ctx.push(Cow::Owned(Record::new()));
            let result = decode_fields(fields, tx, ctx);
            let record = ctx.pop().unwrap_or_default();
            Ok((Some(Value::Record(record)), result?))
        }
    }
}

fn decode_fields(
    fields: &[(String, Schema)],
    tx: &mut Transaction<'_>,
    ctx: &mut Context<'_>,
) -> Result<usize, Error> {
    let mut total = 0;
    for (name, field) in fields {
        let (value, bytes) = decode_node(field, tx, ctx)?;
        total += bytes;
        if let (Some(value), Some(record)) = (value, ctx.current_mut()) {
            record.insert(name.as_str(), value);
        }
    }
    Ok(total)
}

/// Computes the encoded length of `value` with `schema`.
pub(crate) fn encoding_length_node<'a>(
    schema: &'a Schema,
    value: &'a Value,
    ctx: &mut Context<'a>,
) -> Result<usize, Error> {
    match schema {
        Schema::Leaf(codec) => {
            let bytes = codec.encoding_length(value, ctx)?;
            ctx.add_bytes(bytes);
            Ok(bytes)
        }
        Schema::Group(fields) => {
            let record = as_record(value)?;
            ctx.push(Cow::Borrowed(record));
            let result = fields.iter().try_fold(0, |total, (name, field)| -> Result<usize, Error> {
                let value = record.get(name).unwrap_or(&NULL);
                Ok(total + encoding_length_node(field, value, ctx)?)
            });
            ctx.pop();
            result
        }
    }
}

/// Encodes `value` into a new [ChunkList].
///
/// Returns the list and the number of bytes written.
pub fn encode(value: &Value, schema: &Schema) -> Result<(ChunkList, usize), Error> {
    let mut sink = ChunkList::new();
    let bytes = encode_into(value, schema, &mut sink)?;
    Ok((sink, bytes))
}

/// Encodes `value`, appending the output to `sink`.
///
/// Nothing is appended if encoding fails.
pub fn encode_into(value: &Value, schema: &Schema, sink: &mut ChunkList) -> Result<usize, Error> {
    let mut out = ChunkList::new();
    let mut ctx = Context::new(Config::default());
    let bytes = encode_node(schema, value, &mut out, &mut ctx)?;
    sink.append_list(out);
    Ok(bytes)
}

/// Decodes one value from the front of `source`.
///
/// Returns the value and the number of bytes read. Trailing bytes are left unread.
pub fn decode(source: impl Into<Bytes>, schema: &Schema) -> Result<(Value, usize), Error> {
    decode_cfg(source, schema, &Config::default())
}

/// Like [decode], rejecting any size outside of `cfg`.
pub fn decode_cfg(
    source: impl Into<Bytes>,
    schema: &Schema,
    cfg: &Config,
) -> Result<(Value, usize), Error> {
    let mut list = ChunkList::from(source.into());
    let mut tx = Transaction::new(&mut list);
    decode_from_cfg(&mut tx, schema, cfg)
}

/// Decodes one value through an open transaction.
///
/// The transaction is not committed: call [Transaction::commit] once the value is accepted.
pub fn decode_from(tx: &mut Transaction<'_>, schema: &Schema) -> Result<(Value, usize), Error> {
    decode_from_cfg(tx, schema, &Config::default())
}

/// Like [decode_from], rejecting any size outside of `cfg`.
pub fn decode_from_cfg(
    tx: &mut Transaction<'_>,
    schema: &Schema,
    cfg: &Config,
) -> Result<(Value, usize), Error> {
    let mut ctx = Context::new(*cfg);
    let (value, bytes) = decode_node(schema, tx, &mut ctx)?;
    Ok((value.unwrap_or_default(), bytes))
}

/// Returns the number of bytes [encode] would write for `value`.
pub fn encoding_length(value: &Value, schema: &Schema) -> Result<usize, Error> {
    let mut ctx = Context::new(Config::default());
    encoding_length_node(schema, value, &mut ctx)
}

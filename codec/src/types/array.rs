//! Repeated items: arrays and reserved (padding) fields.

use crate::{
    codec::to_size,
    schema::{decode_node, encode_node, encoding_length_node},
    ChunkList, Codec, Context, Error, Schema, Size, SizeKind, Transaction, Value,
};

/// A codec for [Value::Array].
#[derive(Clone, Debug)]
pub struct ArrayCodec {
    item: Schema,
    size: Size,
    kind: SizeKind,
}

/// An array of `item`s whose length is given by `size`, counted as `kind`.
///
/// With [SizeKind::Bytes] the size is the total encoded length of all items, and a size prefix
/// holds that byte total. Fails if `size` is [Size::Terminated].
///
/// An item that reads no bytes but yields a value (an empty fixed-size buffer, for example) is
/// repeated as often as the decoded count says. Bound the count with [crate::Config] when such
/// an array is decoded from untrusted input.
pub fn array(
    item: impl Into<Schema>,
    size: impl Into<Size>,
    kind: SizeKind,
) -> Result<ArrayCodec, Error> {
    let size = size.into();
    if matches!(size, Size::Terminated) {
        return Err(Error::InvalidSchema(
            "array size cannot be zero-terminated".into(),
        ));
    }
    Ok(ArrayCodec {
        item: item.into(),
        size,
        kind,
    })
}

fn expect_array(value: &Value) -> Result<&[Value], Error> {
    value.as_array().ok_or_else(|| Error::TypeMismatch {
        expected: "array",
        found: value.kind().to_owned(),
    })
}

impl ArrayCodec {
    /// Encoded length of every item together.
    fn items_length<'a>(&'a self, items: &'a [Value], ctx: &mut Context<'a>) -> Result<usize, Error> {
        let (_, bytes) = ctx.nested(|ctx| {
            items
                .iter()
                .try_for_each(|item| encoding_length_node(&self.item, item, ctx).map(|_| ()))
        })?;
        Ok(bytes)
    }

    fn decode_count(
        &self,
        count: usize,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<Value>, Error> {
        let mut items = Vec::with_capacity(count.min(tx.remaining()));
        for _ in 0..count {
            match decode_node(&self.item, tx, ctx)? {
                (Some(item), _) => items.push(item),
                // Nothing read and nothing kept: the remaining items would do the same
                (None, 0) => break,
                (None, _) => {}
            }
        }
        Ok(items)
    }

    fn decode_bytes(
        &self,
        budget: usize,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<Vec<Value>, Error> {
        let mut items = Vec::new();
        let mut consumed = 0;
        while consumed < budget {
            let (item, bytes) = decode_node(&self.item, tx, ctx)?;
            consumed += bytes;
            // An empty item would never exhaust the budget.
            if bytes == 0 || consumed > budget {
                return Err(Error::ArrayOverrun { budget, consumed });
            }
            if let Some(item) = item {
                items.push(item);
            }
        }
        Ok(items)
    }
}

impl Codec for ArrayCodec {
    fn encode<'a>(
        &'a self,
        value: &'a Value,
        sink: &mut ChunkList,
        ctx: &mut Context<'a>,
    ) -> Result<usize, Error> {
        let items = expect_array(value)?;
        let len = match self.kind {
            SizeKind::Count => items.len(),
            SizeKind::Bytes => self.items_length(items, ctx)?,
        };
        let prefix = self.size.encode(len, sink, ctx)?;
        let (_, bytes) = ctx.nested(|ctx| {
            items
                .iter()
                .try_for_each(|item| encode_node(&self.item, item, sink, ctx).map(|_| ()))
        })?;
        Ok(prefix + bytes)
    }

    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error> {
        let (size, prefix) = self.size.decode(tx, ctx)?;
        let size = size.ok_or_else(|| Error::InvalidSchema("array without a size".into()))?;
        let (items, bytes) = ctx.nested(|ctx| match self.kind {
            SizeKind::Count => self.decode_count(size, tx, ctx),
            SizeKind::Bytes => self.decode_bytes(size, tx, ctx),
        })?;
        Ok((Some(Value::Array(items)), prefix + bytes))
    }

    fn encoding_length<'a>(&'a self, value: &'a Value, ctx: &mut Context<'a>) -> Result<usize, Error> {
        if let (SizeKind::Bytes, Size::Fixed(n)) = (self.kind, &self.size) {
            return Ok(*n);
        }
        let items = expect_array(value)?;
        let body = self.items_length(items, ctx)?;
        let prefix = match self.kind {
            SizeKind::Count => self.size.check(items.len(), ctx)?,
            SizeKind::Bytes => self.size.check(body, ctx)?,
        };
        Ok(prefix + body)
    }

    fn zero(&self) -> Value {
        match (self.kind, &self.size) {
            (SizeKind::Count, Size::Fixed(n)) => Value::Array(vec![self.item.zero(); *n]),
            _ => Value::Array(Vec::new()),
        }
    }

    fn fixed_size(&self) -> Option<usize> {
        match (self.kind, &self.size) {
            (SizeKind::Bytes, Size::Fixed(n)) => Some(*n),
            (SizeKind::Count, Size::Fixed(n)) => self.item.fixed_size()?.checked_mul(*n),
            _ => None,
        }
    }
}

/// A codec for padding: `count` zero-valued items that never surface in a decoded record.
#[derive(Clone, Debug)]
pub struct ReservedCodec {
    item: Schema,
    count: Size,
    zero: Value,
}

/// Reserves `count` items of `item`.
///
/// Encoding writes the zero value of `item` `count` times, whatever the field's value. Decoding
/// reads and discards them. Fails if `count` is a prefix or a terminator.
pub fn reserved(item: impl Into<Schema>, count: impl Into<Size>) -> Result<ReservedCodec, Error> {
    let count = count.into();
    if matches!(count, Size::Prefixed(_) | Size::Terminated) {
        return Err(Error::InvalidSchema(format!(
            "reserved count must be fixed or computed, got {count:?}"
        )));
    }
    let item = item.into();
    Ok(ReservedCodec {
        zero: item.zero(),
        item,
        count,
    })
}

/// Reserves a single item of `item`.
pub fn padding(item: impl Into<Schema>) -> ReservedCodec {
    let item = item.into();
    ReservedCodec {
        zero: item.zero(),
        item,
        count: Size::Fixed(1),
    }
}

impl ReservedCodec {
    fn count(&self, ctx: &Context<'_>) -> Result<usize, Error> {
        match &self.count {
            Size::Fixed(n) => Ok(*n),
            Size::Dynamic(f) => to_size(f(ctx)),
            Size::Prefixed(_) | Size::Terminated => {
                Err(Error::InvalidSchema("reserved count must be fixed or computed".into()))
            }
        }
    }
}

impl Codec for ReservedCodec {
    fn encode<'a>(
        &'a self,
        _: &'a Value,
        sink: &mut ChunkList,
        ctx: &mut Context<'a>,
    ) -> Result<usize, Error> {
        let count = self.count(ctx)?;
        let (_, bytes) = ctx.nested(|ctx| {
            (0..count).try_for_each(|_| encode_node(&self.item, &self.zero, sink, ctx).map(|_| ()))
        })?;
        Ok(bytes)
    }

    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error> {
        let count = ctx.config().check(self.count(ctx)?)?;
        let (_, bytes) = ctx.nested(|ctx| {
            (0..count).try_for_each(|_| decode_node(&self.item, tx, ctx).map(|_| ()))
        })?;
        Ok((None, bytes))
    }

    fn encoding_length<'a>(&'a self, _: &'a Value, ctx: &mut Context<'a>) -> Result<usize, Error> {
        let count = self.count(ctx)?;
        if count == 0 {
            return Ok(0);
        }
        let (_, bytes) = ctx.nested(|ctx| encoding_length_node(&self.item, &self.zero, ctx))?;
        bytes
            .checked_mul(count)
            .ok_or_else(|| Error::InvalidValue("reserved", format!("{count} items overflow")))
    }

    fn fixed_size(&self) -> Option<usize> {
        match self.count {
            Size::Fixed(n) => self.item.fixed_size()?.checked_mul(n),
            _ => None,
        }
    }

    fn skips(&self, _: &Context<'_>) -> bool {
        true
    }
}

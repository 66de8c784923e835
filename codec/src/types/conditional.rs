//! Fields whose presence depends on the traversal state.
//!
//! A [WhenCodec] is present only while its [Condition] holds. A [SelectCodec] is a tagged union
//! resolved by predicate order: the first arm whose condition holds supplies the value. Neither
//! reads a discriminant from the input; conditions usually inspect sibling fields decoded earlier.

use crate::{
    schema::{decode_node, encode_node, encoding_length_node},
    ChunkList, Codec, Condition, Context, Error, Schema, Transaction, Value,
};

/// A field present only when a condition holds.
#[derive(Clone, Debug)]
pub struct WhenCodec {
    condition: Condition,
    item: Schema,
}

/// A field of type `item`, present when `condition` holds.
///
/// When absent, nothing is read or written and the field is omitted from decoded records.
pub fn when(condition: impl Into<Condition>, item: impl Into<Schema>) -> WhenCodec {
    WhenCodec {
        condition: condition.into(),
        item: item.into(),
    }
}

impl WhenCodec {
    /// Returns true if the field is present in `ctx`.
    pub fn holds(&self, ctx: &Context<'_>) -> bool {
        self.condition.eval(ctx)
    }
}

impl Codec for WhenCodec {
    fn encode<'a>(
        &'a self,
        value: &'a Value,
        sink: &mut ChunkList,
        ctx: &mut Context<'a>,
    ) -> Result<usize, Error> {
        if !self.holds(ctx) {
            return Ok(0);
        }
        let (_, bytes) = ctx.nested(|ctx| encode_node(&self.item, value, sink, ctx))?;
        Ok(bytes)
    }

    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error> {
        if !self.holds(ctx) {
            return Ok((None, 0));
        }
        let ((value, _), bytes) = ctx.nested(|ctx| decode_node(&self.item, tx, ctx))?;
        Ok((value, bytes))
    }

    fn encoding_length<'a>(&'a self, value: &'a Value, ctx: &mut Context<'a>) -> Result<usize, Error> {
        if !self.holds(ctx) {
            return Ok(0);
        }
        let (_, bytes) = ctx.nested(|ctx| encoding_length_node(&self.item, value, ctx))?;
        Ok(bytes)
    }

    fn zero(&self) -> Value {
        self.item.zero()
    }

    fn skips(&self, ctx: &Context<'_>) -> bool {
        !self.holds(ctx) || self.item.skips(ctx)
    }
}

/// A choice between several conditional arms.
#[derive(Clone, Debug)]
pub struct SelectCodec {
    arms: Vec<WhenCodec>,
    default: Option<Schema>,
}

/// A union of `arms`, tried in order.
///
/// Fails if `arms` is empty.
pub fn select(arms: impl IntoIterator<Item = WhenCodec>) -> Result<SelectCodec, Error> {
    let arms: Vec<_> = arms.into_iter().collect();
    if arms.is_empty() {
        return Err(Error::InvalidSchema(
            "select needs at least one arm".into(),
        ));
    }
    Ok(SelectCodec {
        arms,
        default: None,
    })
}

impl SelectCodec {
    /// Uses `item` when no arm holds.
    pub fn otherwise(mut self, item: impl Into<Schema>) -> Self {
        self.default = Some(item.into());
        self
    }

    /// The arms that hold, followed by the default.
    fn candidates<'s>(&'s self, ctx: &Context<'_>) -> Vec<&'s Schema> {
        self.arms
            .iter()
            .filter(|arm| arm.holds(ctx))
            .map(|arm| &arm.item)
            .chain(self.default.as_ref())
            .collect()
    }

    /// The candidates written for a value: every leading one that yields nothing, up to and
    /// including the first that carries the value.
    fn plan<'s>(&'s self, ctx: &Context<'_>) -> Vec<&'s Schema> {
        let mut plan = Vec::new();
        for item in self.candidates(ctx) {
            plan.push(item);
            if !item.skips(ctx) {
                break;
            }
        }
        plan
    }
}

impl Codec for SelectCodec {
    fn encode<'a>(
        &'a self,
        value: &'a Value,
        sink: &mut ChunkList,
        ctx: &mut Context<'a>,
    ) -> Result<usize, Error> {
        let plan = self.plan(ctx);
        let (_, bytes) = ctx.nested(|ctx| {
            plan.into_iter()
                .try_for_each(|item| encode_node(item, value, sink, ctx).map(|_| ()))
        })?;
        Ok(bytes)
    }

    fn decode(
        &self,
        tx: &mut Transaction<'_>,
        ctx: &mut Context<'_>,
    ) -> Result<(Option<Value>, usize), Error> {
        let mut total = 0;
        for item in self.candidates(ctx) {
            let ((value, _), bytes) = ctx.nested(|ctx| decode_node(item, tx, ctx))?;
            total += bytes;
            if value.is_some() {
                return Ok((value, total));
            }
        }
        Ok((None, total))
    }

    fn encoding_length<'a>(&'a self, value: &'a Value, ctx: &mut Context<'a>) -> Result<usize, Error> {
        let plan = self.plan(ctx);
        let (_, bytes) = ctx.nested(|ctx| {
            plan.into_iter()
                .try_for_each(|item| encoding_length_node(item, value, ctx).map(|_| ()))
        })?;
        Ok(bytes)
    }

    fn skips(&self, ctx: &Context<'_>) -> bool {
        self.plan(ctx).last().map_or(true, |item| item.skips(ctx))
    }
}

//! Grouped aggregation operator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::exec::Operator;
use crate::tuple::{Field, FieldDef, FieldType, Schema, Tuple};

/// Aggregation functions over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateOp::Count => "count",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        };
        f.write_str(name)
    }
}

/// Running state for one group, folded as tuples arrive.
///
/// Every counter is carried regardless of the configured function; the one
/// that matters is picked at finalization. Folding incrementally is
/// numerically identical to replaying the group, including AVG's truncating
/// integer division, because that division happens only at the end.
struct Accum {
    count: i64,
    sum: i64,
    min: i64,
    max: i64,
}

impl Accum {
    fn seeded(value: &Field) -> Self {
        let v = match *value {
            Field::Int(v) => v,
            // Strings only ever reach COUNT, which ignores the value.
            Field::Str(_) => 0,
        };
        Self {
            count: 1,
            sum: v,
            min: v,
            max: v,
        }
    }

    fn fold(&mut self, value: &Field) {
        self.count += 1;
        if let Field::Int(v) = *value {
            self.sum += v;
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
    }

    fn finalize(&self, op: AggregateOp) -> i64 {
        match op {
            AggregateOp::Count => self.count,
            AggregateOp::Sum => self.sum,
            // count >= 1: an accumulator exists only once a tuple arrived.
            AggregateOp::Avg => self.sum / self.count,
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
        }
    }
}

/// Groups its child's tuples by one field (or a single implicit group) and
/// aggregates another, yielding one output tuple per group.
///
/// `open` drains the entire child into per-group accumulators; iteration
/// then walks the finalized groups in group-key order. `rewind` restarts
/// that walk without touching the child again.
///
/// Output schema: `(group_field, op(agg_field))` when grouped, or just the
/// aggregate column when not. The result column is always an int; it takes
/// its name from the child's field name as `op(name)`, or just `op` when
/// the child field is unnamed.
pub struct Aggregate<C> {
    child: C,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggregateOp,
    schema: Arc<Schema>,
    opened: bool,
    rows: Vec<Tuple>,
    pos: usize,
}

impl<C: Operator> Aggregate<C> {
    /// Build an aggregation of `child.schema()[agg_field]`, grouped by
    /// `group_field` when given.
    ///
    /// # Errors
    /// `InvalidState` if either field index is out of bounds, or if the
    /// aggregated field is a string and `op` is anything but COUNT.
    pub fn new(
        child: C,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self> {
        let child_schema = Arc::clone(child.schema());

        let agg_type = child_schema.field_type(agg_field).ok_or_else(|| {
            Error::invalid_state(format!("aggregate field {} out of bounds", agg_field))
        })?;
        if agg_type == FieldType::Str && op != AggregateOp::Count {
            return Err(Error::invalid_state(format!(
                "cannot compute {} over a string field",
                op
            )));
        }

        let result_name = match child_schema.field_name(agg_field) {
            Some(name) => format!("{}({})", op, name),
            None => op.to_string(),
        };

        let mut fields = Vec::new();
        if let Some(i) = group_field {
            let group_type = child_schema
                .field_type(i)
                .ok_or_else(|| Error::invalid_state(format!("group field {} out of bounds", i)))?;
            fields.push(match child_schema.field_name(i) {
                Some(name) => FieldDef::named(group_type, name),
                None => FieldDef::unnamed(group_type),
            });
        }
        fields.push(FieldDef::named(FieldType::Int, result_name));

        Ok(Self {
            child,
            agg_field,
            group_field,
            op,
            schema: Arc::new(Schema::new(fields)),
            opened: false,
            rows: Vec::new(),
            pos: 0,
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.opened {
            Ok(())
        } else {
            Err(Error::invalid_state("aggregate operator is not open"))
        }
    }
}

impl<C: Operator> Operator for Aggregate<C> {
    fn open(&mut self) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        self.child.open()?;

        // Eager drain: group keys are the raw group-field values, with a
        // single None key standing in when there is no grouping.
        let mut groups: BTreeMap<Option<Field>, Accum> = BTreeMap::new();
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            let key = self.group_field.map(|i| tuple.fields()[i].clone());
            let value = &tuple.fields()[self.agg_field];
            groups
                .entry(key)
                .and_modify(|acc| acc.fold(value))
                .or_insert_with(|| Accum::seeded(value));
        }

        if groups.is_empty() {
            self.child.close();
            return Err(Error::not_found("aggregate over an empty input"));
        }

        self.rows = groups
            .into_iter()
            .map(|(key, acc)| {
                let result = Field::Int(acc.finalize(self.op));
                let fields = match key {
                    Some(group) => vec![group, result],
                    None => vec![result],
                };
                Tuple::new(Arc::clone(&self.schema), fields)
            })
            .collect::<Result<Vec<_>>>()?;
        self.pos = 0;
        self.opened = true;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        self.check_open()?;
        Ok(self.pos < self.rows.len())
    }

    fn next(&mut self) -> Result<Tuple> {
        self.check_open()?;
        if self.pos >= self.rows.len() {
            return Err(Error::not_found("aggregate output exhausted"));
        }
        let row = self.rows[self.pos].clone();
        self.pos += 1;
        Ok(row)
    }

    fn rewind(&mut self) -> Result<()> {
        self.check_open()?;
        self.pos = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.rows = Vec::new();
        self.pos = 0;
        self.opened = false;
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

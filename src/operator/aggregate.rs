use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SmallError;
use crate::field::Field;
use crate::operator::OpIterator;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::FieldType;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl AggOp {
    fn name(&self) -> &'static str {
        match self {
            AggOp::Min => "min",
            AggOp::Max => "max",
            AggOp::Sum => "sum",
            AggOp::Avg => "avg",
            AggOp::Count => "count",
        }
    }
}

#[derive(Default)]
struct IntAcc {
    count: i64,
    sum: i64,
    min: i32,
    max: i32,
}

impl IntAcc {
    fn new() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: i32::MAX,
            max: i32::MIN,
        }
    }

    fn merge(&mut self, v: i32) {
        self.count += 1;
        self.sum += v as i64;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    // sum is widened to i64 during accumulation and narrowed back here
    // with `as`, which wraps silently on overflow.
    fn finish(&self, op: AggOp) -> i32 {
        match op {
            AggOp::Count => self.count as i32,
            AggOp::Sum => self.sum as i32,
            AggOp::Min => self.min,
            AggOp::Max => self.max,
            // Integer division in Rust truncates toward zero, which is
            // exactly AVG's defined rounding.
            AggOp::Avg => (self.sum / self.count.max(1)) as i32,
        }
    }
}

// None group key means every row falls into a single NO_GROUPING bucket.
struct IntegerAggregator {
    op: AggOp,
    groups: HashMap<Option<Field>, IntAcc>,
}

impl IntegerAggregator {
    fn new(op: AggOp) -> Self {
        Self {
            op,
            groups: HashMap::new(),
        }
    }

    fn merge(&mut self, group: Option<Field>, value: i32) {
        self.groups.entry(group).or_insert_with(IntAcc::new).merge(value);
    }

    // NO_GROUPING must still produce a row for a zero-row child.
    fn seed(&mut self, group: Option<Field>) {
        self.groups.entry(group).or_insert_with(IntAcc::new);
    }

    fn results(&self) -> Vec<(Option<Field>, i32)> {
        self.groups
            .iter()
            .map(|(g, acc)| (g.clone(), acc.finish(self.op)))
            .collect()
    }
}

// only COUNT is meaningful for strings; Aggregate::new rejects any other
// op before ever constructing one of these.
struct StringAggregator {
    counts: HashMap<Option<Field>, i64>,
}

impl StringAggregator {
    fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    fn merge(&mut self, group: Option<Field>) {
        *self.counts.entry(group).or_insert(0) += 1;
    }

    fn seed(&mut self, group: Option<Field>) {
        self.counts.entry(group).or_insert(0);
    }

    fn results(&self) -> Vec<(Option<Field>, i32)> {
        self.counts
            .iter()
            .map(|(g, c)| (g.clone(), *c as i32))
            .collect()
    }
}

enum Agg {
    Int(IntegerAggregator),
    Str(StringAggregator),
}

// on open, drains child entirely and buffers one output row per group;
// has_next/next then stream from that buffer.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggOp,
    result_desc: Arc<TupleDesc>,
    results: Vec<Tuple>,
    cursor: usize,
    is_open: bool,
}

impl Aggregate {
    // group_field = None is NO_GROUPING.
    pub fn new(
        child: Box<dyn OpIterator>,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggOp,
    ) -> Result<Self, SmallError> {
        let child_desc = child.get_tuple_desc();
        let agg_name = child_desc.field_name(agg_field).unwrap_or("").to_string();
        if matches!(child_desc.field_type(agg_field), FieldType::Str(_)) && op != AggOp::Count {
            return Err(SmallError::UnsupportedAggregate(format!(
                "{:?} is not supported over string fields",
                op
            )));
        }

        let mut fields = Vec::new();
        if let Some(gf) = group_field {
            fields.push((
                child_desc.field_type(gf),
                child_desc.field_name(gf).map(|s| s.to_string()),
            ));
        }
        fields.push((
            FieldType::Int,
            Some(format!("{}({})", op.name(), agg_name)),
        ));
        let result_desc = Arc::new(TupleDesc::new(fields));

        Ok(Self {
            child,
            agg_field,
            group_field,
            op,
            result_desc,
            results: Vec::new(),
            cursor: 0,
            is_open: false,
        })
    }

    fn evaluate(&mut self) -> Result<(), SmallError> {
        let child_desc = self.child.get_tuple_desc();
        let agg_type = child_desc.field_type(self.agg_field);
        let mut agg = match agg_type {
            FieldType::Int => Agg::Int(IntegerAggregator::new(self.op)),
            FieldType::Str(_) => Agg::Str(StringAggregator::new()),
        };

        if self.group_field.is_none() {
            match &mut agg {
                Agg::Int(a) => a.seed(None),
                Agg::Str(a) => a.seed(None),
            }
        }

        while self.child.has_next()? {
            let t = self.child.next()?;
            let group = self.group_field.map(|i| t.get_field(i).clone());
            match (&mut agg, t.get_field(self.agg_field)) {
                (Agg::Int(a), Field::Int(v)) => a.merge(group, *v),
                (Agg::Str(a), Field::Str(_)) => a.merge(group),
                _ => {
                    return Err(SmallError::SchemaMismatch(
                        "aggregate field type changed mid-scan".into(),
                    ))
                }
            }
        }

        let rows = match &agg {
            Agg::Int(a) => a.results(),
            Agg::Str(a) => a.results(),
        };

        let mut tuples = Vec::with_capacity(rows.len());
        for (group, value) in rows {
            let mut fields = Vec::new();
            if let Some(g) = group {
                fields.push(g);
            }
            fields.push(Field::Int(value));
            tuples.push(Tuple::new(Arc::clone(&self.result_desc), fields)?);
        }
        self.results = tuples;
        self.cursor = 0;
        Ok(())
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> Result<(), SmallError> {
        self.child.open()?;
        self.evaluate()?;
        self.is_open = true;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        if !self.is_open {
            return Err(SmallError::IllegalState("has_next before open".into()));
        }
        Ok(self.cursor < self.results.len())
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if !self.has_next()? {
            return Err(SmallError::NoMoreTuples);
        }
        let t = self.results[self.cursor].clone();
        self.cursor += 1;
        Ok(t)
    }

    // replays the already-materialized result set; does not re-drain the child.
    fn rewind(&mut self) -> Result<(), SmallError> {
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.results = Vec::new();
        self.cursor = 0;
        self.is_open = false;
    }

    fn get_tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.result_desc)
    }

    fn get_children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) -> Result<(), SmallError> {
        if children.len() != 1 {
            return Err(SmallError::IllegalState(
                "Aggregate takes exactly one child".into(),
            ));
        }
        self.child = children.remove(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::heap_file::HeapFile;
    use crate::operator::SeqScan;
    use crate::transaction::TransactionId;
    use tempfile::NamedTempFile;

    fn table_with_groups(alias: &str, rows: &[(&str, i32)]) -> (i32, TransactionId) {
        let tmp = NamedTempFile::new().unwrap();
        let desc = TupleDesc::new(vec![
            (FieldType::Str(8), Some("category".into())),
            (FieldType::Int, Some("amount".into())),
        ]);
        let file = Arc::new(HeapFile::new(tmp.path(), desc).unwrap());
        let tid = TransactionId::new();
        for (cat, amount) in rows {
            let t = Tuple::new(
                file.get_tuple_desc(),
                vec![Field::Str(cat.to_string()), Field::Int(*amount)],
            )
            .unwrap();
            file.insert_tuple(tid, t).unwrap();
        }
        let table_id = file.get_id();
        Database::global().add_table(file, alias);
        (table_id, tid)
    }

    // S5: grouped AVG over amount, grouped by category.
    #[test]
    fn s5_grouped_average_truncates_toward_zero() {
        let (table_id, tid) = table_with_groups(
            "agg_grouped",
            &[("a", 1), ("a", 2), ("a", 4), ("b", 10), ("b", -3)],
        );
        let scan = SeqScan::new(tid, table_id, "t");
        let mut agg = Aggregate::new(Box::new(scan), 1, Some(0), AggOp::Avg).unwrap();
        agg.open().unwrap();

        let mut out = HashMap::new();
        while agg.has_next().unwrap() {
            let t = agg.next().unwrap();
            let group = t.get_field(0).clone();
            let value = t.get_field(1).clone();
            out.insert(group, value);
        }
        agg.close();

        // (1+2+4)/3 = 2 exactly.
        assert_eq!(out.get(&Field::Str("a".into())), Some(&Field::Int(2)));
        // (10-3)/2 = 3 (truncated toward zero, not floored).
        assert_eq!(out.get(&Field::Str("b".into())), Some(&Field::Int(3)));
    }

    // S6: COUNT with no grouping over a string field.
    #[test]
    fn s6_no_grouping_count_over_strings() {
        let (table_id, tid) = table_with_groups(
            "agg_no_grouping",
            &[("x", 0), ("y", 0), ("z", 0)],
        );
        let scan = SeqScan::new(tid, table_id, "t");
        let mut agg = Aggregate::new(Box::new(scan), 0, None, AggOp::Count).unwrap();
        agg.open().unwrap();
        assert!(agg.has_next().unwrap());
        let t = agg.next().unwrap();
        assert_eq!(t.tuple_desc().num_fields(), 1);
        assert_eq!(t.get_field(0), &Field::Int(3));
        assert!(!agg.has_next().unwrap());
        agg.close();
    }

    #[test]
    fn no_grouping_count_over_zero_rows_still_emits_one_row() {
        let (table_id, tid) = table_with_groups("agg_empty", &[]);
        let scan = SeqScan::new(tid, table_id, "t");
        let mut agg = Aggregate::new(Box::new(scan), 1, None, AggOp::Count).unwrap();
        agg.open().unwrap();
        assert!(agg.has_next().unwrap());
        let t = agg.next().unwrap();
        assert_eq!(t.tuple_desc().num_fields(), 1);
        assert_eq!(t.get_field(0), &Field::Int(0));
        assert!(!agg.has_next().unwrap());
        agg.close();
    }

    #[test]
    fn sum_over_string_field_is_unsupported() {
        let (table_id, tid) = table_with_groups("agg_unsupported", &[("x", 1)]);
        let scan = SeqScan::new(tid, table_id, "t");
        match Aggregate::new(Box::new(scan), 0, None, AggOp::Sum) {
            Err(SmallError::UnsupportedAggregate(_)) => {}
            other => panic!("expected UnsupportedAggregate, got {}", other.is_ok()),
        }
    }
}

use std::fmt;

use crate::field::Field;
use crate::tuple::Tuple;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Op {
    Equals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    Like,
    NotEquals,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Op::Equals => "=",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEq => ">=",
            Op::LessThan => "<",
            Op::LessThanOrEq => "<=",
            Op::Like => "LIKE",
            Op::NotEquals => "<>",
        };
        write!(f, "{}", s)
    }
}

/// A single-row boolean test: `t.field(field_index) OP constant`.
#[derive(Clone)]
pub struct Predicate {
    pub field_index: usize,
    pub op: Op,
    pub constant: Field,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, constant: Field) -> Self {
        Self {
            field_index,
            op,
            constant,
        }
    }

    pub fn filter(&self, t: &Tuple) -> bool {
        t.get_field(self.field_index).matches(self.op, &self.constant)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "field_index: {}, op: {}, constant: {}",
            self.field_index, self.op, self.constant
        )
    }
}

/// A row-pair boolean test used by join: `l.field(field_index1) OP
/// r.field(field_index2)`.
#[derive(Clone)]
pub struct JoinPredicate {
    pub field_index1: usize,
    pub op: Op,
    pub field_index2: usize,
}

impl JoinPredicate {
    pub fn new(field_index1: usize, op: Op, field_index2: usize) -> Self {
        Self {
            field_index1,
            op,
            field_index2,
        }
    }

    pub fn filter(&self, l: &Tuple, r: &Tuple) -> bool {
        l.get_field(self.field_index1)
            .matches(self.op, r.get_field(self.field_index2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::TupleDesc;
    use crate::types::FieldType;
    use std::sync::Arc;

    #[test]
    fn predicate_filters_rows() {
        let desc = Arc::new(TupleDesc::new(vec![(FieldType::Int, None)]));
        let t = Tuple::new(desc, vec![Field::Int(3)]).unwrap();
        let p = Predicate::new(0, Op::GreaterThan, Field::Int(2));
        assert!(p.filter(&t));
        let p2 = Predicate::new(0, Op::GreaterThan, Field::Int(5));
        assert!(!p2.filter(&t));
    }

    #[test]
    fn join_predicate_compares_two_rows() {
        let desc = Arc::new(TupleDesc::new(vec![(FieldType::Int, None)]));
        let l = Tuple::new(desc.clone(), vec![Field::Int(1)]).unwrap();
        let r = Tuple::new(desc, vec![Field::Int(1)]).unwrap();
        let jp = JoinPredicate::new(0, Op::Equals, 0);
        assert!(jp.filter(&l, &r));
    }
}

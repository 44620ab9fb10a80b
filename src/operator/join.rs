use std::sync::Arc;

use crate::error::SmallError;
use crate::operator::OpIterator;
use crate::predicate::JoinPredicate;
use crate::tuple::{Tuple, TupleDesc};

/// Arity-2 nested-loops join: for each left row, scans the whole right
/// child looking for matches, rewinding the right child and advancing to
/// the next left row once it is exhausted. Output rows are `l.concat(r)`
/// and appear in `(left position, right position)` lexicographic order.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    current_left: Option<Tuple>,
    lookahead: Option<Tuple>,
    is_open: bool,
}

impl Join {
    pub fn new(
        predicate: JoinPredicate,
        left: Box<dyn OpIterator>,
        right: Box<dyn OpIterator>,
    ) -> Self {
        Self {
            predicate,
            left,
            right,
            current_left: None,
            lookahead: None,
            is_open: false,
        }
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        loop {
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.next()?);
            }
            let l = self.current_left.clone().expect("just set above");

            while self.right.has_next()? {
                let r = self.right.next()?;
                if self.predicate.filter(&l, &r) {
                    return Ok(Some(l.concat(&r)?));
                }
            }

            self.current_left = None;
            self.right.rewind()?;
        }
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> Result<(), SmallError> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        self.lookahead = None;
        self.is_open = true;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        if !self.is_open {
            return Err(SmallError::IllegalState("has_next before open".into()));
        }
        if self.lookahead.is_some() {
            return Ok(true);
        }
        self.lookahead = self.fetch_next()?;
        Ok(self.lookahead.is_some())
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if !self.has_next()? {
            return Err(SmallError::NoMoreTuples);
        }
        Ok(self.lookahead.take().unwrap())
    }

    fn rewind(&mut self) -> Result<(), SmallError> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        self.lookahead = None;
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.current_left = None;
        self.lookahead = None;
        self.is_open = false;
    }

    fn get_tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::new(TupleDesc::merge(
            &self.left.get_tuple_desc(),
            &self.right.get_tuple_desc(),
        ))
    }

    fn get_children(&self) -> Vec<&dyn OpIterator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) -> Result<(), SmallError> {
        if children.len() != 2 {
            return Err(SmallError::IllegalState(
                "Join takes exactly two children".into(),
            ));
        }
        self.right = children.remove(1);
        self.left = children.remove(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::field::Field;
    use crate::heap_file::HeapFile;
    use crate::operator::SeqScan;
    use crate::predicate::Op;
    use crate::transaction::TransactionId;
    use crate::types::FieldType;
    use tempfile::NamedTempFile;

    fn table_of(alias: &str, rows: &[(i32, &str)]) -> (i32, TransactionId) {
        let tmp = NamedTempFile::new().unwrap();
        let desc = TupleDesc::new(vec![
            (FieldType::Int, Some("id".into())),
            (FieldType::Str(8), Some("name".into())),
        ]);
        let file = Arc::new(HeapFile::new(tmp.path(), desc).unwrap());
        let tid = TransactionId::new();
        for (id, name) in rows {
            let t = Tuple::new(
                file.get_tuple_desc(),
                vec![Field::Int(*id), Field::Str(name.to_string())],
            )
            .unwrap();
            file.insert_tuple(tid, t).unwrap();
        }
        let table_id = file.get_id();
        Database::global().add_table(file, alias);
        (table_id, tid)
    }

    // S4: L=(1,a),(2,b),(3,c); R=(1,x),(3,y),(3,z); join on id1 = id2.
    #[test]
    fn s4_nested_loops_join_orders_by_left_then_right() {
        let (l_id, tid) = table_of("join_left", &[(1, "a"), (2, "b"), (3, "c")]);
        let (r_id, _) = table_of("join_right", &[(1, "x"), (3, "y"), (3, "z")]);

        let left = SeqScan::new(tid, l_id, "l");
        let right = SeqScan::new(tid, r_id, "r");
        let predicate = JoinPredicate::new(0, Op::Equals, 0);
        let mut join = Join::new(predicate, Box::new(left), Box::new(right));
        join.open().unwrap();

        let mut out = Vec::new();
        while join.has_next().unwrap() {
            let t = join.next().unwrap();
            out.push((
                t.get_field(1).clone(),
                t.get_field(3).clone(),
            ));
        }
        join.close();

        assert_eq!(
            out,
            vec![
                (Field::Str("a".into()), Field::Str("x".into())),
                (Field::Str("c".into()), Field::Str("y".into())),
                (Field::Str("c".into()), Field::Str("z".into())),
            ]
        );
    }

    #[test]
    fn join_with_no_matches_is_empty() {
        let (l_id, tid) = table_of("join_nomatch_left", &[(1, "a")]);
        let (r_id, _) = table_of("join_nomatch_right", &[(2, "x")]);
        let left = SeqScan::new(tid, l_id, "l");
        let right = SeqScan::new(tid, r_id, "r");
        let predicate = JoinPredicate::new(0, Op::Equals, 0);
        let mut join = Join::new(predicate, Box::new(left), Box::new(right));
        join.open().unwrap();
        assert!(!join.has_next().unwrap());
    }
}

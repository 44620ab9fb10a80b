use std::fmt;
use std::sync::Arc;

use crate::error::SmallError;
use crate::field::Field;
use crate::page_id::RecordId;
use crate::types::FieldType;

// equality is by type sequence only; names are advisory and not compared.
#[derive(Clone, Debug, Default)]
pub struct TupleDesc {
    fields: Vec<(FieldType, Option<String>)>,
}

impl TupleDesc {
    pub fn new(fields: Vec<(FieldType, Option<String>)>) -> Self {
        Self { fields }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, i: usize) -> FieldType {
        self.fields[i].0
    }

    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.fields[i].1.as_deref()
    }

    pub fn size(&self) -> usize {
        self.fields.iter().map(|(t, _)| t.size()).sum()
    }

    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut fields = a.fields.clone();
        fields.extend(b.fields.clone());
        TupleDesc { fields }
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|((t1, _), (t2, _))| t1 == t2)
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(t, name)| match name {
                Some(n) => format!("{}({})", n, t),
                None => format!("{}", t),
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[derive(Clone, Debug)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(desc: Arc<TupleDesc>, fields: Vec<Field>) -> Result<Tuple, SmallError> {
        if fields.len() != desc.num_fields() {
            return Err(SmallError::SchemaMismatch(format!(
                "expected {} fields, got {}",
                desc.num_fields(),
                fields.len()
            )));
        }
        for (i, field) in fields.iter().enumerate() {
            check_field_matches(field, desc.field_type(i))?;
        }
        Ok(Tuple {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn parse(desc: Arc<TupleDesc>, bytes: &[u8]) -> Result<Tuple, SmallError> {
        let mut fields = Vec::with_capacity(desc.num_fields());
        let mut offset = 0;
        for i in 0..desc.num_fields() {
            let field_type = desc.field_type(i);
            let size = field_type.size();
            fields.push(Field::parse(&bytes[offset..offset + size], &field_type)?);
            offset += size;
        }
        Ok(Tuple {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>, SmallError> {
        let mut out = Vec::with_capacity(self.desc.size());
        for (i, field) in self.fields.iter().enumerate() {
            out.extend(field.serialize(&self.desc.field_type(i))?);
        }
        Ok(out)
    }

    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn get_field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    pub fn set_field(&mut self, i: usize, v: Field) -> Result<(), SmallError> {
        check_field_matches(&v, self.desc.field_type(i))?;
        self.fields[i] = v;
        Ok(())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }

    // output row is positional: |self.td| fields from self, then other's.
    pub fn concat(&self, other: &Tuple) -> Result<Tuple, SmallError> {
        let desc = Arc::new(TupleDesc::merge(&self.desc, &other.desc));
        let mut fields = self.fields.clone();
        fields.extend(other.fields.clone());
        Tuple::new(desc, fields)
    }
}

fn check_field_matches(field: &Field, expected: FieldType) -> Result<(), SmallError> {
    let ok = match (field, expected) {
        (Field::Int(_), FieldType::Int) => true,
        (Field::Str(s), FieldType::Str(lmax)) => s.len() <= lmax,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(SmallError::SchemaMismatch(format!(
            "field {:?} does not match type {:?}",
            field, expected
        )))
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(|field| field.to_string()).collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::init_log;
    use log::info;

    fn int_desc(n: usize) -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new(
            (0..n).map(|i| (FieldType::Int, Some(format!("f{}", i)))).collect(),
        ))
    }

    #[test]
    fn tuple_round_trips_through_bytes() {
        init_log();
        let desc = int_desc(2);
        let t = Tuple::new(desc.clone(), vec![Field::Int(1), Field::Int(-2)]).unwrap();
        let bytes = t.serialize().unwrap();
        assert_eq!(bytes.len(), desc.size());
        let t2 = Tuple::parse(desc, &bytes).unwrap();
        assert_eq!(t2.get_field(0), &Field::Int(1));
        assert_eq!(t2.get_field(1), &Field::Int(-2));
        info!("tuple: {}", t2);
    }

    #[test]
    fn tuple_desc_equality_ignores_names() {
        let a = TupleDesc::new(vec![(FieldType::Int, Some("a".into()))]);
        let b = TupleDesc::new(vec![(FieldType::Int, Some("b".into()))]);
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_field_type_is_schema_mismatch() {
        let desc = int_desc(1);
        let err = Tuple::new(desc, vec![Field::Str("x".into())]).unwrap_err();
        matches!(err, SmallError::SchemaMismatch(_));
    }

    #[test]
    fn concat_merges_descriptors_positionally() {
        let d1 = int_desc(1);
        let d2 = int_desc(1);
        let l = Tuple::new(d1, vec![Field::Int(1)]).unwrap();
        let r = Tuple::new(d2, vec![Field::Int(2)]).unwrap();
        let merged = l.concat(&r).unwrap();
        assert_eq!(merged.tuple_desc().num_fields(), 2);
        assert_eq!(merged.get_field(0), &Field::Int(1));
        assert_eq!(merged.get_field(1), &Field::Int(2));
    }
}

use std::cmp::Ordering;
use std::fmt;

use crate::error::SmallError;
use crate::predicate::Op;
use crate::types::FieldType;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Str(String),
}

impl Field {
    // for strings this is only the minimum Lmax implied by the content;
    // callers still must check against the schema's declared Lmax.
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Str(s) => FieldType::Str(s.len()),
        }
    }

    pub fn serialize(&self, field_type: &FieldType) -> Result<Vec<u8>, SmallError> {
        match (self, field_type) {
            (Field::Int(v), FieldType::Int) => Ok(v.to_be_bytes().to_vec()),
            (Field::Str(s), FieldType::Str(lmax)) => {
                let bytes = s.as_bytes();
                if bytes.len() > *lmax {
                    return Err(SmallError::SchemaMismatch(format!(
                        "string {:?} exceeds Lmax {}",
                        s, lmax
                    )));
                }
                let mut out = Vec::with_capacity(4 + lmax);
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
                out.resize(4 + lmax, 0);
                Ok(out)
            }
            _ => Err(SmallError::SchemaMismatch(format!(
                "field {:?} does not match type {:?}",
                self, field_type
            ))),
        }
    }

    pub fn parse(bytes: &[u8], field_type: &FieldType) -> Result<Field, SmallError> {
        match field_type {
            FieldType::Int => {
                if bytes.len() < 4 {
                    return Err(SmallError::IoError("short read for int field".into()));
                }
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&bytes[..4]);
                Ok(Field::Int(i32::from_be_bytes(buf)))
            }
            FieldType::Str(lmax) => {
                if bytes.len() < 4 + lmax {
                    return Err(SmallError::IoError("short read for string field".into()));
                }
                let mut len_buf = [0u8; 4];
                len_buf.copy_from_slice(&bytes[..4]);
                let len = u32::from_be_bytes(len_buf) as usize;
                let len = len.min(*lmax);
                let payload = &bytes[4..4 + len];
                let s = String::from_utf8_lossy(payload).into_owned();
                Ok(Field::Str(s))
            }
        }
    }

    // LIKE is substring containment, meaningful only between two strings;
    // false (never an error) for any other type combination.
    pub fn matches(&self, op: Op, other: &Field) -> bool {
        if op == Op::Like {
            return match (self, other) {
                (Field::Str(a), Field::Str(b)) => a.contains(b.as_str()),
                _ => false,
            };
        }

        let ord = match self.partial_cmp(other) {
            Some(ord) => ord,
            None => return false,
        };

        match op {
            Op::Equals => ord == Ordering::Equal,
            Op::NotEquals => ord != Ordering::Equal,
            Op::GreaterThan => ord == Ordering::Greater,
            Op::GreaterThanOrEq => ord != Ordering::Less,
            Op::LessThan => ord == Ordering::Less,
            Op::LessThanOrEq => ord != Ordering::Greater,
            Op::Like => unreachable!("handled above"),
        }
    }
}

impl PartialOrd for Field {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => a.partial_cmp(b),
            (Field::Str(a), Field::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Str(s) => write!(f, "{}", s),
        }
    }
}

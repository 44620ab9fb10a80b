use std::fmt;

/// A column type. `Str`'s payload is `Lmax`, the fixed maximum byte length
/// of the field's payload, fixed per schema position at construction.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum FieldType {
    Int,
    Str(usize),
}

impl FieldType {
    /// Serialized size in bytes: 4 for `Int`; 4 (length prefix) + `Lmax`
    /// for `Str`.
    pub fn size(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Str(lmax) => 4 + lmax,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldType::Int => write!(f, "int"),
            FieldType::Str(lmax) => write!(f, "string({})", lmax),
        }
    }
}

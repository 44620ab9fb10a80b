use std::{error::Error, fmt, io};

/// Crate-wide error taxonomy.
///
/// Every fallible operation in this crate returns `Result<T, SmallError>`.
/// Variants map directly onto the kinds a caller needs to distinguish
/// programmatically; the `String` payload is a human-readable detail for
/// logs, not part of the contract.
#[derive(Debug)]
pub enum SmallError {
    /// A tuple's descriptor does not match the target descriptor.
    SchemaMismatch(String),
    /// A page has no empty slot left to hold a new tuple.
    PageFull,
    /// Attempted to delete a tuple whose slot is already empty.
    AlreadyEmpty,
    /// A tuple's record id does not refer to a slot on the page addressed.
    NotOnPage,
    /// Backing-file read/write failure.
    IoError(String),
    /// Signalled by the buffer pool; must propagate to the caller.
    TransactionAborted,
    /// `next()` called past the end of an iterator.
    NoMoreTuples,
    /// Lifecycle misuse: `next` before `open`, `next` after `close`,
    /// `setChildren` with wrong arity, etc.
    IllegalState(String),
    /// Aggregator/field-type combination not supported (e.g. `SUM` over a
    /// string field).
    UnsupportedAggregate(String),
}

impl fmt::Display for SmallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SmallError::SchemaMismatch(msg) => {
                write!(f, "schema mismatch: {}", msg)
            }
            SmallError::PageFull => write!(f, "page is full"),
            SmallError::AlreadyEmpty => write!(f, "slot is already empty"),
            SmallError::NotOnPage => write!(f, "tuple is not on this page"),
            SmallError::IoError(msg) => write!(f, "io error: {}", msg),
            SmallError::TransactionAborted => write!(f, "transaction aborted"),
            SmallError::NoMoreTuples => write!(f, "no more tuples"),
            SmallError::IllegalState(msg) => write!(f, "illegal state: {}", msg),
            SmallError::UnsupportedAggregate(msg) => {
                write!(f, "unsupported aggregate: {}", msg)
            }
        }
    }
}

impl Error for SmallError {}

impl From<io::Error> for SmallError {
    fn from(e: io::Error) -> Self {
        SmallError::IoError(e.to_string())
    }
}

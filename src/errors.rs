//! Error kinds surfaced by the object model, the history walker and the
//! entry history resolver.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use thiserror::Error;

/// Errors produced while navigating the object graph.
///
/// Every variant carries the offending name, path or object id so callers
/// can report precisely what failed.
#[derive(Debug, Error)]
pub enum Error {
    /// A name, ref or path does not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// A referenced object is absent from the store.
    #[error("missing object {0}")]
    MissingObject(ObjectId),

    /// Path traversal hit an intermediate segment that is not a tree.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// A tag or ref points to an object of an unexpected kind.
    #[error("{name} points to a {kind}, expected a {expected}")]
    InvalidTarget {
        name: String,
        kind: ObjectType,
        expected: ObjectType,
    },

    /// The traversal observed a cancellation request.
    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid revision: {0}")]
    InvalidRevision(String),

    /// The object exists but its record could not be decoded.
    #[error("corrupt object {oid}: {reason}")]
    Corrupt { oid: ObjectId, reason: String },

    /// A resolver task panicked or was torn down by the runtime.
    #[error("history task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors meaning "this name or path is absent", as opposed to
    /// integrity or I/O failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub(crate) fn corrupt(oid: &ObjectId, err: anyhow::Error) -> Self {
        Error::Corrupt {
            oid: *oid,
            reason: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

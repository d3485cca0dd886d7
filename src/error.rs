//! Error types

use std::fmt;
use std::time::Duration;

/// Out of memory error
///
/// Raised by the engine when the node store would exceed its capacity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OutOfMemory;

impl fmt::Display for OutOfMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("decision diagram operation ran out of memory")
    }
}
impl std::error::Error for OutOfMemory {}

/// Result type of every engine operation that may allocate nodes.
pub type AllocResult<T> = std::result::Result<T, OutOfMemory>;

/// Errors reported by [`DdManager`](crate::manager::DdManager).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    /// An operand or the result has more nodes than the caller allowed.
    NodeLimitExceeded { limit: usize, nodes: usize },
    /// The wall-clock budget ran out before the operation started.
    TimeLimitExceeded { limit: Duration, elapsed: Duration },
    /// The node store is full.
    OutOfMemory,
    /// A handle belongs to another manager, or predates a `clear`.
    ManagerMismatch,
    /// Variable index is not below the manager's variable count.
    VariableOutOfRange { index: usize, num_vars: usize },
    /// The handle is not a positive variable indicator.
    NotAVariable,
    /// The handle is not a conjunction of positive variables.
    NotACube,
    /// Variable lists passed for renaming have different lengths.
    VariableListMismatch { from: usize, to: usize },
}

impl Error {
    /// Budget exhaustion that the caller may recover from by retrying with a
    /// smaller step.
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            Error::NodeLimitExceeded { .. } | Error::TimeLimitExceeded { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NodeLimitExceeded { limit, nodes } => {
                write!(f, "node limit exceeded: {} nodes, limit is {}", nodes, limit)
            }
            Error::TimeLimitExceeded { limit, elapsed } => {
                write!(
                    f,
                    "time limit exceeded: {} ms elapsed, limit is {} ms",
                    elapsed.as_millis(),
                    limit.as_millis()
                )
            }
            Error::OutOfMemory => fmt::Display::fmt(&OutOfMemory, f),
            Error::ManagerMismatch => f.write_str("handle belongs to a different manager"),
            Error::VariableOutOfRange { index, num_vars } => {
                write!(f, "variable {} is out of range, manager has {} variables", index, num_vars)
            }
            Error::NotAVariable => f.write_str("handle is not a variable"),
            Error::NotACube => f.write_str("handle is not a cube of positive variables"),
            Error::VariableListMismatch { from, to } => {
                write!(f, "variable lists differ in length: {} vs {}", from, to)
            }
        }
    }
}
impl std::error::Error for Error {}

impl From<OutOfMemory> for Error {
    fn from(_: OutOfMemory) -> Self {
        Error::OutOfMemory
    }
}

pub type Result<T> = std::result::Result<T, Error>;

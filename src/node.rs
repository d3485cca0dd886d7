use crate::reference::Ref;
use crate::types::Var;

/// A decision node: `variable ? high : low`.
///
/// `high` is the "then" child (taken when the variable is 1) and is never
/// complemented in a stored node; `low` is the "else" child. `next` links the
/// node into the collision chain of its unique sub-table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub variable: Var,
    pub low: Ref,
    pub high: Ref,
    pub next: u32,
}

impl Node {
    /// End-of-chain marker. Address 0 is the terminal, which is never chained.
    pub const NO_NEXT: u32 = 0;

    pub fn new(variable: Var, low: Ref, high: Ref) -> Self {
        Self {
            variable,
            low,
            high,
            next: Self::NO_NEXT,
        }
    }

    /// The terminal node stored at address 0.
    pub const fn terminal() -> Self {
        Self {
            variable: Var::TERMINAL,
            low: Ref::ONE,
            high: Ref::ONE,
            next: Self::NO_NEXT,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.variable.is_terminal()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::terminal()
    }
}

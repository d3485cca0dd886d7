//! Type-safe wrapper for BDD variables.
//!
//! Variables are 1-indexed. The value `0` is reserved for the terminal node and
//! acts as "past all real variables" in the ordering: [`Var::TERMINAL`] compares
//! greater than every real variable, so `min` over top variables always picks a
//! real variable when there is one.
use std::cmp::Ordering;
use std::fmt;

/// A variable identifier (1-indexed).
///
/// The variable order is fixed: a smaller ID is closer to the root.
///
/// # Invariants
///
/// - Real variable IDs are >= 1
/// - `Var(0)` is the terminal sentinel and sorts after every real variable
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Var(u32);

impl Var {
    /// The variable tag of the terminal node.
    pub const TERMINAL: Var = Var(0);

    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID as a `u32`.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Returns the ID as an index into per-variable tables (`id - 1`).
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub const fn is_terminal(self) -> bool {
        self.0 == 0
    }

    /// Position in the ordering, with the terminal mapped to `u32::MAX`.
    #[inline]
    const fn rank(self) -> u32 {
        self.0.wrapping_sub(1)
    }
}

impl Ord for Var {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Var {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "x⊤")
        } else {
            write!(f, "x{}", self.0)
        }
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.id(), 2);
        assert_eq!(v1.index(), 0);
        assert!(v1 < v2);
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_terminal_sorts_last() {
        assert!(Var::TERMINAL > Var::new(1));
        assert!(Var::TERMINAL > Var::new(u32::MAX));
        assert_eq!(Var::new(7).min(Var::TERMINAL), Var::new(7));
        assert_eq!(Var::TERMINAL.min(Var::TERMINAL), Var::TERMINAL);
    }

    #[test]
    fn test_var_display() {
        assert_eq!(Var::new(3).to_string(), "x3");
        assert_eq!(Var::TERMINAL.to_string(), "x⊤");
    }
}

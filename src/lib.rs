//! # symbolic-bdd: a complement-edge BDD engine for symbolic search
//!
//! **`symbolic-bdd`** represents sets of states and transition relations over
//! Boolean state variables as reduced, ordered Binary Decision Diagrams, and
//! provides the operators a symbolic search needs to compute images and
//! preimages of state sets.
//!
//! ## Key Features
//!
//! - **Complement edges**: negation is a bit flip on a [`Ref`][crate::reference::Ref] handle and never allocates.
//! - **Per-variable unique tables**: every `(variable, low, high)` triple is stored exactly once, so equal functions have equal handles.
//! - **Adaptive compute table**: a direct-mapped operation cache that grows or shrinks with its hit rate and memory pressure.
//! - **Relational product**: fused `∃ cube. (f ∧ g)` plus variable swapping for image computation.
//! - **Budgets**: the [`DdManager`][crate::manager::DdManager] facade enforces node-count and wall-clock limits as recoverable errors.
//!
//! ## Basic Usage
//!
//! ```rust
//! use symbolic_bdd::manager::DdManager;
//!
//! let mgr = DdManager::new(3);
//! let x0 = mgr.variable(0).unwrap();
//! let x1 = mgr.variable(1).unwrap();
//! let x2 = mgr.variable(2).unwrap();
//!
//! // f = x0 AND (x1 OR x2)
//! let f = mgr.and(x0, mgr.or(x1, x2, None).unwrap(), None).unwrap();
//! assert_eq!(mgr.node_count(f).unwrap(), 3);
//!
//! // Existentially quantify x1 and x2 away
//! let cube = mgr.cube(&[x1, x2]).unwrap();
//! assert_eq!(mgr.exist(f, cube).unwrap(), x0);
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: the engine manager [`Bdd`][crate::bdd::Bdd] with AND, XOR and ITE.
//! - **[`quantify`]** and **[`substitute`]**: quantification, restriction, composition and renaming.
//! - **[`manager`]**: the budgeted facade used by search code.
//!
//! Nodes are never reclaimed: a manager only grows until it is cleared.
//! The [handle registry](crate::manager::DdManager::register) reports how many
//! nodes are unreachable from the handles a caller keeps.

pub mod bdd;
pub mod budget;
pub mod cache;
pub mod error;
pub mod manager;
pub mod node;
pub mod quantify;
pub mod reference;
pub mod registry;
pub mod sat;
pub mod storage;
pub mod substitute;
pub mod subtable;
pub mod types;
pub mod unique;
pub mod utils;

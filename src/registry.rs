//! Live-handle registry.
//!
//! Callers register the handles they intend to keep and deregister them when
//! done. Registration is explicit and counted: a handle registered twice must
//! be deregistered twice. The registered handles are the roots from which
//! liveness is computed; the manager never reclaims nodes by itself.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::reference::Ref;

#[derive(Debug, Default)]
pub struct HandleRegistry {
    live: RefCell<HashMap<Ref, usize>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, f: Ref) {
        *self.live.borrow_mut().entry(f).or_insert(0) += 1;
    }

    /// Drop one registration of `f`. Returns false if `f` was not registered.
    pub fn deregister(&self, f: Ref) -> bool {
        let mut live = self.live.borrow_mut();
        match live.get_mut(&f) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                live.remove(&f);
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, f: Ref) -> bool {
        self.live.borrow().contains_key(&f)
    }

    /// Number of registrations, with multiplicity.
    pub fn len(&self) -> usize {
        self.live.borrow().values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.live.borrow().is_empty()
    }

    /// Distinct registered handles.
    pub fn roots(&self) -> Vec<Ref> {
        self.live.borrow().keys().copied().collect()
    }

    pub fn clear(&self) {
        self.live.borrow_mut().clear();
    }
}

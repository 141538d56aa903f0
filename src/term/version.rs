//! Time-shifting of state variables across unrolling steps.
//!
//! Version 0 is the current state, version 1 the next state. Shifting a
//! term moves every versioned variable through time and leaves unversioned
//! symbols and constants alone, so it commutes with the connectives and
//! with substitution of unversioned symbols.

use crate::common::*;
use crate::term::{Term, TermExt, Var, VarTag};

impl Var {
    /// The variable with its version increased by `k`.
    ///
    /// Identity on unversioned and occurrence-tagged variables.
    pub fn shift(self, k: i32) -> Var {
        match self.tag {
            VarTag::At(v) => Var {
                sym: self.sym,
                tag: VarTag::At(v + k),
            },
            _ => self,
        }
    }

    /// Attaches version 0 to an unversioned variable.
    pub fn version_zero(self) -> Var {
        debug_assert_eq! { self.tag, VarTag::Base }
        Var {
            sym: self.sym,
            tag: VarTag::At(0),
        }
    }

    /// True if the variable carries a time coordinate.
    pub fn is_versioned(self) -> bool {
        match self.tag {
            VarTag::At(_) => true,
            _ => false,
        }
    }

    /// Drops the time coordinate.
    pub fn unversioned(self) -> Var {
        debug_assert! { self.is_versioned() }
        Var {
            sym: self.sym,
            tag: VarTag::Base,
        }
    }

    /// The version of the variable, if any.
    pub fn version(self) -> Option<i32> {
        match self.tag {
            VarTag::At(v) => Some(v),
            _ => None,
        }
    }
}

/// Shifts every versioned variable of a term by `k`.
pub fn shift(term: &Term, k: i32) -> Term {
    if k == 0 {
        return term.clone();
    }
    term.map_vars(|v| v.shift(k))
}

/// True if the formula only mentions version-0 variables.
pub fn is_pure_state_formula(term: &Term) -> bool {
    crate::term::vars(term)
        .into_iter()
        .all(|v| v.version() == Some(0))
}

/// True if the formula only mentions version-0 and version-1 variables.
pub fn is_pure_transition_formula(term: &Term) -> bool {
    crate::term::vars(term)
        .into_iter()
        .all(|v| match v.version() {
            Some(0) | Some(1) => true,
            _ => false,
        })
}

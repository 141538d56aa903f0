//! Base types and functions.

pub use std::collections::{BTreeMap, HashMap, HashSet};
pub use std::fmt;
pub use std::io::Write;

pub use rsmt2::SmtRes;

pub use crate::errors::*;
pub use crate::term::{self, Op, Term, TermExt, Typ, Val, Var, VarTag};

#[macro_use]
pub mod macros;
mod wrappers;
pub mod config;
pub mod smt;

pub use self::config::Config;
pub use self::wrappers::*;

/// Integers.
pub type Int = ::num::BigInt;

/// Set of variables.
pub type VarSet = HashSet<Var>;
/// Map from variables to something, typically terms in a substitution.
pub type VarHMap<T> = HashMap<Var, T>;

lazy_static! {
    /// Configuration from clap.
    pub static ref conf: Config = Config::clap();
}

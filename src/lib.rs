//! Hornbeam is a solver core for Constrained Horn Clause (CHC) verification.
//!
//! A CHC problem is given as a directed (hyper)graph: vertices are predicate
//! symbols, edges are the clauses, labeled with a quantifier-free constraint
//! over the current-state variables of the source predicate(s) and the
//! next-state variables of the target predicate. The [`transform`] pipeline
//! rewrites such a graph towards the canonical two-edge shape that [`ts`]
//! recognizes as a transition system, and the [`engine`]s decide safety of
//! the result:
//!
//! - [`engine::bmc`]: plain bounded model checking,
//! - [`engine::kind`]: simultaneous forward/backward k-induction,
//! - [`engine::accel`]: bounded model checking in exponentially growing
//!   step jumps, with fixed-point detection.
//!
//! Terms are hashconsed and managed by a process-wide factory ([`term`]);
//! SMT queries go to a z3 process through `rsmt2`.
//!
//! [`transform`]: transform/index.html (transform module)
//! [`ts`]: ts/index.html (ts module)
//! [`engine`]: engine/index.html (engine module)
//! [`engine::bmc`]: engine/bmc/index.html (bmc module)
//! [`engine::kind`]: engine/kind/index.html (kind module)
//! [`engine::accel`]: engine/accel/index.html (accel module)
//! [`term`]: term/index.html (term module)

#![allow(non_upper_case_globals)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate clap;

pub mod errors;
#[macro_use]
pub mod common;
pub mod term;
pub mod graph;
pub mod transform;
pub mod ts;
pub mod engine;

pub use crate::common::conf;
pub use crate::errors::{Error, ErrorKind, Res};

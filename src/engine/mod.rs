//! Verification engines and their common surface.
//!
//! Every engine decides safety of a linear CHC graph, and of a hypergraph
//! by normalizing it first where its contract allows. Answers are `Safe`,
//! `Unsafe` or `Unknown`; when witness computation is active a `Safe`
//! answer carries predicate interpretations and an `Unsafe` answer carries
//! the unrolled derivation path.

use crate::common::smt::SmtCtx;
use crate::common::*;
use crate::graph::{ChcDirectedGraph, ChcDirectedHyperGraph};
use crate::term::version;
use crate::ts::TransitionSystem;

pub mod accel;
pub mod bmc;
pub mod kind;

pub use self::accel::{AcceleratedBmc, AcceleratedBmcSingle};
pub use self::bmc::Bmc;
pub use self::kind::Kind;

/// Verification answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationAnswer {
    /// The system is safe.
    Safe,
    /// The system has a counterexample.
    Unsafe,
    /// The engine could not decide.
    Unknown,
}
impl fmt::Display for VerificationAnswer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VerificationAnswer::Safe => write!(fmt, "safe"),
            VerificationAnswer::Unsafe => write!(fmt, "unsafe"),
            VerificationAnswer::Unknown => write!(fmt, "unknown"),
        }
    }
}

/// A safety proof: one interpretation per non-sentinel predicate.
#[derive(Debug, Clone)]
pub struct ValidityWitness {
    /// Interpretations, over each predicate's canonical state variables.
    pub interpretations: SymHMap<Term>,
}
impl ValidityWitness {
    /// Witness of a single-loop graph, interpreting its loop predicate by
    /// the given inductive invariant.
    pub fn from_transition_system(graph: &ChcDirectedGraph, invariant: Term) -> Self {
        let mut interpretations = SymHMap::new();
        for sym in graph.get_vertices() {
            if sym != graph.entry() && sym != graph.exit() {
                interpretations.insert(sym, invariant.clone());
            }
        }
        ValidityWitness { interpretations }
    }
}

/// A counterexample: the derivation path through the graph.
#[derive(Debug, Clone)]
pub struct InvalidityWitness {
    /// Edges of the derivation, entry to exit.
    pub derivation: Vec<EId>,
    /// Number of loop unrollings.
    pub depth: usize,
}
impl InvalidityWitness {
    /// Witness of a single-loop graph: the entry edge, `depth` unrollings
    /// of the self-loop, and the exit edge.
    pub fn from_transition_system(graph: &ChcDirectedGraph, depth: usize) -> Self {
        let mut entry_edge = None;
        let mut exit_edge = None;
        let mut loop_edge = None;
        graph.for_each_edge(|edge| {
            if edge.from == graph.entry() {
                entry_edge = Some(edge.id)
            } else if edge.to == graph.exit() {
                exit_edge = Some(edge.id)
            } else if edge.from == edge.to {
                loop_edge = Some(edge.id)
            }
        });
        let mut derivation = vec![];
        if let Some(eid) = entry_edge {
            derivation.push(eid)
        }
        if let Some(eid) = loop_edge {
            for _ in 0..depth {
                derivation.push(eid)
            }
        }
        if let Some(eid) = exit_edge {
            derivation.push(eid)
        }
        InvalidityWitness { derivation, depth }
    }
}

/// A witness, either flavor.
#[derive(Debug, Clone)]
pub enum Witness {
    /// Safety proof.
    Validity(ValidityWitness),
    /// Counterexample.
    Invalidity(InvalidityWitness),
}

/// A verification answer with its optional witness.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// The answer.
    pub answer: VerificationAnswer,
    /// The witness, when computed.
    pub witness: Option<Witness>,
}
impl VerificationResult {
    /// An answer without witness.
    pub fn new(answer: VerificationAnswer) -> Self {
        VerificationResult {
            answer,
            witness: None,
        }
    }
    /// The unknown answer.
    pub fn unknown() -> Self {
        Self::new(VerificationAnswer::Unknown)
    }
    /// A safe answer carrying a witness.
    pub fn safe_with(witness: ValidityWitness) -> Self {
        VerificationResult {
            answer: VerificationAnswer::Safe,
            witness: Some(Witness::Validity(witness)),
        }
    }
    /// An unsafe answer carrying a witness.
    pub fn unsafe_with(witness: InvalidityWitness) -> Self {
        VerificationResult {
            answer: VerificationAnswer::Unsafe,
            witness: Some(Witness::Invalidity(witness)),
        }
    }
}

/// The engine interface.
pub trait Engine {
    /// Name of the engine, for logging.
    fn name(&self) -> &'static str;

    /// Decides safety of a linear graph.
    fn solve(&mut self, graph: &ChcDirectedGraph) -> Res<VerificationResult>;

    /// Decides safety of a hypergraph.
    ///
    /// Engines that only handle transition systems either run the
    /// normalization pipeline first or refuse with `Unsupported`.
    fn solve_hyper(&mut self, graph: ChcDirectedHyperGraph) -> Res<VerificationResult>;
}

/// Checks the three obligations of an inductive invariant against a
/// transition system: `init ⇒ I`, `I ∧ transition ⇒ I′`, `I ⇒ ¬query`.
pub fn validate_validity(system: &TransitionSystem, invariant: &Term) -> Res<bool> {
    let mut solver = SmtCtx::new("validate")?;
    let neg_inv = term::not(invariant.clone());
    let obligations = vec![
        term::and(vec![system.init().clone(), neg_inv.clone()]),
        term::and(vec![
            invariant.clone(),
            system.transition().clone(),
            version::shift(&neg_inv, 1),
        ]),
        term::and(vec![invariant.clone(), system.query().clone()]),
    ];
    for obligation in obligations {
        solver.push()?;
        solver.assert(&obligation)?;
        let sat = solver.check_sat()?;
        solver.pop()?;
        if sat {
            solver.kill()?;
            return Ok(false);
        }
    }
    solver.kill()?;
    Ok(true)
}

/// Checks the shape of an invalidity witness against its graph: the
/// derivation must connect edge to edge, start at the entry and end at the
/// exit.
pub fn validate_invalidity(graph: &ChcDirectedGraph, witness: &InvalidityWitness) -> bool {
    let derivation = &witness.derivation;
    if derivation.is_empty() {
        return false;
    }
    if graph.source(derivation[0]) != graph.entry() {
        return false;
    }
    if graph.target(derivation[derivation.len() - 1]) != graph.exit() {
        return false;
    }
    derivation
        .windows(2)
        .all(|pair| graph.target(pair[0]) == graph.source(pair[1]))
}

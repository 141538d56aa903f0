//! Plain bounded model checking.
//!
//! Unrolls the transition relation step by step, checking after each
//! unrolling whether the query is reachable. Proves unsafety only, except
//! for the degenerate safe case of an empty initial-state set.

use crate::common::smt::SmtCtx;
use crate::common::*;
use crate::engine::{
    Engine, InvalidityWitness, ValidityWitness, VerificationAnswer, VerificationResult,
};
use crate::graph::{ChcDirectedGraph, ChcDirectedHyperGraph};
use crate::term::version;
use crate::transform;
use crate::ts::{self, TransitionSystem};

/// The bounded model checker.
pub struct Bmc;

impl Bmc {
    /// Constructor.
    pub fn new() -> Self {
        Bmc
    }

    /// The unrolling loop.
    fn solve_transition_system(
        &mut self,
        system: &TransitionSystem,
        graph: &ChcDirectedGraph,
    ) -> Res<VerificationResult> {
        let mut solver = SmtCtx::new("bmc")?;
        solver.assert(system.init())?;
        if !solver.check_sat()? {
            log! { @1 "BMC: system has no initial states" }
            return Ok(safe_empty_init(graph));
        }

        for k in 0..conf.max_k {
            let versioned_query = version::shift(system.query(), k as i32);
            solver.push()?;
            solver.assert(&versioned_query)?;
            if solver.check_sat()? {
                log! { @1 "BMC: bug found in depth {}", k }
                if conf.witness {
                    return Ok(VerificationResult::unsafe_with(
                        InvalidityWitness::from_transition_system(graph, k),
                    ));
                } else {
                    return Ok(VerificationResult::new(VerificationAnswer::Unsafe));
                }
            }
            log! { @2 "BMC: no path of length {} found", k }
            solver.pop()?;
            solver.assert(&version::shift(system.transition(), k as i32))?;
        }
        Ok(VerificationResult::unknown())
    }
}

/// The safe result for a system with an unsatisfiable initial-state set.
pub(crate) fn safe_empty_init(graph: &ChcDirectedGraph) -> VerificationResult {
    if conf.witness {
        VerificationResult::safe_with(ValidityWitness::from_transition_system(
            graph,
            term::fls(),
        ))
    } else {
        VerificationResult::new(VerificationAnswer::Safe)
    }
}

/// Turns a solver `unknown` into the unknown answer.
pub(crate) fn absorb_unknown(res: Res<VerificationResult>) -> Res<VerificationResult> {
    match res {
        Err(ref e) if e.is_smt_unknown() => Ok(VerificationResult::unknown()),
        other => other,
    }
}

impl Engine for Bmc {
    fn name(&self) -> &'static str {
        "bmc"
    }

    fn solve(&mut self, graph: &ChcDirectedGraph) -> Res<VerificationResult> {
        if !ts::is_transition_system(graph) {
            return Ok(VerificationResult::unknown());
        }
        let system = ts::to_transition_system(graph)?;
        absorb_unknown(self.solve_transition_system(&system, graph))
    }

    fn solve_hyper(&mut self, graph: ChcDirectedHyperGraph) -> Res<VerificationResult> {
        let pipeline = transform::towards_transition_systems();
        let (transformed, translator) = pipeline.transform(graph)?;
        if !transformed.is_normal_graph() {
            return Ok(VerificationResult::unknown());
        }
        let normal = transformed.to_normal_graph()?;
        let res = self.solve(&normal)?;
        let res = transform::denormalize(res);
        if conf.witness {
            translator.translate(res)
        } else {
            Ok(res)
        }
    }
}

//! k-induction.
//!
//! Runs three solver contexts side by side:
//!
//! - **base** explores bounded paths from the initial states and reports
//!   unsafety as soon as the query is reachable;
//! - **step forward** checks whether the negated query is k-inductive,
//!   accumulating `query(x₀) ∧ Tr(x₁,x₀) ∧ ¬query(x₁) ∧ …` (the unrolling
//!   read backwards through the reversed transition relation);
//! - **step backward** does the same for the negated initial states on the
//!   reversed system.
//!
//! The base context pops its query before asserting the next transition;
//! the step contexts push without popping, accumulating the unrolled step
//! hypothesis for the whole run.

use crate::common::smt::SmtCtx;
use crate::common::*;
use crate::engine::bmc::{absorb_unknown, safe_empty_init};
use crate::engine::{
    Engine, InvalidityWitness, ValidityWitness, VerificationAnswer, VerificationResult,
};
use crate::graph::{ChcDirectedGraph, ChcDirectedHyperGraph};
use crate::term::version;
use crate::transform;
use crate::ts::{self, TransitionSystem};

/// The k-induction engine.
pub struct Kind;

impl Kind {
    /// Constructor.
    pub fn new() -> Self {
        Kind
    }

    /// The simultaneous base/step loop.
    fn solve_transition_system(
        &mut self,
        system: &TransitionSystem,
        graph: &ChcDirectedGraph,
    ) -> Res<VerificationResult> {
        let init = system.init().clone();
        let query = system.query().clone();
        let transition = system.transition().clone();
        let backward_transition = system.reverse_transition_relation();
        let neg_query = term::not(query.clone());
        let neg_init = term::not(init.clone());

        let mut base = SmtCtx::new("kind-base")?;
        let mut step_forward = SmtCtx::new("kind-step-forward")?;
        let mut step_backward = SmtCtx::new("kind-step-backward")?;

        base.assert(&init)?;
        step_backward.assert(&init)?;
        step_forward.assert(&query)?;

        if !base.check_sat()? {
            log! { @1 "KIND: system has no initial states" }
            return Ok(safe_empty_init(graph));
        }

        for k in 0..conf.max_k {
            let versioned_query = version::shift(&query, k as i32);

            // base case
            base.push()?;
            base.assert(&versioned_query)?;
            if base.check_sat()? {
                log! { @1 "KIND: bug found in depth {}", k }
                if conf.witness {
                    return Ok(VerificationResult::unsafe_with(
                        InvalidityWitness::from_transition_system(graph, k),
                    ));
                } else {
                    return Ok(VerificationResult::new(VerificationAnswer::Unsafe));
                }
            }
            log! { @2 "KIND: no path of length {} found", k }
            base.pop()?;
            base.assert(&version::shift(&transition, k as i32))?;

            // step forward
            if !step_forward.check_sat()? {
                log! { @1
                    "KIND: found invariant with forward induction, \
                     which is {}-inductive", k
                }
                return Ok(self.forward_induction_result(graph, system, k));
            }
            step_forward.push()?;
            step_forward.assert(&version::shift(&backward_transition, k as i32))?;
            step_forward.assert(&version::shift(&neg_query, (k + 1) as i32))?;

            // step backward
            if !step_backward.check_sat()? {
                log! { @1
                    "KIND: found invariant with backward induction, \
                     which is {}-inductive", k
                }
                return Ok(self.backward_induction_result(graph, system, k));
            }
            step_backward.push()?;
            step_backward.assert(&version::shift(&transition, k as i32))?;
            step_backward.assert(&version::shift(&neg_init, (k + 1) as i32))?;
        }
        Ok(VerificationResult::unknown())
    }

    /// Safe result from a k-inductive negated query.
    fn forward_induction_result(
        &self,
        graph: &ChcDirectedGraph,
        system: &TransitionSystem,
        k: usize,
    ) -> VerificationResult {
        if !conf.witness {
            return VerificationResult::new(VerificationAnswer::Safe);
        }
        let kinductive = term::not(system.query().clone());
        match ts::kinductive_to_inductive(&kinductive, k, system) {
            Some(invariant) => VerificationResult::safe_with(
                ValidityWitness::from_transition_system(graph, invariant),
            ),
            None => {
                log! { @1 "KIND: could not strengthen the invariant, dropping the witness" }
                VerificationResult::new(VerificationAnswer::Safe)
            }
        }
    }

    /// Safe result from a k-inductive negated init on the reversed system.
    ///
    /// The step context proved that every k-step unrolling from the
    /// initial states revisits them, so the states within `k - 1` steps of
    /// the initial ones are closed under the transition relation; that
    /// bounded reach set is the invariant handed out.
    fn backward_induction_result(
        &self,
        graph: &ChcDirectedGraph,
        system: &TransitionSystem,
        k: usize,
    ) -> VerificationResult {
        if !conf.witness {
            return VerificationResult::new(VerificationAnswer::Safe);
        }
        match ts::bounded_reach_invariant(k, system) {
            Some(invariant) => VerificationResult::safe_with(
                ValidityWitness::from_transition_system(graph, invariant),
            ),
            None => {
                log! { @1 "KIND: could not strengthen the invariant, dropping the witness" }
                VerificationResult::new(VerificationAnswer::Safe)
            }
        }
    }
}

impl Engine for Kind {
    fn name(&self) -> &'static str {
        "kind"
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

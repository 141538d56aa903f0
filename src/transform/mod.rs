//! Structural graph transformations and their back-translators.
//!
//! A transformation consumes a hypergraph and produces a rewritten graph
//! together with a *back-translator* mapping verification results of the
//! output back to the input. The pipeline composes transformations left to
//! right and their translators right to left, as a stack.
//!
//! [`towards_transition_systems`] is the pipeline that converges any
//! single-chain-with-a-loop problem into the canonical two-edge shape the
//! transition-system extraction recognizes.
//!
//! [`towards_transition_systems`]: fn.towards_transition_systems.html
//! (towards_transition_systems function)

use crate::common::*;
use crate::engine::{VerificationResult, Witness};
use crate::graph::ChcDirectedHyperGraph;
use crate::term::TermExt;

mod merge;
mod nonloop;
mod remove_false;

#[cfg(test)]
mod test;

pub use self::merge::MultiEdgeMerger;
pub use self::nonloop::NonLoopEliminator;
pub use self::remove_false::FalseClauseRemoval;

/// Maps a verification result of a transformed graph back to the graph the
/// transformation was applied to.
pub trait BackTranslator {
    /// Translates a result.
    fn translate(&self, result: VerificationResult) -> Res<VerificationResult>;
}

/// Translator of the transformations that preserve witnesses as they are.
pub struct IdentityTranslator;
impl BackTranslator for IdentityTranslator {
    fn translate(&self, result: VerificationResult) -> Res<VerificationResult> {
        Ok(result)
    }
}

/// A structural rewrite of a hypergraph.
pub trait Transformation {
    /// Name of the transformation, for logging.
    fn name(&self) -> &'static str;

    /// Rewrites a graph; the input is dropped.
    ///
    /// Shape errors surface to the caller, they are never swallowed.
    fn transform(
        &self,
        graph: ChcDirectedHyperGraph,
    ) -> Res<(ChcDirectedHyperGraph, Box<dyn BackTranslator>)>;
}

/// A sequence of transformations applied left to right.
pub struct TransformationPipeline {
    /// The stages.
    stages: Vec<Box<dyn Transformation>>,
}

impl TransformationPipeline {
    /// Constructor.
    pub fn new(stages: Vec<Box<dyn Transformation>>) -> Self {
        TransformationPipeline { stages }
    }

    /// Applies all stages; the composed back-translator undoes them in
    /// reverse order.
    pub fn transform(
        &self,
        graph: ChcDirectedHyperGraph,
    ) -> Res<(ChcDirectedHyperGraph, Box<dyn BackTranslator>)> {
        let mut graph = graph;
        let mut translators = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            log! { @2 "applying `{}` ({} edge(s))", stage.name(), graph.edge_count() }
            let (rewritten, translator) = stage.transform(graph)?;
            graph = rewritten;
            translators.push(translator);
        }
        Ok((graph, Box::new(StackedTranslator { translators })))
    }
}

/// Composition of the stage translators, applied in reverse order.
struct StackedTranslator {
    /// Stage translators, in application order.
    translators: Vec<Box<dyn BackTranslator>>,
}
impl BackTranslator for StackedTranslator {
    fn translate(&self, result: VerificationResult) -> Res<VerificationResult> {
        let mut result = result;
        for translator in self.translators.iter().rev() {
            result = translator.translate(result)?;
        }
        Ok(result)
    }
}

/// The pipeline converging towards transition systems:
/// merge parallel edges, contract every loop-free vertex, drop falsified
/// clauses, and merge the parallel edges the contraction introduced.
pub fn towards_transition_systems() -> TransformationPipeline {
    TransformationPipeline::new(vec![
        Box::new(MultiEdgeMerger),
        Box::new(NonLoopEliminator),
        Box::new(FalseClauseRemoval),
        Box::new(MultiEdgeMerger),
    ])
}

/// Rebases a result of a normalized (linear) graph onto the hypergraph it
/// was extracted from.
///
/// Edge ids survive normalization, so derivations pass through; validity
/// interpretations move from the version-0 state tuples to the unversioned
/// base tuples.
pub fn denormalize(result: VerificationResult) -> VerificationResult {
    match result.witness {
        Some(Witness::Validity(mut witness)) => {
            for interp in witness.interpretations.values_mut() {
                *interp = interp.map_vars(|v| {
                    if v.version() == Some(0) {
                        v.unversioned()
                    } else {
                        v
                    }
                });
            }
            VerificationResult {
                answer: result.answer,
                witness: Some(Witness::Validity(witness)),
            }
        }
        _ => result,
    }
}

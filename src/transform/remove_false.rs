//! Falsified-clause removal.

use crate::common::*;
use crate::graph::ChcDirectedHyperGraph;
use crate::transform::{BackTranslator, IdentityTranslator, Transformation};

/// Drops every edge whose label is syntactically `⊥`.
///
/// A derivation never uses a falsified clause and interpretations satisfy
/// it vacuously, so witnesses pass through unchanged.
pub struct FalseClauseRemoval;

impl Transformation for FalseClauseRemoval {
    fn name(&self) -> &'static str {
        "false clause removal"
    }

    fn transform(
        &self,
        mut graph: ChcDirectedHyperGraph,
    ) -> Res<(ChcDirectedHyperGraph, Box<dyn BackTranslator>)> {
        let before = graph.edge_count();
        graph.delete_false_edges();
        if graph.edge_count() != before {
            log! { @3 "removed {} falsified clause(s)", before - graph.edge_count() }
        }
        Ok((graph, Box::new(IdentityTranslator)))
    }
}

//! Parallel-edge merging.

use crate::common::*;
use crate::graph::ChcDirectedHyperGraph;
use crate::transform::{BackTranslator, IdentityTranslator, Transformation};

/// Replaces every group of parallel single-source edges by one edge
/// labeled with the disjunction of the group's labels.
///
/// The surviving edge keeps its id, so witnesses of the merged graph are
/// witnesses of the input graph as they stand; picking the exact disjunct
/// of a derivation step back apart would need the step's model, which the
/// witness does not carry.
pub struct MultiEdgeMerger;

impl Transformation for MultiEdgeMerger {
    fn name(&self) -> &'static str {
        "multi-edge merger"
    }

    fn transform(
        &self,
        mut graph: ChcDirectedHyperGraph,
    ) -> Res<(ChcDirectedHyperGraph, Box<dyn BackTranslator>)> {
        let changed = graph.merge_multi_edges();
        if changed {
            log! { @3 "merged parallel edges, {} edge(s) remain", graph.edge_count() }
        }
        Ok((graph, Box::new(IdentityTranslator)))
    }
}

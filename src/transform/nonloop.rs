//! Loop-free vertex elimination.

use crate::common::*;
use crate::engine::{VerificationResult, Witness};
use crate::graph::{AdjacencyLists, ChcDirectedHyperGraph};
use crate::term::{qe, TermExt};
use crate::transform::{BackTranslator, Transformation};

/// Contracts every vertex without a self-loop, sentinels excepted, until
/// none remains.
///
/// Vertices are visited in reverse post-order from the entry, which keeps
/// chains from being re-contracted quadratically. A vertex adjacent to a
/// true hyperedge is skipped; a vertex with a self-loop is preserved
/// regardless of its degree.
pub struct NonLoopEliminator;

/// An incoming edge of an eliminated vertex, as it was before contraction.
///
/// Adjacent edges of a contracted vertex are linear, so one source each.
struct StoredEdge {
    /// Source symbol.
    source: SymIdx,
    /// Base tuple of the source, captured at elimination time.
    source_base: Vec<Term>,
    /// Source-occurrence tuple the label uses.
    source_occ: Vec<Term>,
    /// Label of the edge.
    label: Term,
}

/// Everything needed to undo one vertex elimination.
struct EliminationRecord {
    /// The eliminated symbol.
    sym: SymIdx,
    /// Its base tuple.
    base_tuple: Vec<Term>,
    /// Its target tuple, the namespace incoming labels constrain.
    target_tuple: Vec<Term>,
    /// Its incoming edges before contraction.
    incoming: Vec<StoredEdge>,
    /// Summary edges created: `(summary, incoming, outgoing)`.
    merges: Vec<(EId, EId, EId)>,
}

impl Transformation for NonLoopEliminator {
    fn name(&self) -> &'static str {
        "non-loop eliminator"
    }

    fn transform(
        &self,
        mut graph: ChcDirectedHyperGraph,
    ) -> Res<(ChcDirectedHyperGraph, Box<dyn BackTranslator>)> {
        let entry = graph.entry();
        let exit = graph.exit();
        let mut records = vec![];
        let mut changed = true;
        while changed {
            changed = false;
            let order = {
                let adjacency = AdjacencyLists::of_hyper(&graph);
                graph.reverse_post_order(&adjacency)
            };
            for sym in order {
                if sym == entry || sym == exit {
                    continue;
                }
                // earlier contractions may have changed the neighborhood
                let adjacency = AdjacencyLists::of_hyper(&graph);
                let incoming = adjacency.incoming(sym);
                let outgoing = adjacency.outgoing(sym);
                if incoming.is_empty() && outgoing.is_empty() {
                    continue;
                }
                if graph.self_loop_of(sym, &adjacency).is_some() {
                    continue;
                }
                if incoming
                    .iter()
                    .chain(outgoing)
                    .any(|&eid| graph.sources(eid).len() > 1)
                {
                    continue;
                }

                let stored: Vec<StoredEdge> = incoming
                    .iter()
                    .map(|&eid| {
                        let source = graph.sources(eid)[0];
                        StoredEdge {
                            source,
                            source_base: graph.repr().base_tuple(source).to_vec(),
                            source_occ: graph.source_tuple(source, 0),
                            label: graph.label(eid).clone(),
                        }
                    })
                    .collect();
                let base_tuple = graph.repr().base_tuple(sym).to_vec();
                let target_tuple = graph.target_tuple(sym);
                let merges = graph.contract_vertex(sym)?;
                log! { @3 "contracted vertex `{}`", graph.preds().name(sym) }
                records.push(EliminationRecord {
                    sym,
                    base_tuple,
                    target_tuple,
                    incoming: stored,
                    merges,
                });
                changed = true
            }
        }
        Ok((
            graph,
            Box::new(NonLoopTranslator { entry, records }),
        ))
    }
}

/// Undoes the eliminations on a verification result.
struct NonLoopTranslator {
    /// The entry sentinel of the graph.
    entry: SymIdx,
    /// Eliminations, in the order they happened.
    records: Vec<EliminationRecord>,
}

impl BackTranslator for NonLoopTranslator {
    fn translate(&self, result: VerificationResult) -> Res<VerificationResult> {
        match result.witness {
            Some(Witness::Invalidity(mut witness)) => {
                witness.derivation = self.expand_derivation(&witness.derivation);
                Ok(VerificationResult {
                    answer: result.answer,
                    witness: Some(Witness::Invalidity(witness)),
                })
            }
            Some(Witness::Validity(mut witness)) => {
                if self.reconstruct_interpretations(&mut witness.interpretations) {
                    Ok(VerificationResult {
                        answer: result.answer,
                        witness: Some(Witness::Validity(witness)),
                    })
                } else {
                    log! { @1
                        "could not reconstruct interpretations of contracted \
                         vertices, dropping the witness"
                    }
                    Ok(VerificationResult {
                        answer: result.answer,
                        witness: None,
                    })
                }
            }
            None => Ok(result),
        }
    }
}

impl NonLoopTranslator {
    /// Replaces every summary step of a derivation by the pair of edges it
    /// merged, recursively.
    fn expand_derivation(&self, derivation: &[EId]) -> Vec<EId> {
        let mut expansion: EIdHMap<(EId, EId)> = EIdHMap::new();
        for record in &self.records {
            for &(summary, incoming, outgoing) in &record.merges {
                expansion.insert(summary, (incoming, outgoing));
            }
        }
        fn expand(eid: EId, expansion: &EIdHMap<(EId, EId)>, out: &mut Vec<EId>) {
            if let Some(&(incoming, outgoing)) = expansion.get(&eid) {
                expand(incoming, expansion, out);
                expand(outgoing, expansion, out);
            } else {
                out.push(eid)
            }
        }
        let mut out = vec![];
        for &eid in derivation {
            expand(eid, &expansion, &mut out)
        }
        out
    }

    /// Computes an interpretation for every eliminated vertex from the
    /// interpretations of its predecessors: the disjunction, over its
    /// incoming edges, of the edge's post-image.
    ///
    /// Records are processed youngest first, so a predecessor is either a
    /// surviving vertex or an already-reconstructed one. True on success.
    fn reconstruct_interpretations(&self, interpretations: &mut SymHMap<Term>) -> bool {
        for record in self.records.iter().rev() {
            let mut disjuncts = Vec::with_capacity(record.incoming.len());
            for edge in &record.incoming {
                let source_interp = if edge.source == self.entry {
                    term::tru()
                } else {
                    match interpretations.get(&edge.source) {
                        Some(interp) => interp.clone(),
                        None => return false,
                    }
                };
                let to_occ = term::tuple_subst(&edge.source_base, &edge.source_occ);
                let fla = term::and(vec![source_interp.subst(&to_occ), edge.label.clone()]);
                let keep: VarSet = record
                    .target_tuple
                    .iter()
                    .map(|t| t.get().var().expect("canonical tuples hold variables"))
                    .collect();
                let projected = qe::try_eliminate_vars_except(&keep, &fla);
                let leftovers: VarSet = term::vars(&projected)
                    .into_iter()
                    .filter(|v| !keep.contains(v))
                    .collect();
                if !leftovers.is_empty() {
                    return false;
                }
                let rebase = term::tuple_subst(&record.target_tuple, &record.base_tuple);
                disjuncts.push(projected.subst(&rebase))
            }
            interpretations.insert(record.sym, term::or(disjuncts));
        }
        true
    }
}

//! Tests for the transformation pipeline and its back-translators.

use crate::common::*;
use crate::engine::{
    validate_invalidity, InvalidityWitness, ValidityWitness, VerificationAnswer,
    VerificationResult, Witness,
};
use crate::graph::{ChcDirectedHyperGraph, NonlinearRepr, Preds};
use crate::transform::*;
use crate::ts;

/// `ENTRY → A → B → P (self-loop) → EXIT` as a hypergraph.
///
/// The chain computes `a = 0`, `b = a + 1`, `p = b + 1`; the loop is
/// `p′ = p + 1` and the query `p ≥ 10`.
fn chain_graph() -> ChcDirectedHyperGraph {
    let mut preds = Preds::new();
    let a = preds.add("A", vec![Typ::Int]);
    let b = preds.add("B", vec![Typ::Int]);
    let p = preds.add("P", vec![Typ::Int]);
    let repr = NonlinearRepr::of_preds(&preds);
    let entry = preds.entry();
    let exit = preds.exit();
    let a_tgt = repr.target_tuple(a)[0].clone();
    let a_src = repr.source_tuple(a, 0)[0].clone();
    let b_tgt = repr.target_tuple(b)[0].clone();
    let b_src = repr.source_tuple(b, 0)[0].clone();
    let p_tgt = repr.target_tuple(p)[0].clone();
    let p_src = repr.source_tuple(p, 0)[0].clone();
    ChcDirectedHyperGraph::new(
        vec![
            (vec![entry], a, term::eq(a_tgt, term::int(0))),
            (
                vec![a],
                b,
                term::eq(b_tgt, term::add(vec![a_src, term::int(1)])),
            ),
            (
                vec![b],
                p,
                term::eq(p_tgt.clone(), term::add(vec![b_src, term::int(1)])),
            ),
            (
                vec![p],
                p,
                term::eq(p_tgt, term::add(vec![p_src.clone(), term::int(1)])),
            ),
            (vec![p], exit, term::ge(p_src, term::int(10))),
        ],
        preds,
        repr,
    )
}

#[test]
fn pipeline_converges_to_a_transition_system() {
    let graph = chain_graph();
    let pipeline = towards_transition_systems();
    let (transformed, _translator) = pipeline.transform(graph).expect("pipeline succeeds");
    assert!(transformed.is_normal_graph());
    let normal = transformed.to_normal_graph().expect("normal shape");
    assert!(ts::is_transition_system(&normal));

    // the surviving entry label is the composition of the chain through QE
    let system = ts::to_transition_system(&normal).expect("single-loop shape");
    let x0 = system.state_vars()[0].clone();
    assert_eq!(*system.init(), term::eq(x0, term::int(2)));
}

#[test]
fn pipeline_is_stable_on_transition_systems() {
    let graph = chain_graph();
    let pipeline = towards_transition_systems();
    let (once, _) = pipeline.transform(graph).expect("pipeline succeeds");
    let (twice, _) = pipeline.transform(once.clone()).expect("pipeline succeeds");
    assert_eq!(once.edge_count(), twice.edge_count());
    assert_eq!(once.get_vertices(), twice.get_vertices());
}

#[test]
fn merger_drops_falsified_disjuncts() {
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let repr = NonlinearRepr::of_preds(&preds);
    let entry = preds.entry();
    let p_tgt = repr.target_tuple(p)[0].clone();
    let p_src = repr.source_tuple(p, 0)[0].clone();
    let label = term::eq(p_tgt.clone(), term::int(0));
    let graph = ChcDirectedHyperGraph::new(
        vec![
            (vec![entry], p, label.clone()),
            (vec![entry], p, term::fls()),
            (
                vec![p],
                p,
                term::eq(p_tgt, term::add(vec![p_src, term::int(1)])),
            ),
        ],
        preds,
        repr,
    );
    let (transformed, _) = MultiEdgeMerger
        .transform(graph)
        .expect("merging cannot fail");
    // ⊥ is the disjunction's neutral element, the label survives unchanged
    let entry_edges: Vec<_> = transformed
        .edges()
        .filter(|edge| edge.from == vec![transformed.entry()])
        .collect();
    assert_eq!(entry_edges.len(), 1);
    assert_eq!(entry_edges[0].label, label);
}

#[test]
fn invalidity_witnesses_expand_through_contraction() {
    let graph = chain_graph();
    let original_edges: Vec<EId> = graph.edges().map(|edge| edge.id).collect();
    let pipeline = towards_transition_systems();
    let (transformed, translator) = pipeline.transform(graph).expect("pipeline succeeds");
    let normal = transformed.to_normal_graph().expect("normal shape");

    // a depth-8 derivation on the transformed graph
    let witness = InvalidityWitness::from_transition_system(&normal, 8);
    assert!(validate_invalidity(&normal, &witness));
    let result = VerificationResult::unsafe_with(witness);
    let translated = translator.translate(result).expect("translation succeeds");
    assert_eq!(translated.answer, VerificationAnswer::Unsafe);
    let derivation = match translated.witness {
        Some(Witness::Invalidity(witness)) => witness.derivation,
        _ => panic!("expected an invalidity witness"),
    };
    // ENTRY→A, A→B, B→P, 8 unrollings, P→EXIT
    assert_eq!(derivation.len(), 12);
    for eid in &derivation {
        assert!(original_edges.contains(eid));
    }
    assert_eq!(derivation[0], original_edges[0]);
    assert_eq!(derivation[1], original_edges[1]);
    assert_eq!(derivation[2], original_edges[2]);
    assert_eq!(derivation[11], original_edges[4]);
}

#[test]
fn validity_witnesses_reconstruct_contracted_vertices() {
    let graph = chain_graph();
    let preds: Vec<SymIdx> = graph.get_vertices();
    let pipeline = towards_transition_systems();
    let (transformed, translator) = pipeline.transform(graph).expect("pipeline succeeds");
    let normal = transformed.to_normal_graph().expect("normal shape");

    // pretend the engine proved `p ≥ 0` for the loop predicate
    let loop_sym = normal
        .get_vertices()
        .into_iter()
        .find(|&sym| sym != normal.entry() && sym != normal.exit())
        .expect("the loop predicate");
    let p0 = normal.state_tuple(loop_sym)[0].clone();
    let invariant = term::ge(p0, term::int(0));
    let witness = ValidityWitness::from_transition_system(&normal, invariant);
    let result = denormalize(VerificationResult::safe_with(witness));
    let translated = translator.translate(result).expect("translation succeeds");

    let interpretations = match translated.witness {
        Some(Witness::Validity(witness)) => witness.interpretations,
        _ => panic!("expected a validity witness"),
    };
    // every original non-sentinel predicate is interpreted
    let sentinels = 2;
    assert_eq!(interpretations.len(), preds.len() - sentinels);
    // the contracted chain got its concrete post-images back
    let a_interp = interpretations
        .values()
        .find(|interp| {
            **interp
                == term::eq(
                    term::var(
                        term::find_var_sym("A.0").map(Var::base).expect("A.0 interned"),
                    ),
                    term::int(0),
                )
        });
    assert!(a_interp.is_some());
}

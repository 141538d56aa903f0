//! End-to-end engine scenarios.
//!
//! Every test that talks to the solver first probes for the configured z3
//! binary and returns early when it is absent, so the suite stays green on
//! solver-less machines.

use hornbeam::conf;
use hornbeam::engine::{
    validate_invalidity, validate_validity, AcceleratedBmc, AcceleratedBmcSingle, Bmc, Engine,
    Kind, VerificationAnswer, VerificationResult, Witness,
};
use hornbeam::graph::{
    ChcDirectedGraph, ChcDirectedHyperGraph, LinearRepr, NonlinearRepr, Preds,
};
use hornbeam::term::{self, Term, Typ};
use hornbeam::ts;

macro_rules! require_z3 {
    () => {
        if !conf.solver.z3_available() {
            eprintln!("z3 is not available, skipping");
            return;
        }
    };
}

/// Builds `ENTRY → P → EXIT` with a self-loop on `P` over one integer
/// state variable.
///
/// The closures get the canonical variables: `init` the next-state
/// variable (entry labels constrain the target), `transition` the pair
/// `(current, next)`, `query` the current-state variable.
fn loop_graph<FI, FT, FQ>(init: FI, transition: FT, query: FQ) -> ChcDirectedGraph
where
    FI: FnOnce(&Term) -> Term,
    FT: FnOnce(&Term, &Term) -> Term,
    FQ: FnOnce(&Term) -> Term,
{
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let x0 = repr.state_tuple(p)[0].clone();
    let x1 = repr.next_tuple(p)[0].clone();
    let entry = preds.entry();
    let exit = preds.exit();
    ChcDirectedGraph::new(
        vec![
            (entry, p, init(&x1)),
            (p, p, transition(&x0, &x1)),
            (p, exit, query(&x0)),
        ],
        preds,
        repr,
    )
}

/// The invariant of a safe result's single-predicate witness.
fn witness_invariant(result: &VerificationResult) -> Option<Term> {
    match result.witness {
        Some(Witness::Validity(ref witness)) => {
            witness.interpretations.values().next().cloned()
        }
        _ => None,
    }
}

/// The depth of an unsafe result's witness.
fn witness_depth(result: &VerificationResult) -> Option<usize> {
    match result.witness {
        Some(Witness::Invalidity(ref witness)) => Some(witness.depth),
        _ => None,
    }
}

#[test]
fn trivially_safe_with_empty_init() {
    require_z3!();
    let engines: Vec<Box<dyn Engine>> = vec![
        Box::new(Bmc::new()),
        Box::new(Kind::new()),
        Box::new(AcceleratedBmcSingle::new()),
        Box::new(AcceleratedBmc::new()),
    ];
    for mut engine in engines {
        let graph = loop_graph(
            |_| term::fls(),
            |x0, x1| term::eq(x1.clone(), term::add(vec![x0.clone(), term::int(1)])),
            |x0| term::gt(x0.clone(), term::int(0)),
        );
        let res = engine.solve(&graph).expect("engine runs");
        assert_eq!(
            res.answer,
            VerificationAnswer::Safe,
            "engine `{}` missed the empty-init case",
            engine.name()
        );
    }
}

#[test]
fn counter_reaches_ten() {
    require_z3!();
    let engines: Vec<Box<dyn Engine>> = vec![
        Box::new(Bmc::new()),
        Box::new(Kind::new()),
        Box::new(AcceleratedBmcSingle::new()),
        Box::new(AcceleratedBmc::new()),
    ];
    for mut engine in engines {
        let graph = loop_graph(
            |x1| term::eq(x1.clone(), term::int(0)),
            |x0, x1| term::eq(x1.clone(), term::add(vec![x0.clone(), term::int(1)])),
            |x0| term::eq(x0.clone(), term::int(10)),
        );
        let res = engine.solve(&graph).expect("engine runs");
        assert_eq!(
            res.answer,
            VerificationAnswer::Unsafe,
            "engine `{}` missed the counterexample",
            engine.name()
        );
        assert_eq!(
            witness_depth(&res),
            Some(10),
            "engine `{}` got the counterexample length wrong",
            engine.name()
        );
        match res.witness {
            Some(Witness::Invalidity(ref witness)) => {
                assert!(validate_invalidity(&graph, witness))
            }
            _ => panic!("expected an invalidity witness"),
        }
    }
}

#[test]
fn nonnegative_counter_is_inductive() {
    require_z3!();
    let graph = loop_graph(
        |x1| term::eq(x1.clone(), term::int(0)),
        |x0, x1| term::eq(x1.clone(), term::add(vec![x0.clone(), term::int(1)])),
        |x0| term::lt(x0.clone(), term::int(0)),
    );
    let res = Kind::new().solve(&graph).expect("engine runs");
    assert_eq!(res.answer, VerificationAnswer::Safe);
    let invariant = witness_invariant(&res).expect("safe answers carry a witness");
    let system = ts::to_transition_system(&graph).expect("single-loop shape");
    assert!(validate_validity(&system, &invariant).expect("validation runs"));
}

#[test]
fn toggle_needs_two_inductive_steps() {
    require_z3!();
    // x′ = 1 - x from x = 0 never reaches 2, but x ≠ 2 is only
    // 2-inductive
    let engines: Vec<Box<dyn Engine>> = vec![
        Box::new(Kind::new()),
        Box::new(AcceleratedBmcSingle::new()),
        Box::new(AcceleratedBmc::new()),
    ];
    for mut engine in engines {
        let graph = loop_graph(
            |x1| term::eq(x1.clone(), term::int(0)),
            |x0, x1| term::eq(x1.clone(), term::sub(vec![term::int(1), x0.clone()])),
            |x0| term::eq(x0.clone(), term::int(2)),
        );
        let res = engine.solve(&graph).expect("engine runs");
        assert_eq!(
            res.answer,
            VerificationAnswer::Safe,
            "engine `{}` missed safety",
            engine.name()
        );
        let invariant = witness_invariant(&res).expect("safe answers carry a witness");
        let system = ts::to_transition_system(&graph).expect("single-loop shape");
        assert!(
            validate_validity(&system, &invariant).expect("validation runs"),
            "engine `{}` produced a bogus invariant: {}",
            engine.name(),
            invariant
        );
    }
}

#[test]
fn decreasing_counter_closes_backwards() {
    require_z3!();
    // x only decreases from x ≤ 0; forward induction cannot close, the
    // backward check does at k = 1
    let graph = loop_graph(
        |x1| term::le(x1.clone(), term::int(0)),
        |x0, x1| term::eq(x1.clone(), term::sub(vec![x0.clone(), term::int(1)])),
        |x0| term::eq(x0.clone(), term::int(3)),
    );
    let res = Kind::new().solve(&graph).expect("engine runs");
    assert_eq!(res.answer, VerificationAnswer::Safe);
    let invariant = witness_invariant(&res).expect("safe answers carry a witness");
    let system = ts::to_transition_system(&graph).expect("single-loop shape");
    assert!(validate_validity(&system, &invariant).expect("validation runs"));
}

/// `ENTRY → A → B → P (self-loop) → EXIT` as a hypergraph; the chain
/// computes `p = 2` and the loop increments.
fn chain_hyper_graph<FQ>(query: FQ) -> ChcDirectedHyperGraph
where
    FQ: FnOnce(&Term) -> Term,
{
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
            (vec![p], exit, query(&p_src)),
        ],
        preds,
        repr,
    )
}

#[test]
fn kind_solves_hypergraphs_through_the_pipeline() {
    require_z3!();
    let graph = chain_hyper_graph(|p| term::ge(p.clone(), term::int(10)));
    let res = Kind::new().solve_hyper(graph).expect("engine runs");
    assert_eq!(res.answer, VerificationAnswer::Unsafe);
    let derivation = match res.witness {
        Some(Witness::Invalidity(ref witness)) => witness.derivation.clone(),
        _ => panic!("expected an invalidity witness"),
    };
    // three chain edges, eight unrollings, one exit edge
    assert_eq!(derivation.len(), 12);
}

#[test]
fn kind_reconstructs_interpretations_through_the_pipeline() {
    require_z3!();
    let graph = chain_hyper_graph(|p| term::lt(p.clone(), term::int(0)));
    let res = Kind::new().solve_hyper(graph).expect("engine runs");
    assert_eq!(res.answer, VerificationAnswer::Safe);
    let interpretations = match res.witness {
        Some(Witness::Validity(ref witness)) => witness.interpretations.clone(),
        _ => panic!("expected a validity witness"),
    };
    // A, B and the loop predicate all get an interpretation
    assert_eq!(interpretations.len(), 3);
}

#[test]
fn accelerated_engines_refuse_hypergraphs() {
    let graph = chain_hyper_graph(|p| term::lt(p.clone(), term::int(0)));
    let err = AcceleratedBmc::new()
        .solve_hyper(graph.clone())
        .expect_err("hypergraphs are not supported");
    assert!(err.is_unsupported());
    let err = AcceleratedBmcSingle::new()
        .solve_hyper(graph)
        .expect_err("hypergraphs are not supported");
    assert!(err.is_unsupported());
}

#[test]
fn engines_answer_unknown_on_unrecognized_shapes() {
    // two loop predicates: not a single transition system
    let mut preds = Preds::new();
    let a = preds.add("A", vec![Typ::Int]);
    let b = preds.add("B", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let entry = preds.entry();
    let exit = preds.exit();
    let a0 = repr.state_tuple(a)[0].clone();
    let a1 = repr.next_tuple(a)[0].clone();
    let b0 = repr.state_tuple(b)[0].clone();
    let b1 = repr.next_tuple(b)[0].clone();
    let graph = ChcDirectedGraph::new(
        vec![
            (entry, a, term::eq(a1.clone(), term::int(0))),
            (a, a, term::eq(a1, term::add(vec![a0.clone(), term::int(1)]))),
            (a, b, term::eq(b1.clone(), a0)),
            (b, b, term::eq(b1, term::add(vec![b0.clone(), term::int(1)]))),
            (b, exit, term::ge(b0, term::int(10))),
        ],
        preds,
        repr,
    );
    let res = Kind::new().solve(&graph).expect("shape check is solver-free");
    assert_eq!(res.answer, VerificationAnswer::Unknown);
    let res = AcceleratedBmc::new()
        .solve(&graph)
        .expect("shape check is solver-free");
    assert_eq!(res.answer, VerificationAnswer::Unknown);
}

//! Tests for transition-system recognition and extraction.

use crate::common::*;
use crate::graph::{ChcDirectedGraph, LinearRepr, Preds};
use crate::ts::*;

/// `ENTRY → P → EXIT` with a self-loop: `init x = 0`, `x′ = x + 1`,
/// `query x ≥ 10`.
fn counter_graph() -> ChcDirectedGraph {
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let x0 = repr.state_tuple(p)[0].clone();
    let x1 = repr.next_tuple(p)[0].clone();
    let entry = preds.entry();
    let exit = preds.exit();
    ChcDirectedGraph::new(
        vec![
            (entry, p, term::eq(x1.clone(), term::int(0))),
            (
                p,
                p,
                term::eq(x1, term::add(vec![x0.clone(), term::int(1)])),
            ),
            (p, exit, term::ge(x0, term::int(10))),
        ],
        preds,
        repr,
    )
}

/// `ENTRY → A → B → EXIT` where both `A` and `B` carry self-loops.
fn two_loop_chain() -> ChcDirectedGraph {
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
    ChcDirectedGraph::new(
        vec![
            (entry, a, term::eq(a1.clone(), term::int(0))),
            (
                a,
                a,
                term::eq(a1.clone(), term::add(vec![a0.clone(), term::int(1)])),
            ),
            (a, b, term::eq(b1.clone(), a0.clone())),
            (
                b,
                b,
                term::eq(b1, term::add(vec![b0.clone(), term::int(1)])),
            ),
            (b, exit, term::ge(b0, term::int(10))),
        ],
        preds,
        repr,
    )
}

#[test]
fn recognizes_single_loop_shape() {
    let graph = counter_graph();
    assert!(is_transition_system(&graph));
    assert!(is_transition_system_chain(&graph));
}

#[test]
fn rejects_multi_loop_shape_but_accepts_chain() {
    let graph = two_loop_chain();
    assert!(!is_transition_system(&graph));
    assert!(is_transition_system_chain(&graph));
}

#[test]
fn rejects_loop_free_graph() {
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let entry = preds.entry();
    let exit = preds.exit();
    let x0 = repr.state_tuple(p)[0].clone();
    let graph = ChcDirectedGraph::new(
        vec![
            (entry, p, term::tru()),
            (p, exit, term::ge(x0, term::int(0))),
        ],
        preds,
        repr,
    );
    assert!(!is_transition_system(&graph));
    assert!(to_transition_system(&graph).is_err());
}

#[test]
fn extraction_rebases_the_entry_label() {
    let graph = counter_graph();
    let system = to_transition_system(&graph).expect("single-loop shape");
    let x0 = system.state_vars()[0].clone();
    let x1 = system.next_vars()[0].clone();
    // init was `x′ = 0` on the entry edge, over version 0 in the system
    assert_eq!(*system.init(), term::eq(x0.clone(), term::int(0)));
    assert_eq!(
        *system.transition(),
        term::eq(x1, term::add(vec![x0.clone(), term::int(1)]))
    );
    assert_eq!(*system.query(), term::ge(x0, term::int(10)));
}

#[test]
fn reverse_swaps_the_time_coordinates() {
    let graph = counter_graph();
    let system = to_transition_system(&graph).expect("single-loop shape");
    let x0 = system.state_vars()[0].clone();
    let x1 = system.next_vars()[0].clone();
    assert_eq!(
        system.reverse_transition_relation(),
        term::eq(x0, term::add(vec![x1, term::int(1)]))
    );
}

#[test]
fn reverse_is_an_involution() {
    let graph = counter_graph();
    let system = to_transition_system(&graph).expect("single-loop shape");
    let back = system.reverse().reverse();
    assert_eq!(system.init(), back.init());
    assert_eq!(system.transition(), back.transition());
    assert_eq!(system.query(), back.query());
}

#[test]
fn reverse_exchanges_init_and_query() {
    let graph = counter_graph();
    let system = to_transition_system(&graph).expect("single-loop shape");
    let reversed = system.reverse();
    assert_eq!(*reversed.init(), term::not(system.query().clone()));
    assert_eq!(*reversed.query(), term::not(system.init().clone()));
}

#[test]
fn strengthening_unrolls_the_transition() {
    // x′ = 1 - x from x = 0: x ≠ 2 is 2-inductive but not 1-inductive
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let x0 = repr.state_tuple(p)[0].clone();
    let x1 = repr.next_tuple(p)[0].clone();
    let system = TransitionSystem::new(
        vec![x0.clone()],
        term::eq(x0.clone(), term::int(0)),
        term::eq(x1, term::sub(vec![term::int(1), x0.clone()])),
        term::eq(x0.clone(), term::int(2)),
    );
    let inv = term::not(term::eq(x0.clone(), term::int(2)));
    let strengthened =
        kinductive_to_inductive(&inv, 2, &system).expect("equational transition");
    let expected = term::and(vec![
        inv.clone(),
        term::not(term::eq(
            term::sub(vec![term::int(1), x0.clone()]),
            term::int(2),
        )),
    ]);
    assert_eq!(strengthened, expected);
    // k = 1 adds nothing beyond the invariant itself
    assert_eq!(kinductive_to_inductive(&inv, 1, &system), Some(inv));
}

#[test]
fn bounded_reach_unrolls_from_the_initial_states() {
    let graph = counter_graph();
    let system = to_transition_system(&graph).expect("single-loop shape");
    let x0 = system.state_vars()[0].clone();
    // fewer than three steps from x = 0: x ∈ {0, 1, 2}
    let reach = bounded_reach_invariant(3, &system).expect("equational transition");
    let expected = term::or(vec![
        term::eq(x0.clone(), term::int(0)),
        term::eq(x0.clone(), term::int(1)),
        term::eq(x0, term::int(2)),
    ]);
    assert_eq!(reach, expected);
}

#[test]
fn strengthening_gives_up_without_definitions() {
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let x0 = repr.state_tuple(p)[0].clone();
    let x1 = repr.next_tuple(p)[0].clone();
    // x only grows, the next state is not a function of the current one
    let system = TransitionSystem::new(
        vec![x0.clone()],
        term::eq(x0.clone(), term::int(0)),
        term::ge(x1, x0.clone()),
        term::lt(x0.clone(), term::int(0)),
    );
    let inv = term::ge(x0, term::int(0));
    assert_eq!(kinductive_to_inductive(&inv, 3, &system), None);
}

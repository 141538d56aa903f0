//! Tests for the graph structures and their rewrites.

use crate::common::*;
use crate::graph::*;

/// `ENTRY → P → EXIT` with a self-loop on `P`: the counter system.
///
/// Init `x = 0`, loop `x′ = x + 1`, query `x ≥ 10`.
fn counter_graph() -> ChcDirectedGraph {
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let x0 = repr.state_tuple(p)[0].clone();
    let x1 = repr.next_tuple(p)[0].clone();
    let entry = preds.entry();
    let exit = preds.exit();
    let edges = vec![
        (entry, p, term::eq(x1.clone(), term::int(0))),
        (
            p,
            p,
            term::eq(x1, term::add(vec![x0.clone(), term::int(1)])),
        ),
        (p, exit, term::ge(x0, term::int(10))),
    ];
    ChcDirectedGraph::new(edges, preds, repr)
}

#[test]
fn vertices_are_endpoints_plus_entry() {
    let graph = counter_graph();
    let vertices = graph.get_vertices();
    assert_eq!(vertices.len(), 3);
    assert!(vertices.contains(&graph.entry()));
    assert!(vertices.contains(&graph.exit()));
}

#[test]
fn hyper_round_trip_is_identity() {
    let graph = counter_graph();
    let back = graph
        .to_hyper_graph()
        .to_normal_graph()
        .expect("single-source graphs normalize");
    assert_eq!(graph.edge_count(), back.edge_count());
    for edge in graph.edges() {
        let there = back.edge(edge.id);
        assert_eq!(edge.from, there.from);
        assert_eq!(edge.to, there.to);
        assert_eq!(edge.label, there.label);
    }
}

#[test]
fn reverse_is_an_involution() {
    let graph = counter_graph();
    let back = graph.reverse().reverse();
    assert_eq!(graph.edge_count(), back.edge_count());
    for edge in graph.edges() {
        let there = back.edge(edge.id);
        assert_eq!(edge.from, there.from);
        assert_eq!(edge.to, there.to);
        assert_eq!(edge.label, there.label);
    }
}

#[test]
fn reverse_swaps_edge_direction() {
    let graph = counter_graph();
    let reversed = graph.reverse();
    for edge in graph.edges() {
        let there = reversed.edge(edge.id);
        assert_eq!(edge.from, there.to);
        assert_eq!(edge.to, there.from);
    }
}

#[test]
fn merge_multi_edges_takes_the_disjunction() {
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let q = preds.add("Q", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let x0 = repr.state_tuple(p)[0].clone();
    let phi_one = term::eq(x0.clone(), term::int(1));
    let phi_two = term::eq(x0, term::int(2));
    let mut graph = ChcDirectedGraph::new(
        vec![(p, q, phi_one.clone()), (p, q, phi_two.clone())],
        preds,
        repr,
    );

    assert!(graph.merge_multi_edges());
    assert_eq!(graph.edge_count(), 1);
    let merged = graph.edges().next().expect("one edge remains");
    assert_eq!(merged.label, term::or(vec![phi_one, phi_two]));

    // idempotence
    assert!(!graph.merge_multi_edges());
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn merge_multi_edges_leaves_distinct_pairs_alone() {
    let mut graph = counter_graph();
    assert!(!graph.merge_multi_edges());
    assert_eq!(graph.edge_count(), 3);
    // no two distinct edges share endpoints
    let mut seen = HashSet::new();
    graph.for_each_edge(|edge| {
        assert!(seen.insert((edge.from, edge.to)));
    });
}

#[test]
fn delete_false_edges_is_idempotent() {
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let entry = preds.entry();
    let mut graph = ChcDirectedGraph::new(
        vec![(entry, p, term::fls()), (p, p, term::tru())],
        preds,
        repr,
    );
    graph.delete_false_edges();
    assert_eq!(graph.edge_count(), 1);
    graph.delete_false_edges();
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn linear_contraction_composes_labels() {
    // ENTRY → A → B, then contract A
    let mut preds = Preds::new();
    let a = preds.add("A", vec![Typ::Int]);
    let b = preds.add("B", vec![Typ::Int]);
    let repr = LinearRepr::of_preds(&preds);
    let entry = preds.entry();
    let a0 = repr.state_tuple(a)[0].clone();
    let a1 = repr.next_tuple(a)[0].clone();
    let b1 = repr.next_tuple(b)[0].clone();
    let mut graph = ChcDirectedGraph::new(
        vec![
            (entry, a, term::eq(a1.clone(), term::int(1))),
            (
                a,
                b,
                term::eq(b1.clone(), term::add(vec![a0.clone(), term::int(1)])),
            ),
        ],
        preds,
        repr,
    );
    graph.contract_vertex(a).expect("a has no self-loop");
    assert_eq!(graph.edge_count(), 1);
    let summary = graph.edges().next().expect("one edge remains");
    assert_eq!(summary.from, entry);
    assert_eq!(summary.to, b);
    // A's variable is defined by the incoming label, so QE leaves b′ = 2
    assert_eq!(summary.label, term::eq(b1, term::int(2)));
}

#[test]
fn contraction_refuses_self_loops() {
    let mut graph = counter_graph();
    let p = graph
        .get_vertices()
        .into_iter()
        .find(|&sym| sym != graph.entry() && sym != graph.exit())
        .expect("the loop predicate");
    let before = graph.edge_count();
    assert!(graph.contract_vertex(p).is_err());
    assert_eq!(graph.edge_count(), before);
}

/// A hypergraph with a true hyperedge `{A, B} → C`.
fn hyper_graph() -> (ChcDirectedHyperGraph, SymIdx, SymIdx, SymIdx) {
    let mut preds = Preds::new();
    let a = preds.add("A", vec![Typ::Int]);
    let b = preds.add("B", vec![Typ::Int]);
    let c = preds.add("C", vec![Typ::Int]);
    let repr = NonlinearRepr::of_preds(&preds);
    let entry = preds.entry();
    let a_tgt = repr.target_tuple(a)[0].clone();
    let a_src = repr.source_tuple(a, 0)[0].clone();
    let b_src = repr.source_tuple(b, 0)[0].clone();
    let c_tgt = repr.target_tuple(c)[0].clone();
    let edges = vec![
        (vec![entry], a, term::eq(a_tgt, term::int(0))),
        (
            vec![a, b],
            c,
            term::eq(c_tgt, term::add(vec![a_src, b_src])),
        ),
    ];
    let graph = ChcDirectedHyperGraph::new(edges, preds, repr);
    (graph, a, b, c)
}

#[test]
fn hyperedges_block_normalization_and_contraction() {
    let (mut graph, a, _, _) = hyper_graph();
    assert!(!graph.is_normal_graph());
    assert!(graph.to_normal_graph().is_err());
    let before = graph.edge_count();
    assert!(graph.contract_vertex(a).is_err());
    assert_eq!(graph.edge_count(), before);
}

#[test]
fn vertex_instances_disambiguate_repeated_sources() {
    let mut preds = Preds::new();
    let p = preds.add("P", vec![Typ::Int]);
    let q = preds.add("Q", vec![Typ::Int]);
    let repr = NonlinearRepr::of_preds(&preds);
    let p_fst = repr.source_tuple(p, 0)[0].clone();
    let p_snd = repr.source_tuple(p, 1)[0].clone();
    let q_tgt = repr.target_tuple(q)[0].clone();
    assert_ne!(p_fst, p_snd);
    let graph = ChcDirectedHyperGraph::new(
        vec![(
            vec![p, p],
            q,
            term::eq(q_tgt, term::add(vec![p_fst, p_snd])),
        )],
        preds,
        repr,
    );
    let instances = VertexInstances::new(&graph);
    let eid = graph.edges().next().expect("one edge").id;
    assert_eq!(instances.instance_number(eid, 0), 0);
    assert_eq!(instances.instance_number(eid, 1), 1);
}

#[test]
fn trivial_chain_contraction_keeps_outer_variables() {
    // ENTRY → A → B → C, contract the A → B → C tail
    let mut preds = Preds::new();
    let a = preds.add("A", vec![Typ::Int]);
    let b = preds.add("B", vec![Typ::Int]);
    let c = preds.add("C", vec![Typ::Int]);
    let repr = NonlinearRepr::of_preds(&preds);
    let entry = preds.entry();
    let a_tgt = repr.target_tuple(a)[0].clone();
    let a_src = repr.source_tuple(a, 0)[0].clone();
    let b_tgt = repr.target_tuple(b)[0].clone();
    let b_src = repr.source_tuple(b, 0)[0].clone();
    let c_tgt = repr.target_tuple(c)[0].clone();
    let mut graph = ChcDirectedHyperGraph::new(
        vec![
            (vec![entry], a, term::eq(a_tgt, term::int(0))),
            (
                vec![a],
                b,
                term::eq(
                    b_tgt.clone(),
                    term::add(vec![a_src.clone(), term::int(1)]),
                ),
            ),
            (
                vec![b],
                c,
                term::eq(c_tgt.clone(), term::add(vec![b_src, term::int(1)])),
            ),
        ],
        preds,
        repr,
    );
    let chain: Vec<EId> = graph
        .edges()
        .filter(|edge| edge.from[0] != entry)
        .map(|edge| edge.id)
        .collect();
    let summary = graph
        .contract_trivial_chain(&chain)
        .expect("the chain is trivial");
    assert_eq!(summary.from, vec![a]);
    assert_eq!(summary.to, c);
    // B's variables are eliminated: label is c!t = a!s0 + 2
    assert_eq!(
        summary.label,
        term::eq(c_tgt, term::add(vec![a_src, term::int(2)]))
    );
    // B is gone
    assert!(!graph.get_vertices().contains(&b));
}

#[test]
fn dot_output_mentions_every_vertex() {
    let graph = counter_graph();
    let mut buf = vec![];
    graph.to_dot(&mut buf, true).expect("dot output");
    let dot = String::from_utf8(buf).expect("dot is utf8");
    assert!(dot.starts_with("digraph"));
    for sym in graph.get_vertices() {
        assert!(dot.contains(&format!("n{}", sym)));
    }
}

//! Transition systems and their extraction from single-loop graphs.
//!
//! A linear graph shaped `ENTRY → P → EXIT` with a self-loop on `P` is a
//! transition system: the entry edge is `init`, the self-loop is
//! `transition`, the exit edge is `query`. `init` and `query` range over
//! the state variables at version 0, `transition` over versions 0 and 1.

use crate::common::*;
use crate::graph::{self_loop_of, AdjacencyLists, ChcDirectedGraph};
use crate::term::{qe, version};

#[cfg(test)]
mod test;

/// A transition system over a single predicate's state variables.
#[derive(Clone, Debug)]
pub struct TransitionSystem {
    /// State variables, version 0.
    state_vars: Vec<Term>,
    /// Initial states, over version 0.
    init: Term,
    /// Transition relation, over versions 0 and 1.
    transition: Term,
    /// Bad states, over version 0.
    query: Term,
}

impl TransitionSystem {
    /// Constructor.
    pub fn new(state_vars: Vec<Term>, init: Term, transition: Term, query: Term) -> Self {
        debug_assert! { version::is_pure_state_formula(& init) }
        debug_assert! { version::is_pure_state_formula(& query) }
        debug_assert! { version::is_pure_transition_formula(& transition) }
        TransitionSystem {
            state_vars,
            init,
            transition,
            query,
        }
    }

    /// State variables, version 0.
    pub fn state_vars(&self) -> &[Term] {
        &self.state_vars
    }
    /// State variables at version 1.
    pub fn next_vars(&self) -> Vec<Term> {
        self.state_vars.iter().map(|t| version::shift(t, 1)).collect()
    }
    /// Initial states.
    pub fn init(&self) -> &Term {
        &self.init
    }
    /// Transition relation.
    pub fn transition(&self) -> &Term {
        &self.transition
    }
    /// Bad states.
    pub fn query(&self) -> &Term {
        &self.query
    }

    /// The transition relation with version-0 and version-1 state variables
    /// exchanged by one simultaneous substitution.
    pub fn reverse_transition_relation(&self) -> Term {
        let next = self.next_vars();
        let mut map = term::tuple_subst(&self.state_vars, &next);
        map.extend(term::tuple_subst(&next, &self.state_vars));
        self.transition.subst(&map)
    }

    /// The reversed system: runs backwards from the bad states.
    pub fn reverse(&self) -> Self {
        TransitionSystem {
            state_vars: self.state_vars.clone(),
            init: term::not(self.query.clone()),
            transition: self.reverse_transition_relation(),
            query: term::not(self.init.clone()),
        }
    }
}

/// True if the graph is a single-loop transition system:
/// exactly the vertices `{ENTRY, P, EXIT}` and exactly the three edges
/// `ENTRY → P`, `P → P`, `P → EXIT`.
pub fn is_transition_system(graph: &ChcDirectedGraph) -> bool {
    let vertices = graph.get_vertices();
    if vertices.len() != 3 {
        return false;
    }
    let loop_sym = match loop_symbol(graph) {
        Some(sym) => sym,
        None => return false,
    };
    if graph.edge_count() != 3 {
        return false;
    }
    let (mut init, mut transition, mut query) = (0, 0, 0);
    graph.for_each_edge(|edge| {
        if edge.from == graph.entry() && edge.to == loop_sym {
            init += 1
        } else if edge.from == loop_sym && edge.to == loop_sym {
            transition += 1
        } else if edge.from == loop_sym && edge.to == graph.exit() {
            query += 1
        }
    });
    init == 1 && transition == 1 && query == 1
}

/// True if the graph is an acyclic chain of single-loop systems:
/// `ENTRY → P₁ → … → Pₙ → EXIT` where every `Pᵢ` carries a self-loop and
/// nothing else.
pub fn is_transition_system_chain(graph: &ChcDirectedGraph) -> bool {
    let adjacency = AdjacencyLists::of_linear(graph);
    let vertices = graph.get_vertices();
    if !vertices.contains(&graph.exit()) {
        return false;
    }
    for &sym in &vertices {
        if sym == graph.entry() || sym == graph.exit() {
            continue;
        }
        if self_loop_of(sym, graph, &adjacency).is_none() {
            return false;
        }
    }
    // follow the unique non-loop edges from the entry to the exit
    let mut seen = SymSet::new();
    let mut current = graph.entry();
    loop {
        seen.insert(current);
        let nexts: Vec<EId> = adjacency
            .outgoing(current)
            .iter()
            .cloned()
            .filter(|&eid| graph.target(eid) != current)
            .collect();
        if nexts.len() != 1 {
            return false;
        }
        let next = graph.target(nexts[0]);
        if seen.contains(&next) {
            return false;
        }
        if next == graph.exit() {
            return seen.len() + 1 == vertices.len();
        }
        current = next
    }
}

/// The single non-sentinel vertex, if there is exactly one.
fn loop_symbol(graph: &ChcDirectedGraph) -> Option<SymIdx> {
    let mut loop_sym = None;
    for sym in graph.get_vertices() {
        if sym == graph.entry() || sym == graph.exit() {
            continue;
        }
        if loop_sym.replace(sym).is_some() {
            return None;
        }
    }
    loop_sym
}

/// Extracts the transition system of a single-loop graph.
///
/// The entry label's next-state variables are rebased to version 0 for
/// `init`; the query label already ranges over version 0; the self-loop
/// label is the transition relation as is.
pub fn to_transition_system(graph: &ChcDirectedGraph) -> Res<TransitionSystem> {
    if !is_transition_system(graph) {
        shape_bail!("graph is not a single-loop transition system")
    }
    let loop_sym = loop_symbol(graph).expect("checked by is_transition_system");
    let state_vars: Vec<Term> = graph.state_tuple(loop_sym).to_vec();
    let next_vars = graph.next_tuple(loop_sym);

    let (mut init, mut transition, mut query) = (None, None, None);
    graph.for_each_edge(|edge| {
        if edge.from == graph.entry() {
            init = Some(edge.label.clone())
        } else if edge.to == graph.exit() {
            query = Some(edge.label.clone())
        } else {
            transition = Some(edge.label.clone())
        }
    });
    let rebase = term::tuple_subst(&next_vars, &state_vars);
    let init = init.expect("checked by is_transition_system").subst(&rebase);
    let transition = transition.expect("checked by is_transition_system");
    let query = query.expect("checked by is_transition_system");
    Ok(TransitionSystem::new(state_vars, init, transition, query))
}

/// Strengthens a k-inductive invariant into a 1-inductive one.
///
/// The result conjoins, for each `i < k`, the strongest state formula
/// saying "no `i`-step unrolling from here leaves the invariant", computed
/// by dualized trivial quantifier elimination. Returns `None` when some
/// unrolling variable cannot be eliminated, in which case no (sound)
/// invariant is available this way.
pub fn kinductive_to_inductive(
    inv: &Term,
    k: usize,
    system: &TransitionSystem,
) -> Option<Term> {
    let mut conj = Vec::with_capacity(k);
    conj.push(inv.clone());
    for i in 1..k {
        let mut body = Vec::with_capacity(i + 1);
        for j in 0..i {
            body.push(version::shift(system.transition(), j as i32));
        }
        body.push(version::shift(&term::not(inv.clone()), i as i32));
        let body = term::and(body);
        let to_elim: VarSet = term::vars(&body)
            .into_iter()
            .filter(|v| v.version() != Some(0))
            .collect();
        let projected = qe::try_eliminate_vars(&to_elim, &body);
        if !qe::residual_vars(&projected, &to_elim).is_empty() {
            return None;
        }
        conj.push(term::not(projected));
    }
    Some(term::and(conj))
}

/// The states reachable from the initial states in fewer than `k` steps,
/// as a state formula over version 0.
///
/// When the negated initial states are k-inductive for the reversed system
/// and the base cases up to `k` hold, this set is closed under the
/// transition relation and avoids the query, so it is the inductive
/// invariant the backward induction hands out. `None` when some unrolling
/// variable cannot be eliminated.
pub fn bounded_reach_invariant(k: usize, system: &TransitionSystem) -> Option<Term> {
    let mut disjuncts = Vec::with_capacity(k);
    for i in 0..k {
        let mut body = Vec::with_capacity(i + 1);
        body.push(system.init().clone());
        for j in 0..i {
            body.push(version::shift(system.transition(), j as i32));
        }
        let body = term::and(body);
        let to_elim: VarSet = term::vars(&body)
            .into_iter()
            .filter(|v| v.version() != Some(i as i32))
            .collect();
        let projected = qe::try_eliminate_vars(&to_elim, &body);
        if !qe::residual_vars(&projected, &to_elim).is_empty() {
            return None;
        }
        disjuncts.push(version::shift(&projected, -(i as i32)));
    }
    Some(term::or(disjuncts))
}

//! CHC graphs: vertices are predicate symbols, edges are the clauses.
//!
//! An edge labeled `φ` from `P` to `Q` encodes the clause
//! `P(s) ∧ φ ⇒ Q(s′)`: the label ranges over the current-state variables of
//! the source(s) and the next-state variables of the target, in the
//! canonical representation of the graph ([`preds`]).
//!
//! Two flavors: [`ChcDirectedGraph`] is linear (one source per edge),
//! [`ChcDirectedHyperGraph`] allows several sources per edge, with *vertex
//! instances* disambiguating repeated source symbols. Structural rewrites
//! (vertex contraction, parallel-edge merging, false-edge removal) mutate
//! the edge maps atomically within one public method; failing rewrites
//! leave the graph untouched.
//!
//! [`preds`]: preds/index.html (preds module)
//! [`ChcDirectedGraph`]: struct.ChcDirectedGraph.html (linear graph)
//! [`ChcDirectedHyperGraph`]: struct.ChcDirectedHyperGraph.html (hypergraph)

use crate::common::*;
use crate::term::qe;

pub mod preds;

#[cfg(test)]
mod test;

pub use self::preds::{LinearRepr, NonlinearRepr, PredInfo, Preds};

/// A linear edge.
#[derive(Clone, Debug)]
pub struct DirectedEdge {
    /// Source symbol.
    pub from: SymIdx,
    /// Target symbol.
    pub to: SymIdx,
    /// Constraint, over `from`'s state and `to`'s next-state variables.
    pub label: Term,
    /// Edge id, stable within one graph.
    pub id: EId,
}

/// A hyperedge. The `from` list may contain repeated symbols.
#[derive(Clone, Debug)]
pub struct DirectedHyperEdge {
    /// Source symbols.
    pub from: Vec<SymIdx>,
    /// Target symbol.
    pub to: SymIdx,
    /// Constraint, over the sources' occurrence variables and the target's
    /// target variables.
    pub label: Term,
    /// Edge id, stable within one graph.
    pub id: EId,
}

/// Incoming/outgoing adjacency lists, rebuilt on demand.
///
/// Vertices never hold edge pointers; every rewrite recomputes the lists it
/// needs from the edge map.
pub struct AdjacencyLists {
    /// Incoming edges per vertex.
    incoming: SymHMap<Vec<EId>>,
    /// Outgoing edges per vertex.
    outgoing: SymHMap<Vec<EId>>,
}

impl AdjacencyLists {
    /// Adjacency of a linear graph.
    pub fn of_linear(graph: &ChcDirectedGraph) -> Self {
        let mut incoming: SymHMap<Vec<EId>> = SymHMap::new();
        let mut outgoing: SymHMap<Vec<EId>> = SymHMap::new();
        graph.for_each_edge(|edge| {
            incoming.entry(edge.to).or_insert_with(Vec::new).push(edge.id);
            outgoing
                .entry(edge.from)
                .or_insert_with(Vec::new)
                .push(edge.id);
        });
        AdjacencyLists { incoming, outgoing }
    }

    /// Adjacency of a hypergraph. Each source of an edge gets the edge in
    /// its outgoing list.
    pub fn of_hyper(graph: &ChcDirectedHyperGraph) -> Self {
        let mut incoming: SymHMap<Vec<EId>> = SymHMap::new();
        let mut outgoing: SymHMap<Vec<EId>> = SymHMap::new();
        graph.for_each_edge(|edge| {
            incoming.entry(edge.to).or_insert_with(Vec::new).push(edge.id);
            for &sym in &edge.from {
                outgoing.entry(sym).or_insert_with(Vec::new).push(edge.id);
            }
        });
        AdjacencyLists { incoming, outgoing }
    }

    /// Incoming edges of a vertex.
    pub fn incoming(&self, sym: SymIdx) -> &[EId] {
        self.incoming.get(&sym).map(|v| &v[..]).unwrap_or(&[])
    }
    /// Outgoing edges of a vertex.
    pub fn outgoing(&self, sym: SymIdx) -> &[EId] {
        self.outgoing.get(&sym).map(|v| &v[..]).unwrap_or(&[])
    }
}

/// Iterative DFS post-order over vertices, following `succs`.
fn dfs_post_order<F: Fn(SymIdx) -> Vec<SymIdx>>(entry: SymIdx, succs: F) -> Vec<SymIdx> {
    let mut order = vec![];
    let mut marked = SymSet::new();
    // (vertex, successors already pushed)
    let mut stack = vec![(entry, false)];
    marked.insert(entry);
    while let Some((sym, expanded)) = stack.pop() {
        if expanded {
            order.push(sym);
            continue;
        }
        stack.push((sym, true));
        for succ in succs(sym) {
            if marked.insert(succ) {
                stack.push((succ, false))
            }
        }
    }
    order
}

/// A directed graph of linear clauses.
#[derive(Clone, Debug)]
pub struct ChcDirectedGraph {
    /// Edges, owned by the graph.
    edges: BTreeMap<EId, DirectedEdge>,
    /// Symbol table.
    preds: Preds,
    /// Canonical representation.
    repr: LinearRepr,
    /// Next free edge id.
    free_id: usize,
}

impl ChcDirectedGraph {
    /// Constructor; assigns edge ids in order.
    pub fn new(edges: Vec<(SymIdx, SymIdx, Term)>, preds: Preds, repr: LinearRepr) -> Self {
        let mut graph = ChcDirectedGraph {
            edges: BTreeMap::new(),
            preds,
            repr,
            free_id: 0,
        };
        for (from, to, label) in edges {
            graph.new_edge(from, to, label);
        }
        graph
    }

    /// Fresh edge id.
    fn fresh_id(&mut self) -> EId {
        let id = self.free_id.into();
        self.free_id += 1;
        id
    }

    /// Adds an edge, returns its id.
    fn new_edge(&mut self, from: SymIdx, to: SymIdx, label: Term) -> EId {
        let id = self.fresh_id();
        self.edges.insert(id, DirectedEdge {
            from,
            to,
            label,
            id,
        });
        id
    }

    /// Symbol table.
    pub fn preds(&self) -> &Preds {
        &self.preds
    }
    /// Canonical representation.
    pub fn repr(&self) -> &LinearRepr {
        &self.repr
    }
    /// The entry sentinel.
    pub fn entry(&self) -> SymIdx {
        self.preds.entry()
    }
    /// The exit sentinel.
    pub fn exit(&self) -> SymIdx {
        self.preds.exit()
    }

    /// Every symbol appearing as source or target of an edge, plus the
    /// entry sentinel. Sorted.
    pub fn get_vertices(&self) -> Vec<SymIdx> {
        let mut set = SymSet::new();
        set.insert(self.entry());
        self.for_each_edge(|edge| {
            set.insert(edge.from);
            set.insert(edge.to);
        });
        let mut vertices: Vec<_> = set.into_iter().collect();
        vertices.sort();
        vertices
    }

    /// Applies an action to every edge.
    pub fn for_each_edge<F: FnMut(&DirectedEdge)>(&self, mut action: F) {
        for edge in self.edges.values() {
            action(edge)
        }
    }

    /// Iterator over the edges.
    pub fn edges(&self) -> impl Iterator<Item = &DirectedEdge> {
        self.edges.values()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// An edge by id.
    pub fn edge(&self, eid: EId) -> &DirectedEdge {
        &self.edges[&eid]
    }

    /// Label of an edge.
    pub fn label(&self, eid: EId) -> &Term {
        &self.edges[&eid].label
    }
    /// Source of an edge.
    pub fn source(&self, eid: EId) -> SymIdx {
        self.edges[&eid].from
    }
    /// Target of an edge.
    pub fn target(&self, eid: EId) -> SymIdx {
        self.edges[&eid].to
    }

    /// State tuple of a symbol (version 0).
    pub fn state_tuple(&self, sym: SymIdx) -> &[Term] {
        self.repr.state_tuple(sym)
    }
    /// Next-state tuple of a symbol (version 1).
    pub fn next_tuple(&self, sym: SymIdx) -> Vec<Term> {
        self.repr.next_tuple(sym)
    }

    /// The graph with every edge reversed.
    ///
    /// Within each label, version-0 occurrences of the source's variables
    /// and version-1 occurrences of the target's are exchanged by one
    /// simultaneous substitution, so the forward semantics of a reversed
    /// edge is the backward semantics of the original. The sentinels stay
    /// where they are.
    pub fn reverse(&self) -> Self {
        let mut edges = BTreeMap::new();
        for edge in self.edges.values() {
            let reversed = self.reverse_edge(edge);
            edges.insert(reversed.id, reversed);
        }
        ChcDirectedGraph {
            edges,
            preds: self.preds.clone(),
            repr: self.repr.clone(),
            free_id: self.free_id,
        }
    }

    /// One edge reversed, id preserved.
    fn reverse_edge(&self, edge: &DirectedEdge) -> DirectedEdge {
        let mut map = VarHMap::new();
        // state vars of the source become next-state
        map.extend(term::tuple_subst(
            self.state_tuple(edge.from),
            &self.next_tuple(edge.from),
        ));
        // next-state vars of the target become state
        map.extend(term::tuple_subst(
            &self.next_tuple(edge.to),
            self.state_tuple(edge.to),
        ));
        DirectedEdge {
            from: edge.to,
            to: edge.from,
            label: edge.label.subst(&map),
            id: edge.id,
        }
    }

    /// Groups parallel edges and replaces each group by one edge labeled
    /// with the disjunction. True if anything was merged.
    pub fn merge_multi_edges(&mut self) -> bool {
        let mut buckets: HashMap<(SymIdx, SymIdx), Vec<EId>> = HashMap::new();
        self.for_each_edge(|edge| {
            buckets
                .entry((edge.from, edge.to))
                .or_insert_with(Vec::new)
                .push(edge.id)
        });
        let mut changed = false;
        for bucket in buckets.values() {
            if bucket.len() < 2 {
                continue;
            }
            let labels = bucket
                .iter()
                .map(|eid| self.edges[eid].label.clone())
                .collect();
            self.edges
                .get_mut(&bucket[0])
                .expect("bucket ids come from the edge map")
                .label = term::or(labels);
            for eid in &bucket[1..] {
                self.edges.remove(eid);
            }
            changed = true
        }
        changed
    }

    /// Removes every edge whose label is syntactically `⊥`.
    pub fn delete_false_edges(&mut self) {
        let fls = term::fls();
        self.edges.retain(|_, edge| edge.label != fls)
    }

    /// Contracts a vertex: merges every incoming/outgoing edge pair into a
    /// summary edge, then deletes the vertex and its edges.
    ///
    /// Fails on a vertex carrying a self-loop; the graph is left untouched.
    pub fn contract_vertex(&mut self, sym: SymIdx) -> Res<()> {
        let adjacency = AdjacencyLists::of_linear(self);
        for &eid in adjacency.incoming(sym).iter().chain(adjacency.outgoing(sym)) {
            let edge = &self.edges[&eid];
            if edge.from == edge.to {
                shape_bail!(
                    "cannot contract vertex `{}`: it carries a self-loop",
                    self.preds.name(sym)
                )
            }
        }
        for &incoming in adjacency.incoming(sym) {
            for &outgoing in adjacency.outgoing(sym) {
                let _summary = self.merge_edges(incoming, outgoing)?;
            }
        }
        self.delete_node(sym);
        Ok(())
    }

    /// Merges an incoming/outgoing edge pair into a fresh summary edge.
    fn merge_edges(&mut self, incoming: EId, outgoing: EId) -> Res<EId> {
        if self.edges[&incoming].to != self.edges[&outgoing].from {
            shape_bail!("cannot merge edges without a common endpoint")
        }
        let from = self.edges[&incoming].from;
        let to = self.edges[&outgoing].to;
        let label = self.merge_labels(incoming, outgoing);
        Ok(self.new_edge(from, to, label))
    }

    /// Label of the summary edge for an incoming/outgoing pair.
    ///
    /// The incoming label's next-state variables are rebased onto the
    /// connecting predicate's state variables, the conjunction is taken,
    /// and the connecting predicate's variables are eliminated where
    /// trivially possible.
    fn merge_labels(&self, incoming: EId, outgoing: EId) -> Term {
        let common = self.edges[&incoming].to;
        debug_assert_eq! { common, self.edges[& outgoing].from }
        let map = term::tuple_subst(&self.next_tuple(common), self.state_tuple(common));
        let rebased = self.edges[&incoming].label.subst(&map);
        let combined = term::and(vec![rebased, self.edges[&outgoing].label.clone()]);
        let private: VarSet = self
            .state_tuple(common)
            .iter()
            .map(|t| t.get().var().expect("state tuples hold variables"))
            .collect();
        qe::try_eliminate_vars(&private, &combined)
    }

    /// Deletes a vertex and every edge touching it.
    fn delete_node(&mut self, sym: SymIdx) {
        self.edges
            .retain(|_, edge| edge.from != sym && edge.to != sym)
    }

    /// The same graph over the nonlinear canonical representation.
    ///
    /// Version-0 source variables become source-occurrence variables,
    /// version-1 target variables become target variables.
    pub fn to_hyper_graph(&self) -> ChcDirectedHyperGraph {
        let mut repr = NonlinearRepr::new();
        for sym in self.repr.syms() {
            let base = self
                .state_tuple(sym)
                .iter()
                .map(|t| {
                    let v = t.get().var().expect("state tuples hold variables");
                    term::var(v.unversioned())
                })
                .collect();
            repr.add_representation(sym, base);
        }

        let mut edges = BTreeMap::new();
        for edge in self.edges.values() {
            let mut map = VarHMap::new();
            map.extend(term::tuple_subst(
                self.state_tuple(edge.from),
                &repr.source_tuple(edge.from, 0),
            ));
            map.extend(term::tuple_subst(
                &self.next_tuple(edge.to),
                &repr.target_tuple(edge.to),
            ));
            edges.insert(edge.id, DirectedHyperEdge {
                from: vec![edge.from],
                to: edge.to,
                label: edge.label.subst(&map),
                id: edge.id,
            });
        }
        ChcDirectedHyperGraph {
            edges,
            preds: self.preds.clone(),
            repr,
            free_id: self.free_id,
        }
    }

    /// GraphViz DOT output. With `full`, vertices show their state tuple
    /// and edges their label.
    pub fn to_dot<W: Write>(&self, w: &mut W, full: bool) -> Res<()> {
        writeln!(w, "digraph proof {{")?;
        for sym in self.get_vertices() {
            let label = if full {
                let tuple: Vec<String> =
                    self.state_tuple(sym).iter().map(|t| t.to_string()).collect();
                format!("{}({})", self.preds.name(sym), tuple.join(" "))
            } else {
                self.preds.name(sym).to_string()
            };
            writeln!(w, "n{}\t[label = \"{}\"];", sym, label)?;
        }
        for edge in self.edges.values() {
            let label = if full {
                format!("{}", edge.label)
            } else {
                String::new()
            };
            writeln!(w, "n{} -> n{} [label = \"{}\"];", edge.from, edge.to, label)?;
        }
        writeln!(w, "}}")?;
        Ok(())
    }
}

/// Looks up a self-loop on a vertex of a linear graph.
pub fn self_loop_of(
    sym: SymIdx,
    graph: &ChcDirectedGraph,
    adjacency: &AdjacencyLists,
) -> Option<EId> {
    adjacency
        .outgoing(sym)
        .iter()
        .cloned()
        .find(|&eid| graph.target(eid) == sym)
}

/// Post-order of a linear graph's vertices, from the entry.
pub fn post_order(graph: &ChcDirectedGraph, adjacency: &AdjacencyLists) -> Vec<SymIdx> {
    dfs_post_order(graph.entry(), |sym| {
        adjacency
            .outgoing(sym)
            .iter()
            .map(|&eid| graph.target(eid))
            .collect()
    })
}

/// Reverse post-order of a linear graph's vertices.
pub fn reverse_post_order(graph: &ChcDirectedGraph, adjacency: &AdjacencyLists) -> Vec<SymIdx> {
    let mut order = post_order(graph, adjacency);
    order.reverse();
    order
}

/// Per-edge instance numbers for repeated source symbols.
///
/// Slot `i` of a hyperedge uses the `instance_number(eid, i)`-th
/// source-occurrence renaming of its symbol.
pub struct VertexInstances {
    /// Instance number per edge and source slot.
    counter: EIdHMap<Vec<usize>>,
}

impl VertexInstances {
    /// Computes the instance numbers of a hypergraph.
    pub fn new(graph: &ChcDirectedHyperGraph) -> Self {
        let mut counter = EIdHMap::new();
        graph.for_each_edge(|edge| {
            let mut seen: SymHMap<usize> = SymHMap::new();
            let mut instances = Vec::with_capacity(edge.from.len());
            for &sym in &edge.from {
                let count = seen.entry(sym).or_insert(0);
                instances.push(*count);
                *count += 1;
            }
            counter.insert(edge.id, instances);
        });
        VertexInstances { counter }
    }

    /// Instance number of the `source_index`-th source slot of an edge.
    pub fn instance_number(&self, eid: EId, source_index: usize) -> usize {
        self.counter[&eid][source_index]
    }
}

/// A directed hypergraph of (possibly nonlinear) clauses.
#[derive(Clone, Debug)]
pub struct ChcDirectedHyperGraph {
    /// Edges, owned by the graph.
    edges: BTreeMap<EId, DirectedHyperEdge>,
    /// Symbol table.
    preds: Preds,
    /// Canonical representation.
    repr: NonlinearRepr,
    /// Next free edge id.
    free_id: usize,
}

impl ChcDirectedHyperGraph {
    /// Constructor; assigns edge ids in order.
    pub fn new(edges: Vec<(Vec<SymIdx>, SymIdx, Term)>, preds: Preds, repr: NonlinearRepr) -> Self {
        let mut graph = ChcDirectedHyperGraph {
            edges: BTreeMap::new(),
            preds,
            repr,
            free_id: 0,
        };
        for (from, to, label) in edges {
            graph.new_edge(from, to, label);
        }
        graph
    }

    /// Fresh edge id.
    fn fresh_id(&mut self) -> EId {
        let id = self.free_id.into();
        self.free_id += 1;
        id
    }

    /// Adds an edge, returns its id.
    fn new_edge(&mut self, from: Vec<SymIdx>, to: SymIdx, label: Term) -> EId {
        debug_assert! { !from.is_empty() }
        let id = self.fresh_id();
        self.edges.insert(id, DirectedHyperEdge {
            from,
            to,
            label,
            id,
        });
        id
    }

    /// Symbol table.
    pub fn preds(&self) -> &Preds {
        &self.preds
    }
    /// Canonical representation.
    pub fn repr(&self) -> &NonlinearRepr {
        &self.repr
    }
    /// The entry sentinel.
    pub fn entry(&self) -> SymIdx {
        self.preds.entry()
    }
    /// The exit sentinel.
    pub fn exit(&self) -> SymIdx {
        self.preds.exit()
    }

    /// Every symbol appearing as source or target of an edge, plus the
    /// entry sentinel. Sorted.
    pub fn get_vertices(&self) -> Vec<SymIdx> {
        let mut set = SymSet::new();
        set.insert(self.entry());
        self.for_each_edge(|edge| {
            for &sym in &edge.from {
                set.insert(sym);
            }
            set.insert(edge.to);
        });
        let mut vertices: Vec<_> = set.into_iter().collect();
        vertices.sort();
        vertices
    }

    /// Applies an action to every edge.
    pub fn for_each_edge<F: FnMut(&DirectedHyperEdge)>(&self, mut action: F) {
        for edge in self.edges.values() {
            action(edge)
        }
    }

    /// Iterator over the edges.
    pub fn edges(&self) -> impl Iterator<Item = &DirectedHyperEdge> {
        self.edges.values()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// An edge by id.
    pub fn edge(&self, eid: EId) -> &DirectedHyperEdge {
        &self.edges[&eid]
    }

    /// Label of an edge.
    pub fn label(&self, eid: EId) -> &Term {
        &self.edges[&eid].label
    }
    /// Sources of an edge.
    pub fn sources(&self, eid: EId) -> &[SymIdx] {
        &self.edges[&eid].from
    }
    /// Target of an edge.
    pub fn target(&self, eid: EId) -> SymIdx {
        self.edges[&eid].to
    }

    /// Source tuple of the `instance`-th occurrence of a symbol.
    pub fn source_tuple(&self, sym: SymIdx, instance: usize) -> Vec<Term> {
        self.repr.source_tuple(sym, instance)
    }
    /// Target tuple of a symbol.
    pub fn target_tuple(&self, sym: SymIdx) -> Vec<Term> {
        self.repr.target_tuple(sym)
    }

    /// True if every edge has exactly one source.
    pub fn is_normal_graph(&self) -> bool {
        self.edges.values().all(|edge| edge.from.len() == 1)
    }

    /// The same graph over the linear canonical representation.
    ///
    /// Defined when every edge has one source: source-occurrence variables
    /// are rebased to version 0, target variables to version 1.
    pub fn to_normal_graph(&self) -> Res<ChcDirectedGraph> {
        if !self.is_normal_graph() {
            shape_bail!("cannot normalize a graph with true hyperedges")
        }
        let mut repr = LinearRepr::new();
        for sym in self.repr.syms() {
            let state = self
                .repr
                .base_tuple(sym)
                .iter()
                .map(|t| {
                    let v = t.get().var().expect("base tuples hold variables");
                    term::var(v.version_zero())
                })
                .collect();
            repr.add_representation(sym, state);
        }

        let mut edges = BTreeMap::new();
        for edge in self.edges.values() {
            let source = edge.from[0];
            let mut map = VarHMap::new();
            map.extend(term::tuple_subst(
                &self.source_tuple(source, 0),
                repr.state_tuple(source),
            ));
            map.extend(term::tuple_subst(
                &self.target_tuple(edge.to),
                &repr.next_tuple(edge.to),
            ));
            edges.insert(edge.id, DirectedEdge {
                from: source,
                to: edge.to,
                label: edge.label.subst(&map),
                id: edge.id,
            });
        }
        Ok(ChcDirectedGraph {
            edges,
            preds: self.preds.clone(),
            repr,
            free_id: self.free_id,
        })
    }

    /// Groups parallel single-source edges and replaces each group by one
    /// edge labeled with the disjunction. True if anything was merged.
    pub fn merge_multi_edges(&mut self) -> bool {
        let mut buckets: HashMap<(SymIdx, SymIdx), Vec<EId>> = HashMap::new();
        self.for_each_edge(|edge| {
            if edge.from.len() != 1 {
                return;
            }
            buckets
                .entry((edge.from[0], edge.to))
                .or_insert_with(Vec::new)
                .push(edge.id)
        });
        let mut changed = false;
        for bucket in buckets.values() {
            if bucket.len() < 2 {
                continue;
            }
            let labels = bucket
                .iter()
                .map(|eid| self.edges[eid].label.clone())
                .collect();
            self.edges
                .get_mut(&bucket[0])
                .expect("bucket ids come from the edge map")
                .label = term::or(labels);
            for eid in &bucket[1..] {
                self.edges.remove(eid);
            }
            changed = true
        }
        changed
    }

    /// Removes every edge whose label is syntactically `⊥`.
    pub fn delete_false_edges(&mut self) {
        let fls = term::fls();
        self.edges.retain(|_, edge| edge.label != fls)
    }

    /// Contracts a vertex: merges every incoming/outgoing edge pair into a
    /// summary edge, then deletes the vertex and its edges.
    ///
    /// Fails without mutating if an adjacent edge is a true hyperedge or
    /// the vertex carries a self-loop. Returns, for each summary edge, the
    /// pair it merged: `(summary, incoming, outgoing)`.
    pub fn contract_vertex(&mut self, sym: SymIdx) -> Res<Vec<(EId, EId, EId)>> {
        let adjacency = AdjacencyLists::of_hyper(self);
        for &eid in adjacency.incoming(sym).iter().chain(adjacency.outgoing(sym)) {
            let edge = &self.edges[&eid];
            if edge.from.len() > 1 {
                shape_bail!(
                    "cannot contract vertex `{}` through a hyperedge",
                    self.preds.name(sym)
                )
            }
            if edge.from[0] == edge.to {
                shape_bail!(
                    "cannot contract vertex `{}`: it carries a self-loop",
                    self.preds.name(sym)
                )
            }
        }
        let mut merged = vec![];
        for &incoming in adjacency.incoming(sym) {
            for &outgoing in adjacency.outgoing(sym) {
                let summary = self.merge_edges(&[incoming, outgoing])?;
                merged.push((summary.id, incoming, outgoing));
            }
        }
        self.delete_node(sym);
        Ok(merged)
    }

    /// Contracts a connected chain of single-source edges into one summary
    /// edge; the intermediate vertices (every edge target but the last) are
    /// deleted.
    pub fn contract_trivial_chain(&mut self, chain: &[EId]) -> Res<DirectedHyperEdge> {
        if chain.len() < 2 {
            shape_bail!("trivial chain contraction expects at least two edges")
        }
        for window in chain.windows(2) {
            if self.target(window[0]) != self.sources(window[1])[0] {
                shape_bail!("trivial chain contraction expects a connected chain")
            }
        }
        let outer_source = self.sources(chain[0])[0];
        let outer_target = self.target(chain[chain.len() - 1]);
        for &eid in chain {
            if self.sources(eid).len() != 1 {
                shape_bail!("trivial chain contraction expects single-source edges")
            }
        }
        let intermediates: Vec<SymIdx> = chain[..chain.len() - 1]
            .iter()
            .map(|&eid| self.target(eid))
            .collect();
        if intermediates
            .iter()
            .any(|&sym| sym == outer_source || sym == outer_target)
        {
            shape_bail!("trivial chain contraction expects an acyclic chain")
        }
        let summary = self.merge_edges(chain)?;
        for sym in intermediates {
            self.delete_node(sym)
        }
        Ok(summary)
    }

    /// Merges a connected chain of single-source edges into a fresh edge.
    fn merge_edges(&mut self, chain: &[EId]) -> Res<DirectedHyperEdge> {
        debug_assert! { self.sources(chain[0]).len() == 1 }
        let source = self.sources(chain[0])[0];
        let target = self.target(chain[chain.len() - 1]);
        let label = self.merge_labels(chain)?;
        let eid = self.new_edge(vec![source], target, label);
        Ok(self.edges[&eid].clone())
    }

    /// Label of the summary edge for a chain.
    ///
    /// Every connecting predicate has unique variables in the canonical
    /// representation, so its target variables can be rebased onto its
    /// source variables directly; everything not exposed at the outer
    /// endpoints is then eliminated where trivially possible.
    fn merge_labels(&self, chain: &[EId]) -> Res<Term> {
        debug_assert! { chain.len() >= 2 }
        let source = self.sources(chain[0])[0];
        let target = self.target(chain[chain.len() - 1]);
        let mut labels = Vec::with_capacity(chain.len());
        let mut map = VarHMap::new();
        for &eid in chain {
            labels.push(self.edges[&eid].label.clone());
        }
        for window in chain.windows(2) {
            let common = self.target(window[0]);
            if self.sources(window[1])[0] != common {
                shape_bail!("cannot merge edges without a common endpoint")
            }
            map.extend(term::tuple_subst(
                &self.target_tuple(common),
                &self.source_tuple(common, 0),
            ));
        }
        let combined = term::and(labels).subst(&map);
        let mut keep: VarSet = VarSet::new();
        for t in self
            .source_tuple(source, 0)
            .iter()
            .chain(self.target_tuple(target).iter())
        {
            keep.insert(t.get().var().expect("canonical tuples hold variables"));
        }
        Ok(qe::try_eliminate_vars_except(&keep, &combined))
    }

    /// Deletes a vertex and every edge touching it.
    pub(crate) fn delete_node(&mut self, sym: SymIdx) {
        self.edges
            .retain(|_, edge| edge.to != sym && !edge.from.contains(&sym))
    }

    /// Looks up a self-loop on a vertex.
    pub fn self_loop_of(&self, sym: SymIdx, adjacency: &AdjacencyLists) -> Option<EId> {
        adjacency
            .outgoing(sym)
            .iter()
            .cloned()
            .find(|&eid| self.target(eid) == sym)
    }

    /// Reverse post-order of the vertices, from the entry.
    pub fn reverse_post_order(&self, adjacency: &AdjacencyLists) -> Vec<SymIdx> {
        let mut order = dfs_post_order(self.entry(), |sym| {
            adjacency
                .outgoing(sym)
                .iter()
                .map(|&eid| self.target(eid))
                .collect()
        });
        order.reverse();
        order
    }

    /// GraphViz DOT output. With `full`, vertices show their base tuple
    /// and edges their label.
    pub fn to_dot<W: Write>(&self, w: &mut W, full: bool) -> Res<()> {
        writeln!(w, "digraph proof {{")?;
        for sym in self.get_vertices() {
            let label = if full {
                let tuple: Vec<String> = self
                    .repr
                    .base_tuple(sym)
                    .iter()
                    .map(|t| t.to_string())
                    .collect();
                format!("{}({})", self.preds.name(sym), tuple.join(" "))
            } else {
                self.preds.name(sym).to_string()
            };
            writeln!(w, "n{}\t[label = \"{}\"];", sym, label)?;
        }
        for edge in self.edges.values() {
            let label = if full {
                format!("{}", edge.label)
            } else {
                String::new()
            };
            for &src in &edge.from {
                writeln!(w, "n{} -> n{} [label = \"{}\"];", src, edge.to, label)?;
            }
        }
        writeln!(w, "}}")?;
        Ok(())
    }
}

use crate::{NodeId, Weight};

use std::collections::{BTreeSet, HashMap};

/// Rank of a materialized edge, used to index the dense per-edge arrays in
/// the graph and the heap. Rank 0 is reserved for pairs that never appeared
/// in the input, i.e. implicit zero edges.
pub type RankId = usize;

/// Canonical unordered pair of distinct vertices, stored with `u < v`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub u: NodeId,
    pub v: NodeId,
}

impl Edge {
    /// Panics if `a == b`; self-loops carry no meaning here.
    pub fn new(a: NodeId, b: NodeId) -> Self {
        assert_ne!(a, b);
        if a < b {
            Edge { u: a, v: b }
        } else {
            Edge { u: b, v: a }
        }
    }
}

/// Tagged edge weight. `Permanent` and `Forbidden` are the two sentinel
/// states, `Zero` is the implicit weight of non-materialized pairs.
///
/// The numeric reading maps `Permanent` to `+inf` and `Forbidden` to `-inf`.
/// Storing the sentinels as tags instead of float infinities keeps the
/// stored data free of NaN hazards; the infinities only ever appear inside
/// comparisons and the min/max arithmetic of the induced-cost maintenance,
/// where they behave as intended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EdgeWeight {
    Permanent,
    Forbidden,
    Zero,
    Real(Weight),
}

impl EdgeWeight {
    pub fn value(self) -> Weight {
        match self {
            EdgeWeight::Permanent => Weight::INFINITY,
            EdgeWeight::Forbidden => Weight::NEG_INFINITY,
            EdgeWeight::Zero => 0.0,
            EdgeWeight::Real(w) => w,
        }
    }

    pub fn is_permanent(self) -> bool {
        matches!(self, EdgeWeight::Permanent)
    }

    pub fn is_forbidden(self) -> bool {
        matches!(self, EdgeWeight::Forbidden)
    }
}

/// Assembles a `WeightedGraph` from an edge list. Ranks are assigned in
/// insertion order, starting at 1.
///
/// The builder asserts the structural contract (distinct in-range endpoints,
/// no duplicates, no NaN); input-level validation with recoverable errors is
/// the parser's job.
pub struct GraphBuilder {
    size: usize,
    ranks: HashMap<Edge, RankId>,
    weights: Vec<EdgeWeight>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn new(size: usize) -> Self {
        GraphBuilder {
            size,
            ranks: HashMap::new(),
            // Rank 0 is the "not materialized" sentinel, so the dense
            // vectors carry a dummy slot at index 0.
            weights: vec![EdgeWeight::Zero],
            edges: vec![Edge { u: 0, v: 0 }],
        }
    }

    /// Registers the pair `(u, v)` with the given weight. Pairs with an
    /// exact zero weight stay implicit and are not materialized.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, w: EdgeWeight) {
        assert!(u < self.size && v < self.size);
        let e = Edge::new(u, v);
        match w {
            EdgeWeight::Zero => return,
            EdgeWeight::Real(w) => {
                assert!(!w.is_nan());
                if w == 0.0 {
                    return;
                }
            }
            _ => {}
        }
        let prev = self.ranks.insert(e, self.weights.len());
        assert!(prev.is_none(), "duplicate edge ({}, {})", e.u, e.v);
        self.weights.push(w);
        self.edges.push(e);
    }

    pub fn build(self) -> WeightedGraph {
        let size = self.size;
        let mut g = WeightedGraph {
            num_nodes: size,
            ranks: self.ranks,
            weights: self.weights,
            edges: self.edges,
            clique_id: (0..size).collect(),
            members: (0..size).map(|v| vec![v]).collect(),
            forbidden: vec![BTreeSet::new(); size],
            unpruned: vec![Vec::new(); size],
            nonzero: vec![Vec::new(); size],
        };

        for rank in 1..g.weights.len() {
            let Edge { u, v } = g.edges[rank];
            g.nonzero[u].push(v);
            g.nonzero[v].push(u);
            match g.weights[rank] {
                EdgeWeight::Permanent => g.merge_cliques(u, v),
                EdgeWeight::Forbidden => {
                    g.forbidden[u].insert(v);
                    g.forbidden[v].insert(u);
                }
                _ => {
                    g.unpruned[u].push(v);
                    g.unpruned[v].push(u);
                }
            }
        }

        for v in 0..size {
            g.nonzero[v].sort_unstable();
            g.unpruned[v].sort_unstable();
        }

        g
    }
}

/// Sparse undirected graph with mutable edge state, the substrate of the
/// induced-cost heuristic.
///
/// Permanent-closure over vertices is tracked by keeping, for every vertex,
/// the id of its clique class together with an enumerable member list per
/// class; merging relabels the smaller class. Forbidden pairs are tracked as
/// per-vertex neighbor sets and are *not* transitively closed across clique
/// classes here — the solver propagates those implications itself.
pub struct WeightedGraph {
    num_nodes: usize,
    ranks: HashMap<Edge, RankId>,
    weights: Vec<EdgeWeight>,
    edges: Vec<Edge>,
    clique_id: Vec<NodeId>,
    members: Vec<Vec<NodeId>>,
    forbidden: Vec<BTreeSet<NodeId>>,
    /// Materialized edges that are still undecided, as adjacency lists in
    /// ascending vertex order.
    unpruned: Vec<Vec<NodeId>>,
    /// All materialized edges, regardless of state. Fixed after
    /// construction.
    nonzero: Vec<Vec<NodeId>>,
}

impl WeightedGraph {
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of materialized edges, i.e. the highest assigned rank.
    pub fn num_edges(&self) -> usize {
        self.weights.len() - 1
    }

    /// Rank of `e`, or 0 if the pair was never materialized.
    pub fn find_index(&self, e: Edge) -> RankId {
        self.ranks.get(&e).copied().unwrap_or(0)
    }

    pub fn edge_of_rank(&self, r: RankId) -> Edge {
        debug_assert!(r > 0);
        self.edges[r]
    }

    /// Weight by rank. Rank 0 reads as the implicit zero weight; callers
    /// that hold a possibly-zero rank use this to treat unmaterialized pairs
    /// as weight 0 regardless of their derived logical state.
    pub fn weight_by_rank(&self, r: RankId) -> EdgeWeight {
        if r == 0 {
            EdgeWeight::Zero
        } else {
            self.weights[r]
        }
    }

    /// Weight of an arbitrary pair. For non-materialized pairs the logical
    /// state is derived from the clique classes and forbidden sets.
    pub fn weight(&self, e: Edge) -> EdgeWeight {
        let r = self.find_index(e);
        if r > 0 {
            self.weights[r]
        } else if self.clique_id[e.u] == self.clique_id[e.v] {
            EdgeWeight::Permanent
        } else if self.forbidden[e.u].contains(&e.v) {
            EdgeWeight::Forbidden
        } else {
            EdgeWeight::Zero
        }
    }

    pub fn is_forbidden(&self, e: Edge) -> bool {
        self.weight(e).is_forbidden()
    }

    /// All vertices in `v`'s clique class, in ascending order, including `v`
    /// itself.
    pub fn clique_of(&self, v: NodeId) -> &[NodeId] {
        &self.members[self.clique_id[v]]
    }

    /// Identifier of `v`'s clique class. Opaque, but equal for all members
    /// of one class.
    pub fn clique_id_of(&self, v: NodeId) -> NodeId {
        self.clique_id[v]
    }

    /// Vertices with a forbidden edge to `v`, in ascending order.
    pub fn forbidden_neighbors(&self, v: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.forbidden[v].iter().copied()
    }

    /// Vertices connected to `v` by a materialized, still undecided edge, in
    /// ascending order.
    pub fn unpruned_neighbours(&self, v: NodeId) -> &[NodeId] {
        &self.unpruned[v]
    }

    /// Vertices connected to `v` by any materialized edge, decided or not,
    /// in ascending order.
    pub fn nonzero_neighbours(&self, v: NodeId) -> &[NodeId] {
        &self.nonzero[v]
    }

    /// Commits `e` to the permanent state and merges the clique classes of
    /// its endpoints. For rank-0 pairs only the class merge is recorded.
    pub fn set_permanent(&mut self, e: Edge) {
        let r = self.find_index(e);
        if r > 0 {
            self.weights[r] = EdgeWeight::Permanent;
            self.prune(e);
        }
        self.merge_cliques(e.u, e.v);
    }

    /// Commits `e` to the forbidden state. For rank-0 pairs only the
    /// forbidden-neighbor sets are updated.
    pub fn set_forbidden(&mut self, e: Edge) {
        let r = self.find_index(e);
        if r > 0 {
            self.weights[r] = EdgeWeight::Forbidden;
            self.prune(e);
        }
        self.forbidden[e.u].insert(e.v);
        self.forbidden[e.v].insert(e.u);
    }

    /// Creates a petgraph graph holding every materialized edge with its
    /// numeric weight reading, for display purposes.
    pub fn to_petgraph(&self) -> crate::PetGraph {
        use petgraph::prelude::NodeIndex;

        let mut pg = crate::PetGraph::with_capacity(self.num_nodes, self.num_edges());
        let map: Vec<NodeIndex> = (0..self.num_nodes).map(|v| pg.add_node(v)).collect();
        for r in 1..self.weights.len() {
            let e = self.edges[r];
            pg.add_edge(map[e.u], map[e.v], self.weights[r].value());
        }
        pg
    }

    fn prune(&mut self, e: Edge) {
        if let Ok(i) = self.unpruned[e.u].binary_search(&e.v) {
            self.unpruned[e.u].remove(i);
        }
        if let Ok(i) = self.unpruned[e.v].binary_search(&e.u) {
            self.unpruned[e.v].remove(i);
        }
    }

    fn merge_cliques(&mut self, u: NodeId, v: NodeId) {
        let (cu, cv) = (self.clique_id[u], self.clique_id[v]);
        if cu == cv {
            return;
        }

        let (keep, gone) = if self.members[cu].len() >= self.members[cv].len() {
            (cu, cv)
        } else {
            (cv, cu)
        };

        let moved = std::mem::take(&mut self.members[gone]);
        for &x in &moved {
            self.clique_id[x] = keep;
        }
        let merged = merge_sorted(&self.members[keep], &moved);
        self.members[keep] = merged;
    }
}

fn merge_sorted(a: &[NodeId], b: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

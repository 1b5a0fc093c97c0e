use crate::edge_heap::EdgeHeap;
use crate::graph::{Edge, EdgeWeight, WeightedGraph};
use crate::{NodeId, RankId, Weight};

use std::collections::HashMap;

use log::{debug, info, warn};

/// Result of a heuristic run: the partition into cliques and the total
/// absolute weight of all modifications. An infeasible instance is reported
/// as an infinite cost with no clusters.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterSolution {
    total_cost: Weight,
    clusters: Vec<Vec<NodeId>>,
}

impl ClusterSolution {
    fn infeasible() -> Self {
        ClusterSolution {
            total_cost: Weight::INFINITY,
            clusters: Vec::new(),
        }
    }

    pub fn total_cost(&self) -> Weight {
        self.total_cost
    }

    /// Clusters in ascending order of their smallest vertex, each sorted
    /// ascending. Empty iff the instance was infeasible.
    pub fn clusters(&self) -> &[Vec<NodeId>] {
        &self.clusters
    }

    pub fn is_feasible(&self) -> bool {
        self.total_cost.is_finite()
    }
}

/// Greedy solver for weighted cluster editing.
///
/// In every iteration the edge with the highest induced cost is taken from
/// the heap and committed: if forbidding it would be at least as expensive
/// as making it permanent, it becomes permanent, otherwise forbidden. All
/// logical consequences of the decision (clique merges, forbidden
/// propagation, optional bundling of parallel edges) are applied before the
/// next pick.
pub struct InducedCostHeuristic {
    graph: WeightedGraph,
    heap: EdgeHeap,
    bundle_edges: bool,
    total_cost: Weight,
    total_edges: usize,
}

impl InducedCostHeuristic {
    /// Builds the solver for `graph`. Resolves the closure of pre-declared
    /// permanent and forbidden edges first; a contradiction found there
    /// marks the instance as infeasible.
    pub fn new(mut graph: WeightedGraph, bundle_edges: bool) -> Self {
        let mut total_cost = 0.0;
        if !resolve_permanent_forbidden(&mut graph, &mut total_cost) {
            total_cost = Weight::INFINITY;
        }

        let heap = EdgeHeap::new(&graph);
        let total_edges = heap.num_unprocessed();

        InducedCostHeuristic {
            graph,
            heap,
            bundle_edges,
            total_cost,
            total_edges,
        }
    }

    /// Runs the heuristic and returns the solution.
    pub fn solve(&mut self) -> ClusterSolution {
        if self.total_cost.is_infinite() {
            warn!("Instance is infeasible");
            return ClusterSolution::infeasible();
        }

        info!("Running heuristic on {} candidate edges", self.total_edges);

        // The heap shrinks by at least the chosen edge per iteration, so
        // this bound is never the one that terminates the loop.
        for _ in 0..=self.graph.num_edges() {
            let (e_icf, e_icp) = match (self.heap.max_icf_edge(), self.heap.max_icp_edge()) {
                (Some(a), Some(b)) => (a, b),
                _ => break,
            };

            let icf = self.heap.icf_of(self.graph.find_index(e_icf));
            let icp = self.heap.icp_of(self.graph.find_index(e_icp));

            // The costlier outcome is the one to avoid: an edge whose
            // removal would be expensive is fixed as permanent, one whose
            // insertion would be expensive is cut. Equality goes to
            // permanent.
            if icf >= icp {
                self.choose_permanent(e_icf);
            } else {
                self.choose_forbidden(e_icp);
            }

            debug!(
                "{} of {} edges processed",
                self.total_edges - self.heap.num_unprocessed(),
                self.total_edges
            );
        }

        self.extract_clusters()
    }

    fn choose_permanent(&mut self, e: Edge) {
        debug!("Setting ({}, {}) to permanent", e.u, e.v);

        // Both implication sets are collected before any state changes: the
        // zero edges inside the affected cliques flip their implicit state
        // as soon as the merge is committed, which would corrupt the
        // collection if it ran interleaved.
        let u_clique = self.graph.clique_of(e.u).to_vec();
        let v_clique = self.graph.clique_of(e.v).to_vec();

        // Connecting u and v connects their cliques pairwise. Zero edges
        // need no entry, the clique merge covers them implicitly.
        let mut permanent = Vec::new();
        for &x in &u_clique {
            for &y in &v_clique {
                let pair = Edge::new(x, y);
                if pair == e || self.graph.find_index(pair) == 0 {
                    continue;
                }
                permanent.push(pair);
            }
        }

        // The cliques being connected may already be forbidden to other
        // vertices; those exclusions extend to the whole merged clique.
        let mut forbidden = Vec::new();
        let forb_u: Vec<NodeId> = self.graph.forbidden_neighbors(e.u).collect();
        for f in forb_u {
            for &x in &v_clique {
                if f == x {
                    continue;
                }
                let pair = Edge::new(f, x);
                if self.graph.find_index(pair) != 0 && !self.graph.is_forbidden(pair) {
                    forbidden.push(pair);
                }
            }
        }
        let forb_v: Vec<NodeId> = self.graph.forbidden_neighbors(e.v).collect();
        for f in forb_v {
            for &x in &u_clique {
                if f == x {
                    continue;
                }
                let pair = Edge::new(f, x);
                if self.graph.find_index(pair) != 0 && !self.graph.is_forbidden(pair) {
                    forbidden.push(pair);
                }
            }
        }

        self.set_permanent(e);
        self.remove_from_heap(e);

        for pair in permanent {
            self.set_permanent(pair);
            self.remove_from_heap(pair);
        }
        for pair in forbidden {
            self.set_forbidden(pair);
            self.remove_from_heap(pair);
        }

        if self.bundle_edges {
            self.bundle_clique_edges(&u_clique, &v_clique);
        }
    }

    fn choose_forbidden(&mut self, e: Edge) {
        debug!("Setting ({}, {}) to forbidden", e.u, e.v);

        // Keeping u and v apart keeps their cliques apart pairwise. As
        // above, the set is collected before the first mutation.
        let u_clique = self.graph.clique_of(e.u).to_vec();
        let v_clique = self.graph.clique_of(e.v).to_vec();

        let mut implications = Vec::new();
        for &x in &u_clique {
            for &y in &v_clique {
                let pair = Edge::new(x, y);
                if pair == e || self.graph.find_index(pair) == 0 {
                    continue;
                }
                implications.push(pair);
            }
        }

        self.set_forbidden(e);
        self.remove_from_heap(e);

        for pair in implications {
            self.set_forbidden(pair);
            self.remove_from_heap(pair);
        }
    }

    /// After a merge the combined clique acts as a single node: all parallel
    /// edges running from it to one outside clique collapse into a single
    /// heap entry carrying the summed scores, so later induced-cost updates
    /// stay coherent with the merged view.
    fn bundle_clique_edges(&mut self, u_clique: &[NodeId], v_clique: &[NodeId]) {
        let mut combined = u_clique.to_vec();
        combined.extend_from_slice(v_clique);

        let mut representative: HashMap<NodeId, RankId> = HashMap::new();
        for &x in &combined {
            let neighbours = self.graph.unpruned_neighbours(x).to_vec();
            for xn in neighbours {
                if combined.contains(&xn) {
                    continue;
                }
                let rank = self.graph.find_index(Edge::new(x, xn));
                let target = self.graph.clique_id_of(xn);
                match representative.get(&target).copied() {
                    Some(rep) => self.heap.merge_edges(rank, rep),
                    None => {
                        representative.insert(target, rank);
                    }
                }
            }
        }
    }

    /// Commits the permanent state for `e`, updating every triple through it
    /// and charging the edge's weight if the decision flips a negative edge.
    ///
    /// The weight is read through the rank so that pairs that were never
    /// materialized count as 0, whatever their derived logical state is by
    /// now.
    fn set_permanent(&mut self, e: Edge) {
        let rank = self.graph.find_index(e);
        let w_uv = self.graph.weight_by_rank(rank).value();

        let u_neighbours = self.graph.unpruned_neighbours(e.u).to_vec();
        for w in u_neighbours {
            if w == e.v {
                continue;
            }
            let r = self.graph.find_index(Edge::new(e.v, w));
            if r > 0 {
                let w_vw = self.graph.weight_by_rank(r).value();
                self.update_triple_permanent(w_uv, Edge::new(e.u, w), w_vw);
            }
        }
        let v_neighbours = self.graph.unpruned_neighbours(e.v).to_vec();
        for w in v_neighbours {
            if w == e.u {
                continue;
            }
            let r = self.graph.find_index(Edge::new(e.u, w));
            if r > 0 {
                let w_uw = self.graph.weight_by_rank(r).value();
                self.update_triple_permanent(w_uv, Edge::new(e.v, w), w_uw);
            }
        }

        if w_uv < 0.0 {
            self.total_cost += -w_uv;
        }
        self.graph.set_permanent(e);
    }

    /// Forbidden counterpart of `set_permanent`; charges positive weights.
    fn set_forbidden(&mut self, e: Edge) {
        let rank = self.graph.find_index(e);
        let w_uv = self.graph.weight_by_rank(rank).value();

        let u_neighbours = self.graph.unpruned_neighbours(e.u).to_vec();
        for w in u_neighbours {
            if w == e.v {
                continue;
            }
            let r = self.graph.find_index(Edge::new(e.v, w));
            if r > 0 {
                let w_vw = self.graph.weight_by_rank(r).value();
                self.update_triple_forbidden(w_uv, Edge::new(e.u, w), w_vw);
            }
        }
        let v_neighbours = self.graph.unpruned_neighbours(e.v).to_vec();
        for w in v_neighbours {
            if w == e.u {
                continue;
            }
            let r = self.graph.find_index(Edge::new(e.u, w));
            if r > 0 {
                let w_uw = self.graph.weight_by_rank(r).value();
                self.update_triple_forbidden(w_uv, Edge::new(e.v, w), w_uw);
            }
        }

        if w_uv > 0.0 {
            self.total_cost += w_uv;
        }
        self.graph.set_forbidden(e);
    }

    /// Replaces the contribution the old `(uv, vw)` pair made to the scores
    /// of `uw` with the post-decision one: once `uv` is permanent, `uw`
    /// tracks `vw` directly.
    fn update_triple_permanent(&mut self, w_uv: Weight, uw: Edge, w_vw: Weight) {
        let rank = self.graph.find_index(uw);
        let icf_old = EdgeHeap::icf_triple(w_uv, w_vw);
        let icp_old = EdgeHeap::icp_triple(w_uv, w_vw);
        let icf_new = w_vw.max(0.0);
        let icp_new = (-w_vw).max(0.0);
        if icf_new != icf_old {
            self.heap.increase_icf(rank, icf_new - icf_old);
        }
        if icp_new != icp_old {
            self.heap.increase_icp(rank, icp_new - icp_old);
        }
    }

    /// Once `uv` is forbidden the triple can no longer force a cut of `uw`,
    /// but making `uw` permanent would pull `w` next to `v`.
    fn update_triple_forbidden(&mut self, w_uv: Weight, uw: Edge, w_vw: Weight) {
        let rank = self.graph.find_index(uw);
        let icf_old = EdgeHeap::icf_triple(w_uv, w_vw);
        let icp_old = EdgeHeap::icp_triple(w_uv, w_vw);
        let icp_new = w_vw.max(0.0);
        if icf_old != 0.0 {
            self.heap.increase_icf(rank, -icf_old);
        }
        if icp_new != icp_old {
            self.heap.increase_icp(rank, icp_new - icp_old);
        }
    }

    fn remove_from_heap(&mut self, e: Edge) {
        self.heap.remove_edge(self.graph.find_index(e));
    }

    /// The clusters are the connected components of the permanent subgraph;
    /// zero edges that were never decided count as forbidden.
    fn extract_clusters(&self) -> ClusterSolution {
        let mut clusters: Vec<Vec<NodeId>> = Vec::new();
        let mut assigned = vec![false; self.graph.num_nodes()];

        for u in 0..self.graph.num_nodes() {
            if assigned[u] {
                continue;
            }
            let members = self.graph.clique_of(u).to_vec();
            for &v in &members {
                assigned[v] = true;
            }
            clusters.push(members);
        }

        info!(
            "Heuristic finished with total cost {} and {} clusters",
            self.total_cost,
            clusters.len()
        );

        ClusterSolution {
            total_cost: self.total_cost,
            clusters,
        }
    }
}

/// Closes the pre-declared permanent edges into cliques, charging negative
/// intra-clique weights, and separates clique pairs that carry a forbidden
/// edge between them. Promotions to forbidden are not charged: the
/// triggering forbidden edge already encodes the separation.
///
/// Returns false iff some pair is derived as both permanent and forbidden,
/// i.e. the instance is infeasible.
fn resolve_permanent_forbidden(graph: &mut WeightedGraph, total_cost: &mut Weight) -> bool {
    let mut processed = vec![false; graph.num_nodes()];
    let mut cliques: Vec<Vec<NodeId>> = Vec::new();
    let mut large_cliques: Vec<Vec<NodeId>> = Vec::new();

    for u in 0..graph.num_nodes() {
        if processed[u] {
            continue;
        }
        let clique = graph.clique_of(u).to_vec();
        for &x in &clique {
            processed[x] = true;
        }

        for i in 0..clique.len() {
            for j in (i + 1)..clique.len() {
                let pair = Edge::new(clique[i], clique[j]);
                match graph.weight(pair) {
                    EdgeWeight::Forbidden => return false,
                    EdgeWeight::Permanent => {}
                    w => {
                        let value = w.value();
                        if value < 0.0 {
                            *total_cost += -value;
                        }
                        graph.set_permanent(pair);
                        debug!(
                            "Making ({}, {}) permanent due to implication",
                            pair.u, pair.v
                        );
                    }
                }
            }
        }

        if clique.len() > 1 {
            large_cliques.push(clique.clone());
        }
        cliques.push(clique);
    }

    // A single forbidden edge between two cliques separates them entirely.
    // Singleton-singleton pairs have nothing to promote and are skipped by
    // only pairing against cliques with more than one member.
    for k in &cliques {
        for l in &large_cliques {
            if graph.clique_id_of(k[0]) == graph.clique_id_of(l[0]) {
                continue;
            }
            let found = k
                .iter()
                .any(|&u| l.iter().any(|&v| graph.weight(Edge::new(u, v)).is_forbidden()));
            if !found {
                continue;
            }
            for &u in k {
                for &v in l {
                    let pair = Edge::new(u, v);
                    if !graph.weight(pair).is_forbidden() {
                        graph.set_forbidden(pair);
                        debug!(
                            "Making ({}, {}) forbidden due to implication",
                            pair.u, pair.v
                        );
                    }
                }
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn preprocessing_charges_negative_intra_clique_weights() {
        let mut b = GraphBuilder::new(3);
        b.add_edge(0, 1, EdgeWeight::Permanent);
        b.add_edge(1, 2, EdgeWeight::Permanent);
        b.add_edge(0, 2, EdgeWeight::Real(-3.0));
        let mut graph = b.build();

        let mut cost = 0.0;
        assert!(resolve_permanent_forbidden(&mut graph, &mut cost));
        assert_eq!(cost, 3.0);
        assert!(graph.weight(Edge::new(0, 2)).is_permanent());
    }

    #[test]
    fn preprocessing_detects_contradictions() {
        let mut b = GraphBuilder::new(3);
        b.add_edge(0, 1, EdgeWeight::Permanent);
        b.add_edge(1, 2, EdgeWeight::Permanent);
        b.add_edge(0, 2, EdgeWeight::Forbidden);
        let mut graph = b.build();

        let mut cost = 0.0;
        assert!(!resolve_permanent_forbidden(&mut graph, &mut cost));
    }

    #[test]
    fn preprocessing_promotes_forbidden_across_cliques_without_charge() {
        let mut b = GraphBuilder::new(3);
        b.add_edge(0, 1, EdgeWeight::Permanent);
        b.add_edge(0, 2, EdgeWeight::Forbidden);
        b.add_edge(1, 2, EdgeWeight::Real(5.0));
        let mut graph = b.build();

        let mut cost = 0.0;
        assert!(resolve_permanent_forbidden(&mut graph, &mut cost));
        assert_eq!(cost, 0.0);
        assert!(graph.is_forbidden(Edge::new(1, 2)));
    }

    #[test]
    fn infeasible_instances_solve_to_an_empty_solution() {
        let mut b = GraphBuilder::new(3);
        b.add_edge(0, 1, EdgeWeight::Permanent);
        b.add_edge(1, 2, EdgeWeight::Permanent);
        b.add_edge(0, 2, EdgeWeight::Forbidden);

        let mut solver = InducedCostHeuristic::new(b.build(), true);
        let solution = solver.solve();

        assert!(!solution.is_feasible());
        assert!(solution.total_cost().is_infinite());
        assert!(solution.clusters().is_empty());
    }

    #[test]
    fn cost_matches_the_flipped_weights() {
        // Triangle plus a pendant negative edge: merging the triangle is
        // free, the only charge is cutting (2, 3) if it points into the
        // triangle, or keeping it out otherwise.
        let mut b = GraphBuilder::new(4);
        b.add_edge(0, 1, EdgeWeight::Real(4.0));
        b.add_edge(0, 2, EdgeWeight::Real(4.0));
        b.add_edge(1, 2, EdgeWeight::Real(4.0));
        b.add_edge(2, 3, EdgeWeight::Real(-1.0));

        let mut solver = InducedCostHeuristic::new(b.build(), true);
        let solution = solver.solve();

        assert_eq!(solution.total_cost(), 0.0);
        assert_eq!(solution.clusters(), &[vec![0, 1, 2], vec![3]]);
    }
}

use cluster_heuristic::{ClusterSolution, EdgeWeight, GraphBuilder, InducedCostHeuristic};

fn solve(n: usize, edges: &[(usize, usize, EdgeWeight)], bundle_edges: bool) -> ClusterSolution {
    let mut builder = GraphBuilder::new(n);
    for &(u, v, w) in edges {
        builder.add_edge(u, v, w);
    }
    InducedCostHeuristic::new(builder.build(), bundle_edges).solve()
}

fn real(w: f64) -> EdgeWeight {
    EdgeWeight::Real(w)
}

#[test]
fn empty_graph() {
    let solution = solve(0, &[], true);
    assert_eq!(solution.total_cost(), 0.0);
    assert!(solution.clusters().is_empty());
}

#[test]
fn single_vertex() {
    let solution = solve(1, &[], true);
    assert_eq!(solution.total_cost(), 0.0);
    assert_eq!(solution.clusters(), &[vec![0]]);
}

#[test]
fn two_vertices_with_positive_edge() {
    let solution = solve(2, &[(0, 1, real(3.0))], true);
    assert_eq!(solution.total_cost(), 0.0);
    assert_eq!(solution.clusters(), &[vec![0, 1]]);
}

#[test]
fn two_vertices_with_negative_edge() {
    let solution = solve(2, &[(0, 1, real(-3.0))], true);
    assert_eq!(solution.total_cost(), 0.0);
    assert_eq!(solution.clusters(), &[vec![0], vec![1]]);
}

#[test]
fn triangle_with_one_negative_edge() {
    // Cheapest repair: cut one of the two positive edges. The deterministic
    // tie-break keeps the lowest-rank edge (0, 1) and cuts (0, 2).
    let solution = solve(
        3,
        &[
            (0, 1, real(1.0)),
            (0, 2, real(1.0)),
            (1, 2, real(-2.0)),
        ],
        true,
    );

    assert_eq!(solution.total_cost(), 1.0);
    assert_eq!(solution.clusters(), &[vec![0, 1], vec![2]]);
}

#[test]
fn four_cycle_closes_into_one_cluster() {
    // The two missing chords are zero edges; promoting them to permanent is
    // free, so the whole cycle collapses into a single cluster at no cost.
    let solution = solve(
        4,
        &[
            (0, 1, real(1.0)),
            (1, 2, real(1.0)),
            (2, 3, real(1.0)),
            (3, 0, real(1.0)),
        ],
        true,
    );

    assert_eq!(solution.total_cost(), 0.0);
    assert_eq!(solution.clusters(), &[vec![0, 1, 2, 3]]);
}

#[test]
fn predeclared_contradiction_is_infeasible() {
    let solution = solve(
        3,
        &[
            (0, 1, EdgeWeight::Permanent),
            (1, 2, EdgeWeight::Permanent),
            (0, 2, EdgeWeight::Forbidden),
        ],
        true,
    );

    assert!(solution.total_cost().is_infinite());
    assert!(solution.clusters().is_empty());
    assert!(!solution.is_feasible());
}

#[test]
fn disconnected_components_stay_apart() {
    let solution = solve(4, &[(0, 1, real(5.0)), (2, 3, real(5.0))], true);

    assert_eq!(solution.total_cost(), 0.0);
    assert_eq!(solution.clusters(), &[vec![0, 1], vec![2, 3]]);
}

#[test]
fn complete_triangle_is_free() {
    let solution = solve(
        3,
        &[(0, 1, real(1.0)), (0, 2, real(1.0)), (1, 2, real(1.0))],
        true,
    );

    assert_eq!(solution.total_cost(), 0.0);
    assert_eq!(solution.clusters(), &[vec![0, 1, 2]]);
}

#[test]
fn bundling_does_not_change_the_clustering() {
    // Two pre-declared cliques with mixed parallel edges between them; the
    // decisions must come out the same whether or not the parallel edges
    // are bundled into one heap entry.
    let edges = [
        (0, 1, EdgeWeight::Permanent),
        (2, 3, EdgeWeight::Permanent),
        (0, 2, real(1.0)),
        (1, 3, real(1.0)),
        (0, 3, real(-1.0)),
        (1, 2, real(-1.0)),
    ];

    let bundled = solve(4, &edges, true);
    let unbundled = solve(4, &edges, false);

    assert_eq!(bundled, unbundled);
    assert_eq!(bundled.total_cost(), 2.0);
    assert_eq!(bundled.clusters(), &[vec![0, 1, 2, 3]]);
}

#[test]
fn forbidden_promotion_blocks_merging() {
    // (1, 2) would love to merge, but 2 is forbidden to 0's clique, so
    // preprocessing promotes it to forbidden without charging its weight.
    let solution = solve(
        3,
        &[
            (0, 1, EdgeWeight::Permanent),
            (0, 2, EdgeWeight::Forbidden),
            (1, 2, real(5.0)),
        ],
        true,
    );

    assert_eq!(solution.total_cost(), 0.0);
    assert_eq!(solution.clusters(), &[vec![0, 1], vec![2]]);
}

#[test]
fn negative_intra_clique_weight_is_charged_in_preprocessing() {
    let solution = solve(
        3,
        &[
            (0, 1, EdgeWeight::Permanent),
            (1, 2, EdgeWeight::Permanent),
            (0, 2, real(-3.0)),
        ],
        true,
    );

    assert_eq!(solution.total_cost(), 3.0);
    assert_eq!(solution.clusters(), &[vec![0, 1, 2]]);
}

fn mixed_instance() -> Vec<(usize, usize, EdgeWeight)> {
    // Two natural cliques {0,1,2} and {4,5,6} with a wavering vertex 3 and
    // some noise edges.
    vec![
        (0, 1, real(3.0)),
        (0, 2, real(2.0)),
        (1, 2, real(2.5)),
        (2, 3, real(1.0)),
        (3, 4, real(1.5)),
        (4, 5, real(3.0)),
        (4, 6, real(2.0)),
        (5, 6, real(2.5)),
        (0, 4, real(-1.0)),
        (1, 5, real(-2.0)),
        (2, 6, real(-0.5)),
        (0, 3, real(-0.5)),
    ]
}

#[test]
fn repeated_runs_are_deterministic() {
    let edges = mixed_instance();

    for &bundle_edges in &[true, false] {
        let first = solve(7, &edges, bundle_edges);
        let second = solve(7, &edges, bundle_edges);
        assert_eq!(first, second);
    }
}

#[test]
fn clusters_partition_the_vertex_set() {
    let solution = solve(7, &mixed_instance(), true);

    let mut all: Vec<usize> = solution.clusters().iter().flatten().copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..7).collect::<Vec<_>>());

    for cluster in solution.clusters() {
        let mut sorted = cluster.clone();
        sorted.sort_unstable();
        assert_eq!(&sorted, cluster);
    }

    assert!(solution.total_cost() >= 0.0);
    assert!(solution.total_cost().is_finite());
}

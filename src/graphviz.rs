use crate::heuristic::ClusterSolution;
use crate::PetGraph;

use log::info;
use petgraph::dot::Dot;

use std::io::Write;
use std::process::{Command, Stdio};

/// Renders `graph` to a PNG at `path` by piping its dot representation into
/// the given graphviz command (`sfdp`, `fdp`, ...).
pub fn print_graph<P: AsRef<std::path::Path>>(command: &str, path: P, graph: &PetGraph) {
    info!(
        "Writing graph image to {}, graph has {} nodes",
        path.as_ref().display(),
        graph.node_count()
    );

    let dot = Dot::new(graph);

    let mut graphviz = Command::new(command)
        .arg("-Tpng")
        .arg(format!("-o{}", path.as_ref().display()))
        .stdin(Stdio::piped())
        .spawn()
        .expect("Failed to spawn graphviz process");

    {
        let stdin = graphviz
            .stdin
            .as_mut()
            .expect("Failed to open graphviz stdin pipe.");
        stdin
            .write_all(dot.to_string().as_bytes())
            .expect("Failed to write to graphviz stdin pipe.");
    }

    graphviz.wait().expect("Executing graphviz failed");
}

/// Builds the clique rendition of a clustering: every cluster becomes a
/// fully connected component over its vertices.
pub fn solution_graph(solution: &ClusterSolution) -> PetGraph {
    use petgraph::prelude::NodeIndex;

    let num_nodes: usize = solution.clusters().iter().map(|c| c.len()).sum();
    let mut pg = PetGraph::with_capacity(num_nodes, 0);

    let mut map = vec![NodeIndex::new(0); num_nodes];
    for cluster in solution.clusters() {
        for &v in cluster {
            map[v] = pg.add_node(v);
        }
    }

    for cluster in solution.clusters() {
        for (i, &u) in cluster.iter().enumerate() {
            for &v in &cluster[(i + 1)..] {
                pg.add_edge(map[u], map[v], 1.0);
            }
        }
    }

    pg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeWeight, GraphBuilder};
    use crate::InducedCostHeuristic;

    #[test]
    fn solution_graph_connects_clusters_as_cliques() {
        let mut b = GraphBuilder::new(4);
        b.add_edge(0, 1, EdgeWeight::Real(1.0));
        b.add_edge(0, 2, EdgeWeight::Real(1.0));
        b.add_edge(1, 2, EdgeWeight::Real(1.0));

        let solution = InducedCostHeuristic::new(b.build(), true).solve();
        let pg = solution_graph(&solution);

        assert_eq!(pg.node_count(), 4);
        // one triangle, vertex 3 isolated
        assert_eq!(pg.edge_count(), 3);
    }
}

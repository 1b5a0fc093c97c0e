pub mod edge_heap;
pub mod graph;
pub mod graphviz;
pub mod heuristic;
pub mod parser;

pub use graph::{Edge, EdgeWeight, GraphBuilder, RankId, WeightedGraph};
pub use heuristic::{ClusterSolution, InducedCostHeuristic};

/// Numeric type for edge weights and induced costs.
pub type Weight = f64;

/// Vertex id, `0..num_nodes`.
pub type NodeId = usize;

/// Petgraph rendition of a graph or clustering, for display purposes.
pub type PetGraph = petgraph::Graph<NodeId, Weight, petgraph::Undirected>;

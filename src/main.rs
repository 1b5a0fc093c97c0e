use cluster_heuristic::{graphviz, parser, ClusterSolution, InducedCostHeuristic};

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use log::info;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "cluster-heuristic",
    about = "Partitions a weighted graph into cliques with the induced-cost heuristic for cluster editing."
)]
struct Opt {
    /// Input file, using the weighted cluster editing format.
    /// `stdin` if not specified.
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,

    /// Output file. `stdout` if not specified.
    #[structopt(parse(from_os_str))]
    output: Option<PathBuf>,

    /// Disable bundling of parallel edges when cliques merge.
    #[structopt(long = "no-bundling")]
    no_bundling: bool,

    /// Print the input graph to the given path, as a PNG file.
    /// Requires a working graphviz installation accessible in the path.
    #[structopt(short = "i", long = "print-input", parse(from_os_str))]
    print_input: Option<PathBuf>,

    /// Print the resulting clustering to the given path, as a PNG file.
    /// Requires a working graphviz installation accessible in the path.
    #[structopt(short = "o", long = "print-output", parse(from_os_str))]
    print_output: Option<PathBuf>,

    /// Which command is used to print the graph images. Can generally be any
    /// Graphviz tool, default is `sfdp`.
    #[structopt(long = "print-command", default_value = "sfdp")]
    print_command: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = Opt::from_args();

    let graph = match opt.input {
        Some(path) => parser::parse_file(path),
        None => parser::parse(std::io::stdin().lock()),
    }?;

    info!(
        "Input graph has {} nodes and {} edges.",
        graph.num_nodes(),
        graph.num_edges()
    );

    if let Some(path) = opt.print_input {
        graphviz::print_graph(&opt.print_command, path, &graph.to_petgraph());
    }

    let mut solver = InducedCostHeuristic::new(graph, !opt.no_bundling);
    let solution = solver.solve();

    info!(
        "Total cost: {}, {} clusters.",
        solution.total_cost(),
        solution.clusters().len()
    );

    if let Some(path) = opt.print_output {
        graphviz::print_graph(&opt.print_command, path, &graphviz::solution_graph(&solution));
    }

    match opt.output {
        Some(path) => write_solution(BufWriter::new(File::create(path)?), &solution)?,
        None => write_solution(std::io::stdout().lock(), &solution)?,
    }

    Ok(())
}

// The output mirrors the input convention: a `c cost <total>` header, then
// one line of ascending, 1-indexed vertex ids per cluster.
fn write_solution<W: Write>(mut writer: W, solution: &ClusterSolution) -> io::Result<()> {
    writeln!(writer, "c cost {}", solution.total_cost())?;
    for cluster in solution.clusters() {
        let ids: Vec<String> = cluster.iter().map(|v| (v + 1).to_string()).collect();
        writeln!(writer, "{}", ids.join(" "))?;
    }
    writer.flush()
}

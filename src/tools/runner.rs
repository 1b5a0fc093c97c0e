use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use log::{info, warn};
use rayon::{prelude::*, ThreadPoolBuilder};
use regex::Regex;
use structopt::StructOpt;
use wait_timeout::ChildExt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "runner",
    about = "Runs the solver on a given set of instances, with a given amount of parallelism and a timeout per instance, and collects the achieved costs."
)]
struct Opt {
    /// Solver program.
    #[structopt(
        default_value = "target/release/cluster-heuristic",
        parse(from_os_str),
        long = "solver"
    )]
    solver: PathBuf,

    /// Timeout per instance, in minutes.
    #[structopt(default_value = "30", long = "timeout")]
    timeout: u64,

    /// Amount of parallel workers.
    #[structopt(default_value = "10", long = "num-workers")]
    num_workers: usize,

    /// Run the solver without edge bundling.
    #[structopt(long = "no-bundling")]
    no_bundling: bool,

    /// Output directory. A result file for each input file will be created
    /// in this directory.
    #[structopt(parse(from_os_str))]
    output_dir: PathBuf,

    /// Input files, using the weighted cluster editing format.
    #[structopt(parse(from_os_str))]
    input: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    info!("Starting runner on {} input files.", opt.input.len());

    ThreadPoolBuilder::new()
        .num_threads(opt.num_workers)
        .build_global()
        .unwrap();

    let cost_re = Regex::new(r"^c cost (\S+)").unwrap();

    let results: Vec<(String, Option<f64>)> = opt
        .input
        .par_iter()
        .map(|in_path| do_file(&opt, in_path, &cost_re))
        .collect();

    let completed = results.iter().filter(|(_, cost)| cost.is_some()).count();
    let total_cost: f64 = results.iter().filter_map(|(_, cost)| *cost).sum();

    for (name, cost) in &results {
        match cost {
            Some(cost) => info!("{}: cost {}", name, cost),
            None => info!("{}: no result", name),
        }
    }
    info!(
        "Done. {} of {} completed, summed cost {}.",
        completed,
        opt.input.len(),
        total_cost
    );

    Ok(())
}

// Runs the solver on a single instance and extracts the achieved cost from
// its result file. Returns None if the run timed out, failed, or produced no
// parsable cost line.
fn do_file(opt: &Opt, in_path: &PathBuf, cost_re: &Regex) -> (String, Option<f64>) {
    let filename = in_path
        .file_name()
        .expect("every input is a file")
        .to_str()
        .expect("input paths are valid UTF-8")
        .to_string();

    info!("Starting worker for {}...", filename);

    let mut out_path = opt.output_dir.clone();
    out_path.push(format!("{}.out", filename));

    let mut command = Command::new(&opt.solver);
    command.arg(in_path).arg(&out_path);
    if opt.no_bundling {
        command.arg("--no-bundling");
    }

    let mut child = command
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let finished = match child
        .wait_timeout(Duration::from_secs(opt.timeout * 60))
        .unwrap()
    {
        Some(status) => {
            info!("Completed {} with status {}", filename, status);
            status.success()
        }
        None => {
            warn!("{} timed out!", filename);
            child.kill().unwrap();
            child.wait().unwrap();
            false
        }
    };

    let mut log_path = opt.output_dir.clone();
    log_path.push(format!("{}.log", filename));
    let mut log_file = File::create(log_path).unwrap();
    io::copy(&mut child.stderr.take().unwrap(), &mut log_file).unwrap();
    log_file.flush().unwrap();

    if !finished {
        return (filename, None);
    }

    (filename, read_cost(&out_path, cost_re))
}

fn read_cost(out_path: &PathBuf, cost_re: &Regex) -> Option<f64> {
    let reader = BufReader::new(File::open(out_path).ok()?);
    for line in reader.lines() {
        let line = line.ok()?;
        if let Some(captures) = cost_re.captures(&line) {
            return captures.get(1).unwrap().as_str().parse().ok();
        }
    }
    None
}

use crate::graph::{EdgeWeight, GraphBuilder, WeightedGraph};
use crate::Weight;

use std::collections::HashSet;
use std::{
    fs::File,
    io::{self, prelude::*, BufReader},
};

fn make_error(text: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, text)
}

// Both parse_file and parse read the weighted cluster editing format: an
// optional block of `c` comment lines, a problem descriptor `p cew <n> <m>`,
// then one `<u> <v> <w>` line per edge. Vertices are 1-indexed in the file,
// weights are reals with `inf` marking a permanent and `-inf` a forbidden
// pair. Lines with weight 0 are accepted but stay implicit.
//
// This is the validating collaborator for the solver core: duplicate edges,
// self-loops, out-of-range ids and NaN weights are rejected here, the core
// assumes validated input.

pub fn parse_file<P: AsRef<std::path::Path>>(path: P) -> io::Result<WeightedGraph> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    parse(reader)
}

pub fn parse<R: BufRead>(reader: R) -> io::Result<WeightedGraph> {
    let mut lines = reader.lines();

    let mut n: Option<usize> = None;
    while let Some(line) = lines.next() {
        let line = line?;
        match line.bytes().next() {
            None | Some(b'c') => continue,
            Some(b'p') => {
                let mut split = line.split_whitespace();
                n = split.nth(2).and_then(|s| s.parse().ok());
                break;
            }
            _ => return Err(make_error("did not find problem descriptor line")),
        }
    }

    let n = n.ok_or_else(|| make_error("could not read vertex count"))?;

    let mut builder = GraphBuilder::new(n);
    let mut seen = HashSet::new();

    for line in lines {
        let line = line?;
        if line.is_empty() || line.starts_with('c') {
            continue;
        }

        let mut split = line.split_whitespace();
        let u: usize = split
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| make_error("invalid edge format"))?;
        let v: usize = split
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| make_error("invalid edge format"))?;
        let w: Weight = split
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| make_error("invalid edge weight"))?;

        if u == 0 || v == 0 || u > n || v > n {
            return Err(make_error("vertex id out of range"));
        }
        if u == v {
            return Err(make_error("self-loops are not allowed"));
        }
        if w.is_nan() {
            return Err(make_error("edge weight is NaN"));
        }
        if !seen.insert((u.min(v), u.max(v))) {
            return Err(make_error("duplicate edge"));
        }

        let weight = if w == Weight::INFINITY {
            EdgeWeight::Permanent
        } else if w == Weight::NEG_INFINITY {
            EdgeWeight::Forbidden
        } else {
            EdgeWeight::Real(w)
        };
        builder.add_edge(u - 1, v - 1, weight);
    }

    Ok(builder.build())
}

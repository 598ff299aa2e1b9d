//! Run the greedy Steiner tree approximation on PACE graph files.
//! Results go to stdout, log messages to stderr.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use greedy_steiner::{approximate, compute_shortest_paths, EdgeWeight, Graph, NodeIndex};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "steiner-tree", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print node, edge, terminal, degree and weight statistics as one CSV line.
    Stats { file: PathBuf },
    /// Approximate a Steiner tree connecting the terminals of the file.
    Approx {
        file: PathBuf,
        /// Write the tree in the PACE solution format to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the shortest path between two nodes (1-based, as in the file).
    Path {
        file: PathBuf,
        from: NodeIndex,
        to: NodeIndex,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Stats { file } => {
            let graph = read_graph(&file)?;
            let stats = GraphStatistics::new(&graph).context("graph has no nodes or edges")?;
            println!(
                "{fp}, {ne}, {nn}, {nt}, {ad}, {md}, {Md}, {aw}, {mw}, {Mw}",
                fp = file.display(),
                ne = stats.num_edges,
                nn = stats.num_nodes,
                nt = stats.num_terminals,
                ad = stats.average_degree,
                md = stats.min_degree,
                Md = stats.max_degree,
                aw = stats.average_weight,
                mw = stats.min_weight,
                Mw = stats.max_weight,
            );
        }
        Command::Approx { file, output } => {
            let graph = read_graph(&file)?;
            info!(terminals = graph.num_terminals(), "running greedy approximation");
            let (tree, time) = measure_time(|| approximate(&graph, graph.terminals()));
            let tree = tree.with_context(|| format!("approximating {}", file.display()))?;
            info!(edges = tree.edges().len(), weight = tree.weight(), "done");
            println!("{}, {}", tree.weight(), time.as_nanos());
            if let Some(output) = output {
                let file = File::create(&output)
                    .with_context(|| format!("creating {}", output.display()))?;
                let mut writer = BufWriter::new(file);
                tree.write(&mut writer, &graph)?;
                writer.flush()?;
            }
        }
        Command::Path { file, from, to } => {
            let graph = read_graph(&file)?;
            let (from, to) = (to_node_index(from, &graph)?, to_node_index(to, &graph)?);
            let shortest_paths = compute_shortest_paths(&graph);
            let path = shortest_paths.shortest_path(from, to)?;
            if path.path().is_empty() {
                println!("unreachable");
            } else {
                let nodes = path
                    .path()
                    .iter()
                    .map(|n| (n + 1).to_string())
                    .collect::<Vec<_>>();
                println!("{} ({})", nodes.join(" "), path.distance());
            }
        }
    }
    Ok(())
}

fn read_graph(path: &Path) -> anyhow::Result<Graph> {
    info!(file = %path.display(), "reading graph");
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let graph = content
        .parse::<Graph>()
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(graph)
}

fn to_node_index(node: NodeIndex, graph: &Graph) -> anyhow::Result<NodeIndex> {
    if node == 0 || node > graph.num_nodes() {
        bail!("node {} is not between 1 and {}", node, graph.num_nodes());
    }
    Ok(node - 1)
}

struct GraphStatistics {
    num_edges: usize,
    num_nodes: usize,
    num_terminals: usize,
    average_degree: f64,
    min_degree: usize,
    max_degree: usize,
    average_weight: f64,
    min_weight: EdgeWeight,
    max_weight: EdgeWeight,
}

impl GraphStatistics {
    /// `None` for graphs without nodes or edges.
    fn new(graph: &Graph) -> Option<Self> {
        let degrees = graph
            .node_indices()
            .map(|ni| graph.neighbors(ni).count())
            .collect::<Vec<_>>();
        let weights = graph.edges().map(|(_, _, w)| w).collect::<Vec<_>>();
        if degrees.is_empty() || weights.is_empty() {
            return None;
        }
        Some(Self {
            num_edges: graph.num_edges(),
            num_nodes: graph.num_nodes(),
            num_terminals: graph.num_terminals(),
            average_degree: degrees.iter().sum::<usize>() as f64 / degrees.len() as f64,
            min_degree: degrees.iter().min().copied()?,
            max_degree: degrees.iter().max().copied()?,
            average_weight: weights.iter().sum::<f64>() / weights.len() as f64,
            min_weight: weights.iter().copied().fold(f64::INFINITY, f64::min),
            max_weight: weights.iter().copied().fold(0.0, f64::max),
        })
    }
}

// measure running time of a closure
fn measure_time<F: FnOnce() -> R, R>(closure: F) -> (R, Duration) {
    let before = Instant::now();
    let result = closure();
    (result, before.elapsed())
}

use std::env;
use std::io;
use std::process;
use std::str::FromStr;
use std::sync::Arc;

use fox::floyd::floyd_warshall;
use fox::generate::random_graph;
use fox::grid::process_grid_side;
use fox::io::{format_graph, read_graph, write_matrix};
use fox::job;
use fox::partition::apply_adjacency_sentinel;
use fox_mesh::RelayTransport;
use tracing::info;

const DEFAULT_RELAY: &str = "127.0.0.1:50051";

type BoxError = Box<dyn std::error::Error>;

#[tokio::main]
async fn main() {
    // stdout carries the result matrix, so logs go to stderr.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).cloned().unwrap_or_else(|| "local".to_string());

    if let Err(e) = run(&mode, &args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(mode: &str, args: &[String]) -> Result<(), BoxError> {
    match mode {
        "local" => {
            let processes: usize = arg(args, 2, "1")?;
            process_grid_side(processes)?;

            let graph = read_graph(io::stdin().lock())?;
            let distances = job::run_local(graph, processes).await?;
            write_matrix(io::stdout().lock(), &distances)?;
        }
        "worker" => {
            let relay = args
                .get(2)
                .cloned()
                .unwrap_or_else(|| DEFAULT_RELAY.to_string());
            let rank: usize = arg(args, 3, "0")?;
            let size: usize = arg(args, 4, "1")?;
            process_grid_side(size)?;

            info!(rank, size, %relay, "joining job");
            let transport = RelayTransport::connect(relay, rank, size).await?;
            let result = job::run(Arc::new(transport), || read_graph(io::stdin().lock())).await?;

            if let Some(distances) = result {
                write_matrix(io::stdout().lock(), &distances)?;
            }
        }
        "sequential" => {
            let mut graph = read_graph(io::stdin().lock())?;
            apply_adjacency_sentinel(&mut graph);
            floyd_warshall(&mut graph);
            write_matrix(io::stdout().lock(), &graph)?;
        }
        "generate" => {
            let n: usize = arg(args, 2, "8")?;
            let density: f64 = arg(args, 3, "0.5")?;
            let max_weight: i64 = arg(args, 4, "10")?;

            let graph = random_graph(&mut rand::thread_rng(), n, density, max_weight);
            print!("{}", format_graph(&graph));
        }
        other => {
            return Err(format!(
                "unknown mode {:?}\n\
                 usage: fox-apsp local [processes]\n       \
                 fox-apsp worker <relay-addr> <rank> <size>\n       \
                 fox-apsp sequential\n       \
                 fox-apsp generate <n> [density] [max-weight]",
                other
            )
            .into());
        }
    }

    Ok(())
}

fn arg<T>(args: &[String], index: usize, default: &str) -> Result<T, BoxError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = args.get(index).map_or(default, String::as_str);
    raw.parse()
        .map_err(|e| format!("invalid argument {:?}: {}", raw, e).into())
}

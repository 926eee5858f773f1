//! A complete shortest-path job as seen by one rank.
//!
//! Rank 0 is the coordinator: it owns the input graph, tells every rank the
//! dimension, hands out blocks, and collects the result. Every other rank
//! only ever sees its own block.

use std::sync::Arc;
use std::time::Instant;

use fox_mesh::{Group, LocalTransport, Transport};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::grid::{ProcessGrid, grid_side};
use crate::matrix::{Block, Matrix};
use crate::partition::{apply_adjacency_sentinel, assemble, partition};
use crate::squaring::SquaringDriver;

const COORDINATOR: usize = 0;
const SCATTER_LABEL: u32 = 1;
const GATHER_LABEL: u32 = 2;

/// Runs the job on one rank.
///
/// `load` is called on the coordinator only and yields the graph in input
/// encoding (0 off the diagonal means no edge). The coordinator returns the
/// distance matrix; every other rank returns `None`.
///
/// On failure the job is aborted for every rank before the error is
/// returned, so no peer is left waiting. Configuration errors are the
/// exception: every rank detects those by itself.
pub async fn run<L>(transport: Arc<dyn Transport>, load: L) -> Result<Option<Matrix>, Error>
where
    L: FnOnce() -> Result<Matrix, Error> + Send,
{
    let world = Group::world(transport);

    match solve(&world, load).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if !e.is_configuration() && !is_aborted(&e) {
                if let Err(abort_err) = world.abort(&e.to_string()).await {
                    warn!("failed to abort job: {}", abort_err);
                }
            }
            Err(e)
        }
    }
}

/// Runs the job with `processes` ranks as tasks of the current runtime and
/// returns the distance matrix.
pub async fn run_local(graph: Matrix, processes: usize) -> Result<Matrix, Error> {
    grid_side(processes, graph.size())?;

    let mut graph = Some(graph);
    let handles: Vec<_> = LocalTransport::mesh(processes)
        .into_iter()
        .map(|transport| {
            let input = if transport.rank() == COORDINATOR {
                graph.take()
            } else {
                None
            };
            let load = move || input.ok_or_else(|| Error::Input("no graph loaded".to_string()));
            tokio::spawn(run(Arc::new(transport), load))
        })
        .collect();

    let mut result = None;
    let mut failure: Option<Error> = None;
    for handle in handles {
        let outcome = handle
            .await
            .map_err(|e| Error::Worker(e.to_string()))
            .and_then(|r| r);
        match outcome {
            Ok(Some(matrix)) => result = Some(matrix),
            Ok(None) => {}
            // Keep the root cause, not the aborts it caused on other ranks.
            Err(e) => {
                let keep_first = failure.as_ref().is_some_and(|first| !is_aborted(first));
                if !keep_first {
                    failure = Some(e);
                }
            }
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }
    result.ok_or_else(|| Error::Worker("coordinator returned no result".to_string()))
}

async fn solve<L>(world: &Group, load: L) -> Result<Option<Matrix>, Error>
where
    L: FnOnce() -> Result<Matrix, Error>,
{
    let graph = if world.index() == COORDINATOR {
        let mut graph = load()?;
        apply_adjacency_sentinel(&mut graph);
        Some(graph)
    } else {
        None
    };

    let mut header = vec![graph.as_ref().map_or(0, |g| g.size() as i64)];
    world.broadcast(COORDINATOR, &mut header).await?;
    let n = usize::try_from(header[0])
        .map_err(|_| Error::Input(format!("invalid matrix dimension {}", header[0])))?;

    let grid = ProcessGrid::build(world, n)?;
    let q = grid.q();
    let b = n / q;
    debug!(rank = world.index(), row = grid.row(), col = grid.col(), "grid ready");

    let block = scatter(world, graph.as_ref(), q, b).await?;
    drop(graph);

    world.barrier().await?;
    let started = Instant::now();

    let distances = SquaringDriver::new(&grid, b).shortest_paths(block, n).await?;

    world.barrier().await?;
    if world.index() == COORDINATOR {
        info!(
            n,
            q,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "shortest paths computed"
        );
    }

    gather(world, distances, q).await
}

async fn scatter(world: &Group, graph: Option<&Matrix>, q: usize, b: usize) -> Result<Block, Error> {
    let Some(graph) = graph else {
        let values = world.recv(COORDINATOR, SCATTER_LABEL).await?;
        return block_from_payload(b, values);
    };

    let mut blocks = partition(graph, q)?.into_iter();
    let own = blocks.next().ok_or(Error::BlockLayout {
        expected: q * q,
        actual: 0,
        size: b,
    })?;
    for (offset, block) in blocks.enumerate() {
        world.send(offset + 1, SCATTER_LABEL, block.into_vec()).await?;
    }
    Ok(own)
}

async fn gather(world: &Group, block: Block, q: usize) -> Result<Option<Matrix>, Error> {
    if world.index() != COORDINATOR {
        world.send(COORDINATOR, GATHER_LABEL, block.into_vec()).await?;
        return Ok(None);
    }

    let b = block.size();
    let mut blocks = Vec::with_capacity(q * q);
    blocks.push(block);
    for rank in 1..q * q {
        let values = world.recv(rank, GATHER_LABEL).await?;
        blocks.push(block_from_payload(b, values)?);
    }

    Ok(Some(assemble(&blocks, q)?))
}

fn block_from_payload(b: usize, values: Vec<i64>) -> Result<Block, Error> {
    let actual = values.len();
    Block::from_vec(b, values).ok_or(Error::Communication(fox_mesh::Error::SizeMismatch {
        expected: b * b,
        actual,
    }))
}

fn is_aborted(e: &Error) -> bool {
    matches!(e, Error::Communication(fox_mesh::Error::Aborted(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::UNREACHABLE;

    #[tokio::test]
    async fn single_rank_job() {
        let graph = Matrix::from_rows(&[vec![0, 1, 0], vec![0, 0, 1], vec![0, 0, 0]]).unwrap();
        let distances = run_local(graph, 1).await.unwrap();

        let inf = UNREACHABLE;
        let expected = Matrix::from_rows(&[vec![0, 1, 2], vec![inf, 0, 1], vec![inf, inf, 0]]).unwrap();
        assert_eq!(distances, expected);
    }

    #[tokio::test]
    async fn bad_process_count_fails_before_work() {
        let graph = Matrix::filled(4, 0);
        assert!(matches!(run_local(graph, 3).await, Err(Error::NotPerfectSquare(3))));
    }

    #[tokio::test]
    async fn every_rank_sees_the_configuration_error() {
        let handles: Vec<_> = LocalTransport::mesh(4)
            .into_iter()
            .map(|transport| {
                tokio::spawn(run(Arc::new(transport), || Ok(Matrix::filled(5, 0))))
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(matches!(result, Err(Error::Indivisible { n: 5, q: 2 })));
        }
    }

    #[tokio::test]
    async fn input_error_aborts_workers() {
        let handles: Vec<_> = LocalTransport::mesh(4)
            .into_iter()
            .map(|transport| {
                tokio::spawn(run(Arc::new(transport), || {
                    Err(Error::Input("truncated".to_string()))
                }))
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert!(matches!(results[0], Err(Error::Input(_))));
        for result in &results[1..] {
            assert!(matches!(result, Err(e) if is_aborted(e)));
        }
    }
}

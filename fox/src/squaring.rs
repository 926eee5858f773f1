//! All-pairs shortest paths by repeated min-plus squaring.

use tracing::debug;

use crate::engine::FoxEngine;
use crate::error::Error;
use crate::grid::ProcessGrid;
use crate::matrix::Block;
use crate::pool::allocate_block;
use crate::semiring::{MinPlus, Semiring};

/// Number of squarings that cover every simple path in an `n`-vertex graph:
/// `ceil(log2(n))`, and 0 for `n <= 1`.
pub fn epochs(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// Squares distance blocks under (min, +).
///
/// If `D` holds shortest distances over paths of at most `k` edges and a zero
/// diagonal, `D ⊗ D` holds them over paths of at most `2k` edges. Negative
/// cycles are not detected.
pub struct SquaringDriver<'g> {
    engine: FoxEngine<'g, MinPlus>,
}

impl<'g> SquaringDriver<'g> {
    pub fn new(grid: &'g ProcessGrid, block_size: usize) -> Self {
        Self {
            engine: FoxEngine::new(grid, MinPlus, block_size),
        }
    }

    /// One epoch: this rank's block of `D ⊗ D`.
    pub async fn square(&mut self, d: &Block) -> Result<Block, Error> {
        let mut b = d.clone();
        let mut accumulator = allocate_block(d.size(), self.engine.semiring().identity())?;
        self.engine.multiply(d, &mut b, &mut accumulator).await?;
        Ok(accumulator)
    }

    /// Squares `d` [`epochs`]`(n)` times, where `n` is the global dimension.
    pub async fn shortest_paths(&mut self, d: Block, n: usize) -> Result<Block, Error> {
        let total = epochs(n);
        let mut d = d;
        for epoch in 0..total {
            d = self.square(&d).await?;
            debug!(epoch = epoch + 1, total, "squaring epoch done");
        }
        Ok(d)
    }
}

/// This rank's block of the distributed product `A ⊗ B` under `semiring`.
///
/// `b` is copied, so the caller's block is left untouched.
pub async fn multiply<S: Semiring>(
    grid: &ProcessGrid,
    semiring: S,
    a: &Block,
    b: &Block,
) -> Result<Block, Error> {
    let identity = semiring.identity();
    let mut engine = FoxEngine::new(grid, semiring, a.size());
    let mut b = b.clone();
    let mut c = allocate_block(a.size(), identity)?;
    engine.multiply(a, &mut b, &mut c).await?;
    Ok(c)
}

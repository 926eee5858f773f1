//! One distributed matrix product by Fox's broadcast-multiply-shift scheme.

use tracing::trace;

use crate::error::Error;
use crate::grid::ProcessGrid;
use crate::matrix::Block;
use crate::pool::BlockPool;
use crate::schedule::Schedule;
use crate::semiring::{Semiring, multiply_accumulate};

/// Idle broadcast buffers kept between steps.
const POOLED_PANELS: usize = 2;

/// Runs the Q-step Fox schedule on this rank's blocks.
///
/// Step `s` on the rank at `(row, col)`:
///
/// 1. the rank at column `(row + s) mod q` broadcasts its A-block along the
///    row;
/// 2. every rank accumulates `received_a ⊗ local_b` into its C-block;
/// 3. B-blocks move one row up the column ring (send to `row - 1`, receive
///    from `row + 1`).
///
/// After `q` steps C holds this rank's block of `A ⊗ B`, provided it started
/// at the semiring identity. Every rank of the grid must call
/// [`FoxEngine::multiply`] the same number of times.
pub struct FoxEngine<'g, S> {
    grid: &'g ProcessGrid,
    semiring: S,
    block_size: usize,
    panels: BlockPool,
}

impl<'g, S: Semiring> FoxEngine<'g, S> {
    pub fn new(grid: &'g ProcessGrid, semiring: S, block_size: usize) -> Self {
        Self {
            grid,
            semiring,
            block_size,
            panels: BlockPool::new(block_size * block_size, POOLED_PANELS),
        }
    }

    pub fn semiring(&self) -> &S {
        &self.semiring
    }

    /// Accumulates this rank's block of `A ⊗ B` into `c`.
    ///
    /// `b` is overwritten by the column shifts. After all `q` shifts it holds
    /// its original values again, but if the call fails part way it does not.
    pub async fn multiply(&mut self, a: &Block, b: &mut Block, c: &mut Block) -> Result<(), Error> {
        let size = self.block_size;
        if a.size() != size || b.size() != size || c.size() != size {
            return Err(Error::BlockLayout {
                expected: size,
                actual: a.size().max(b.size()).max(c.size()),
                size,
            });
        }

        let (q, row, col) = (self.grid.q(), self.grid.row(), self.grid.col());
        for step in Schedule::new(q, row, col) {
            trace!(step = step.index, root = step.broadcast_col, row, col, "fox step");

            let mut panel = self.panels.acquire()?;
            if step.is_root {
                panel.copy_from_slice(a.as_slice());
            }
            self.grid
                .row_group()
                .broadcast(step.broadcast_col, &mut panel)
                .await?;

            let received = Block::from_vec(size, panel).ok_or(Error::BlockLayout {
                expected: size * size,
                actual: 0,
                size,
            })?;
            multiply_accumulate(&self.semiring, &received, b, c);
            self.panels.release(received.into_vec())?;

            if q > 1 {
                self.grid
                    .col_group()
                    .exchange(step.shift_dest_row, step.shift_source_row, b.as_vec_mut())
                    .await?;
            }
        }

        Ok(())
    }
}

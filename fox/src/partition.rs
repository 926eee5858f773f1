//! Block decomposition of a global matrix over a QxQ grid.
//!
//! Block `p` belongs to grid coordinate `(p / q, p % q)` and holds global rows
//! `[r*b, r*b + b)` and columns `[c*b, c*b + b)` with `b = n / q`.

use crate::error::Error;
use crate::matrix::{Block, Matrix, UNREACHABLE};

/// Side of each block when an `n`x`n` matrix is split over a `q`x`q` grid.
pub fn block_size(n: usize, q: usize) -> Result<usize, Error> {
    if q == 0 || n % q != 0 {
        return Err(Error::Indivisible { n, q });
    }
    Ok(n / q)
}

/// Splits `global` into `q * q` blocks ordered by process index.
pub fn partition(global: &Matrix, q: usize) -> Result<Vec<Block>, Error> {
    let n = global.size();
    let b = block_size(n, q)?;
    let source = global.as_slice();

    let blocks = (0..q * q)
        .map(|p| {
            let (start_row, start_col) = ((p / q) * b, (p % q) * b);
            let mut data = Vec::with_capacity(b * b);
            for i in 0..b {
                let offset = (start_row + i) * n + start_col;
                data.extend_from_slice(&source[offset..offset + b]);
            }
            Block::from_vec(b, data).ok_or(Error::BlockLayout {
                expected: q * q,
                actual: p,
                size: b,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(blocks)
}

/// Inverse of [`partition`]: writes every block back to the region it came
/// from.
pub fn assemble(blocks: &[Block], q: usize) -> Result<Matrix, Error> {
    let b = blocks.first().map_or(0, Block::size);
    if blocks.len() != q * q || blocks.iter().any(|block| block.size() != b) {
        return Err(Error::BlockLayout {
            expected: q * q,
            actual: blocks.len(),
            size: b,
        });
    }

    let n = b * q;
    let mut global = Matrix::filled(n, 0);
    let target = global.as_mut_slice();

    for (p, block) in blocks.iter().enumerate() {
        let (start_row, start_col) = ((p / q) * b, (p % q) * b);
        for (i, row) in block.as_slice().chunks(b.max(1)).enumerate() {
            let offset = (start_row + i) * n + start_col;
            target[offset..offset + b].copy_from_slice(row);
        }
    }

    Ok(global)
}

/// Replaces every off-diagonal zero (no edge) with [`UNREACHABLE`] and sets
/// the diagonal to zero, the distance from a vertex to itself.
///
/// Must run on the coordinator's copy before partitioning.
pub fn apply_adjacency_sentinel(matrix: &mut Matrix) {
    let n = matrix.size();
    for i in 0..n {
        for j in 0..n {
            if i == j {
                matrix[(i, j)] = 0;
            } else if matrix[(i, j)] == 0 {
                matrix[(i, j)] = UNREACHABLE;
            }
        }
    }
}

//! The periodic QxQ process grid and its row and column groups.

use fox_mesh::{Group, WORLD_CONTEXT};

use crate::error::Error;
use crate::partition::block_size;

/// Side of the square grid formed by `processes` ranks.
pub fn process_grid_side(processes: usize) -> Result<usize, Error> {
    let q = processes.isqrt();
    if processes == 0 || q * q != processes {
        return Err(Error::NotPerfectSquare(processes));
    }
    Ok(q)
}

/// Validates a launch of `processes` ranks on an `n`x`n` matrix and returns
/// the grid side Q.
///
/// This is a pure function of its arguments, so every rank reaches the same
/// verdict without exchanging a message.
pub fn grid_side(processes: usize, n: usize) -> Result<usize, Error> {
    let q = process_grid_side(processes)?;
    if n == 0 {
        return Err(Error::Indivisible { n, q });
    }
    block_size(n, q)?;
    Ok(q)
}

/// This rank's place in the grid.
///
/// Ranks map to coordinates row-major: `row = rank / q`, `col = rank % q`.
/// The row group holds the ranks of this row ordered by column; the column
/// group holds the ranks of this column ordered by row. Both wrap around.
/// Built once per job and torn down when dropped.
pub struct ProcessGrid {
    q: usize,
    row: usize,
    col: usize,
    row_group: Group,
    col_group: Group,
}

impl ProcessGrid {
    /// Lays the grid over every rank of `world` for an `n`x`n` matrix.
    pub fn build(world: &Group, n: usize) -> Result<Self, Error> {
        let q = grid_side(world.size(), n)?;
        let rank = world.index();
        let (row, col) = (rank / q, rank % q);

        // Contexts: 0 is the world, then one per row, then one per column.
        let row_context = WORLD_CONTEXT + 1 + row as u32;
        let col_context = WORLD_CONTEXT + 1 + (q + col) as u32;

        let row_group = world.split((0..q).map(|c| row * q + c).collect(), row_context)?;
        let col_group = world.split((0..q).map(|r| r * q + col).collect(), col_context)?;

        Ok(Self {
            q,
            row,
            col,
            row_group,
            col_group,
        })
    }

    /// Grid side.
    pub fn q(&self) -> usize {
        self.q
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn coords(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Ranks in this row, indexed by column.
    pub fn row_group(&self) -> &Group {
        &self.row_group
    }

    /// Ranks in this column, indexed by row.
    pub fn col_group(&self) -> &Group {
        &self.col_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fox_mesh::LocalTransport;
    use std::sync::Arc;

    #[test]
    fn side_of_valid_launches() {
        assert_eq!(grid_side(1, 1).unwrap(), 1);
        assert_eq!(grid_side(4, 4).unwrap(), 2);
        assert_eq!(grid_side(9, 6).unwrap(), 3);
        assert_eq!(grid_side(16, 8).unwrap(), 4);
    }

    #[test]
    fn rejects_non_square_process_count() {
        for processes in [0, 2, 3, 5, 8, 15] {
            let err = grid_side(processes, 12).unwrap_err();
            assert!(matches!(err, Error::NotPerfectSquare(p) if p == processes));
            assert!(err.is_configuration());
        }
    }

    #[test]
    fn rejects_indivisible_dimension() {
        assert!(matches!(grid_side(4, 5), Err(Error::Indivisible { n: 5, q: 2 })));
        assert!(matches!(grid_side(4, 0), Err(Error::Indivisible { n: 0, q: 2 })));
    }

    #[test]
    fn every_rank_gets_its_row_and_column() {
        let grids: Vec<ProcessGrid> = LocalTransport::mesh(9)
            .into_iter()
            .map(|transport| ProcessGrid::build(&Group::world(Arc::new(transport)), 6).unwrap())
            .collect();

        for (rank, grid) in grids.iter().enumerate() {
            assert_eq!(grid.q(), 3);
            assert_eq!(grid.coords(), (rank / 3, rank % 3));

            let row = grid.row();
            let col = grid.col();
            assert_eq!(grid.row_group().members(), &[row * 3, row * 3 + 1, row * 3 + 2]);
            assert_eq!(grid.col_group().members(), &[col, col + 3, col + 6]);
            assert_eq!(grid.row_group().index(), col);
            assert_eq!(grid.col_group().index(), row);
        }
    }

    #[test]
    fn row_and_column_contexts_are_distinct() {
        let grid = ProcessGrid::build(
            &Group::world(Arc::new(LocalTransport::mesh(1).remove(0))),
            3,
        )
        .unwrap();
        assert_ne!(grid.row_group().context(), grid.col_group().context());
        assert_ne!(grid.row_group().context(), WORLD_CONTEXT);
    }
}

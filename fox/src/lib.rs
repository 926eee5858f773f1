//! All-pairs shortest paths with Fox's algorithm.
//!
//! An `n`x`n` distance matrix is split into `q`x`q` blocks, one per rank of
//! a square process grid. Fox's algorithm multiplies two such distributed
//! matrices with `q` rounds of row broadcasts and column ring shifts; doing
//! that under the (min, +) semiring `ceil(log2(n))` times squares the
//! adjacency matrix into the shortest-path matrix.
//!
//! # Layers
//!
//! - [`grid`] - the process grid and its row/column groups
//! - [`partition`] - block decomposition and the "0 means no edge" rule
//! - [`semiring`] - (min, +) and (+, ×), plus the block kernel
//! - [`engine`] - one distributed product
//! - [`squaring`] - repeated squaring into shortest paths
//! - [`job`] - coordinator scatter/gather around all of the above
//!
//! # Example
//!
//! ```
//! use fox::{Matrix, job};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fox::Error> {
//!     let graph = Matrix::from_rows(&[
//!         vec![0, 3, 0, 7],
//!         vec![8, 0, 2, 0],
//!         vec![5, 0, 0, 1],
//!         vec![2, 0, 4, 0],
//!     ])
//!     .unwrap();
//!
//!     let distances = job::run_local(graph, 4).await?;
//!     assert_eq!(distances[(0, 3)], 6);
//!     Ok(())
//! }
//! ```

pub mod engine;
mod error;
pub mod floyd;
pub mod generate;
pub mod grid;
pub mod io;
pub mod job;
pub mod matrix;
pub mod partition;
pub mod pool;
pub mod schedule;
pub mod semiring;
pub mod squaring;

pub use error::Error;
pub use matrix::{Block, MAX_EDGE_WEIGHT, Matrix, UNREACHABLE, Weight};

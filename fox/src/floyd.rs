//! Single-process reference solver.

use crate::matrix::{Matrix, UNREACHABLE, add_weights};

/// Floyd-Warshall in place on a sentinel-applied distance matrix.
pub fn floyd_warshall(matrix: &mut Matrix) {
    let n = matrix.size();
    for k in 0..n {
        for i in 0..n {
            let through = matrix[(i, k)];
            if through == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let candidate = add_weights(through, matrix[(k, j)]);
                if candidate < matrix[(i, j)] {
                    matrix[(i, j)] = candidate;
                }
            }
        }
    }
}

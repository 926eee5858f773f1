//! Random test graphs.

use rand::Rng;

use crate::matrix::{Matrix, Weight};

/// A random directed graph in input encoding: zero diagonal, each off-diagonal
/// edge present with probability `density` and a weight in `1..=max_weight`,
/// absent edges written as 0.
pub fn random_graph<R: Rng + ?Sized>(rng: &mut R, n: usize, density: f64, max_weight: Weight) -> Matrix {
    let density = density.clamp(0.0, 1.0);
    let max_weight = max_weight.max(1);

    let mut matrix = Matrix::filled(n, 0);
    for i in 0..n {
        for j in 0..n {
            if i != j && rng.gen_bool(density) {
                matrix[(i, j)] = rng.gen_range(1..=max_weight);
            }
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn respects_shape_and_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = random_graph(&mut rng, 6, 0.5, 9);

        for i in 0..6 {
            assert_eq!(m[(i, i)], 0);
            for j in 0..6 {
                assert!((0..=9).contains(&m[(i, j)]));
            }
        }
    }

    #[test]
    fn full_density_connects_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let m = random_graph(&mut rng, 4, 1.0, 3);
        let edges = m.as_slice().iter().filter(|&&w| w > 0).count();
        assert_eq!(edges, 12);
    }
}

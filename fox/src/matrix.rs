//! Dense square matrices over the extended integers.

use std::ops::{Index, IndexMut};

/// Element type of every distance and weight.
pub type Weight = i64;

/// Distance between two vertices with no path. Absorbing under addition.
pub const UNREACHABLE: Weight = Weight::MAX;

/// Largest edge weight magnitude accepted from input. Anything at or above it
/// could be mistaken for [`UNREACHABLE`] after a few additions.
pub const MAX_EDGE_WEIGHT: Weight = UNREACHABLE / 2 - 1;

/// Adds two weights, treating [`UNREACHABLE`] as absorbing. Overflow
/// saturates: upwards to [`UNREACHABLE`], downwards to `Weight::MIN`.
#[inline]
pub fn add_weights(a: Weight, b: Weight) -> Weight {
    if a == UNREACHABLE || b == UNREACHABLE {
        return UNREACHABLE;
    }
    a.saturating_add(b)
}

/// An `n`x`n` row-major matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    n: usize,
    data: Vec<Weight>,
}

impl Matrix {
    pub fn filled(n: usize, value: Weight) -> Self {
        Self {
            n,
            data: vec![value; n * n],
        }
    }

    /// Wraps row-major `data`, which must hold `n * n` values.
    pub fn from_vec(n: usize, data: Vec<Weight>) -> Option<Self> {
        (data.len() == n * n).then_some(Self { n, data })
    }

    pub fn from_rows(rows: &[Vec<Weight>]) -> Option<Self> {
        let n = rows.len();
        if rows.iter().any(|row| row.len() != n) {
            return None;
        }
        Some(Self {
            n,
            data: rows.concat(),
        })
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn as_slice(&self) -> &[Weight] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Weight] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<Weight> {
        self.data
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Weight]> {
        // chunks(0) panics; an empty matrix simply has no rows.
        self.data.chunks(self.n.max(1))
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Weight;

    fn index(&self, (i, j): (usize, usize)) -> &Weight {
        &self.data[i * self.n + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Weight {
        &mut self.data[i * self.n + j]
    }
}

/// One process's `b`x`b` slice of a global matrix, row-major.
///
/// The block is also what travels over the wire: [`Block::into_vec`] and
/// [`Block::from_vec`] convert to and from a bare payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    size: usize,
    data: Vec<Weight>,
}

impl Block {
    pub fn filled(size: usize, value: Weight) -> Self {
        Self {
            size,
            data: vec![value; size * size],
        }
    }

    pub fn from_vec(size: usize, data: Vec<Weight>) -> Option<Self> {
        (data.len() == size * size).then_some(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_slice(&self) -> &[Weight] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Weight] {
        &mut self.data
    }

    pub fn as_vec_mut(&mut self) -> &mut Vec<Weight> {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<Weight> {
        self.data
    }
}

impl Index<(usize, usize)> for Block {
    type Output = Weight;

    fn index(&self, (i, j): (usize, usize)) -> &Weight {
        &self.data[i * self.size + j]
    }
}

impl IndexMut<(usize, usize)> for Block {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Weight {
        &mut self.data[i * self.size + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_absorbs() {
        assert_eq!(add_weights(UNREACHABLE, 5), UNREACHABLE);
        assert_eq!(add_weights(-5, UNREACHABLE), UNREACHABLE);
        assert_eq!(add_weights(UNREACHABLE, UNREACHABLE), UNREACHABLE);
        assert_eq!(add_weights(3, 4), 7);
    }

    #[test]
    fn large_sums_saturate() {
        assert_eq!(add_weights(Weight::MAX - 1, 10), UNREACHABLE);
        assert_eq!(add_weights(Weight::MIN + 1, -10), Weight::MIN);
        assert_ne!(add_weights(-MAX_EDGE_WEIGHT, -MAX_EDGE_WEIGHT), UNREACHABLE);
    }

    #[test]
    fn from_rows_checks_shape() {
        assert!(Matrix::from_rows(&[vec![1, 2], vec![3]]).is_none());

        let m = Matrix::from_rows(&[vec![1, 2], vec![3, 4]]).unwrap();
        assert_eq!(m[(1, 0)], 3);
        assert_eq!(m.rows().collect::<Vec<_>>(), vec![&[1, 2][..], &[3, 4][..]]);
    }

    #[test]
    fn block_index_is_row_major() {
        let mut block = Block::from_vec(2, vec![1, 2, 3, 4]).unwrap();
        block[(0, 1)] = 9;
        assert_eq!(block.as_slice(), &[1, 9, 3, 4]);
        assert!(Block::from_vec(2, vec![1]).is_none());
    }
}

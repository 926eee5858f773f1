//! The algebra a distributed product is computed in.

use crate::matrix::{Block, UNREACHABLE, Weight, add_weights};

/// A (combine, accumulate) pair: `C[i][j] = acc_k combine(A[i][k], B[k][j])`.
///
/// `accumulate` must be associative and commutative with [`identity`] as its
/// neutral element, so that partial products computed in any step order add
/// up to the same result.
///
/// [`identity`]: Semiring::identity
pub trait Semiring: Send + Sync {
    fn identity(&self) -> Weight;

    fn combine(&self, a: Weight, b: Weight) -> Weight;

    fn accumulate(&self, acc: Weight, value: Weight) -> Weight;
}

/// (min, +): shortest-path composition. Identity is [`UNREACHABLE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MinPlus;

impl Semiring for MinPlus {
    fn identity(&self) -> Weight {
        UNREACHABLE
    }

    #[inline]
    fn combine(&self, a: Weight, b: Weight) -> Weight {
        add_weights(a, b)
    }

    #[inline]
    fn accumulate(&self, acc: Weight, value: Weight) -> Weight {
        acc.min(value)
    }
}

/// (+, ×): the ordinary matrix product. Identity is 0.
///
/// [`UNREACHABLE`] absorbs in both operations and positive overflow
/// saturates to it, so a sentinel in the input is never turned into a finite
/// value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Arithmetic;

impl Semiring for Arithmetic {
    fn identity(&self) -> Weight {
        0
    }

    #[inline]
    fn combine(&self, a: Weight, b: Weight) -> Weight {
        if a == UNREACHABLE || b == UNREACHABLE {
            return UNREACHABLE;
        }
        a.saturating_mul(b)
    }

    #[inline]
    fn accumulate(&self, acc: Weight, value: Weight) -> Weight {
        add_weights(acc, value)
    }
}

/// `c[i][j] = accumulate(c[i][j], combine(a[i][k], b[k][j]))` for all i, j, k.
///
/// `c` is not reset first; callers start it at [`Semiring::identity`] and may
/// call this repeatedly to accumulate several products into it.
pub fn multiply_accumulate<S: Semiring + ?Sized>(semiring: &S, a: &Block, b: &Block, c: &mut Block) {
    let n = c.size();
    debug_assert_eq!(a.size(), n);
    debug_assert_eq!(b.size(), n);

    let (a, b) = (a.as_slice(), b.as_slice());
    let c = c.as_mut_slice();

    // i-k-j order walks b and c row by row.
    for i in 0..n {
        let c_row = &mut c[i * n..(i + 1) * n];
        for k in 0..n {
            let x = a[i * n + k];
            let b_row = &b[k * n..(k + 1) * n];
            for (acc, &y) in c_row.iter_mut().zip(b_row) {
                *acc = semiring.accumulate(*acc, semiring.combine(x, y));
            }
        }
    }
}

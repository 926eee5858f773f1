//! The per-step plan of one Fox multiplication.
//!
//! Every rank derives the plan from `(q, row, col)` alone, so all ranks agree
//! on who broadcasts and where blocks move without coordinating.

/// What one rank does in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub index: usize,
    /// Column whose A-block is broadcast along this row.
    pub broadcast_col: usize,
    /// Whether this rank is the broadcast root.
    pub is_root: bool,
    /// Row the local B-block is sent to.
    pub shift_dest_row: usize,
    /// Row the next B-block arrives from.
    pub shift_source_row: usize,
}

/// Iterator over the `q` steps for the rank at `(row, col)`.
#[derive(Debug, Clone)]
pub struct Schedule {
    q: usize,
    row: usize,
    col: usize,
    next: usize,
}

impl Schedule {
    pub fn new(q: usize, row: usize, col: usize) -> Self {
        Self { q, row, col, next: 0 }
    }

    pub fn step(&self, index: usize) -> Step {
        let q = self.q;
        let broadcast_col = (self.row + index) % q;
        Step {
            index,
            broadcast_col,
            is_root: self.col == broadcast_col,
            shift_dest_row: (self.row + q - 1) % q,
            shift_source_row: (self.row + 1) % q,
        }
    }
}

impl Iterator for Schedule {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.next >= self.q {
            return None;
        }
        let step = self.step(self.next);
        self.next += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.q.saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Schedule {}

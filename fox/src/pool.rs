//! Recycler for fixed-size block buffers.

use crate::error::Error;
use crate::matrix::{Block, Weight};

/// Hands out buffers of exactly `block_len` elements and takes them back for
/// reuse, keeping at most `capacity` idle.
///
/// Allocation goes through `try_reserve_exact`, so running out of memory
/// surfaces as [`Error::Allocation`] instead of aborting the process.
#[derive(Debug)]
pub struct BlockPool {
    block_len: usize,
    capacity: usize,
    free: Vec<Vec<Weight>>,
}

impl BlockPool {
    pub fn new(block_len: usize, capacity: usize) -> Self {
        Self {
            block_len,
            capacity,
            free: Vec::with_capacity(capacity),
        }
    }

    /// Idle buffers ready to be handed out.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Returns a buffer of `block_len` elements. Recycled buffers keep their
    /// previous contents.
    pub fn acquire(&mut self) -> Result<Vec<Weight>, Error> {
        if let Some(buffer) = self.free.pop() {
            return Ok(buffer);
        }
        allocate(self.block_len, 0)
    }

    /// Gives a buffer back. Buffers of the wrong length are refused.
    pub fn release(&mut self, buffer: Vec<Weight>) -> Result<(), Error> {
        if buffer.len() != self.block_len {
            return Err(Error::Allocation(format!(
                "pool holds buffers of {} values, got one of {}",
                self.block_len,
                buffer.len()
            )));
        }
        if self.free.len() < self.capacity {
            self.free.push(buffer);
        }
        Ok(())
    }
}

/// Allocates `len` copies of `value` without aborting on exhaustion.
pub fn allocate(len: usize, value: Weight) -> Result<Vec<Weight>, Error> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| Error::Allocation(format!("{} values: {}", len, e)))?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Allocates a `size`x`size` block filled with `value`.
pub fn allocate_block(size: usize, value: Weight) -> Result<Block, Error> {
    let len = size
        .checked_mul(size)
        .ok_or_else(|| Error::Allocation(format!("block of side {}", size)))?;
    let data = allocate(len, value)?;
    Block::from_vec(size, data).ok_or_else(|| Error::Allocation(format!("block of side {}", size)))
}

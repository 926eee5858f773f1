//! The point-to-point layer every group operation is built on.

use async_trait::async_trait;

use crate::Error;

/// Sequence numbers at or above this value carry point-to-point labels.
const POINT_BASE: u64 = 1 << 63;

/// Identifies a message within a group.
///
/// `context` tells groups apart. Collectives take consecutive sequence
/// numbers from the group's counter; point-to-point messages use an explicit
/// label in a separate range so they never collide with a collective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub context: u32,
    pub sequence: u64,
}

impl Tag {
    pub fn collective(context: u32, sequence: u64) -> Self {
        Self {
            context,
            sequence: sequence & !POINT_BASE,
        }
    }

    pub fn point(context: u32, label: u32) -> Self {
        Self {
            context,
            sequence: POINT_BASE | u64::from(label),
        }
    }

    pub fn is_point(&self) -> bool {
        self.sequence & POINT_BASE != 0
    }
}

/// Moves payloads between the ranks of one job.
///
/// Sends never wait for the receiver: payloads are buffered on the receiving
/// side until a matching [`Transport::recv`]. This is what keeps paired
/// exchanges around a ring free of deadlock.
#[async_trait]
pub trait Transport: Send + Sync {
    /// This process's rank in the job.
    fn rank(&self) -> usize;

    /// Number of ranks in the job.
    fn size(&self) -> usize;

    async fn send(&self, dest: usize, tag: Tag, values: Vec<i64>) -> Result<(), Error>;

    async fn recv(&self, source: usize, tag: Tag) -> Result<Vec<i64>, Error>;

    /// Ends the job for every rank. Pending and future receives anywhere in
    /// the job fail with [`Error::Aborted`].
    async fn abort(&self, reason: &str) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_and_collective_tags_never_collide() {
        let collective = Tag::collective(4, 7);
        let point = Tag::point(4, 7);
        assert_ne!(collective, point);
        assert!(point.is_point());
        assert!(!collective.is_point());
    }
}

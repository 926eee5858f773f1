//! Process groups and the collectives Fox's algorithm needs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::Error;
use crate::transport::{Tag, Transport};

/// Context of the group that spans every rank.
pub const WORLD_CONTEXT: u32 = 0;

/// An ordered subset of the job's ranks.
///
/// Members are addressed by their index in the group, not by their rank in
/// the job. Every collective must be called by every member in the same
/// order: each call takes the next tag from a counter that only stays in step
/// across members under that discipline.
///
/// # Example
///
/// ```
/// use fox_mesh::{Group, LocalTransport};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), fox_mesh::Error> {
///     let mut handles = Vec::new();
///     for transport in LocalTransport::mesh(3) {
///         handles.push(tokio::spawn(async move {
///             let world = Group::world(Arc::new(transport));
///             let mut value = if world.index() == 0 { vec![7] } else { vec![0] };
///             world.broadcast(0, &mut value).await?;
///             Ok::<_, fox_mesh::Error>(value)
///         }));
///     }
///     for handle in handles {
///         assert_eq!(handle.await.unwrap()?, vec![7]);
///     }
///     Ok(())
/// }
/// ```
pub struct Group {
    transport: Arc<dyn Transport>,
    members: Vec<usize>,
    index: usize,
    context: u32,
    sequence: AtomicU64,
}

impl Group {
    /// The group of all ranks, ordered by rank.
    pub fn world(transport: Arc<dyn Transport>) -> Self {
        let members = (0..transport.size()).collect();
        let index = transport.rank();
        Self {
            transport,
            members,
            index,
            context: WORLD_CONTEXT,
            sequence: AtomicU64::new(0),
        }
    }

    /// Derives a group over `members` (job ranks, in group order).
    ///
    /// `context` must be the same on every member and different from every
    /// other group the members share.
    pub fn split(&self, members: Vec<usize>, context: u32) -> Result<Group, Error> {
        let size = self.transport.size();
        if let Some(&rank) = members.iter().find(|&&rank| rank >= size) {
            return Err(Error::UnknownRank { rank, size });
        }

        let rank = self.transport.rank();
        let index = members
            .iter()
            .position(|&member| member == rank)
            .ok_or(Error::NotAMember(rank))?;

        Ok(Group {
            transport: Arc::clone(&self.transport),
            members,
            index,
            context,
            sequence: AtomicU64::new(0),
        })
    }

    /// This process's position in the group.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn context(&self) -> u32 {
        self.context
    }

    fn next_tag(&self) -> Tag {
        Tag::collective(self.context, self.sequence.fetch_add(1, Ordering::SeqCst))
    }

    fn member(&self, index: usize) -> Result<usize, Error> {
        self.members.get(index).copied().ok_or(Error::UnknownRank {
            rank: index,
            size: self.members.len(),
        })
    }

    /// Sends a labelled payload to the member at `dest`.
    pub async fn send(&self, dest: usize, label: u32, values: Vec<i64>) -> Result<(), Error> {
        let rank = self.member(dest)?;
        self.transport
            .send(rank, Tag::point(self.context, label), values)
            .await
    }

    /// Receives the payload labelled `label` from the member at `source`.
    pub async fn recv(&self, source: usize, label: u32) -> Result<Vec<i64>, Error> {
        let rank = self.member(source)?;
        self.transport
            .recv(rank, Tag::point(self.context, label))
            .await
    }

    /// Copies `buffer` from the member at `root` into `buffer` on every
    /// member. Receivers' buffers must already have the root's length.
    pub async fn broadcast(&self, root: usize, buffer: &mut Vec<i64>) -> Result<(), Error> {
        let root_rank = self.member(root)?;
        let tag = self.next_tag();

        if self.index == root {
            for (index, &rank) in self.members.iter().enumerate() {
                if index != root {
                    self.transport.send(rank, tag, buffer.clone()).await?;
                }
            }
            return Ok(());
        }

        let values = self.transport.recv(root_rank, tag).await?;
        check_len(buffer.len(), values.len())?;
        *buffer = values;
        Ok(())
    }

    /// Sends `buffer` to the member at `dest` and replaces it with the
    /// payload from the member at `source`. On error `buffer` is left as it
    /// was.
    pub async fn exchange(
        &self,
        dest: usize,
        source: usize,
        buffer: &mut Vec<i64>,
    ) -> Result<(), Error> {
        let dest_rank = self.member(dest)?;
        let source_rank = self.member(source)?;
        let tag = self.next_tag();

        self.transport.send(dest_rank, tag, buffer.clone()).await?;

        let incoming = self.transport.recv(source_rank, tag).await?;
        check_len(buffer.len(), incoming.len())?;
        *buffer = incoming;
        Ok(())
    }

    /// Returns once every member has entered the barrier.
    pub async fn barrier(&self) -> Result<(), Error> {
        let tag = self.next_tag();
        let root = self.members[0];

        if self.index == 0 {
            for &rank in &self.members[1..] {
                self.transport.recv(rank, tag).await?;
            }
            for &rank in &self.members[1..] {
                self.transport.send(rank, tag, Vec::new()).await?;
            }
        } else {
            self.transport.send(root, tag, Vec::new()).await?;
            self.transport.recv(root, tag).await?;
        }

        Ok(())
    }

    /// Aborts the whole job, not just this group.
    pub async fn abort(&self, reason: &str) -> Result<(), Error> {
        self.transport.abort(reason).await
    }
}

fn check_len(expected: usize, actual: usize) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::SizeMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalTransport;
    use std::future::Future;

    /// Runs `body` once per rank on its own task and returns the results in
    /// rank order.
    async fn spmd<F, Fut, T>(size: usize, body: F) -> Vec<Result<T, Error>>
    where
        F: Fn(Group) -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = LocalTransport::mesh(size)
            .into_iter()
            .map(|transport| tokio::spawn(body(Group::world(Arc::new(transport)))))
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test]
    async fn broadcast_from_every_root() {
        for root in 0..4 {
            let results = spmd(4, move |world| async move {
                let mut buffer = vec![world.index() as i64; 3];
                world.broadcast(root, &mut buffer).await?;
                Ok(buffer)
            })
            .await;

            for result in results {
                assert_eq!(result.unwrap(), vec![root as i64; 3]);
            }
        }
    }

    #[tokio::test]
    async fn broadcast_rejects_wrong_length() {
        let results = spmd(2, |world| async move {
            let mut buffer = if world.index() == 0 { vec![1, 2] } else { vec![0] };
            world.broadcast(0, &mut buffer).await
        })
        .await;

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Error::SizeMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn exchange_rotates_ring_upwards() {
        let results = spmd(3, |world| async move {
            let (index, size) = (world.index(), world.size());
            let mut buffer = vec![index as i64];
            world
                .exchange((index + size - 1) % size, (index + 1) % size, &mut buffer)
                .await?;
            Ok(buffer[0])
        })
        .await;

        let values: Vec<i64> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn repeated_exchanges_stay_matched() {
        let results = spmd(4, |world| async move {
            let (index, size) = (world.index(), world.size());
            let mut buffer = vec![index as i64 * 10];
            for _ in 0..4 {
                world
                    .exchange((index + size - 1) % size, (index + 1) % size, &mut buffer)
                    .await?;
            }
            Ok(buffer[0])
        })
        .await;

        let values: Vec<i64> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, vec![0, 10, 20, 30]);
    }

    #[tokio::test]
    async fn failed_exchange_keeps_the_buffer() {
        let results = spmd(2, |world| async move {
            let peer = 1 - world.index();
            let mut buffer = vec![world.index() as i64 + 1; 2 - world.index()];
            let outcome = world.exchange(peer, peer, &mut buffer).await;
            Ok((outcome.is_err(), buffer))
        })
        .await;

        assert_eq!(results[0].as_ref().unwrap(), &(true, vec![1, 1]));
        assert_eq!(results[1].as_ref().unwrap(), &(true, vec![2]));

        let world = Group::world(Arc::new(LocalTransport::mesh(1).remove(0)));
        world.abort("stop").await.unwrap();
        let mut buffer = vec![4, 5, 6];
        assert!(world.exchange(0, 0, &mut buffer).await.is_err());
        assert_eq!(buffer, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn split_groups_are_independent() {
        // Ranks 0..4 as a 2x2 grid: broadcast in rows, then swap in columns.
        let results = spmd(4, |world| async move {
            let rank = world.index();
            let (row, col) = (rank / 2, rank % 2);
            let rows = world.split(vec![row * 2, row * 2 + 1], 1 + row as u32)?;
            let cols = world.split(vec![col, col + 2], 3 + col as u32)?;

            let mut a = vec![rank as i64];
            rows.broadcast(1, &mut a).await?;

            let mut b = vec![rank as i64];
            let other = 1 - cols.index();
            cols.exchange(other, other, &mut b).await?;

            Ok((a[0], b[0]))
        })
        .await;

        let values: Vec<(i64, i64)> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, vec![(1, 2), (1, 3), (3, 0), (3, 1)]);
    }

    #[tokio::test]
    async fn split_requires_membership() {
        let results = spmd(2, |world| async move {
            world.split(vec![0], 1).map(|group| group.size())
        })
        .await;

        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert!(matches!(results[1], Err(Error::NotAMember(1))));
    }

    #[tokio::test]
    async fn point_to_point_by_label() {
        let results = spmd(2, |world| async move {
            if world.index() == 0 {
                world.send(1, 2, vec![20]).await?;
                world.send(1, 1, vec![10]).await?;
                Ok(Vec::new())
            } else {
                let first = world.recv(0, 1).await?;
                let second = world.recv(0, 2).await?;
                Ok([first, second].concat())
            }
        })
        .await;

        assert_eq!(results[1].as_ref().unwrap(), &vec![10, 20]);
    }

    #[tokio::test]
    async fn barrier_then_abort_unblocks_peers() {
        let results = spmd(3, |world| async move {
            world.barrier().await?;
            if world.index() == 2 {
                world.abort("stop").await?;
                return Ok(());
            }
            let mut buffer = vec![0];
            world.broadcast(2, &mut buffer).await
        })
        .await;

        assert!(results[2].is_ok());
        assert!(matches!(results[0], Err(Error::Aborted(_))));
        assert!(matches!(results[1], Err(Error::Aborted(_))));
    }
}

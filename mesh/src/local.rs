//! In-process transport: every rank is a task in the same runtime.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Error;
use crate::inbox::Inbox;
use crate::transport::{Tag, Transport};

/// One rank's handle onto a set of in-process inboxes.
pub struct LocalTransport {
    rank: usize,
    inboxes: Arc<[Inbox]>,
}

impl LocalTransport {
    /// Creates one connected transport per rank, ordered by rank.
    pub fn mesh(size: usize) -> Vec<LocalTransport> {
        let inboxes: Arc<[Inbox]> = (0..size).map(|_| Inbox::new()).collect();
        (0..size)
            .map(|rank| LocalTransport {
                rank,
                inboxes: Arc::clone(&inboxes),
            })
            .collect()
    }

    fn inbox(&self, rank: usize) -> Result<&Inbox, Error> {
        self.inboxes.get(rank).ok_or(Error::UnknownRank {
            rank,
            size: self.inboxes.len(),
        })
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.inboxes.len()
    }

    async fn send(&self, dest: usize, tag: Tag, values: Vec<i64>) -> Result<(), Error> {
        let inbox = self.inbox(dest)?;
        if inbox.is_closed() {
            return Err(Error::Aborted("job already aborted".to_string()));
        }
        inbox.deliver(self.rank, tag, values);
        Ok(())
    }

    async fn recv(&self, source: usize, tag: Tag) -> Result<Vec<i64>, Error> {
        self.inbox(source)?;
        self.inbox(self.rank)?.take(source, tag).await
    }

    async fn abort(&self, reason: &str) -> Result<(), Error> {
        let reason = format!("rank {} aborted the job: {}", self.rank, reason);
        for inbox in self.inboxes.iter() {
            inbox.close(&reason);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_between_ranks() {
        let mut mesh = LocalTransport::mesh(2);
        let one = mesh.pop().unwrap();
        let zero = mesh.pop().unwrap();

        zero.send(1, Tag::point(0, 1), vec![1, 2, 3]).await.unwrap();
        assert_eq!(one.recv(0, Tag::point(0, 1)).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn rejects_unknown_rank() {
        let mesh = LocalTransport::mesh(1);
        let err = mesh[0].send(5, Tag::point(0, 0), vec![]).await.unwrap_err();
        assert!(matches!(err, Error::UnknownRank { rank: 5, size: 1 }));
    }

    #[tokio::test]
    async fn abort_fails_every_rank() {
        let mesh = LocalTransport::mesh(3);
        mesh[2].abort("input error").await.unwrap();

        for transport in &mesh {
            let err = transport.recv(0, Tag::collective(0, 1)).await.unwrap_err();
            assert!(matches!(err, Error::Aborted(_)));
        }
        assert!(mesh[0].send(1, Tag::point(0, 0), vec![]).await.is_err());
    }
}

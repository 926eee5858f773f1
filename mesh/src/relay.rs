//! Transport for ranks running as separate processes behind a relay server.

use std::sync::Arc;

use async_trait::async_trait;
use fox_relay_types::relay::relay_client::RelayClient;
use fox_relay_types::relay::{AbortRequest, Envelope, SubscribeRequest};
use tokio::task::JoinHandle;
use tonic::transport::{Channel, Endpoint};
use tracing::{error, info};

use crate::Error;
use crate::inbox::Inbox;
use crate::sync::SyncTask;
use crate::transport::{Tag, Transport};

/// Largest envelope this client sends or accepts.
const MAX_MESSAGE_BYTES: usize = 256 * 1024 * 1024;

/// A rank connected to a relay server.
///
/// Connecting subscribes to the rank's queue on the relay; a background task
/// moves every delivery into a local [`Inbox`]. Envelopes posted by peers
/// before this rank connected are buffered by the relay and arrive first.
///
/// # Example
///
/// ```no_run
/// use fox_mesh::{Group, RelayTransport};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let transport = RelayTransport::connect("localhost:50051", 0, 4).await?;
///     let world = Group::world(Arc::new(transport));
///     world.barrier().await?;
///     Ok(())
/// }
/// ```
pub struct RelayTransport {
    rank: usize,
    size: usize,
    client: RelayClient<Channel>,
    inbox: Arc<Inbox>,
    sync_handle: JoinHandle<()>,
}

impl RelayTransport {
    /// Connects to a relay and joins the job as `rank` of `size`.
    ///
    /// # Arguments
    ///
    /// * `addr` - Relay address (e.g., `"localhost:50051"`)
    pub async fn connect(
        addr: impl Into<RelayAddr>,
        rank: usize,
        size: usize,
    ) -> Result<Self, Error> {
        if rank >= size {
            return Err(Error::UnknownRank { rank, size });
        }

        let relay_addr = addr.into();
        let endpoint = Endpoint::from_shared(format!("http://{}", relay_addr.0))?;
        let channel = endpoint.connect().await?;
        let mut client = RelayClient::new(channel)
            .max_decoding_message_size(MAX_MESSAGE_BYTES)
            .max_encoding_message_size(MAX_MESSAGE_BYTES);

        let stream = client
            .subscribe(SubscribeRequest {
                rank: rank as u32,
                size: size as u32,
            })
            .await?
            .into_inner();
        info!(rank, size, relay = %relay_addr.0, "joined relay");

        let inbox = Arc::new(Inbox::new());
        let sync_task = SyncTask::new(stream, Arc::clone(&inbox));
        let sync_handle = tokio::spawn(async move {
            if let Err(e) = sync_task.run().await {
                error!("relay subscription ended: {}", e);
            }
        });

        Ok(Self {
            rank,
            size,
            client,
            inbox,
            sync_handle,
        })
    }

    fn check_rank(&self, rank: usize) -> Result<(), Error> {
        if rank < self.size {
            Ok(())
        } else {
            Err(Error::UnknownRank {
                rank,
                size: self.size,
            })
        }
    }
}

impl Drop for RelayTransport {
    fn drop(&mut self) {
        self.sync_handle.abort();
    }
}

#[async_trait]
impl Transport for RelayTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    async fn send(&self, dest: usize, tag: Tag, values: Vec<i64>) -> Result<(), Error> {
        self.check_rank(dest)?;

        let envelope = Envelope {
            source: self.rank as u32,
            dest: dest as u32,
            context: tag.context,
            sequence: tag.sequence,
            values,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let mut client = self.client.clone();
        let ack = client.post(envelope).await?.into_inner();
        if ack.accepted {
            Ok(())
        } else {
            Err(Error::Rejected(ack.error))
        }
    }

    async fn recv(&self, source: usize, tag: Tag) -> Result<Vec<i64>, Error> {
        self.check_rank(source)?;
        self.inbox.take(source, tag).await
    }

    async fn abort(&self, reason: &str) -> Result<(), Error> {
        let mut client = self.client.clone();
        client
            .abort(AbortRequest {
                rank: self.rank as u32,
                reason: reason.to_string(),
            })
            .await?;
        Ok(())
    }
}

/// Relay address wrapper for type-safe connection.
#[derive(Clone)]
pub struct RelayAddr(pub String);

impl From<String> for RelayAddr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RelayAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

//! Background task that feeds relay deliveries into the local inbox.

use std::sync::Arc;

use fox_relay_types::relay::Envelope;
use futures_util::StreamExt;
use tonic::{Code, Streaming};
use tracing::{debug, warn};

use crate::Error;
use crate::inbox::Inbox;
use crate::transport::Tag;

pub struct SyncTask {
    stream: Streaming<Envelope>,
    inbox: Arc<Inbox>,
}

impl SyncTask {
    pub fn new(stream: Streaming<Envelope>, inbox: Arc<Inbox>) -> Self {
        Self { stream, inbox }
    }

    /// Runs until the subscription ends. However it ends, the inbox is closed
    /// so that no receive waits on a stream that will never deliver.
    pub async fn run(mut self) -> Result<(), Error> {
        let result = self.pump().await;
        let reason = match &result {
            Ok(()) => "relay closed the subscription".to_string(),
            Err(Error::Status(status)) if status.code() == Code::Aborted => {
                status.message().to_string()
            }
            Err(e) => e.to_string(),
        };
        self.inbox.close(&reason);
        result
    }

    async fn pump(&mut self) -> Result<(), Error> {
        while let Some(result) = self.stream.next().await {
            let envelope = result?;
            self.process_envelope(envelope);
        }
        Ok(())
    }

    fn process_envelope(&self, envelope: Envelope) {
        let latency_ms = chrono::Utc::now().timestamp_millis() - envelope.timestamp;
        if latency_ms > 1000 {
            warn!(source = envelope.source, latency_ms, "slow delivery");
        } else {
            debug!(source = envelope.source, latency_ms, "delivery");
        }

        let tag = Tag {
            context: envelope.context,
            sequence: envelope.sequence,
        };
        self.inbox.deliver(envelope.source as usize, tag, envelope.values);
    }
}

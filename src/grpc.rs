use crate::mailbox::{Mailbox, MailboxError};
use crate::models;
use fox_relay_types::relay::{
    self,
    relay_server::{Relay, RelayServer},
    AbortAck, AbortRequest, PostAck, SubscribeRequest,
};
use futures_util::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

/// Largest envelope the relay accepts or emits; one envelope carries a whole
/// matrix block.
pub const MAX_MESSAGE_BYTES: usize = 256 * 1024 * 1024;

#[derive(Clone)]
pub struct RelayServiceImpl {
    mailbox: Arc<Mailbox>,
}

impl RelayServiceImpl {
    pub fn new(mailbox: Arc<Mailbox>) -> Self {
        Self { mailbox }
    }
}

type SubscribeStream = Pin<Box<dyn Stream<Item = Result<relay::Envelope, Status>> + Send>>;

#[tonic::async_trait]
impl Relay for RelayServiceImpl {
    type SubscribeStream = SubscribeStream;

    async fn post(&self, request: Request<relay::Envelope>) -> Result<Response<PostAck>, Status> {
        let envelope = models::Envelope::from(request.into_inner());
        let (source, dest, len) = (envelope.source, envelope.dest, envelope.values.len());

        match self.mailbox.post(envelope) {
            Ok(()) => {
                debug!(source, dest, len, "envelope queued");
                Ok(Response::new(PostAck {
                    accepted: true,
                    error: String::new(),
                }))
            }
            Err(e) => Ok(Response::new(PostAck {
                accepted: false,
                error: e.to_string(),
            })),
        }
    }

    async fn subscribe(
        &self,
        request: Request<SubscribeRequest>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let SubscribeRequest { rank, size } = request.into_inner();
        let mut deliveries = self
            .mailbox
            .subscribe(rank, size)
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        info!(rank, size, "rank subscribed");

        let output = async_stream::stream! {
            while let Some(delivery) = deliveries.recv().await {
                match delivery {
                    Ok(envelope) => {
                        debug!(
                            source = envelope.source,
                            dest = envelope.dest,
                            latency_ms = envelope.age_millis(),
                            "envelope delivered"
                        );
                        yield Ok(relay::Envelope::from(envelope));
                    }
                    Err(MailboxError::Aborted(reason)) => {
                        yield Err(Status::aborted(reason));
                        break;
                    }
                    Err(e) => {
                        yield Err(Status::internal(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Response::new(Box::pin(output)))
    }

    async fn abort(&self, request: Request<AbortRequest>) -> Result<Response<AbortAck>, Status> {
        let req = request.into_inner();
        let reason = format!("rank {} aborted the job: {}", req.rank, req.reason);
        if self.mailbox.abort(reason.clone()) {
            warn!("{}", reason);
        }
        Ok(Response::new(AbortAck {}))
    }
}

pub fn create_server(mailbox: Arc<Mailbox>) -> RelayServer<RelayServiceImpl> {
    RelayServer::new(RelayServiceImpl::new(mailbox))
        .max_decoding_message_size(MAX_MESSAGE_BYTES)
        .max_encoding_message_size(MAX_MESSAGE_BYTES)
}

use std::sync::Arc;
use tonic::transport::Server;
use tracing::info;

use fox_relay::{grpc, mailbox};

const DEFAULT_ADDR: &str = "127.0.0.1:50051";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
        .parse()?;

    let mailbox = Arc::new(mailbox::Mailbox::new());
    let server = grpc::create_server(mailbox);

    info!(%addr, "relay listening");
    Server::builder().add_service(server).serve(addr).await?;

    Ok(())
}

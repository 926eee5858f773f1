//! Process groups and collectives for SPMD jobs.
//!
//! `fox-mesh` gives every rank of a job the handful of primitives Fox's
//! algorithm needs: a world [`Group`], sub-groups split from it, broadcast
//! within a group, a paired ring exchange, point-to-point messages, a barrier
//! and a job-wide abort. All of it is built on the [`Transport`] trait, which
//! has two implementations:
//!
//! - [`LocalTransport`] - every rank is a task in one process
//! - [`RelayTransport`] - every rank is its own process, connected through
//!   the relay server
//!
//! # Example
//!
//! ```no_run
//! use fox_mesh::{Group, RelayTransport};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = RelayTransport::connect("localhost:50051", 1, 2).await?;
//!     let world = Group::world(Arc::new(transport));
//!
//!     let mut block = vec![0; 4];
//!     world.broadcast(0, &mut block).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod group;
mod inbox;
mod local;
mod relay;
mod sync;
mod transport;

pub use error::Error;
pub use group::{Group, WORLD_CONTEXT};
pub use inbox::Inbox;
pub use local::LocalTransport;
pub use relay::{RelayAddr, RelayTransport};
pub use transport::{Tag, Transport};

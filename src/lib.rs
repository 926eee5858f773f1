//! Message relay for distributed Fox jobs.
//!
//! Ranks that run as separate processes cannot reach each other directly;
//! they all connect to one relay, subscribe to their own queue and post
//! envelopes addressed to their peers. An abort from any rank ends every
//! subscription so that no rank waits forever on a peer that is gone.

pub mod grpc;
pub mod mailbox;
pub mod models;

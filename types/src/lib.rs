//! Generated protocol types for the relay service.

pub mod relay {
    tonic::include_proto!("relay");
}

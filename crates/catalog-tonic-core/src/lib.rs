#![doc = include_str!("../README.md")]

mod common;
pub use common::*;

/// Generated protobuf/gRPC bindings for the `catalog` package.
pub mod proto {
    tonic::include_proto!("catalog");

    /// Serialized file descriptor set, registered with the reflection
    /// service so clients can discover the schema at runtime.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("catalog_descriptor");
}

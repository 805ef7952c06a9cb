//! Storage abstractions for catalog records and uploaded images.
//!
//! Both stores are trait seams: the in-memory and on-disk reference
//! implementations here can be swapped for durable backends without touching
//! the service handlers. The error surface is deliberately narrow; the
//! handler layer translates it into gRPC status codes.

pub mod image;
pub mod laptop;

/// Failures a storage backend can report. Everything beyond duplicate
/// detection is collapsed into `Internal`; classification into the RPC
/// vocabulary happens at the service boundary.
#[derive(Clone, thiserror::Error, Debug)]
pub enum StoreError {
    /// A record with the same identifier already exists.
    #[error("record already exists")]
    Duplicate,

    /// The backend failed to read or write.
    #[error("storage failure: {0}")]
    Internal(String),
}

//! Error types for the catalog service.
//!
//! This module defines the central `Error` enum, which captures every
//! reportable failure in the catalog service. It implements `From<Error>`
//! for `tonic::Status` so errors propagate to clients with the right gRPC
//! status codes. The storage layer deliberately does not use these types:
//! it reports a narrow duplicate/internal pair, and the service handler is
//! the only layer that classifies failures into this vocabulary.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the catalog service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// A client-supplied laptop id is not a valid UUID.
    #[error("laptop id {id:?} is not a valid UUID: {reason}")]
    InvalidId { id: String, reason: String },

    /// A laptop with the same id is already registered.
    #[error("laptop {id} already exists")]
    AlreadyExists { id: String },

    /// An upload referenced a laptop that is not in the store.
    #[error("laptop {id} does not exist")]
    UnknownLaptop { id: String },

    /// The request was malformed or violated a protocol rule.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The accumulated image payload exceeded the configured maximum.
    #[error("image is too large: {size} > {max}")]
    ImageTooLarge { size: usize, max: usize },

    /// A storage operation failed for a reason other than duplication.
    #[error("storage error: {context}")]
    Storage { context: String },

    /// The caller cancelled the request, or the service is shutting down.
    #[error("request cancelled")]
    RequestCancelled,

    /// The caller-supplied deadline expired mid-request.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A transport-level receive or send failure outside our control.
    #[error("transport error: {context}")]
    Transport { context: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidId { .. }
            | Error::UnknownLaptop { .. }
            | Error::InvalidRequest { .. }
            | Error::ImageTooLarge { .. } => Status::invalid_argument(err.to_string()),
            Error::AlreadyExists { .. } => Status::already_exists(err.to_string()),
            Error::Storage { .. } => Status::internal(err.to_string()),
            Error::RequestCancelled => Status::cancelled(err.to_string()),
            Error::DeadlineExceeded => Status::deadline_exceeded(err.to_string()),
            Error::Transport { .. } => Status::unknown(err.to_string()),
        }
    }
}

//! State machine for client-streamed image uploads.

use bytes::{Bytes, BytesMut};
use catalog_tonic_core::Error;
use catalog_tonic_core::proto::upload_image_request::Data;

enum State {
    AwaitingMetadata,
    Accumulating {
        laptop_id: String,
        image_type: String,
        data: BytesMut,
    },
    Aborted,
}

/// Accumulates one image upload.
///
/// The first message must carry the image metadata, every following message
/// appends a chunk, and end-of-input finalizes into the full payload. A
/// chunk before the metadata, a second metadata message, a message with no
/// payload, or an accumulated size above `max_size` aborts the upload; an
/// aborted upload never yields a payload, so no partial asset can be
/// persisted.
pub struct ImageUpload {
    state: State,
    max_size: usize,
}

impl ImageUpload {
    pub fn new(max_size: usize) -> Self {
        Self {
            state: State::AwaitingMetadata,
            max_size,
        }
    }

    /// Consumes the first stream message and returns the parent laptop id
    /// and type tag, so the caller can validate the parent before reading
    /// any chunk.
    pub fn start(&mut self, data: Option<Data>) -> Result<(String, String), Error> {
        match (&self.state, data) {
            (State::AwaitingMetadata, Some(Data::Info(info))) => {
                self.state = State::Accumulating {
                    laptop_id: info.laptop_id.clone(),
                    image_type: info.image_type.clone(),
                    data: BytesMut::new(),
                };
                Ok((info.laptop_id, info.image_type))
            }
            (State::AwaitingMetadata, Some(Data::ChunkData(_))) => {
                self.state = State::Aborted;
                Err(Error::InvalidRequest {
                    reason: "first upload message must carry image info, got chunk data".into(),
                })
            }
            (State::AwaitingMetadata, None) => {
                self.state = State::Aborted;
                Err(Error::InvalidRequest {
                    reason: "upload message carries no payload".into(),
                })
            }
            _ => {
                self.state = State::Aborted;
                Err(Error::InvalidRequest {
                    reason: "image info was already received".into(),
                })
            }
        }
    }

    /// Appends one chunk and returns the running total.
    pub fn append(&mut self, data: Option<Data>) -> Result<usize, Error> {
        let max_size = self.max_size;
        match (&mut self.state, data) {
            (State::Accumulating { data: buf, .. }, Some(Data::ChunkData(chunk))) => {
                let size = buf.len() + chunk.len();
                if size > max_size {
                    self.state = State::Aborted;
                    return Err(Error::ImageTooLarge {
                        size,
                        max: max_size,
                    });
                }

                buf.extend_from_slice(&chunk);
                Ok(size)
            }
            (State::Accumulating { .. }, Some(Data::Info(_))) => {
                self.state = State::Aborted;
                Err(Error::InvalidRequest {
                    reason: "unexpected image info after chunk data started".into(),
                })
            }
            (State::Accumulating { .. }, None) => {
                self.state = State::Aborted;
                Err(Error::InvalidRequest {
                    reason: "upload message carries no payload".into(),
                })
            }
            _ => Err(Error::InvalidRequest {
                reason: "upload is not accumulating chunks".into(),
            }),
        }
    }

    /// Finalizes the upload, yielding the parent id, type tag, and the full
    /// payload.
    pub fn finalize(self) -> Result<(String, String, Bytes), Error> {
        match self.state {
            State::Accumulating {
                laptop_id,
                image_type,
                data,
            } => Ok((laptop_id, image_type, data.freeze())),
            _ => Err(Error::InvalidRequest {
                reason: "upload stream ended before image info".into(),
            }),
        }
    }
}

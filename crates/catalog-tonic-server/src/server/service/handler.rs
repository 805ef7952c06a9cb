//! gRPC service implementation for the laptop catalog.
//!
//! This module defines [`CatalogService`], the concrete implementation of
//! the [`LaptopService`] gRPC service defined in the protobuf specification.
//! It mediates between the transport layer and the two stores: it owns
//! identifier assignment, error-code classification, and streaming flow
//! control; the stores own persistence and report only a narrow error pair.

use crate::server::{
    config::ServerConfig,
    service::{context, upload::ImageUpload},
    store::{StoreError, image::ImageStore, laptop::LaptopStore},
};
use catalog_tonic_core::Error;
use catalog_tonic_core::proto::{
    CreateLaptopRequest, CreateLaptopResponse, SearchLaptopRequest, SearchLaptopResponse,
    UploadImageRequest, UploadImageResponse, laptop_service_server::LaptopService,
};
use core::pin::Pin;
use futures::{Stream, StreamExt, stream};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming};
use uuid::Uuid;

/// gRPC service for registering, searching, and attaching images to laptop
/// records.
///
/// Each RPC invocation runs as an independent task. The record store is the
/// only shared mutable resource; both stores sit behind trait objects so
/// durable backends can be swapped in without touching this handler.
#[derive(Clone)]
pub struct CatalogService {
    config: ServerConfig,
    laptop_store: Arc<dyn LaptopStore>,
    image_store: Arc<dyn ImageStore>,
    shutdown_token: CancellationToken,
}

impl CatalogService {
    pub fn new(
        config: ServerConfig,
        laptop_store: Arc<dyn LaptopStore>,
        image_store: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            config,
            laptop_store,
            image_store,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Initiates shutdown: in-flight scans and uploads observe the token at
    /// their next iteration boundary and abort with `Cancelled`.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

#[tonic::async_trait]
impl LaptopService for CatalogService {
    /// Registers a new laptop record.
    ///
    /// A client-supplied id must be a valid UUID; an empty id is replaced
    /// with a freshly generated one. The cancellation/deadline check happens
    /// before the store write so an abandoned call never mutates the store.
    #[tracing::instrument(skip_all)]
    async fn create_laptop(
        &self,
        req: Request<CreateLaptopRequest>,
    ) -> Result<Response<CreateLaptopResponse>, Status> {
        let deadline = context::request_deadline(req.metadata());
        let mut laptop = req.into_inner().laptop.ok_or_else(|| Error::InvalidRequest {
            reason: "request contains no laptop".into(),
        })?;

        tracing::info!(id = %laptop.id, "received a create-laptop request");

        if laptop.id.is_empty() {
            laptop.id = Uuid::new_v4().to_string();
        } else if let Err(e) = Uuid::parse_str(&laptop.id) {
            return Err(Error::InvalidId {
                id: laptop.id,
                reason: e.to_string(),
            }
            .into());
        }

        // The weight oneof must carry exactly one representation; the wire
        // format already rules out both, this rules out neither.
        if laptop.weight.is_none() {
            return Err(Error::InvalidRequest {
                reason: "laptop weight must be set".into(),
            }
            .into());
        }

        context::ensure_live(&self.shutdown_token, deadline)?;

        self.laptop_store.save(&laptop).await.map_err(|e| match e {
            StoreError::Duplicate => Error::AlreadyExists {
                id: laptop.id.clone(),
            },
            StoreError::Internal(context) => Error::Storage { context },
        })?;

        tracing::info!(id = %laptop.id, "saved laptop");
        Ok(Response::new(CreateLaptopResponse { id: laptop.id }))
    }

    type SearchLaptopStream =
        Pin<Box<dyn Stream<Item = Result<SearchLaptopResponse, Status>> + Send>>;

    /// Streams every laptop matching the filter.
    ///
    /// A producer task scans a point-in-time snapshot of the store and
    /// feeds matches through a bounded channel; backpressure from a slow
    /// consumer therefore throttles the scan instead of buffering unsent
    /// matches. A store failure, a cancelled scan, or an expired caller
    /// deadline terminates the stream with a single trailing status. An
    /// absent filter evaluates with zero values, like protobuf getters.
    #[tracing::instrument(skip_all)]
    async fn search_laptop(
        &self,
        req: Request<SearchLaptopRequest>,
    ) -> Result<Response<Self::SearchLaptopStream>, Status> {
        let deadline = context::request_deadline(req.metadata());
        let filter = req.into_inner().filter.unwrap_or_default();

        tracing::info!(?filter, "received a search-laptop request");

        let (found_tx, found_rx) = mpsc::channel(self.config.stream_buffer_size);
        let (done_tx, done_rx) = oneshot::channel::<Result<(), Status>>();

        let store = Arc::clone(&self.laptop_store);
        let cancel = self.shutdown_token.child_token();

        tokio::spawn(async move {
            let scan = store.search(cancel.clone(), filter, found_tx);
            let expired = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                    None => std::future::pending::<()>().await,
                }
            };

            // Expiry drops the scan future, which closes the match channel;
            // already-buffered matches still drain before the terminal status.
            let outcome = tokio::select! {
                res = scan => match res {
                    Ok(()) if cancel.is_cancelled() => Err(Error::RequestCancelled.into()),
                    Ok(()) => Ok(()),
                    Err(e) => {
                        tracing::warn!("search scan failed: {e}");
                        Err(Error::Storage {
                            context: e.to_string(),
                        }
                        .into())
                    }
                },
                () = expired => Err(Error::DeadlineExceeded.into()),
            };
            let _ = done_tx.send(outcome);
        });

        let matches = ReceiverStream::new(found_rx).map(|laptop| {
            tracing::debug!(id = %laptop.id, "sending matched laptop");
            Ok(SearchLaptopResponse {
                laptop: Some(laptop),
            })
        });

        // Emitted only after every buffered match has been drained. A
        // producer that died without reporting shows up as a closed channel.
        let terminal = stream::once(async move {
            done_rx.await.unwrap_or_else(|_| {
                Err(Error::Storage {
                    context: "search scan stopped unexpectedly".into(),
                }
                .into())
            })
        })
        .filter_map(|outcome| futures::future::ready(outcome.err().map(Err)));

        Ok(Response::new(Box::pin(matches.chain(terminal))))
    }

    /// Accepts a client-streamed image upload for an existing laptop.
    ///
    /// The first message must carry metadata naming the parent record,
    /// which is validated before any chunk is read. Chunks accumulate in
    /// memory under the configured cap; the asset is created atomically at
    /// end-of-input, so an aborted upload persists nothing.
    #[tracing::instrument(skip_all)]
    async fn upload_image(
        &self,
        req: Request<Streaming<UploadImageRequest>>,
    ) -> Result<Response<UploadImageResponse>, Status> {
        let deadline = context::request_deadline(req.metadata());
        let mut stream = req.into_inner();

        let first = stream
            .message()
            .await
            .map_err(|e| Error::Transport {
                context: format!("cannot receive image info: {e}"),
            })?
            .ok_or_else(|| Error::InvalidRequest {
                reason: "upload stream closed before image info".into(),
            })?;

        let mut upload = ImageUpload::new(self.config.max_image_size);
        let (laptop_id, image_type) = upload.start(first.data)?;
        tracing::info!(%laptop_id, %image_type, "received an upload-image request");

        let laptop = self
            .laptop_store
            .find_by_id(&laptop_id)
            .await
            .map_err(|e| Error::Storage {
                context: format!("cannot look up laptop: {e}"),
            })?;

        if laptop.is_none() {
            return Err(Error::UnknownLaptop { id: laptop_id }.into());
        }

        loop {
            context::ensure_live(&self.shutdown_token, deadline)?;

            let msg = match stream.message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(e) => {
                    return Err(Error::Transport {
                        context: format!("cannot receive chunk data: {e}"),
                    }
                    .into());
                }
            };

            let total = upload.append(msg.data)?;
            tracing::debug!(total, "accumulated image chunk");
        }

        let (laptop_id, image_type, data) = upload.finalize()?;
        let size = data.len();

        let id = self
            .image_store
            .save(&laptop_id, &image_type, data)
            .await
            .map_err(|e| Error::Storage {
                context: format!("cannot save image: {e}"),
            })?;

        tracing::info!(%id, size, "saved image");
        Ok(Response::new(UploadImageResponse {
            id,
            size: size as u32,
        }))
    }
}
